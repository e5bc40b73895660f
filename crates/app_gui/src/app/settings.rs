//! Settings panel for the classification service, plus config file location.

use super::UiApp;
use anyhow::{Context, Result};
use detect_core::AppConfig;
use directories_next::ProjectDirs;
use eframe::egui;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api_base_url` for one run.
pub const API_URL_ENV: &str = "ONCOSCAN_API_URL";

/// `<config dir>/config.toml`, if the platform has a config directory.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "OncoScan", "OncoScan")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Loads the config file (defaults when absent) and applies the environment
/// override.
pub fn load_config(path: Option<&Path>, env_override: Option<String>) -> Result<AppConfig> {
    let cfg = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => AppConfig::default(),
    };
    Ok(cfg.with_base_url_override(env_override))
}

impl UiApp {
    /// Renders the service settings and version information.
    pub(super) fn render_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Classification service URL");
            ui.add(
                egui::TextEdit::singleline(&mut self.pending_base_url)
                    .hint_text(detect_core::config::DEFAULT_API_BASE_URL)
                    .desired_width(320.0),
            );
        });
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            ui.label("Request timeout");
            ui.add(
                egui::DragValue::new(&mut self.pending_timeout_secs)
                    .range(0..=600)
                    .speed(1)
                    .custom_formatter(|v, _| {
                        if v == 0.0 {
                            "none".to_string()
                        } else {
                            format!("{v:.0} s")
                        }
                    }),
            );
        });
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.apply_pending_settings();
                self.status = format!("Using {}", self.config.api_base_url);
            }
            let can_save = self.config_path.is_some();
            if ui
                .add_enabled(can_save, egui::Button::new("Save"))
                .clicked()
            {
                self.apply_pending_settings();
                self.save_settings();
            }
        });

        ui.add_space(16.0);
        ui.separator();
        ui.add_space(6.0);
        ui.heading("Versions");
        ui.label(format!("App version: {}", self.app_version));
        if let Some(path) = &self.config_path {
            ui.label(format!("Settings file: {}", path.display()));
        }
        ui.label(format!(
            "Set {API_URL_ENV} to override the service URL for a single run."
        ));
    }

    fn apply_pending_settings(&mut self) {
        self.config.api_base_url = self.pending_base_url.trim().to_string();
        self.config.request_timeout_secs =
            Some(self.pending_timeout_secs).filter(|secs| *secs > 0);
        self.rebuild_backend();
    }

    fn save_settings(&mut self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        match self.config.save(&path) {
            Ok(()) => self.status = format!("Settings saved to {}", path.display()),
            Err(e) => {
                tracing::error!("saving settings failed: {e}");
                self.status = format!("Could not save settings: {e}");
            }
        }
    }
}
