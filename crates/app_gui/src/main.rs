mod app;
mod preview;

use app::UiApp;
use app::settings::{API_URL_ENV, config_path, load_config};
use detect_core::AppConfig;
use eframe::{NativeOptions, egui};

fn main() {
    tracing_subscriber::fmt::init();

    let path = config_path();
    let env_override = std::env::var(API_URL_ENV).ok();
    let (config, startup_status) = match load_config(path.as_deref(), env_override.clone()) {
        Ok(cfg) => (cfg, None),
        Err(e) => {
            tracing::error!("{e:#}");
            (
                AppConfig::default().with_base_url_override(env_override),
                Some("Settings file unreadable; using defaults".to_string()),
            )
        }
    };

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        "OncoScan",
        options,
        Box::new(move |cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(UiApp::new(
                cc,
                config,
                path,
                startup_status,
            )))
        }),
    ) {
        eprintln!("Application stopped with error: {e}");
    }
}
