//! Application shell: header, footer, panel switching and the failure alert.

mod detect;
mod home;
pub mod settings;

use crate::preview::TexturePreviewProvider;
use detect_core::{
    AnalysisBackend, AppConfig, CategoryCatalog, DetectionSession, HttpAnalysisClient,
    RemoteReply, ResultView, TransportError, UploadRequest,
};
use eframe::{App, Frame, egui};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) type Session = DetectionSession<TexturePreviewProvider>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Panel {
    Home,
    Detect,
    Settings,
}

/// Stand-in used when no HTTP client could be built from the configuration.
struct UnavailableBackend(String);

impl AnalysisBackend for UnavailableBackend {
    fn analyze(&self, _request: &UploadRequest) -> Result<RemoteReply, TransportError> {
        Err(TransportError::Io(std::io::Error::other(self.0.clone())))
    }
}

pub struct UiApp {
    ctx: egui::Context,
    config: AppConfig,
    config_path: Option<PathBuf>,
    catalog: CategoryCatalog,
    backend: Arc<dyn AnalysisBackend>,
    panel: Panel,
    session: Option<Session>,
    status: String,
    app_version: &'static str,
    pending_base_url: String,
    pending_timeout_secs: u64,
}

impl UiApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        config_path: Option<PathBuf>,
        startup_status: Option<String>,
    ) -> Self {
        let mut app = Self {
            ctx: cc.egui_ctx.clone(),
            pending_base_url: config.api_base_url.clone(),
            pending_timeout_secs: config.request_timeout_secs.unwrap_or(0),
            catalog: config.catalog(),
            backend: Arc::new(UnavailableBackend("not configured".into())),
            config,
            config_path,
            panel: Panel::Home,
            session: None,
            status: startup_status.unwrap_or_default(),
            app_version: env!("ONCOSCAN_VERSION"),
        };
        app.rebuild_backend();
        app
    }

    /// Recreates the HTTP client from the current configuration.
    pub(crate) fn rebuild_backend(&mut self) {
        self.backend = match HttpAnalysisClient::from_config(&self.config) {
            Ok(client) => {
                tracing::info!("classification service at {}", client.base_url());
                Arc::new(client)
            }
            Err(e) => {
                tracing::error!("cannot use configured service: {e}");
                self.status = format!("Service unavailable: {e}");
                Arc::new(UnavailableBackend(e.to_string()))
            }
        };
    }

    /// Opens a fresh workflow for `category_id`.
    pub(crate) fn open_category(&mut self, category_id: &str) {
        let provider = TexturePreviewProvider::new(self.ctx.clone());
        let mut session =
            DetectionSession::open(&self.catalog, category_id, self.backend.clone(), provider);
        if let DetectionSession::Ready(workflow) = &mut session {
            let ctx = self.ctx.clone();
            workflow.set_waker(Arc::new(move || ctx.request_repaint()));
        }
        self.session = Some(session);
        self.panel = Panel::Detect;
    }

    /// Leaves the detection view; dropping the session releases its preview and
    /// detaches any outstanding request.
    pub(crate) fn go_home(&mut self) {
        self.session = None;
        self.panel = Panel::Home;
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("⚕ OncoScan")
                        .size(22.0)
                        .strong()
                        .color(egui::Color32::from_rgb(37, 99, 235)),
                );
                ui.add_space(24.0);
                if ui.selectable_label(self.panel == Panel::Home, "Home").clicked() {
                    self.go_home();
                }
                if ui
                    .selectable_label(self.panel == Panel::Settings, "Settings")
                    .clicked()
                {
                    self.session = None;
                    self.panel = Panel::Settings;
                }
                if !self.status.is_empty() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(egui::RichText::new(&self.status).weak());
                    });
                }
            });
            ui.add_space(6.0);
        });
    }

    fn render_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new("🛡 Privacy & Security").strong());
                ui.label("Your uploaded images are not stored or shared.");
                ui.separator();
                ui.label(format!("Supported: {}", self.supported_names()));
                ui.separator();
                ui.label(egui::RichText::new(format!("v{}", self.app_version)).weak());
            });
            ui.add_space(6.0);
        });
    }

    fn supported_names(&self) -> String {
        self.catalog
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Failures interrupt: they show as a modal that must be dismissed.
    fn render_failure_alert(&mut self, ctx: &egui::Context) {
        let Some(Session::Ready(workflow)) = self.session.as_mut() else {
            return;
        };
        let ResultView::Alert(message) = workflow.view() else {
            return;
        };
        let response = egui::Modal::new(egui::Id::new("analysis-failure")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("Analysis failed");
            ui.add_space(8.0);
            ui.label(message.as_str());
            ui.add_space(12.0);
            ui.button("OK").clicked()
        });
        if response.inner || response.should_close() {
            workflow.acknowledge_alert();
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if let Some(Session::Ready(workflow)) = self.session.as_mut() {
            workflow.poll();
        }
        if self.panel == Panel::Detect {
            self.handle_file_drag(ctx);
        }

        self.render_header(ctx);
        self.render_footer(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| match self.panel {
                    Panel::Home => self.render_home_panel(ui),
                    Panel::Detect => self.render_detect_panel(ui),
                    Panel::Settings => self.render_settings_panel(ui),
                });
        });
        self.render_failure_alert(ctx);
    }
}
