//! Detection view for one category: upload area, analysis button and verdict.

use super::{Session, UiApp};
use crate::preview::{TexturePreviewProvider, descriptor_from_dropped};
use detect_core::{
    DetectionWorkflow, FileDescriptor, ResultView, Tone, VerdictView, format_size_mb,
};
use eframe::egui;
use rfd::FileDialog;

/// Extensions offered by the picker. A hint only; any file can still be dropped.
const IMAGE_EXTENSIONS: [&str; 9] = [
    "png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff", "dcm",
];

const ACCENT: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectAction {
    PickFile,
    Submit,
    Reset,
    ChangeCategory,
}

impl UiApp {
    /// Maps OS drag-and-drop input onto the workflow's drag events.
    pub(super) fn handle_file_drag(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(Session::Ready(workflow)) = self.session.as_mut() else {
            return;
        };

        match (workflow.drag_active(), hovering) {
            (false, true) => workflow.drag_enter(),
            (true, true) => workflow.drag_over(),
            (true, false) if dropped.is_empty() => workflow.drag_leave(),
            _ => {}
        }

        if !dropped.is_empty() {
            if dropped.len() > 1 {
                tracing::debug!("{} files dropped; only the first is used", dropped.len());
            }
            let files = dropped
                .iter()
                .filter_map(|file| match descriptor_from_dropped(file) {
                    Ok(descriptor) => Some(descriptor),
                    Err(e) => {
                        tracing::warn!("skipping dropped file {}: {e:#}", file.name);
                        None
                    }
                });
            if workflow.drop_files(files) {
                self.status.clear();
            }
        }
    }

    pub(super) fn render_detect_panel(&mut self, ui: &mut egui::Ui) {
        let mut actions = Vec::new();
        match &self.session {
            Some(Session::Ready(workflow)) => render_workflow(ui, workflow, &mut actions),
            Some(Session::NotFound { requested }) => {
                back_link(ui, &mut actions);
                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Cancer type not found");
                    ui.label(format!("There is no category with id \"{requested}\"."));
                });
            }
            None => back_link(ui, &mut actions),
        }
        for action in actions {
            self.apply_detect_action(action);
        }
    }

    fn apply_detect_action(&mut self, action: DetectAction) {
        match action {
            DetectAction::PickFile => {
                let Some(path) = FileDialog::new()
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file()
                else {
                    return;
                };
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match FileDescriptor::from_path(&path) {
                    Ok(file) => match session.select_file(file) {
                        Ok(()) => self.status.clear(),
                        Err(e) => self.status = e.to_string(),
                    },
                    Err(e) => {
                        tracing::warn!("{e:#}");
                        self.status = format!("Could not open {}", path.display());
                    }
                }
            }
            DetectAction::Submit => {
                if let Some(session) = self.session.as_mut()
                    && let Err(e) = session.submit()
                {
                    self.status = e.to_string();
                }
            }
            DetectAction::Reset => {
                if let Some(Session::Ready(workflow)) = self.session.as_mut() {
                    workflow.reset();
                }
            }
            DetectAction::ChangeCategory => self.go_home(),
        }
    }
}

fn back_link(ui: &mut egui::Ui, actions: &mut Vec<DetectAction>) {
    if ui.link("← Back to Cancer Types").clicked() {
        actions.push(DetectAction::ChangeCategory);
    }
}

fn card<R>(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui) -> R) -> R {
    egui::Frame::group(ui.style())
        .corner_radius(10.0)
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui)
        })
        .inner
}

fn render_workflow(
    ui: &mut egui::Ui,
    workflow: &DetectionWorkflow<TexturePreviewProvider>,
    actions: &mut Vec<DetectAction>,
) {
    back_link(ui, actions);
    ui.add_space(8.0);

    let category = workflow.category();
    let [r, g, b] = workflow.style().color;
    card(ui, |ui| {
        ui.horizontal(|ui| {
            egui::Frame::new()
                .fill(egui::Color32::from_rgb(r, g, b))
                .corner_radius(10.0)
                .inner_margin(egui::Margin::same(12))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(workflow.style().icon.glyph())
                            .size(30.0)
                            .color(egui::Color32::WHITE),
                    );
                });
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(&category.name).size(22.0).strong());
                ui.label(category.description.as_str());
            });
        });
    });
    ui.add_space(12.0);

    card(ui, |ui| {
        ui.vertical_centered(|ui| {
            ui.heading("Upload Medical Image");
        });
        ui.add_space(8.0);
        match workflow.staged() {
            None => render_drop_zone(ui, workflow.drag_active(), actions),
            Some(staged) => {
                let file = staged.file();
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("🖼").size(24.0).color(ACCENT));
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(&file.name).strong());
                        ui.label(egui::RichText::new(format_size_mb(file.size_bytes)).weak());
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✖").on_hover_text("Remove file").clicked() {
                            actions.push(DetectAction::Reset);
                        }
                    });
                });
                if let Some(texture) = staged.preview() {
                    ui.add_space(8.0);
                    ui.vertical_centered(|ui| {
                        ui.add(
                            egui::Image::from_texture(egui::load::SizedTexture::from_handle(
                                texture,
                            ))
                            .max_height(256.0),
                        );
                    });
                }
                ui.add_space(8.0);
                render_analyze_button(ui, workflow, actions);
            }
        }
    });

    if let ResultView::Verdict(verdict) = workflow.view() {
        ui.add_space(12.0);
        card(ui, |ui| render_verdict(ui, &verdict, actions));
    }
}

fn render_drop_zone(ui: &mut egui::Ui, drag_active: bool, actions: &mut Vec<DetectAction>) {
    let (stroke, fill) = if drag_active {
        (
            egui::Color32::from_rgb(59, 130, 246),
            egui::Color32::from_rgb(239, 246, 255),
        )
    } else {
        (egui::Color32::from_gray(209), egui::Color32::TRANSPARENT)
    };
    egui::Frame::new()
        .stroke(egui::Stroke::new(2.0, stroke))
        .fill(fill)
        .corner_radius(10.0)
        .inner_margin(egui::Margin::same(24))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("⬆").size(36.0).weak());
                ui.label(egui::RichText::new("Please upload your MRI images").size(16.0));
                ui.label(egui::RichText::new("Drag and drop a file here, or").weak());
                ui.add_space(6.0);
                let choose = egui::Button::new(
                    egui::RichText::new("Choose File").color(egui::Color32::WHITE),
                )
                .fill(ACCENT);
                if ui.add(choose).clicked() {
                    actions.push(DetectAction::PickFile);
                }
            });
        });
}

fn render_analyze_button(
    ui: &mut egui::Ui,
    workflow: &DetectionWorkflow<TexturePreviewProvider>,
    actions: &mut Vec<DetectAction>,
) {
    if matches!(workflow.view(), ResultView::Progress) {
        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Analyzing Image...");
            });
        });
        return;
    }
    let button = egui::Button::new(
        egui::RichText::new("Start AI Analysis")
            .strong()
            .color(egui::Color32::WHITE),
    )
    .fill(ACCENT)
    .min_size(egui::vec2(ui.available_width(), 36.0));
    if ui.add_enabled(workflow.can_submit(), button).clicked() {
        actions.push(DetectAction::Submit);
    }
}

fn render_verdict(ui: &mut egui::Ui, verdict: &VerdictView, actions: &mut Vec<DetectAction>) {
    ui.heading("Analysis Results");
    ui.add_space(8.0);
    let (icon, fill, stroke, text) = match verdict.tone {
        Tone::Alarm => (
            "⚠",
            egui::Color32::from_rgb(254, 242, 242),
            egui::Color32::from_rgb(254, 202, 202),
            egui::Color32::from_rgb(127, 29, 29),
        ),
        Tone::Clear => (
            "✔",
            egui::Color32::from_rgb(240, 253, 244),
            egui::Color32::from_rgb(187, 247, 208),
            egui::Color32::from_rgb(20, 83, 45),
        ),
    };
    egui::Frame::new()
        .fill(fill)
        .stroke(egui::Stroke::new(2.0, stroke))
        .corner_radius(10.0)
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(icon).size(30.0).color(text));
                ui.vertical(|ui| {
                    ui.label(
                        egui::RichText::new(verdict.headline)
                            .size(18.0)
                            .strong()
                            .color(text),
                    );
                    ui.label(verdict.details.as_str());
                    ui.label(egui::RichText::new(&verdict.confidence_line).weak());
                });
            });
        });
    ui.add_space(12.0);
    ui.horizontal(|ui| {
        if ui.button("Analyze Another Image").clicked() {
            actions.push(DetectAction::Reset);
        }
        if ui.button("Try Different Cancer Type").clicked() {
            actions.push(DetectAction::ChangeCategory);
        }
    });
}
