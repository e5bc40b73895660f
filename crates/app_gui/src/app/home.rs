//! Category overview rendering.

use super::UiApp;
use eframe::egui;

const TILE_WIDTH: f32 = 220.0;

const FEATURES: [(&str, &str, &str); 3] = [
    (
        "⚡",
        "Fast Analysis",
        "Get results in seconds with our optimized AI models",
    ),
    (
        "🎯",
        "High Accuracy",
        "Advanced deep learning models trained on medical data",
    ),
    (
        "📄",
        "Detailed Reports",
        "Comprehensive analysis with confidence scores",
    ),
];

fn tile_color([r, g, b]: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(r, g, b)
}

impl UiApp {
    /// Renders the hero text, one clickable tile per category and the feature blurbs.
    pub(super) fn render_home_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("AI-Powered Cancer Detection")
                    .size(32.0)
                    .strong(),
            );
            ui.add_space(8.0);
            ui.label(format!(
                "Upload medical images for instant analysis across {} different cancer types.",
                self.catalog.len()
            ));
            ui.label("Choose a cancer type below to begin analysis.");
        });
        ui.add_space(20.0);

        let mut chosen: Option<String> = None;
        ui.horizontal_wrapped(|ui| {
            for category in self.catalog.iter() {
                let style = self.catalog.style_for(&category.id);
                let tile = egui::Frame::group(ui.style())
                    .corner_radius(10.0)
                    .inner_margin(egui::Margin::same(12))
                    .show(ui, |ui| {
                        ui.set_width(TILE_WIDTH);
                        egui::Frame::new()
                            .fill(tile_color(style.color))
                            .corner_radius(8.0)
                            .inner_margin(egui::Margin::same(10))
                            .show(ui, |ui| {
                                ui.label(
                                    egui::RichText::new(style.icon.glyph())
                                        .size(28.0)
                                        .color(egui::Color32::WHITE),
                                );
                            });
                        ui.add_space(6.0);
                        ui.label(egui::RichText::new(&category.name).strong().size(16.0));
                        ui.label(egui::RichText::new(&category.description).weak());
                        ui.add_space(4.0);
                        ui.label(
                            egui::RichText::new("Start Analysis →")
                                .color(egui::Color32::from_rgb(37, 99, 235)),
                        );
                    });
                let response = tile
                    .response
                    .interact(egui::Sense::click())
                    .on_hover_cursor(egui::CursorIcon::PointingHand);
                if response.clicked() {
                    chosen = Some(category.id.clone());
                }
            }
        });

        ui.add_space(28.0);
        ui.separator();
        ui.vertical_centered(|ui| {
            ui.heading("Why Choose Our Platform?");
        });
        ui.add_space(8.0);
        ui.columns(FEATURES.len(), |cols| {
            for (col, (icon, title, blurb)) in cols.iter_mut().zip(FEATURES) {
                col.vertical_centered(|ui| {
                    ui.label(egui::RichText::new(icon).size(26.0));
                    ui.label(egui::RichText::new(title).strong());
                    ui.label(blurb);
                });
            }
        });

        if let Some(id) = chosen {
            self.open_category(&id);
        }
    }
}
