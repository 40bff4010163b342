//! Scrollable technical log with level coloring.

use crate::ui_state::{LogLevel, UiState};

pub fn render(ui: &mut egui::Ui, ui_state: &mut UiState) {
    egui::ScrollArea::vertical()
        .max_height(160.0)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in &ui_state.technical_log {
                let color = match entry.level {
                    LogLevel::Info => ui.visuals().text_color(),
                    LogLevel::Warning => egui::Color32::from_rgb(220, 160, 0),
                    LogLevel::Error => egui::Color32::from_rgb(220, 60, 60),
                };
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&entry.timestamp).weak().monospace());
                    ui.label(egui::RichText::new(&entry.message).color(color));
                });
            }
            if ui_state.technical_log.is_empty() {
                ui.label(egui::RichText::new("No log entries yet.").weak());
            }
        });
}
