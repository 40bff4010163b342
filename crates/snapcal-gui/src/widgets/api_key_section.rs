//! Settings: transport mode, relay URL, model id, and API key management.

use snapcal_core::TransportMode;

use crate::state::AppState;
use crate::ui_state::{LogEntry, LogLevel, UiState};

/// Render the settings section. Returns true when the config changed and
/// should be persisted.
pub fn render(ui: &mut egui::Ui, state: &mut AppState, ui_state: &mut UiState) -> bool {
    let mut dirty = false;
    let runtime = &mut state.config.runtime;

    ui.horizontal(|ui| {
        ui.label("Extraction via");
        if ui
            .selectable_value(&mut runtime.transport, TransportMode::Direct, "Direct")
            .changed()
        {
            dirty = true;
        }
        if ui
            .selectable_value(&mut runtime.transport, TransportMode::Relay, "Relay")
            .changed()
        {
            dirty = true;
        }
    });

    match runtime.transport {
        TransportMode::Relay => {
            ui.horizontal(|ui| {
                ui.label("Relay URL");
                dirty |= ui.text_edit_singleline(&mut runtime.relay_url).changed();
            });
        }
        TransportMode::Direct => {
            ui.horizontal(|ui| {
                ui.label("Model");
                let mut model = runtime.model.clone().unwrap_or_default();
                if ui
                    .add(
                        egui::TextEdit::singleline(&mut model)
                            .hint_text(snapcal_core::config::DEFAULT_MODEL),
                    )
                    .changed()
                {
                    runtime.model = if model.trim().is_empty() {
                        None
                    } else {
                        Some(model)
                    };
                    dirty = true;
                }
            });

            ui.horizontal(|ui| {
                ui.label("API key");
                ui.add(
                    egui::TextEdit::singleline(&mut ui_state.api_key_input)
                        .password(true)
                        .hint_text(if runtime.has_api_key() {
                            "stored — enter to replace"
                        } else {
                            "not configured"
                        }),
                );
                if ui.button("Save").clicked() && !ui_state.api_key_input.trim().is_empty() {
                    match runtime.set_api_key(&ui_state.api_key_input) {
                        Ok(()) => {
                            ui_state.api_key_input.clear();
                            ui_state.add_log_entry(LogEntry {
                                timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
                                level: LogLevel::Info,
                                message: "API key stored".to_string(),
                            });
                            dirty = true;
                        }
                        Err(err) => {
                            ui_state.add_log_entry(LogEntry {
                                timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
                                level: LogLevel::Error,
                                message: format!("Failed to store API key: {err}"),
                            });
                        }
                    }
                }
                if runtime.has_api_key() && ui.button("Clear").clicked() {
                    if let Err(err) = runtime.clear_api_key() {
                        ui_state.add_log_entry(LogEntry {
                            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
                            level: LogLevel::Warning,
                            message: format!("Failed to clear API key: {err}"),
                        });
                    }
                    dirty = true;
                }
            });
        }
    }

    dirty
}
