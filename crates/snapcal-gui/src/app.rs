//! Main application structure for the Snapcal GUI

use std::time::{Duration, Instant};

use chrono::Local;

use snapcal_core::ThemePreference;
use snapcal_core::session::{CapturedImage, SessionPhase};

use crate::async_bridge::{AsyncBridge, ExtractionOutcome};
use crate::processor;
use crate::state::AppState;
use crate::ui_state::{LogEntry, LogLevel, UiState};
use crate::widgets;
use crate::widgets::capture_panel::CaptureAction;
use crate::widgets::event_form::EventEditState;
use crate::widgets::review_stack::ReviewAction;

/// How long the saved acknowledgment stays on a committed card before it is
/// removed from the stack.
const COMMIT_ACK_DELAY: Duration = Duration::from_millis(900);

/// Main application struct implementing eframe::App
pub struct SnapcalApp {
    /// Domain state
    state: AppState,

    /// UI state
    ui_state: UiState,

    /// Async runtime bridge
    async_bridge: AsyncBridge,

    /// Edit buffers for the front review card
    edit: EventEditState,

    /// When set, the front card is showing its saved flash; the card is
    /// removed once this deadline passes.
    commit_deadline: Option<Instant>,

    /// Last config save time
    last_save: Instant,

    /// Config dirty flag
    config_dirty: bool,
}

impl SnapcalApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            state: AppState::new(),
            ui_state: UiState::new(),
            async_bridge: AsyncBridge::new(),
            edit: EventEditState::default(),
            commit_deadline: None,
            last_save: Instant::now(),
            config_dirty: false,
        };
        app.ui_state.technical_log_expanded = app.state.config.ui.show_technical_log;
        app.add_log(LogLevel::Info, "Application started");
        app
    }

    fn add_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.ui_state.add_log_entry(LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        });
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        let visuals = match self.state.config.ui.theme {
            ThemePreference::Light => egui::Visuals::light(),
            ThemePreference::Dark | ThemePreference::System => egui::Visuals::dark(),
        };
        ctx.set_visuals(visuals);
    }

    /// Auto-save configuration if dirty and enough time has passed
    fn handle_auto_save(&mut self) {
        if self.config_dirty && self.last_save.elapsed() > Duration::from_millis(300) {
            if let Err(e) = self.state.save_config() {
                self.add_log(LogLevel::Error, format!("Failed to save config: {e}"));
            } else {
                self.config_dirty = false;
            }
            self.last_save = Instant::now();
        }
    }

    fn mark_dirty(&mut self) {
        self.config_dirty = true;
    }

    fn handle_outcome(&mut self, outcome: ExtractionOutcome) {
        match outcome.result {
            Ok(candidates) => {
                let count = candidates.len();
                self.state
                    .session
                    .extraction_succeeded(outcome.generation, candidates);
                if self.state.session.phase() == SessionPhase::Review {
                    self.edit.clear();
                    self.add_log(LogLevel::Info, format!("Extracted {count} event(s)"));
                }
            }
            Err(message) => {
                self.add_log(LogLevel::Error, format!("Extraction failed: {message}"));
                self.state
                    .session
                    .extraction_failed(outcome.generation, message);
            }
        }
    }

    /// Load image bytes as the new capture and start extraction.
    fn capture_bytes(&mut self, ctx: &egui::Context, bytes: Vec<u8>, mime_type: String) {
        let decoded = match image::load_from_memory(&bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.add_log(LogLevel::Error, format!("Could not read image: {err}"));
                return;
            }
        };

        let rgba = decoded.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        // Replacing the handle drops the previous preview texture.
        self.state.preview_texture =
            Some(ctx.load_texture("flyer-preview", color_image, Default::default()));

        let Some(generation) = self.state.session.capture(CapturedImage { bytes, mime_type })
        else {
            return;
        };
        self.start_extraction(generation);
    }

    fn start_extraction(&mut self, generation: u64) {
        let Some(preview) = self.state.session.preview() else {
            return;
        };
        match processor::start_extraction(
            &self.async_bridge,
            &self.state.config.runtime,
            generation,
            preview,
        ) {
            Ok(rx) => {
                self.async_bridge.register_outcome_receiver(rx);
                self.add_log(LogLevel::Info, "Extraction started");
            }
            Err(message) => {
                self.add_log(LogLevel::Error, format!("Cannot start extraction: {message}"));
                self.state.session.extraction_failed(generation, message);
            }
        }
    }

    fn pick_file(&mut self, ctx: &egui::Context) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "gif"])
            .pick_file();
        if let Some(path) = picked {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let mime = mime_for_extension(&path);
                    self.capture_bytes(ctx, bytes, mime);
                }
                Err(err) => {
                    self.add_log(
                        LogLevel::Error,
                        format!("Could not read {}: {err}", path.display()),
                    );
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        if self.state.session.phase() != SessionPhase::Idle {
            return;
        }
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(path) = file.path {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let mime = mime_for_extension(&path);
                    self.capture_bytes(ctx, bytes, mime);
                }
                Err(err) => self.add_log(
                    LogLevel::Error,
                    format!("Could not read dropped file: {err}"),
                ),
            }
        } else if let Some(bytes) = file.bytes {
            self.capture_bytes(ctx, bytes.to_vec(), "image/png".to_string());
        }
    }

    fn drive_pending_commit(&mut self) {
        if let Some(deadline) = self.commit_deadline {
            if Instant::now() >= deadline {
                self.state.session.finish_commit();
                self.edit.clear();
                self.commit_deadline = None;
            }
        }
    }

    fn reset_session(&mut self) {
        self.state.session.reset();
        self.state.preview_texture = None;
        self.edit.clear();
        self.commit_deadline = None;
    }

    fn render_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Snapcal");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = match self.state.config.ui.theme {
                        ThemePreference::Light => "🌙 Dark",
                        _ => "☀ Light",
                    };
                    if ui.button(theme_label).clicked() {
                        self.state.config.ui.theme = match self.state.config.ui.theme {
                            ThemePreference::Light => ThemePreference::Dark,
                            _ => ThemePreference::Light,
                        };
                        self.mark_dirty();
                    }
                    if ui.button("⚙").clicked() {
                        self.ui_state.settings_expanded = !self.ui_state.settings_expanded;
                    }
                    if self.state.session.phase() != SessionPhase::Idle
                        && ui.button("Start over").clicked()
                    {
                        self.reset_session();
                    }
                });
            });
        });
    }

    fn render_main_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if self.ui_state.settings_expanded {
                    ui.group(|ui| {
                        ui.set_min_width(ui.available_width());
                        ui.heading("Settings");
                        if widgets::api_key_section::render(
                            ui,
                            &mut self.state,
                            &mut self.ui_state,
                        ) {
                            self.mark_dirty();
                        }
                    });
                    ui.add_space(8.0);
                }

                match self.state.session.phase() {
                    SessionPhase::Idle => {
                        let action = widgets::capture_panel::render(
                            ui,
                            self.state.preview_texture.as_ref(),
                        );
                        match action {
                            CaptureAction::PickFile => self.pick_file(ctx),
                            CaptureAction::Resubmit => {
                                if let Some(generation) = self.state.session.resubmit() {
                                    self.start_extraction(generation);
                                }
                            }
                            CaptureAction::None => {}
                        }
                    }
                    SessionPhase::Processing => {
                        widgets::progress_display::render(
                            ui,
                            self.state.preview_texture.as_ref(),
                        );
                    }
                    SessionPhase::Review => {
                        let action = widgets::review_stack::render(
                            ui,
                            &mut self.state.session,
                            &mut self.edit,
                        );
                        match action {
                            ReviewAction::Commit => {
                                if let Some(url) = self.state.session.begin_commit() {
                                    if let Err(err) = open::that(&url) {
                                        self.add_log(
                                            LogLevel::Warning,
                                            format!("Could not open browser: {err}"),
                                        );
                                    }
                                    self.commit_deadline = Some(Instant::now() + COMMIT_ACK_DELAY);
                                }
                            }
                            ReviewAction::Skip => {
                                if self.state.session.discard() {
                                    self.edit.clear();
                                }
                            }
                            ReviewAction::Reset => self.reset_session(),
                            ReviewAction::None => {}
                        }
                    }
                    SessionPhase::Failed => {
                        self.render_error(ui);
                    }
                }

                ui.add_space(12.0);

                let log_response = egui::CollapsingHeader::new("Technical Log")
                    .default_open(self.ui_state.technical_log_expanded)
                    .show(ui, |ui| {
                        widgets::technical_log::render(ui, &mut self.ui_state);
                    });
                if log_response.header_response.clicked() {
                    self.ui_state.technical_log_expanded = !self.ui_state.technical_log_expanded;
                    self.state.config.ui.show_technical_log =
                        self.ui_state.technical_log_expanded;
                    self.mark_dirty();
                }
            });
    }

    fn render_error(&mut self, ui: &mut egui::Ui) {
        let message = self
            .state
            .session
            .error_message()
            .unwrap_or("Something went wrong.")
            .to_string();
        ui.vertical_centered(|ui| {
            ui.add_space(32.0);
            ui.label(
                egui::RichText::new("⚠ Extraction failed")
                    .size(18.0)
                    .color(egui::Color32::from_rgb(220, 60, 60)),
            );
            ui.add_space(8.0);
            ui.label(message);
            ui.add_space(16.0);
            if ui
                .add_sized([160.0, 40.0], egui::Button::new("Try again"))
                .clicked()
            {
                self.state.session.try_again();
            }
        });
    }
}

impl eframe::App for SnapcalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);

        // Collect first to avoid borrowing self inside the closure.
        let mut outcomes = Vec::new();
        self.async_bridge.poll_outcomes(|outcome| {
            outcomes.push(outcome);
        });
        for outcome in outcomes {
            self.handle_outcome(outcome);
        }

        self.handle_dropped_files(ctx);
        self.drive_pending_commit();

        // Keep repainting so the spinner and the commit timer stay live.
        ctx.request_repaint();

        self.render_top_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_main_ui(ctx, ui);
        });

        self.handle_auto_save();
    }
}

fn mime_for_extension(path: &std::path::Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
    .to_string()
}
