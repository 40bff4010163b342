//! Application state management for the Snapcal GUI.

use snapcal_core::config::FileConfig;
use snapcal_core::session::ReviewSession;

/// Main application state (domain/persistent)
pub struct AppState {
    /// Configuration from snapcal-core
    pub config: FileConfig,

    /// The review session state machine
    pub session: ReviewSession,

    /// GPU texture for the captured image preview. Replaced on capture and
    /// dropped on reset so old previews do not accumulate.
    pub preview_texture: Option<egui::TextureHandle>,
}

impl AppState {
    pub fn new() -> Self {
        let load = snapcal_core::load_config();

        // Log warnings to console
        for warning in &load.warnings {
            eprintln!("Warning: {warning}");
        }

        Self {
            config: load.config,
            session: ReviewSession::new(),
            preview_texture: None,
        }
    }

    /// Save configuration to disk
    pub fn save_config(&self) -> Result<(), String> {
        snapcal_core::save_config(&self.config).map_err(|e| e.to_string())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
