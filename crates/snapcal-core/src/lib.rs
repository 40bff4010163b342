//! Core library crate exposing shared Snapcal extraction and review logic.

pub mod candidate;
pub mod config;
pub mod datetime;
pub mod extract;
pub mod gcal;
pub mod logging;
pub mod normalize;
pub mod secret_store;
pub mod session;

pub use candidate::{DEFAULT_TITLE, EventCandidate};
pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, RuntimePreferences, SecretValue,
    ThemePreference, TransportMode, UiPreferences, config_directory, config_path, load_config,
    save_config,
};
pub use extract::{
    DirectTransport, ExtractError, Extractor, ImagePayload, RelayTransport, SubmitExtraction,
    Transport, build_prompt,
};
pub use normalize::normalize;
pub use session::{CapturedImage, ReviewSession, SessionPhase};
