//! UI widgets for the Snapcal GUI

pub mod api_key_section;
pub mod capture_panel;
pub mod event_form;
pub mod progress_display;
pub mod review_stack;
pub mod technical_log;
