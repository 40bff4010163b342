//! Snapcal GUI module using eframe/egui.
//!
//! Capture a flyer photo, watch the extraction run, then walk the review
//! card stack committing or skipping each event.

pub mod app;
pub mod async_bridge;
pub mod processor;
pub mod state;
pub mod ui_state;
pub mod widgets;

/// Main entry point for the GUI
pub fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 780.0])
            .with_min_inner_size([420.0, 640.0])
            .with_resizable(true)
            .with_title("Snapcal"),
        ..Default::default()
    };

    eframe::run_native(
        "Snapcal",
        native_options,
        Box::new(|cc| Ok(Box::new(app::SnapcalApp::new(cc)))),
    )
    .map_err(|e| format!("{e:?}"))
    .map_err(|e| {
        Box::new(std::io::Error::other(e)) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(())
}
