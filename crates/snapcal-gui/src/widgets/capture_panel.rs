//! Idle-state capture panel: file picker button, drag-and-drop hint, and
//! the retained preview with a re-submit path after a failure.

/// What the capture panel asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    None,
    /// Open the native file picker.
    PickFile,
    /// Re-run extraction on the retained preview.
    Resubmit,
}

pub fn render(
    ui: &mut egui::Ui,
    preview: Option<&egui::TextureHandle>,
) -> CaptureAction {
    let mut action = CaptureAction::None;

    ui.vertical_centered(|ui| {
        ui.add_space(16.0);
        ui.heading("Scan a flyer");
        ui.label("Photograph an event flyer and turn it into calendar entries.");
        ui.add_space(12.0);

        if let Some(texture) = preview {
            let size = scaled_size(texture.size_vec2(), ui.available_width() - 32.0, 260.0);
            ui.image((texture.id(), size));
            ui.add_space(8.0);
            if ui
                .add_sized([220.0, 40.0], egui::Button::new("Extract events again"))
                .clicked()
            {
                action = CaptureAction::Resubmit;
            }
            ui.add_space(4.0);
            if ui.button("Choose a different image…").clicked() {
                action = CaptureAction::PickFile;
            }
        } else {
            let pick = egui::Button::new(egui::RichText::new("📷 Choose image…").size(18.0));
            if ui.add_sized([240.0, 56.0], pick).clicked() {
                action = CaptureAction::PickFile;
            }
            ui.add_space(8.0);
            ui.label(egui::RichText::new("or drop an image file anywhere in this window").weak());
        }
    });

    action
}

fn scaled_size(original: egui::Vec2, max_width: f32, max_height: f32) -> egui::Vec2 {
    if original.x <= 0.0 || original.y <= 0.0 {
        return egui::vec2(max_width, max_height);
    }
    let scale = (max_width / original.x).min(max_height / original.y).min(1.0);
    original * scale
}
