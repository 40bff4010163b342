//! Processing-state view: the captured image with a spinner on top.

pub fn render(ui: &mut egui::Ui, preview: Option<&egui::TextureHandle>) {
    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        if let Some(texture) = preview {
            let original = texture.size_vec2();
            let scale = ((ui.available_width() - 32.0) / original.x)
                .min(240.0 / original.y)
                .min(1.0);
            ui.image((texture.id(), original * scale));
            ui.add_space(12.0);
        }
        ui.spinner();
        ui.add_space(8.0);
        ui.label(egui::RichText::new("Reading your flyer…").size(16.0));
        ui.label(
            egui::RichText::new("This usually takes a few seconds.")
                .weak()
                .small(),
        );
    });
}
