//! The review card stack: one editable front card, up to two dimmed cards
//! behind it for depth, and the terminal "all processed" view.

use snapcal_core::datetime;
use snapcal_core::session::ReviewSession;

use crate::widgets::event_form::{self, EventEditState};

/// What the user asked the stack to do this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    None,
    /// Open the front card's deep link and start the saved acknowledgment.
    Commit,
    /// Drop the front card without saving.
    Skip,
    /// Leave the terminal view and start over.
    Reset,
}

pub fn render(
    ui: &mut egui::Ui,
    session: &mut ReviewSession,
    edit: &mut EventEditState,
) -> ReviewAction {
    if session.all_processed() {
        return render_terminal(ui);
    }

    let mut action = ReviewAction::None;
    let queue: Vec<usize> = session.queue().collect();

    ui.label(format!(
        "{} event{} left to review",
        queue.len(),
        if queue.len() == 1 { "" } else { "s" }
    ));
    ui.add_space(6.0);

    // Dimmed depth cards, deepest first so the front card lands on top.
    for &index in queue.iter().take(3).skip(1).rev() {
        if let Some(candidate) = session.candidate(index) {
            let title = candidate.title.clone();
            let when = datetime::to_local_input(&candidate.start_date_time);
            // Disabled so the depth cards can never take input.
            ui.add_enabled_ui(false, |ui| {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.label(egui::RichText::new(title).weak());
                    if !when.is_empty() {
                        ui.label(egui::RichText::new(when).weak().small());
                    }
                });
            });
            ui.add_space(2.0);
        }
    }

    // Front card.
    if let Some(&front_index) = queue.first() {
        let committing = session.is_committing();
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_width(ui.available_width());

            if committing {
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    ui.label(
                        egui::RichText::new("✔ Saved")
                            .size(22.0)
                            .color(egui::Color32::from_rgb(0, 160, 60)),
                    );
                    ui.add_space(24.0);
                });
                return;
            }

            if let Some(candidate) = session.front_mut() {
                edit.sync_to(front_index, candidate);
                event_form::render(ui, edit, candidate);
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let half = (ui.available_width() - 8.0) / 2.0;
                if ui
                    .add_sized([half, 36.0], egui::Button::new("Skip"))
                    .clicked()
                {
                    action = ReviewAction::Skip;
                }
                let commit_button = egui::Button::new(
                    egui::RichText::new("Add to Calendar").color(egui::Color32::WHITE),
                )
                .fill(egui::Color32::from_rgb(0, 120, 200));
                if ui.add_sized([half, 36.0], commit_button).clicked() {
                    action = ReviewAction::Commit;
                }
            });
        });
    }

    action
}

fn render_terminal(ui: &mut egui::Ui) -> ReviewAction {
    let mut action = ReviewAction::None;
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading("All events processed");
        ui.label("Every extracted event has been saved or skipped.");
        ui.add_space(16.0);
        if ui
            .add_sized([200.0, 40.0], egui::Button::new("Scan another flyer"))
            .clicked()
        {
            action = ReviewAction::Reset;
        }
    });
    action
}
