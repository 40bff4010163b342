//! Edit form for the front review card.
//!
//! The form edits a local buffer (`EventEditState`) holding the input-field
//! representations of one candidate, and writes every change straight back
//! to the canonical candidate so edits survive queue operations.

use snapcal_core::EventCandidate;
use snapcal_core::datetime::{self, RecurrenceUnit};

/// Input-field representation of the candidate currently at the front.
pub struct EventEditState {
    /// Candidate index the buffers were loaded from.
    index: Option<usize>,
    pub title: String,
    pub location: String,
    pub description: String,
    pub all_day: bool,
    pub start_input: String,
    pub end_input: String,
    pub repeats: bool,
    pub unit: RecurrenceUnit,
    pub interval: u32,
}

impl Default for EventEditState {
    fn default() -> Self {
        Self {
            index: None,
            title: String::new(),
            location: String::new(),
            description: String::new(),
            all_day: false,
            start_input: String::new(),
            end_input: String::new(),
            repeats: false,
            unit: RecurrenceUnit::Weekly,
            interval: 1,
        }
    }
}

impl EventEditState {
    /// Reload the buffers when a different candidate reaches the front.
    pub fn sync_to(&mut self, index: usize, candidate: &EventCandidate) {
        if self.index == Some(index) {
            return;
        }
        self.index = Some(index);
        self.title = candidate.title.clone();
        self.location = candidate.location.clone();
        self.description = candidate.description.clone();
        self.all_day = false;
        self.start_input = datetime::to_local_input(&candidate.start_date_time);
        self.end_input = datetime::to_local_input(&candidate.end_date_time);
        match datetime::parse_rule(&candidate.recurrence) {
            Some(rule) => {
                self.repeats = true;
                self.unit = rule.unit;
                self.interval = rule.interval;
            }
            None => {
                self.repeats = false;
                // unit/interval keep their previous values as the editor default
            }
        }
    }

    /// Forget the loaded candidate (batch replaced or session reset).
    pub fn clear(&mut self) {
        self.index = None;
    }

    /// Write the buffers back to the canonical candidate.
    fn store(&self, candidate: &mut EventCandidate) {
        candidate.title = self.title.clone();
        candidate.location = self.location.clone();
        candidate.description = self.description.clone();
        candidate.start_date_time = datetime::from_local_input(&self.start_input);
        candidate.end_date_time = datetime::from_local_input(&self.end_input);
        candidate.recurrence = if self.repeats {
            datetime::build_rule(self.unit, self.interval)
        } else {
            String::new()
        };
    }
}

/// Render the form. Returns true when the candidate was modified.
pub fn render(
    ui: &mut egui::Ui,
    edit: &mut EventEditState,
    candidate: &mut EventCandidate,
) -> bool {
    let mut changed = false;

    egui::Grid::new("event_form_grid")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Title");
            changed |= ui.text_edit_singleline(&mut edit.title).changed();
            ui.end_row();

            ui.label("Location");
            changed |= ui.text_edit_singleline(&mut edit.location).changed();
            ui.end_row();

            ui.label("Details");
            changed |= ui.text_edit_multiline(&mut edit.description).changed();
            ui.end_row();
        });

    ui.add_space(4.0);

    if ui.checkbox(&mut edit.all_day, "All-day event").changed() {
        if edit.all_day {
            // Truncate the inputs to their date part.
            edit.start_input = truncate_to_date(&edit.start_input);
            edit.end_input = truncate_to_date(&edit.end_input);
        } else if !edit.start_input.is_empty() && !edit.start_input.contains('T') {
            edit.start_input.push_str("T09:00");
            if !edit.end_input.is_empty() && !edit.end_input.contains('T') {
                edit.end_input.push_str("T10:00");
            }
        }
        changed = true;
    }

    let (start_hint, end_hint) = if edit.all_day {
        ("YYYY-MM-DD", "YYYY-MM-DD")
    } else {
        ("YYYY-MM-DDTHH:MM", "YYYY-MM-DDTHH:MM")
    };

    egui::Grid::new("event_form_dates")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Starts");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut edit.start_input).hint_text(start_hint))
                .changed();
            ui.end_row();

            ui.label("Ends");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut edit.end_input).hint_text(end_hint))
                .changed();
            ui.end_row();
        });

    ui.add_space(4.0);

    ui.horizontal(|ui| {
        changed |= ui.checkbox(&mut edit.repeats, "Repeats").changed();
        if edit.repeats {
            ui.label("every");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut edit.interval)
                        .range(1..=datetime::MAX_RULE_INTERVAL),
                )
                .changed();
            egui::ComboBox::from_id_salt("recurrence_unit")
                .selected_text(edit.unit.noun())
                .show_ui(ui, |ui| {
                    for unit in RecurrenceUnit::ALL {
                        changed |= ui
                            .selectable_value(&mut edit.unit, unit, unit.noun())
                            .changed();
                    }
                });
        }
    });

    if changed {
        edit.store(candidate);
    }
    changed
}

fn truncate_to_date(input: &str) -> String {
    match input.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => input.to_string(),
    }
}
