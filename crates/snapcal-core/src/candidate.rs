use serde::{Deserialize, Serialize};

/// Title substituted when the model returns no usable title for an event.
pub const DEFAULT_TITLE: &str = "Untitled Event";

/// One extracted, editable, not-yet-committed event record.
///
/// Timestamps are RFC 3339 instant strings; an empty string means unset.
/// `recurrence` holds an `RRULE:FREQ=<UNIT>;INTERVAL=<N>` string, or is
/// empty for a non-recurring event. Field names on the wire match the
/// JSON contract spoken by the vision model (camelCase).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCandidate {
    pub title: String,
    #[serde(default)]
    pub start_date_time: String,
    #[serde(default)]
    pub end_date_time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recurrence: String,
}

impl EventCandidate {
    /// True when both timestamps are unset.
    pub fn is_undated(&self) -> bool {
        self.start_date_time.is_empty() && self.end_date_time.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let candidate = EventCandidate {
            title: "Standup".to_string(),
            start_date_time: "2025-06-02T09:00:00+00:00".to_string(),
            ..EventCandidate::default()
        };

        let json = serde_json::to_string(&candidate).expect("serialize");
        assert!(json.contains("\"startDateTime\""));
        assert!(json.contains("\"endDateTime\""));
        assert!(!json.contains("start_date_time"));
    }

    #[test]
    fn test_missing_wire_fields_default_to_empty() {
        let candidate: EventCandidate =
            serde_json::from_str("{\"title\":\"Picnic\"}").expect("deserialize");
        assert_eq!(candidate.title, "Picnic");
        assert!(candidate.start_date_time.is_empty());
        assert!(candidate.recurrence.is_empty());
    }
}
