//! Recovery of structured event candidates from free-form model text.
//!
//! The model response is adversarial from this module's point of view: it
//! may wrap the JSON in markdown fences, preface it with prose, emit a bare
//! object instead of a one-element array, or mistype individual fields. The
//! normalizer is maximally permissive about shape and strict only about the
//! terminal case where no JSON can be located at all, so callers can tell
//! "no events found" (empty vec) apart from "response unusable"
//! ([`ExtractError::MalformedResponse`]).

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::candidate::{DEFAULT_TITLE, EventCandidate};
use crate::extract::ExtractError;

fn fence_marker() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    // Opening fences may carry a language tag (```json); closers never do.
    FENCE.get_or_init(|| Regex::new(r"```[A-Za-z]*").unwrap())
}

/// Turn raw model text into a validated array of event candidates.
///
/// Field-level problems inside a successfully parsed candidate are absorbed
/// as defaults and never escalate; only an unrecoverable response errors.
pub fn normalize(raw: &str) -> Result<Vec<EventCandidate>, ExtractError> {
    let stripped = fence_marker().replace_all(raw, "");

    let isolated = isolate_json(&stripped).ok_or(ExtractError::MalformedResponse)?;

    let parsed: Value = serde_json::from_str(isolated).map_err(|err| {
        debug!(error = %err, "located JSON substring failed to parse");
        ExtractError::MalformedResponse
    })?;

    // A single object in place of an array of one is the most common model
    // slip; wrap it rather than reject it.
    let items = match parsed {
        Value::Array(items) => items,
        other => vec![other],
    };

    Ok(items.into_iter().filter_map(candidate_from_value).collect())
}

/// Locate the widest top-level JSON array in `text`, falling back to a
/// single object when no array brackets are present.
fn isolate_json(text: &str) -> Option<&str> {
    if let (Some(open), Some(close)) = (text.find('['), text.rfind(']')) {
        if close > open {
            return Some(&text[open..=close]);
        }
    }
    if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
        if close > open {
            return Some(&text[open..=close]);
        }
    }
    None
}

/// Coerce one parsed element into a candidate.
///
/// Non-object elements (including nulls) are dropped: the contract is that
/// the result never contains a null candidate.
fn candidate_from_value(value: Value) -> Option<EventCandidate> {
    let map = match value {
        Value::Object(map) => map,
        _ => return None,
    };

    let title = text_field(&map, "title");
    Some(EventCandidate {
        title: if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        },
        start_date_time: text_field(&map, "startDateTime"),
        end_date_time: text_field(&map, "endDateTime"),
        location: text_field(&map, "location"),
        description: text_field(&map, "description"),
        recurrence: text_field(&map, "recurrence"),
    })
}

/// Read a string field with defaulting: missing/null become empty, and a
/// mistyped scalar is rendered to its JSON text rather than discarded.
fn text_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_array_with_language_tag() {
        let raw = "```json\n[{\"title\":\"Standup\",\"startDateTime\":\"2025-06-02T09:00:00\"}]\n```";
        let candidates = normalize(raw).expect("should normalize");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Standup");
        assert_eq!(candidates[0].start_date_time, "2025-06-02T09:00:00");
        assert_eq!(candidates[0].end_date_time, "");
    }

    #[test]
    fn test_bare_object_with_empty_title_gets_defaults() {
        let candidates = normalize("{\"title\":\"\"}").expect("should normalize");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, DEFAULT_TITLE);
        assert_eq!(candidates[0].location, "");
        assert_eq!(candidates[0].description, "");
        assert_eq!(candidates[0].recurrence, "");
    }

    #[test]
    fn test_array_surrounded_by_prose() {
        let raw = "Here are the events I found:\n[{\"title\":\"Gallery Night\"}]\nLet me know!";
        let candidates = normalize(raw).expect("should normalize");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Gallery Night");
    }

    #[test]
    fn test_no_json_at_all_is_malformed() {
        let err = normalize("Sorry, I could not read the flyer.").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse));
    }

    #[test]
    fn test_broken_json_is_malformed_not_empty() {
        let err = normalize("[{\"title\": \"Unterminated\"").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse));
    }

    #[test]
    fn test_empty_array_is_a_valid_empty_result() {
        let candidates = normalize("[]").expect("should normalize");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_null_elements_are_dropped() {
        let candidates =
            normalize("[null, {\"title\":\"Real Event\"}, 42]").expect("should normalize");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Real Event");
    }

    #[test]
    fn test_mistyped_scalar_fields_are_rendered_not_dropped() {
        let raw = "[{\"title\": 7, \"location\": true}]";
        let candidates = normalize(raw).expect("should normalize");
        assert_eq!(candidates[0].title, "7");
        assert_eq!(candidates[0].location, "true");
    }

    #[test]
    fn test_unknown_fields_are_discarded() {
        let raw = "[{\"title\":\"Quiz Night\",\"organizer\":\"The Fox & Hound\"}]";
        let candidates = normalize(raw).expect("should normalize");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Quiz Night");
        assert_eq!(candidates[0].description, "");
    }

    #[test]
    fn test_all_fields_carried_through() {
        let raw = concat!(
            "[{\"title\":\"Yoga in the Park\",",
            "\"startDateTime\":\"2025-07-05T08:00:00\",",
            "\"endDateTime\":\"2025-07-05T09:30:00\",",
            "\"location\":\"Riverside Lawn\",",
            "\"description\":\"Bring a mat\",",
            "\"recurrence\":\"RRULE:FREQ=WEEKLY;INTERVAL=1\"}]"
        );
        let candidates = normalize(raw).expect("should normalize");
        let event = &candidates[0];
        assert_eq!(event.title, "Yoga in the Park");
        assert_eq!(event.location, "Riverside Lawn");
        assert_eq!(event.description, "Bring a mat");
        assert_eq!(event.recurrence, "RRULE:FREQ=WEEKLY;INTERVAL=1");
    }
}
