//! Google Calendar deep-link encoding.
//!
//! The encoder is total: a candidate with missing or contradictory pieces
//! still yields a well-formed URL, with defaults substituted where needed.
//! A missing end time becomes start plus exactly one hour; missing dates
//! drop the `dates` parameter entirely so the provider falls back to "now".

use crate::candidate::EventCandidate;
use crate::datetime;

const RENDER_BASE: &str = "https://calendar.google.com/calendar/render";

/// Title used when a candidate reaches the encoder with an empty title.
const FALLBACK_TITLE: &str = "New Event";

/// Build the calendar deep link for one candidate.
pub fn render_url(candidate: &EventCandidate) -> String {
    let title = if candidate.title.trim().is_empty() {
        FALLBACK_TITLE
    } else {
        candidate.title.as_str()
    };

    let mut params: Vec<(&str, String)> = vec![
        ("action", "TEMPLATE".to_string()),
        ("text", title.to_string()),
        ("details", candidate.description.clone()),
        ("location", candidate.location.clone()),
    ];

    let start = datetime::to_provider_stamp(&candidate.start_date_time);
    let end = {
        let explicit = datetime::to_provider_stamp(&candidate.end_date_time);
        if explicit.is_empty() && !start.is_empty() {
            datetime::to_provider_stamp_offset(&candidate.start_date_time, 1)
        } else {
            explicit
        }
    };

    if !start.is_empty() && !end.is_empty() {
        params.push(("dates", format!("{start}/{end}")));
    }

    if datetime::parse_rule(&candidate.recurrence).is_some() {
        params.push(("recur", candidate.recurrence.trim().to_string()));
    }

    let query = params
        .into_iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(&value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{RENDER_BASE}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(start: &str, end: &str) -> EventCandidate {
        EventCandidate {
            title: "Harbor Market".to_string(),
            start_date_time: start.to_string(),
            end_date_time: end.to_string(),
            location: "Pier 3".to_string(),
            description: "Local makers & food stalls".to_string(),
            recurrence: String::new(),
        }
    }

    #[test]
    fn test_full_candidate_renders_all_parameters() {
        let url = render_url(&candidate(
            "2025-06-02T09:00:00+00:00",
            "2025-06-02T11:00:00+00:00",
        ));

        assert!(url.starts_with("https://calendar.google.com/calendar/render?action=TEMPLATE"));
        assert!(url.contains("text=Harbor%20Market"));
        assert!(url.contains("location=Pier%203"));
        assert!(url.contains("dates=20250602T090000Z%2F20250602T110000Z"));
    }

    #[test]
    fn test_missing_end_defaults_to_one_hour_after_start() {
        let url = render_url(&candidate("2025-06-02T09:00:00+00:00", ""));
        assert!(url.contains("dates=20250602T090000Z%2F20250602T100000Z"));
    }

    #[test]
    fn test_missing_start_omits_dates_entirely() {
        let url = render_url(&candidate("", "2025-06-02T11:00:00+00:00"));
        assert!(!url.contains("dates="));
    }

    #[test]
    fn test_empty_title_falls_back() {
        let mut event = candidate("", "");
        event.title = "   ".to_string();
        let url = render_url(&event);
        assert!(url.contains("text=New%20Event"));
    }

    #[test]
    fn test_valid_recurrence_is_appended() {
        let mut event = candidate("2025-06-02T09:00:00+00:00", "");
        event.recurrence = "RRULE:FREQ=WEEKLY;INTERVAL=2".to_string();
        let url = render_url(&event);
        assert!(url.contains("recur=RRULE%3AFREQ%3DWEEKLY%3BINTERVAL%3D2"));
    }

    #[test]
    fn test_invalid_recurrence_is_dropped() {
        let mut event = candidate("2025-06-02T09:00:00+00:00", "");
        event.recurrence = "every other tuesday".to_string();
        let url = render_url(&event);
        assert!(!url.contains("recur="));
    }

    #[test]
    fn test_reversed_range_is_tolerated() {
        // The encoder does not reorder or reject end-before-start data.
        let url = render_url(&candidate(
            "2025-06-02T11:00:00+00:00",
            "2025-06-02T09:00:00+00:00",
        ));
        assert!(url.contains("dates=20250602T110000Z%2F20250602T090000Z"));
    }
}
