//! Conversions between instant strings, the local date/time inputs the UI
//! edits, and the compact UTC stamps the calendar deep link requires.
//!
//! Every conversion is total over strings: empty or unparseable input yields
//! an empty string (or `None` for rule parsing), never an error. A candidate
//! with a broken timestamp stays editable instead of poisoning the batch.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Upper bound accepted for a recurrence interval at composition time.
pub const MAX_RULE_INTERVAL: u32 = 999;

/// Repetition frequency unit of a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceUnit {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceUnit {
    pub const ALL: [RecurrenceUnit; 4] = [
        RecurrenceUnit::Daily,
        RecurrenceUnit::Weekly,
        RecurrenceUnit::Monthly,
        RecurrenceUnit::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceUnit::Daily => "DAILY",
            RecurrenceUnit::Weekly => "WEEKLY",
            RecurrenceUnit::Monthly => "MONTHLY",
            RecurrenceUnit::Yearly => "YEARLY",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "DAILY" => Some(RecurrenceUnit::Daily),
            "WEEKLY" => Some(RecurrenceUnit::Weekly),
            "MONTHLY" => Some(RecurrenceUnit::Monthly),
            "YEARLY" => Some(RecurrenceUnit::Yearly),
            _ => None,
        }
    }

    /// Label used by UI combo boxes ("day", "week", ...).
    pub fn noun(&self) -> &'static str {
        match self {
            RecurrenceUnit::Daily => "day",
            RecurrenceUnit::Weekly => "week",
            RecurrenceUnit::Monthly => "month",
            RecurrenceUnit::Yearly => "year",
        }
    }
}

/// Decomposed recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub unit: RecurrenceUnit,
    pub interval: u32,
}

/// Parse an instant string into a local date/time.
///
/// Accepts RFC 3339 (the canonical candidate form) and the naive
/// `YYYY-MM-DDTHH:mm[:ss]` / `YYYY-MM-DD` shapes the model emits, which are
/// interpreted as the viewer's local civil time.
pub(crate) fn parse_instant(value: &str) -> Option<DateTime<Local>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Local));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Local.from_local_datetime(&midnight).earliest();
    }

    None
}

/// Render an instant as the fixed-width `YYYY-MM-DDTHH:mm` local string a
/// datetime input edits. Date-only callers use [`to_local_date_input`].
pub fn to_local_input(instant: &str) -> String {
    match parse_instant(instant) {
        Some(local) => local.format("%Y-%m-%dT%H:%M").to_string(),
        None => String::new(),
    }
}

/// Render an instant as the `YYYY-MM-DD` local string a date input edits.
pub fn to_local_date_input(instant: &str) -> String {
    let full = to_local_input(instant);
    match full.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => full,
    }
}

/// Interpret a local input string as local civil time and serialize it back
/// to an RFC 3339 instant.
pub fn from_local_input(local: &str) -> String {
    match parse_instant(local) {
        Some(parsed) => parsed.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => String::new(),
    }
}

/// Render an instant as the compact punctuation-free UTC stamp
/// (`YYYYMMDDTHHMMSSZ`) required by the calendar deep link.
pub fn to_provider_stamp(instant: &str) -> String {
    match parse_instant(instant) {
        Some(local) => local
            .with_timezone(&Utc)
            .format("%Y%m%dT%H%M%SZ")
            .to_string(),
        None => String::new(),
    }
}

/// Provider stamp for an instant shifted by a whole number of hours.
pub(crate) fn to_provider_stamp_offset(instant: &str, hours: i64) -> String {
    match parse_instant(instant) {
        Some(local) => (local.with_timezone(&Utc) + Duration::hours(hours))
            .format("%Y%m%dT%H%M%SZ")
            .to_string(),
        None => String::new(),
    }
}

/// Decompose an `RRULE:FREQ=<UNIT>;INTERVAL=<N>` string.
///
/// An absent or unparseable rule yields `None`; callers keep whatever unit
/// and interval they were already showing.
pub fn parse_rule(rule: &str) -> Option<RecurrenceRule> {
    let rest = rule.trim().strip_prefix("RRULE:FREQ=")?;
    let (unit, interval) = rest.split_once(";INTERVAL=")?;
    let unit = RecurrenceUnit::from_str(unit)?;
    let interval: u32 = interval.parse().ok()?;
    if interval == 0 {
        return None;
    }
    Some(RecurrenceRule { unit, interval })
}

/// Compose a recurrence rule string, clamping the interval to `[1, 999]`.
pub fn build_rule(unit: RecurrenceUnit, interval: u32) -> String {
    let interval = interval.clamp(1, MAX_RULE_INTERVAL);
    format!("RRULE:FREQ={};INTERVAL={}", unit.as_str(), interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_garbage_inputs_yield_empty() {
        assert_eq!(to_local_input(""), "");
        assert_eq!(to_local_input("next thursday-ish"), "");
        assert_eq!(from_local_input("   "), "");
        assert_eq!(to_provider_stamp("not a date"), "");
    }

    #[test]
    fn test_local_round_trip_is_idempotent_at_minute_precision() {
        let samples = [
            "2025-06-02T09:00:00",
            "2025-12-31T23:59",
            "2024-02-29T12:30:45",
        ];
        for sample in samples {
            let first = to_local_input(sample);
            assert!(!first.is_empty(), "sample {sample} should parse");
            let round_tripped = to_local_input(&from_local_input(&first));
            assert_eq!(
                round_tripped, first,
                "round trip changed the rendered minute for {sample}"
            );
        }
    }

    #[test]
    fn test_local_input_is_minute_precision() {
        let rendered = to_local_input("2025-06-02T09:00:27");
        assert_eq!(rendered, "2025-06-02T09:00");
    }

    #[test]
    fn test_date_input_truncates_at_t() {
        assert_eq!(to_local_date_input("2025-06-02T09:00:00"), "2025-06-02");
        assert_eq!(to_local_date_input(""), "");
    }

    #[test]
    fn test_provider_stamp_shape() {
        let stamp = to_provider_stamp("2025-06-02T09:00:00+00:00");
        assert_eq!(stamp, "20250602T090000Z");
    }

    #[test]
    fn test_provider_stamp_offset_adds_hours() {
        let base = to_provider_stamp("2025-06-02T23:30:00+00:00");
        let shifted = to_provider_stamp_offset("2025-06-02T23:30:00+00:00", 1);
        assert_eq!(base, "20250602T233000Z");
        assert_eq!(shifted, "20250603T003000Z");
    }

    #[test]
    fn test_bare_date_parses_as_midnight() {
        assert_eq!(to_local_input("2025-06-02"), "2025-06-02T00:00");
    }

    #[test]
    fn test_rule_round_trip() {
        let rule = build_rule(RecurrenceUnit::Weekly, 2);
        assert_eq!(rule, "RRULE:FREQ=WEEKLY;INTERVAL=2");

        let parsed = parse_rule(&rule).expect("rule should parse");
        assert_eq!(parsed.unit, RecurrenceUnit::Weekly);
        assert_eq!(parsed.interval, 2);
    }

    #[test]
    fn test_build_rule_clamps_interval() {
        assert_eq!(
            build_rule(RecurrenceUnit::Daily, 0),
            "RRULE:FREQ=DAILY;INTERVAL=1"
        );
        assert_eq!(
            build_rule(RecurrenceUnit::Yearly, 5000),
            "RRULE:FREQ=YEARLY;INTERVAL=999"
        );
    }

    #[test]
    fn test_parse_rule_rejects_malformed_rules() {
        assert!(parse_rule("").is_none());
        assert!(parse_rule("FREQ=WEEKLY;INTERVAL=2").is_none());
        assert!(parse_rule("RRULE:FREQ=FORTNIGHTLY;INTERVAL=2").is_none());
        assert!(parse_rule("RRULE:FREQ=WEEKLY;INTERVAL=0").is_none());
        assert!(parse_rule("RRULE:FREQ=WEEKLY;INTERVAL=two").is_none());
    }
}
