//! Plain-text and JSON rendering for command results.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use lulu_core::FetchState;

/// Print `value` as pretty JSON or through `render`.
pub fn emit<T: Serialize>(value: &T, json: bool, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

/// Render a settled fetch, turning a failed load into a command error.
pub fn emit_fetch<T: Serialize>(
    state: FetchState<T>,
    json: bool,
    render: impl FnOnce(&T),
) -> Result<()> {
    match (state.data, state.error) {
        (_, Some(error)) => anyhow::bail!(error),
        (Some(data), None) => emit(&data, json, render),
        (None, None) => anyhow::bail!("No data received"),
    }
}

/// Truncate to `max_chars` characters, adding an ellipsis when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 1 {
        s.chars().take(max_chars).collect()
    } else {
        let truncated: String = s.chars().take(max_chars - 1).collect();
        format!("{}…", truncated)
    }
}

pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_datetime(date: &NaiveDateTime) -> String {
    date.format("%d.%m.%Y %H:%M").to_string()
}

/// Parse a preferred visit date: `YYYY-MM-DD` (midday) or `YYYY-MM-DDTHH:MM`.
pub fn parse_visit_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{}': use YYYY-MM-DD or YYYY-MM-DDTHH:MM", s))?;
    date.and_hms_opt(12, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Очень понравилось", 6), "Очень…");
        assert_eq!(truncate("abc", 1), "a");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("x@y.ru"), "-"), "x@y.ru");
        assert_eq!(format_optional(None, "-"), "-");
    }

    #[test]
    fn test_parse_visit_date() {
        let dt = parse_visit_date("2024-07-13").unwrap();
        assert_eq!(format_datetime(&dt), "13.07.2024 12:00");

        let dt = parse_visit_date("2024-07-13T10:30").unwrap();
        assert_eq!(format_datetime(&dt), "13.07.2024 10:30");

        assert!(parse_visit_date("13.07.2024").is_err());
    }

    #[test]
    fn test_emit_fetch_error_fails_command() {
        let state: FetchState<Vec<u32>> = FetchState {
            data: Some(vec![1]),
            loading: false,
            error: Some("An error occurred".to_string()),
        };
        let err = emit_fetch(state, true, |_| {}).unwrap_err();
        assert_eq!(err.to_string(), "An error occurred");
    }
}
