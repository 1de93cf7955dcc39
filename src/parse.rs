//! String normalizers for environment-style inputs.
//!
//! Every function here is total: malformed input yields `None` or an empty
//! collection, never an error.

use std::collections::{BTreeSet, HashMap};

/// Weekday names recognized in inputs and in the upstream `DayOfWeek` field.
const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Treat blank values the same as unset ones.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a location list such as `"22, 29a, '33', x"` into `["22", "29", "33"]`.
///
/// Tokens are split on commas and whitespace, quotes are stripped and only
/// digit characters are kept. Tokens without digits are dropped.
pub fn parse_location_ids(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|piece| piece.trim_matches(|c: char| c == '"' || c == '\''))
        .map(|piece| piece.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .collect()
}

/// Parse a JSON object of location id -> display name.
///
/// Non-object or malformed input yields an empty map. Non-string values are
/// coerced with their JSON rendering.
pub fn parse_name_map(raw: &str) -> HashMap<String, String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| {
                let name = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, name)
            })
            .collect(),
        _ => HashMap::new(),
    }
}

/// Convert `"HH:MM"` to minutes since midnight.
pub fn parse_hhmm(raw: &str) -> Option<u32> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hours: u32 = parts[0].trim().parse().ok()?;
    let minutes: u32 = parts[1].trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Map a weekday name (any case) or number to 1..=7, Monday = 1.
pub fn weekday_to_num(raw: &str) -> Option<u32> {
    let value = raw.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value.parse::<u32>().ok().filter(|n| (1..=7).contains(n));
    }
    weekday_from_name(value)
}

/// Map a weekday name (any case) to 1..=7. Numbers are not accepted.
pub fn weekday_from_name(raw: &str) -> Option<u32> {
    let value = raw.trim().to_lowercase();
    WEEKDAY_NAMES
        .iter()
        .position(|name| *name == value)
        .map(|idx| idx as u32 + 1)
}

/// Parse a comma-separated weekday list. Invalid entries are dropped; an
/// empty result means the filter is off.
pub fn parse_weekday_set(raw: &str) -> Option<BTreeSet<u32>> {
    let set: BTreeSet<u32> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(weekday_to_num)
        .collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

/// Parse a signed integer, tolerating surrounding whitespace.
pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
