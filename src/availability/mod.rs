//! Upstream appointment-availability API.
//!
//! Payload types mirror the upstream JSON:
//! `{ LocationAvailabilityDates: [ { AvailabilityDate, DayOfWeek, AvailableTimeSlots: [ { StartDateTime, Duration } ] } ] }`.
//! Field access is lenient: a field of the wrong JSON type reads as absent,
//! and list entries that do not parse are skipped rather than failing the
//! whole document.

pub mod client;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::CheckError;

/// Upstream datetime format, interpreted as UTC.
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Availability document for a single location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailabilityResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub location_availability_dates: Vec<AvailabilityDay>,
}

/// One calendar date for one location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailabilityDay {
    #[serde(default, deserialize_with = "lenient_string")]
    pub availability_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub day_of_week: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub available_time_slots: Vec<TimeSlot>,
}

/// A raw bookable slot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeSlot {
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date_time: Option<String>,
    /// Minutes. Numbers and numeric strings are accepted.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration: Option<i64>,
}

/// Anything that can produce an availability document for a location id.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn fetch(&self, location_id: &str) -> Result<AvailabilityResponse, CheckError>;
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
