//! Run settings, normalized from environment-style key/value inputs.
//!
//! Blank values are treated exactly like unset ones. Only `BEARER_TOKEN` and
//! `LOCATION_IDS` are required; everything else has a default or disables
//! the corresponding filter.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::CheckError;
use crate::parse::{
    non_blank, parse_hhmm, parse_int, parse_location_ids, parse_name_map, parse_weekday_set,
    weekday_to_num,
};
use crate::slots::SlotFilters;

pub const DEFAULT_BASE_URL: &str =
    "https://publicwebsiteapi.nydmvreservation.com/api/AvailableLocationDates";
pub const DEFAULT_TYPE_ID: &str = "204";
pub const DEFAULT_ORIGIN: &str = "https://public.nydmvreservation.com";
pub const DEFAULT_OUTPUT_DIR: &str = ".availability";
pub const DEFAULT_WEBHOOK_JSON_KEY: &str = "text";

/// Upstream `startDate` format when none is configured.
const START_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn default_user_agent() -> String {
    format!("slotwatch/{}", env!("CARGO_PKG_VERSION"))
}

/// Connection details for the upstream availability API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub type_id: String,
    pub start_date: String,
    pub origin: String,
    pub user_agent: String,
    pub bearer_token: String,
}

/// Body encoding for webhook notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFormat {
    Text,
    Json,
}

impl WebhookFormat {
    /// `"json"` (any case) selects JSON; everything else is plain text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => WebhookFormat::Json,
            _ => WebhookFormat::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: Url,
    pub format: WebhookFormat,
    pub json_key: String,
}

/// Everything a single check run needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub location_ids: Vec<String>,
    pub name_map: HashMap<String, String>,
    pub filters: SlotFilters,
    pub now: DateTime<Utc>,
    pub output_dir: PathBuf,
    pub webhook: Option<WebhookSettings>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, CheckError> {
        Self::from_lookup(env_var)
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Returns `CheckError::MissingConfiguration` when the token is blank or
    /// no location id survives parsing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        let bearer_token = get("BEARER_TOKEN").map(|t| t.trim().to_string());
        let location_ids = get("LOCATION_IDS")
            .map(|raw| parse_location_ids(&raw))
            .unwrap_or_default();
        let bearer_token = match bearer_token {
            Some(token) if !location_ids.is_empty() => token,
            _ => return Err(CheckError::MissingConfiguration),
        };

        let now = resolve_now(get("NOW_EPOCH"));

        let base_url_raw = get("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(base_url_raw.trim()).map_err(|_| CheckError::InvalidUrl {
            key: "BASE_URL",
            value: base_url_raw.clone(),
        })?;

        let api = ApiSettings {
            base_url,
            type_id: get("TYPE_ID").unwrap_or_else(|| DEFAULT_TYPE_ID.to_string()),
            start_date: get("START_DATE")
                .unwrap_or_else(|| now.format(START_DATE_FORMAT).to_string()),
            origin: get("ORIGIN")
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            user_agent: get("USER_AGENT").unwrap_or_else(default_user_agent),
            bearer_token,
        };

        let filters = SlotFilters {
            time_from: get("TIME_FROM").and_then(|v| parse_hhmm(&v)),
            time_to: get("TIME_TO").and_then(|v| parse_hhmm(&v)),
            // Zero or negative disables the window, same as unset.
            window_days: get("DATE_WINDOW_DAYS")
                .and_then(|v| parse_int(&v))
                .filter(|days| *days > 0),
            weekdays: get("WEEKDAYS").and_then(|v| parse_weekday_set(&v)),
            target_weekday: get("TARGET_WEEKDAY").and_then(|v| weekday_to_num(&v)),
            week_offset: get("WEEK_OFFSET").and_then(|v| parse_int(&v)),
        };

        let name_map = get("LOCATION_NAME_MAP")
            .map(|raw| parse_name_map(&raw))
            .unwrap_or_default();

        let webhook = get("WEBHOOK_URL").and_then(|raw| match Url::parse(raw.trim()) {
            Ok(url) => Some(WebhookSettings {
                url,
                format: WebhookFormat::parse(get("WEBHOOK_FORMAT").as_deref()),
                json_key: get("WEBHOOK_JSON_KEY")
                    .unwrap_or_else(|| DEFAULT_WEBHOOK_JSON_KEY.to_string()),
            }),
            Err(e) => {
                log::warn!("WEBHOOK_URL is not a valid URL ({}); notifications disabled", e);
                None
            }
        });

        Ok(Settings {
            api,
            location_ids,
            name_map,
            filters,
            now,
            output_dir: output_dir(&lookup),
            webhook,
        })
    }

    /// Header label for a location: `Name (ID)` when mapped, else the raw id.
    pub fn location_label(&self, location_id: &str) -> String {
        match self.name_map.get(location_id) {
            Some(name) if !name.trim().is_empty() => format!("{} ({})", name.trim(), location_id),
            _ => location_id.to_string(),
        }
    }
}

/// Process environment lookup; unset and non-UTF-8 values read as `None`.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Output directory for `summary.txt` and `found`.
///
/// Resolved separately from [`Settings`] so the missing-configuration path
/// can still write its outputs.
pub fn output_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup("OUTPUT_DIR"))
        .map(|dir| PathBuf::from(dir.trim()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

fn resolve_now(raw: Option<String>) -> DateTime<Utc> {
    if let Some(raw) = raw {
        match parse_int(&raw).and_then(|secs| DateTime::from_timestamp(secs, 0)) {
            Some(now) => return now,
            None => log::warn!("NOW_EPOCH {:?} is not a valid epoch; using the clock", raw),
        }
    }
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![("BEARER_TOKEN", "tok"), ("LOCATION_IDS", "22, 29")]
    }

    #[test]
    fn test_missing_token_is_configuration_error() {
        let result = Settings::from_lookup(lookup_from(&[("LOCATION_IDS", "22")]));
        assert!(matches!(result, Err(CheckError::MissingConfiguration)));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let result =
            Settings::from_lookup(lookup_from(&[("BEARER_TOKEN", "  "), ("LOCATION_IDS", "22")]));
        assert!(matches!(result, Err(CheckError::MissingConfiguration)));

        let result =
            Settings::from_lookup(lookup_from(&[("BEARER_TOKEN", "tok"), ("LOCATION_IDS", "")]));
        assert!(matches!(result, Err(CheckError::MissingConfiguration)));
    }

    #[test]
    fn test_location_ids_without_digits_are_missing() {
        let result =
            Settings::from_lookup(lookup_from(&[("BEARER_TOKEN", "tok"), ("LOCATION_IDS", "x, y")]));
        assert!(matches!(result, Err(CheckError::MissingConfiguration)));
    }

    #[test]
    fn test_defaults() {
        let mut pairs = minimal();
        pairs.push(("NOW_EPOCH", "1758067200")); // 2025-09-17T00:00:00Z
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(settings.location_ids, vec!["22", "29"]);
        assert_eq!(settings.api.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(settings.api.type_id, "204");
        assert_eq!(settings.api.origin, DEFAULT_ORIGIN);
        assert_eq!(settings.api.start_date, "2025-09-17T00:00:00Z");
        assert_eq!(settings.output_dir, PathBuf::from(".availability"));
        assert!(settings.webhook.is_none());
        assert!(settings.name_map.is_empty());
        assert_eq!(settings.filters.window_days, None);
        assert_eq!(settings.filters.time_from, None);
        assert_eq!(settings.filters.weekdays, None);
    }

    #[test]
    fn test_filters_are_parsed() {
        let mut pairs = minimal();
        pairs.extend([
            ("TIME_FROM", "08:00"),
            ("TIME_TO", "25:00"),
            ("DATE_WINDOW_DAYS", "14"),
            ("WEEKDAYS", "friday,saturday,bogus"),
            ("TARGET_WEEKDAY", "Tuesday"),
            ("WEEK_OFFSET", "1"),
        ]);
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        let f = &settings.filters;

        assert_eq!(f.time_from, Some(480));
        assert_eq!(f.time_to, None);
        assert_eq!(f.window_days, Some(14));
        assert_eq!(
            f.weekdays.as_ref().map(|s| s.iter().copied().collect::<Vec<_>>()),
            Some(vec![5, 6])
        );
        assert_eq!(f.target_weekday, Some(2));
        assert_eq!(f.week_offset, Some(1));
    }

    #[test]
    fn test_zero_or_invalid_window_is_disabled() {
        for raw in ["0", "-3", "soon"] {
            let mut pairs = minimal();
            pairs.push(("DATE_WINDOW_DAYS", raw));
            let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
            assert_eq!(settings.filters.window_days, None, "{}", raw);
        }
    }

    #[test]
    fn test_invalid_now_epoch_falls_back_to_clock() {
        let mut pairs = minimal();
        pairs.push(("NOW_EPOCH", "yesterday"));
        let before = Utc::now();
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(settings.now >= before);
    }

    #[test]
    fn test_invalid_base_url() {
        let mut pairs = minimal();
        pairs.push(("BASE_URL", "not a url"));
        let result = Settings::from_lookup(lookup_from(&pairs));
        assert!(matches!(
            result,
            Err(CheckError::InvalidUrl { key: "BASE_URL", .. })
        ));
    }

    #[test]
    fn test_webhook_settings() {
        let mut pairs = minimal();
        pairs.extend([
            ("WEBHOOK_URL", "https://hooks.example.com/abc"),
            ("WEBHOOK_FORMAT", "JSON"),
            ("WEBHOOK_JSON_KEY", "content"),
        ]);
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        let webhook = settings.webhook.unwrap();
        assert_eq!(webhook.url.as_str(), "https://hooks.example.com/abc");
        assert_eq!(webhook.format, WebhookFormat::Json);
        assert_eq!(webhook.json_key, "content");
    }

    #[test]
    fn test_invalid_webhook_url_disables_notifier() {
        let mut pairs = minimal();
        pairs.push(("WEBHOOK_URL", "::::"));
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(settings.webhook.is_none());
    }

    #[test]
    fn test_webhook_format_defaults_to_text() {
        assert_eq!(WebhookFormat::parse(None), WebhookFormat::Text);
        assert_eq!(WebhookFormat::parse(Some("discord")), WebhookFormat::Text);
        assert_eq!(WebhookFormat::parse(Some(" json ")), WebhookFormat::Json);
    }

    #[test]
    fn test_location_label() {
        let mut pairs = minimal();
        pairs.push(("LOCATION_NAME_MAP", r#"{"22":"Bethpage"}"#));
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(settings.location_label("22"), "Bethpage (22)");
        assert_eq!(settings.location_label("29"), "29");
    }

    #[test]
    fn test_output_dir_override() {
        let lookup = lookup_from(&[("OUTPUT_DIR", "/tmp/out")]);
        assert_eq!(output_dir(&lookup), PathBuf::from("/tmp/out"));
        let lookup = lookup_from(&[("OUTPUT_DIR", " ")]);
        assert_eq!(output_dir(&lookup), PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_env_var_reads_process_environment() {
        std::env::set_var("SLOTWATCH_TEST_OUTPUT_DIR", "/tmp/slotwatch-env");
        assert_eq!(
            env_var("SLOTWATCH_TEST_OUTPUT_DIR").as_deref(),
            Some("/tmp/slotwatch-env")
        );
        assert_eq!(env_var("SLOTWATCH_TEST_UNSET_KEY"), None);
    }
}
