//! HTTP client for the upstream availability API.
//!
//! One authenticated GET per location:
//! `GET {base}?locationId={id}&typeId={type}&startDate={start}`.
//! The browser-style headers (Origin, Referer, Sec-Fetch-*) are what the
//! upstream booking site sends and are required for it to answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use super::{AvailabilityResponse, AvailabilitySource};
use crate::config::ApiSettings;
use crate::error::CheckError;

/// Per-request timeout. No retries.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AvailabilityClient {
    client: reqwest::Client,
    api: ApiSettings,
}

impl AvailabilityClient {
    pub fn new(api: ApiSettings) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(default_headers(&api)?)
            .build()?;
        Ok(Self { client, api })
    }

    /// Full request URL for one location.
    pub fn request_url(&self, location_id: &str) -> Url {
        build_request_url(&self.api, location_id)
    }
}

#[async_trait]
impl AvailabilitySource for AvailabilityClient {
    async fn fetch(&self, location_id: &str) -> Result<AvailabilityResponse, CheckError> {
        let url = self.request_url(location_id);
        log::debug!("Fetching availability for location {}", location_id);

        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckError::Status {
                status,
                body: truncate(&body, 200),
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn build_request_url(api: &ApiSettings, location_id: &str) -> Url {
    let mut url = api.base_url.clone();
    url.query_pairs_mut()
        .append_pair("locationId", location_id)
        .append_pair("typeId", &api.type_id)
        .append_pair("startDate", &api.start_date);
    url
}

fn default_headers(api: &ApiSettings) -> Result<HeaderMap, CheckError> {
    let value = |name: &'static str, raw: &str| {
        HeaderValue::from_str(raw).map_err(|_| CheckError::InvalidHeader(name))
    };

    let mut authorization = value(
        "Authorization",
        &format!("Bearer {}", api.bearer_token),
    )?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::AUTHORIZATION, authorization);
    headers.insert(header::ORIGIN, value("Origin", &api.origin)?);
    headers.insert(header::REFERER, value("Referer", &format!("{}/", api.origin))?);
    headers.insert(header::USER_AGENT, value("User-Agent", &api.user_agent)?);
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    Ok(headers)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
