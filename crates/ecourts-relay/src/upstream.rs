//! Outbound HTTP to the eCourts portals.
//!
//! One [`UpstreamClient`] is built at startup; its transport mode (direct
//! or ScraperAPI relay) and timeout are fixed for the process lifetime.
//! Every failure — transport error, timeout, non-2xx — collapses into a
//! single opaque [`RelayError::UpstreamFetch`] per endpoint; the cause is
//! logged here and never distinguished to the caller.

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::RelayConfig;
use ecourts_common::constants::{
    DEFAULT_USER_AGENT, ERR_CAPTCHA_FETCH, ERR_CASE_SEARCH, SCRAPERAPI_URL,
};
use ecourts_common::{CookieJar, RelayError};

/// Transport mode, selected once from configuration
#[derive(Debug, Clone)]
pub enum FetchMode {
    /// Call the portal host directly
    Direct,
    /// Route through ScraperAPI, which forwards our headers to the target
    Relay { api_key: String },
}

/// Upstream fetcher shared by all endpoints
pub struct UpstreamClient {
    http: reqwest::Client,
    mode: FetchMode,
}

/// A fetched captcha image plus any cookies the portal set
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub cookies: CookieJar,
}

/// A fetched text/JSON body plus any cookies the portal set
pub struct FetchedBody {
    pub body: String,
    pub cookies: CookieJar,
}

impl UpstreamClient {
    /// Build the client from configuration. Relay mode is chosen here, once,
    /// based on whether a ScraperAPI key is present; the timeout is longer
    /// in relay mode because the relay adds its own round trips.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let (mode, timeout_secs) = match &config.scraperapi_key {
            Some(api_key) => (
                FetchMode::Relay { api_key: api_key.clone() },
                config.relay_timeout_secs,
            ),
            None => (FetchMode::Direct, config.direct_timeout_secs),
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, mode })
    }

    /// Human-readable mode name, for startup logging
    pub fn mode_name(&self) -> &'static str {
        match self.mode {
            FetchMode::Direct => "direct",
            FetchMode::Relay { .. } => "scraperapi",
        }
    }

    /// The URL actually requested for a given target: the target itself in
    /// direct mode, or the ScraperAPI entry point wrapping it in relay mode.
    fn request_url(&self, target: &str) -> String {
        match &self.mode {
            FetchMode::Direct => target.to_string(),
            FetchMode::Relay { api_key } => format!(
                "{SCRAPERAPI_URL}?api_key={api_key}&url={}&keep_headers=true",
                urlencoding::encode(target)
            ),
        }
    }

    /// GET a captcha image with browser-mimicking headers and the formatted
    /// cookie jar attached.
    pub async fn fetch_image(
        &self,
        target: &str,
        jar: &CookieJar,
        referer: &str,
        user_agent: &str,
    ) -> Result<FetchedImage, RelayError> {
        debug!(url = %target, mode = self.mode_name(), "Fetching captcha image");

        let result = self
            .http
            .get(self.request_url(target))
            .headers(image_headers(referer, user_agent))
            .header(header::COOKIE, jar.to_header_value())
            .send()
            .await;

        let response = check_response(result, target, ERR_CAPTCHA_FETCH)?;

        let cookies = extract_cookies(response.headers());
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = response.bytes().await.map_err(|err| {
            error!(url = %target, error = %err, "Failed to read captcha image body");
            RelayError::UpstreamFetch(ERR_CAPTCHA_FETCH)
        })?;

        debug!(url = %target, bytes = bytes.len(), new_cookies = cookies.len(), "Captcha image fetched");

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
            cookies,
        })
    }

    /// POST a URL-encoded form body with browser-mimicking headers and the
    /// formatted cookie jar attached. The body comes back as text; parsing
    /// (or deliberately not parsing) is the caller's concern.
    pub async fn submit_form(
        &self,
        target: &str,
        form_body: String,
        jar: &CookieJar,
        referer: &str,
        user_agent: &str,
    ) -> Result<FetchedBody, RelayError> {
        debug!(url = %target, mode = self.mode_name(), "Submitting case query form");

        let result = self
            .http
            .post(self.request_url(target))
            .headers(form_headers(referer, user_agent))
            .header(header::COOKIE, jar.to_header_value())
            .body(form_body)
            .send()
            .await;

        let response = check_response(result, target, ERR_CASE_SEARCH)?;

        let cookies = extract_cookies(response.headers());

        let body = response.text().await.map_err(|err| {
            error!(url = %target, error = %err, "Failed to read case query body");
            RelayError::UpstreamFetch(ERR_CASE_SEARCH)
        })?;

        debug!(url = %target, bytes = body.len(), new_cookies = cookies.len(), "Case query submitted");

        Ok(FetchedBody { body, cookies })
    }
}

/// Collapse transport errors and non-2xx statuses into the opaque
/// per-endpoint failure, logging the real cause.
fn check_response(
    result: Result<reqwest::Response, reqwest::Error>,
    target: &str,
    opaque_message: &'static str,
) -> Result<reqwest::Response, RelayError> {
    let response = result.map_err(|err| {
        error!(url = %target, error = %err, timeout = err.is_timeout(), "Upstream request failed");
        RelayError::UpstreamFetch(opaque_message)
    })?;

    if !response.status().is_success() {
        error!(url = %target, status = %response.status(), "Upstream returned non-success status");
        return Err(RelayError::UpstreamFetch(opaque_message));
    }

    Ok(response)
}

/// Harvest `Set-Cookie` values from an upstream reply
fn extract_cookies(headers: &HeaderMap) -> CookieJar {
    CookieJar::from_set_cookie_values(
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    )
}

/// Header value from a client-supplied string, falling back to a known-good
/// static when the string is not a legal header value.
fn header_value_or(value: &str, fallback: &'static str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(fallback))
}

/// Browser-mimicking headers for a captcha image fetch
fn image_headers(referer: &str, user_agent: &str) -> HeaderMap {
    let mut headers = common_headers(referer, user_agent);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8"),
    );
    headers.insert("Priority", HeaderValue::from_static("i"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("image"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("no-cors"));
    headers
}

/// Browser-mimicking headers for an XHR form submission
fn form_headers(referer: &str, user_agent: &str) -> HeaderMap {
    let mut headers = common_headers(referer, user_agent);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
    );
    headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers
}

fn common_headers(referer: &str, user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::REFERER,
        header_value_or(referer, ecourts_common::constants::HIGHCOURT_REFERER),
    );
    headers.insert(
        header::USER_AGENT,
        header_value_or(user_agent, DEFAULT_USER_AGENT),
    );
    headers.insert(
        "sec-ch-ua",
        HeaderValue::from_static(r#""Chromium";v="136", "Brave";v="136", "Not.A/Brand";v="99""#),
    );
    headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
    headers.insert("sec-ch-ua-platform", HeaderValue::from_static(r#""Windows""#));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    headers.insert("sec-gpc", HeaderValue::from_static("1"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}
