//! Configuration management for the relay.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use ecourts_common::constants::{
    DEFAULT_ALLOWED_ORIGIN, DEFAULT_LISTEN_ADDR, DIRECT_TIMEOUT_SECS, DISTRICT_CAPTCHA_URL,
    HIGHCOURT_CAPTCHA_URL, HIGHCOURT_CASE_QUERY_URL, RELAY_TIMEOUT_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Single origin allowed to call the relay cross-origin
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// ScraperAPI credential. When set, every upstream call is routed
    /// through the relay service instead of hitting the portal directly.
    #[serde(default)]
    pub scraperapi_key: Option<String>,

    /// Timeout for direct upstream calls, in seconds
    #[serde(default = "default_direct_timeout")]
    pub direct_timeout_secs: u64,

    /// Timeout when routed through ScraperAPI, in seconds
    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_secs: u64,

    /// Upstream endpoint URLs
    #[serde(default)]
    pub upstream: UpstreamTargets,
}

/// Upstream endpoint URLs. Defaults point at the live portals; tests point
/// them at a closed local port instead.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamTargets {
    /// High Court captcha image endpoint
    #[serde(default = "default_highcourt_captcha_url")]
    pub highcourt_captcha_url: String,

    /// High Court case status query endpoint
    #[serde(default = "default_highcourt_case_url")]
    pub highcourt_case_url: String,

    /// District Court captcha endpoint (challenge id appended per fetch)
    #[serde(default = "default_district_captcha_url")]
    pub district_captcha_url: String,
}

impl Default for UpstreamTargets {
    fn default() -> Self {
        Self {
            highcourt_captcha_url: default_highcourt_captcha_url(),
            highcourt_case_url: default_highcourt_case_url(),
            district_captcha_url: default_district_captcha_url(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_allowed_origin() -> String { DEFAULT_ALLOWED_ORIGIN.to_string() }
fn default_direct_timeout() -> u64 { DIRECT_TIMEOUT_SECS }
fn default_relay_timeout() -> u64 { RELAY_TIMEOUT_SECS }
fn default_highcourt_captcha_url() -> String { HIGHCOURT_CAPTCHA_URL.to_string() }
fn default_highcourt_case_url() -> String { HIGHCOURT_CASE_QUERY_URL.to_string() }
fn default_district_captcha_url() -> String { DISTRICT_CAPTCHA_URL.to_string() }

impl RelayConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref key) = args.scraperapi_key {
            config.scraperapi_key = Some(key.clone());
        }
        if let Some(ref origin) = args.allowed_origin {
            config.allowed_origin = origin.clone();
        }

        Ok(config)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            allowed_origin: default_allowed_origin(),
            scraperapi_key: None,
            direct_timeout_secs: default_direct_timeout(),
            relay_timeout_secs: default_relay_timeout(),
            upstream: UpstreamTargets::default(),
        }
    }
}
