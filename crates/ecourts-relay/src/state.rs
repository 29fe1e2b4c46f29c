//! Application state and shared resources.

use anyhow::Result;
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::upstream::UpstreamClient;

/// Shared application state.
///
/// Everything here is immutable after startup; session state travels in
/// request/response bodies, never in server memory.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: RelayConfig,

    /// Upstream fetcher, mode fixed at construction
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    /// Create new application state, building the upstream client once
    pub fn new(config: RelayConfig) -> Result<Self> {
        let upstream = Arc::new(UpstreamClient::from_config(&config)?);
        Ok(Self { config, upstream })
    }
}
