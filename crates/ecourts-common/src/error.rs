//! Common error types for the eCourts relay.

use thiserror::Error;

/// Errors surfaced by the relay components
#[derive(Debug, Error)]
pub enum RelayError {
    /// Client omitted one or more required request fields
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Upstream transport failure, timeout, or non-success status.
    /// Carries only the opaque per-endpoint message; the cause is logged
    /// server-side and never distinguished to the caller.
    #[error("{0}")]
    UpstreamFetch(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingFields(_) => 400,
            Self::UpstreamFetch(_) => 500,
            Self::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_names_every_field() {
        let err = RelayError::MissingFields(vec!["captcha".into(), "cookiesString".into()]);
        assert_eq!(err.to_string(), "Missing required fields: captcha, cookiesString");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_upstream_fetch_is_opaque() {
        let err = RelayError::UpstreamFetch(crate::constants::ERR_CAPTCHA_FETCH);
        assert_eq!(err.to_string(), "Failed to fetch captcha image");
        assert_eq!(err.status_code(), 500);
    }
}
