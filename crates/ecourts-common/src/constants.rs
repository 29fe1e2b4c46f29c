//! Shared constants for the eCourts relay.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Default allowed CORS origin (the hosted frontend)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://verdant-cucurucho-13134b.netlify.app";

/// High Court securimage captcha endpoint (cache-buster query appended per fetch)
pub const HIGHCOURT_CAPTCHA_URL: &str =
    "https://hcservices.ecourts.gov.in/hcservices/securimage/securimage_show.php";

/// High Court case status query endpoint
pub const HIGHCOURT_CASE_QUERY_URL: &str =
    "https://hcservices.ecourts.gov.in/hcservices/cases_qry/index_qry.php";

/// District Court captcha endpoint (`&id=<challenge id>` appended per fetch)
pub const DISTRICT_CAPTCHA_URL: &str = "https://lucknow.dcourts.gov.in/?_siwp_captcha";

/// Referer sent upstream for High Court requests when the client supplies none
pub const HIGHCOURT_REFERER: &str = "https://hcservices.ecourts.gov.in/";

/// Referer sent upstream for District Court requests when the client supplies none
pub const DISTRICT_REFERER: &str =
    "https://lucknow.dcourts.gov.in/case-status-search-by-petitioner-respondent/";

/// User agent sent upstream when the client supplies none
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// ScraperAPI relay entry point
pub const SCRAPERAPI_URL: &str = "http://api.scraperapi.com/";

/// Outbound timeout for direct upstream calls (seconds)
pub const DIRECT_TIMEOUT_SECS: u64 = 30;

/// Outbound timeout when routed through the ScraperAPI relay (seconds).
/// The relay adds substantial latency of its own.
pub const RELAY_TIMEOUT_SECS: u64 = 70;

/// Content type assumed when the upstream omits one on a captcha image
pub const FALLBACK_IMAGE_CONTENT_TYPE: &str = "image/png";

/// Opaque failure message for captcha fetches
pub const ERR_CAPTCHA_FETCH: &str = "Failed to fetch captcha image";

/// Opaque failure message for case search submissions
pub const ERR_CASE_SEARCH: &str = "Case verification failed";

/// Fixed form fields for the case status query
pub mod form {
    /// Action code expected by the case query endpoint
    pub const ACTION_CODE: &str = "showRecords";

    /// Application flag marker expected by the case query endpoint
    pub const APP_FLAG: &str = "web";
}
