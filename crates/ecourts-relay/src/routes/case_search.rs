//! Case status search submission.
//!
//! Accepts the solved captcha plus the search parameters, replays them as a
//! browser-style form POST to the High Court case query endpoint, and hands
//! the reply back with the cookie jar intact. The upstream answers with JSON
//! on success and with plain text/HTML for some failure shapes (notably
//! "invalid captcha"), so a body that does not parse as JSON is passed
//! through verbatim rather than rejected.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::error::ApiError;
use crate::state::AppState;
use ecourts_common::constants::{DEFAULT_USER_AGENT, HIGHCOURT_REFERER, form};
use ecourts_common::{CookieJar, CookieJarInput, RelayError};

#[derive(Deserialize, Default)]
pub struct CaseSearchRequest {
    captcha: Option<String>,
    petres_name: Option<String>,
    rgyear: Option<String>,
    #[serde(rename = "caseStatusSearchType")]
    case_status_search_type: Option<String>,
    f: Option<String>,
    court_code: Option<String>,
    state_code: Option<String>,
    court_complex_code: Option<String>,
    cookies: Option<CookieJarInput>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

#[derive(Serialize)]
pub struct CaseSearchResponse {
    #[serde(rename = "sessionID")]
    session_id: Option<String>,
    data: Value,
    cookies: CookieJar,
}

/// Submit a case status search to the High Court portal
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut payload): Json<CaseSearchRequest>,
) -> Result<Json<CaseSearchResponse>, ApiError> {
    let jar: CookieJar = payload
        .cookies
        .take()
        .map(CookieJar::from)
        .unwrap_or_default();
    let cookie_header = jar.to_header_value();

    let missing = missing_fields(&payload, &cookie_header);
    if !missing.is_empty() {
        return Err(RelayError::MissingFields(missing).into());
    }

    let form_body = build_form_body(&payload);

    let reply = state
        .upstream
        .submit_form(
            &state.config.upstream.highcourt_case_url,
            form_body,
            &jar,
            headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(HIGHCOURT_REFERER),
            headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(DEFAULT_USER_AGENT),
        )
        .await
        .map_err(|err| ApiError::from(err).with_details("upstream case query failed"))?;

    // Deliberate leniency: the portal's "invalid captcha" signal arrives as
    // JSON or as plain text depending on its mood; both must reach the caller.
    let data = parse_or_passthrough(reply.body);

    // Echo the submitted jar back when the portal set nothing, so the
    // caller never loses session continuity.
    let mut cookies = jar;
    cookies.merge(reply.cookies);

    let session_id = payload
        .session_id
        .filter(|s| !s.trim().is_empty())
        .or_else(|| cookies.session_id().map(str::to_owned));

    Ok(Json(CaseSearchResponse {
        session_id,
        data,
        cookies,
    }))
}

/// Collect every missing required field name, in a stable order
fn missing_fields(payload: &CaseSearchRequest, cookie_header: &str) -> Vec<String> {
    let checks: [(&Option<String>, &str); 8] = [
        (&payload.captcha, "captcha"),
        (&payload.petres_name, "petres_name"),
        (&payload.rgyear, "rgyear"),
        (&payload.case_status_search_type, "caseStatusSearchType"),
        (&payload.f, "f"),
        (&payload.court_code, "court_code"),
        (&payload.state_code, "state_code"),
        (&payload.court_complex_code, "court_complex_code"),
    ];

    let mut missing: Vec<String> = checks
        .iter()
        .filter(|(value, _)| is_blank(value))
        .map(|(_, name)| name.to_string())
        .collect();

    if cookie_header.is_empty() {
        missing.push("cookiesString".to_string());
    }

    missing
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Build the URL-encoded form body the case query endpoint expects.
/// Callers only reach this after validation, so absent fields (impossible
/// by then) would encode as empty strings rather than panic.
fn build_form_body(payload: &CaseSearchRequest) -> String {
    let field = |value: &Option<String>| encode(value.as_deref().unwrap_or("")).into_owned();

    format!(
        "action_code={}&court_code={}&state_code={}&court_complex_code={}\
         &caseStatusSearchType={}&captcha={}&petres_name={}&rgyear={}&f={}&appFlag={}",
        form::ACTION_CODE,
        field(&payload.court_code),
        field(&payload.state_code),
        field(&payload.court_complex_code),
        field(&payload.case_status_search_type),
        field(&payload.captcha),
        field(&payload.petres_name),
        field(&payload.rgyear),
        field(&payload.f),
        form::APP_FLAG,
    )
}

fn parse_or_passthrough(body: String) -> Value {
    serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body))
}
