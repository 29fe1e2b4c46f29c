//! Captcha relay endpoints.
//!
//! Both portals gate their case search behind an image captcha that a human
//! solves in the frontend. The relay fetches the image with the client's
//! cookie jar attached, hands back a base64 data URI plus whatever cookies
//! the portal set, and keeps no state of its own.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::FetchedImage;
use ecourts_common::constants::{
    DEFAULT_USER_AGENT, DISTRICT_REFERER, FALLBACK_IMAGE_CONTENT_TYPE, HIGHCOURT_REFERER,
};
use ecourts_common::{CookieJar, CookieJarInput, RelayError};

#[derive(Deserialize, Default)]
pub struct HighCourtRequest {
    cookies: Option<CookieJarInput>,
}

#[derive(Deserialize, Default)]
pub struct DistrictCourtRequest {
    cookies: Option<CookieJarInput>,
    id: Option<String>,
}

/// GET-variant parameters: the jar arrives as a raw `a=1; b=2` string
#[derive(Deserialize, Default)]
pub struct CaptchaQuery {
    cookies: Option<String>,
    id: Option<String>,
}

#[derive(Serialize)]
pub struct CaptchaResponse {
    #[serde(rename = "captchaImageBase64")]
    captcha_image_base64: String,
    cookies: CookieJar,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

/// High Court captcha (POST, canonical jar form)
pub async fn highcourt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<HighCourtRequest>,
) -> Result<Json<CaptchaResponse>, ApiError> {
    let jar = require_cookies(payload.cookies.map(CookieJar::from))?;
    fetch_highcourt(&state, &headers, jar).await
}

/// High Court captcha (GET, raw cookie string for older frontends)
pub async fn highcourt_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CaptchaQuery>,
) -> Result<Json<CaptchaResponse>, ApiError> {
    let jar = require_cookies(params.cookies.as_deref().map(CookieJar::from_header_str))?;
    fetch_highcourt(&state, &headers, jar).await
}

/// District Court captcha (POST). The portal binds the challenge image to a
/// server-side id, so the caller must supply one.
pub async fn districtcourt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<DistrictCourtRequest>,
) -> Result<Json<CaptchaResponse>, ApiError> {
    let jar = require_cookies(payload.cookies.map(CookieJar::from))?;
    let id = require_id(payload.id)?;
    fetch_districtcourt(&state, &headers, jar, &id).await
}

/// District Court captcha (GET, raw cookie string for older frontends)
pub async fn districtcourt_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CaptchaQuery>,
) -> Result<Json<CaptchaResponse>, ApiError> {
    let jar = require_cookies(params.cookies.as_deref().map(CookieJar::from_header_str))?;
    let id = require_id(params.id)?;
    fetch_districtcourt(&state, &headers, jar, &id).await
}

async fn fetch_highcourt(
    state: &AppState,
    headers: &HeaderMap,
    jar: CookieJar,
) -> Result<Json<CaptchaResponse>, ApiError> {
    // Cache buster so every fetch yields a fresh image
    let url = format!(
        "{}?{}",
        state.config.upstream.highcourt_captcha_url,
        chrono::Utc::now().timestamp_millis()
    );

    let image = state
        .upstream
        .fetch_image(
            &url,
            &jar,
            header_or(headers, header::REFERER, HIGHCOURT_REFERER),
            header_or(headers, header::USER_AGENT, DEFAULT_USER_AGENT),
        )
        .await?;

    Ok(Json(build_response(jar, image)))
}

async fn fetch_districtcourt(
    state: &AppState,
    headers: &HeaderMap,
    jar: CookieJar,
    id: &str,
) -> Result<Json<CaptchaResponse>, ApiError> {
    let url = format!(
        "{}&id={}",
        state.config.upstream.district_captcha_url,
        urlencoding::encode(id)
    );

    let image = state
        .upstream
        .fetch_image(
            &url,
            &jar,
            header_or(headers, header::REFERER, DISTRICT_REFERER),
            header_or(headers, header::USER_AGENT, DEFAULT_USER_AGENT),
        )
        .await?;

    Ok(Json(build_response(jar, image)))
}

fn require_cookies(jar: Option<CookieJar>) -> Result<CookieJar, ApiError> {
    jar.ok_or_else(|| RelayError::MissingFields(vec!["cookies".to_string()]).into())
}

fn require_id(id: Option<String>) -> Result<String, ApiError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(RelayError::MissingFields(vec!["id".to_string()]).into()),
    }
}

fn header_or<'a>(headers: &'a HeaderMap, name: header::HeaderName, fallback: &'a str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback)
}

/// Merge portal-set cookies over the submitted jar and wrap the image as a
/// data URI, so the frontend keeps session continuity in one round trip.
fn build_response(mut jar: CookieJar, image: FetchedImage) -> CaptchaResponse {
    jar.merge(image.cookies);

    let content_type = image
        .content_type
        .unwrap_or_else(|| FALLBACK_IMAGE_CONTENT_TYPE.to_string());

    let captcha_image_base64 =
        format!("data:{};base64,{}", content_type, STANDARD.encode(&image.bytes));

    let session_id = jar.session_id().map(str::to_owned);

    CaptchaResponse {
        captcha_image_base64,
        cookies: jar,
        session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelayConfig, UpstreamTargets};
    use crate::routes::create_router;
    use crate::state::AppState;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// State whose upstream targets point at a closed local port, so any
    /// test that does reach the fetcher fails fast without external traffic.
    fn test_state() -> AppState {
        let config = RelayConfig {
            upstream: UpstreamTargets {
                highcourt_captcha_url: "http://127.0.0.1:9/captcha.php".to_string(),
                highcourt_case_url: "http://127.0.0.1:9/case.php".to_string(),
                district_captcha_url: "http://127.0.0.1:9/?_siwp_captcha".to_string(),
            },
            direct_timeout_secs: 2,
            ..RelayConfig::default()
        };
        AppState::new(config).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_highcourt_without_cookies_is_rejected() {
        let app = create_router(test_state());
        let response = app.oneshot(json_post("/captcha/highcourt", "{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("cookies"));
    }

    #[tokio::test]
    async fn test_districtcourt_without_id_is_rejected_before_any_fetch() {
        let app = create_router(test_state());
        let response = app
            .oneshot(json_post(
                "/captcha/districtcourt",
                r#"{"cookies":{"PHPSESSID":"x"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("id"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_opaque_500() {
        let app = create_router(test_state());
        let response = app
            .oneshot(json_post(
                "/captcha/highcourt",
                r#"{"cookies":{"PHPSESSID":"x"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("Failed to fetch captcha image"));
    }

    #[tokio::test]
    async fn test_get_variant_accepts_raw_cookie_string() {
        let app = create_router(test_state());
        let request = Request::builder()
            .method("GET")
            .uri("/captcha/districtcourt?cookies=a%3D1%3B%20b%3D2&id=42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        // Validation passed (cookie string and id accepted); only the
        // unreachable upstream makes it fail.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_raw_string_jar_in_post_body_is_accepted() {
        let app = create_router(test_state());
        let response = app
            .oneshot(json_post(
                "/captcha/highcourt",
                r#"{"cookies":"PHPSESSID=abc; lang=en"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_data_uri_defaults_to_png() {
        let image = FetchedImage {
            bytes: vec![1, 2, 3],
            content_type: None,
            cookies: CookieJar::new(),
        };
        let response = build_response(CookieJar::new(), image);
        assert!(response.captcha_image_base64.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_reply_without_set_cookie_echoes_submitted_jar() {
        let mut submitted = CookieJar::new();
        submitted.insert("PHPSESSID", "abc");

        let image = FetchedImage {
            bytes: vec![0xFF],
            content_type: Some("image/png".to_string()),
            cookies: CookieJar::new(),
        };

        let response = build_response(submitted.clone(), image);
        assert_eq!(response.cookies, submitted);
    }

    #[test]
    fn test_portal_cookies_merge_over_submitted_jar() {
        let mut submitted = CookieJar::new();
        submitted.insert("JSESSIONID", "old");
        submitted.insert("lang", "en");

        let image = FetchedImage {
            bytes: vec![0xFF],
            content_type: Some("image/jpeg".to_string()),
            cookies: CookieJar::from_set_cookie_values(["JSESSIONID=new; Path=/"]),
        };

        let response = build_response(submitted, image);
        assert_eq!(response.cookies.get("JSESSIONID"), Some("new"));
        assert_eq!(response.cookies.get("lang"), Some("en"));
        assert_eq!(response.session_id.as_deref(), Some("new"));
    }
}
