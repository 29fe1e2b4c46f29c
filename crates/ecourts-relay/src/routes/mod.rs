//! HTTP route handlers for the relay.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod captcha;
mod case_search;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origin);

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))

        // Captcha relays (GET kept for older frontend revisions)
        .route(
            "/captcha/highcourt",
            get(captcha::highcourt_query).post(captcha::highcourt),
        )
        .route(
            "/captcha/districtcourt",
            get(captcha::districtcourt_query).post(captcha::districtcourt),
        )

        // Case status search
        .route("/api/case", post(case_search::submit))

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

/// CORS restricted to the single configured frontend origin
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
        Err(_) => {
            tracing::warn!(origin = %allowed_origin, "Invalid allowed_origin; CORS disabled");
            CorsLayer::new()
        }
    }
}
