// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    error::AppError,
    handlers::{health, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * `POST /api/generate-quiz`, optionally rate limited per client IP.
/// * `GET /api/health`.
/// * Applies global middleware (Trace, CORS).
///
/// When rate limiting is enabled the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let mut quiz_routes = Router::new().route("/generate-quiz", post(quiz::generate_quiz));

    if let Some(secs) = state.config.rate_limit_replenish_secs {
        match GovernorConfigBuilder::default()
            .per_second(secs)
            .burst_size(state.config.rate_limit_burst.max(1))
            .finish()
        {
            Some(governor_conf) => {
                let limiter =
                    GovernorLayer::new(Arc::new(governor_conf)).error_handler(rate_limit_response);
                quiz_routes = quiz_routes.layer(limiter);
            }
            None => tracing::warn!("Invalid rate limit settings, rate limiting disabled"),
        }
    }

    let api_routes = Router::new()
        .route("/health", get(health::health))
        .merge(quiz_routes);

    Router::new()
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Renders limiter rejections with the same `{ "error": ... }` body as every other failure.
fn rate_limit_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, .. } => AppError::TooManyRequests(format!(
            "Too many requests. Please wait {}s before trying again.",
            wait_time
        ))
        .into_response(),
        other => AppError::InternalServerError(other.to_string()).into_response(),
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
