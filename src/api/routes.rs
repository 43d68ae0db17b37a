//! HTTP API route definitions.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::docs::ApiDoc;
use super::handlers::{
    confirmed, countries, country, current, current_list, deaths, health, recovered,
    render_metrics, timeseries, total, AppState,
};
use crate::metrics;

/// Create the API router.
pub fn create_router(state: AppState, cors_allow_any: bool) -> Router {
    let router = Router::new()
        // Case data
        .route("/current", get(current))
        .route("/current_list", get(current_list))
        .route("/total", get(total))
        .route("/confirmed", get(confirmed))
        .route("/deaths", get(deaths))
        .route("/recovered", get(recovered))
        .route("/countries", get(countries))
        .route("/country/:name", get(country))
        .route("/timeseries/:case", get(timeseries))
        // Operations
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route_layer(middleware::from_fn(track_latency))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_allow_any {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
    } else {
        router
    }
}

/// Record request latency against the matched route template.
async fn track_latency(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let start = Instant::now();

    let response = next.run(request).await;
    metrics::record_http_latency(start, &endpoint);
    response
}
