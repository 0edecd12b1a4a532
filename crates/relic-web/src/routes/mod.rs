pub mod add;
pub mod read;
pub mod send;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::routing::get;
use axum::Router;
use relic_core::graph::GraphBackend;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::AppState;

/// Identifies this proxy's responses to the infrastructure in front of it.
pub const SOURCE_HEADER: &str = "x-source";
pub const SOURCE_VALUE: &str = "relic-v3-proxy";

pub fn router<B: GraphBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/health", get(health))
        .merge(read::routes())
        .merge(add::routes())
        .merge(send::routes())
        .fallback(not_found)
}

/// The full application: routes, state, and the response layers.
pub fn app<B: GraphBackend + 'static>(state: Arc<AppState<B>>) -> Router {
    router()
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(SOURCE_HEADER),
            HeaderValue::from_static(SOURCE_VALUE),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}
