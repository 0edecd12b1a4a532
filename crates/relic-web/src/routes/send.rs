use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use relic_core::dispatch::Dispatcher;
use relic_core::graph::GraphBackend;
use relic_core::model::{parse_actions, ActionBatch, BatchResult};
use serde::Serialize;

use crate::error::ApiError;
use crate::extract::{Auth, LegacyRequest};
use crate::AppState;

pub fn routes<B: GraphBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/v3/send", get(send::<B>).post(send::<B>))
        .route("/v3/send_guid", get(send_guid::<B>).post(send_guid::<B>))
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: u8,
    #[serde(flatten)]
    pub results: BatchResult,
}

async fn send<B: GraphBackend>(
    State(state): State<Arc<AppState<B>>>,
    req: LegacyRequest,
) -> Result<Json<SendResponse>, ApiError> {
    run_batch(&state, &req, Auth::AccessToken).await
}

/// Unauthenticated variant: identifies the device by `guid` instead of a token.
async fn send_guid<B: GraphBackend>(
    State(state): State<Arc<AppState<B>>>,
    req: LegacyRequest,
) -> Result<Json<SendResponse>, ApiError> {
    run_batch(&state, &req, Auth::Guid).await
}

async fn run_batch<B: GraphBackend>(
    state: &AppState<B>,
    req: &LegacyRequest,
    auth: Auth,
) -> Result<Json<SendResponse>, ApiError> {
    let caller = req.caller(&state.config.api, auth)?;
    let raw = req
        .params
        .get("actions")
        .ok_or_else(|| ApiError::bad_request("actions is required"))?;
    let actions = parse_actions(raw, state.clock.now())?;

    let batch = ActionBatch { actions, caller };
    let results = Dispatcher::new(&state.backend).dispatch(&batch).await;
    tracing::debug!(actions = results.len(), "batch dispatched");

    Ok(Json(SendResponse { status: 1, results }))
}
