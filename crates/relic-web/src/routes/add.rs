use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use relic_core::dispatch::Dispatcher;
use relic_core::graph::GraphBackend;
use relic_core::model::Action;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::extract::{Auth, LegacyRequest};
use crate::AppState;

/// Top-level `add` parameters copied into the single add action.
const ADD_FIELDS: &[&str] = &["url", "title", "tags", "item_id", "time"];

pub fn routes<B: GraphBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new().route("/v3/add", get(add_item::<B>).post(add_item::<B>))
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub item: Value,
    pub status: u8,
}

async fn add_item<B: GraphBackend>(
    State(state): State<Arc<AppState<B>>>,
    req: LegacyRequest,
) -> Result<Json<AddResponse>, ApiError> {
    let caller = req.caller(&state.config.api, Auth::AccessToken)?;
    if req.params.non_empty_str("url").is_none() {
        return Err(ApiError::bad_request("url is required"));
    }

    let mut raw = Map::new();
    raw.insert("action".into(), Value::String("add".into()));
    for key in ADD_FIELDS {
        if let Some(value) = req.params.get(key) {
            raw.insert((*key).to_string(), value.clone());
        }
    }
    let action = Action::from_value(&Value::Object(raw), state.clock.now())?;

    let item = Dispatcher::new(&state.backend)
        .perform(&action, &caller)
        .await?;
    Ok(Json(AddResponse { item, status: 1 }))
}
