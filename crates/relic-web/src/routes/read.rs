use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use relic_core::graph::GraphBackend;
use relic_core::model::DetailType;
use relic_core::pagination::{build_envelope, parse_get_query, read_page, GetEnvelope};

use crate::error::ApiError;
use crate::extract::{Auth, LegacyRequest};
use crate::AppState;

pub fn routes<B: GraphBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/v3/get", get(get_items::<B>).post(get_items::<B>))
        .route("/v3/fetch", get(fetch_items::<B>).post(fetch_items::<B>))
}

async fn get_items<B: GraphBackend>(
    State(state): State<Arc<AppState<B>>>,
    req: LegacyRequest,
) -> Result<Json<GetEnvelope>, ApiError> {
    list(&state, &req, DetailType::Simple).await
}

/// Same as `get`, but complete detail unless asked otherwise.
async fn fetch_items<B: GraphBackend>(
    State(state): State<Arc<AppState<B>>>,
    req: LegacyRequest,
) -> Result<Json<GetEnvelope>, ApiError> {
    list(&state, &req, DetailType::Complete).await
}

async fn list<B: GraphBackend>(
    state: &AppState<B>,
    req: &LegacyRequest,
    default_detail: DetailType,
) -> Result<Json<GetEnvelope>, ApiError> {
    let caller = req.caller(&state.config.api, Auth::AccessToken)?;
    let query = parse_get_query(&req.params, &state.config.api, default_detail)?;
    let now = state.clock.now();
    let page = read_page(&state.backend, &query, &caller).await?;
    Ok(Json(build_envelope(&query, page, now, &state.config.api)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use relic_core::graph::{Operation, ScriptedBackend};
    use serde_json::{json, Value};

    use crate::routes::test_support::*;

    fn listing() -> Value {
        json!({"user": {
            "savedItems": {
                "totalCount": 2,
                "edges": [
                    {"cursor": "c1", "node": {
                        "id": "11", "url": "https://a.example", "status": "UNREAD",
                        "isFavorite": false, "createdAt": "2024-03-01T12:00:00.000Z",
                        "tags": [],
                        "item": {"__typename": "Item", "itemId": "11",
                                 "givenUrl": "https://a.example", "title": "A",
                                 "images": null, "authors": [{"id": "9", "name": "Ann"}]}
                    }},
                    {"cursor": "c2", "node": {
                        "id": "12", "url": "https://b.example",
                        "item": {"__typename": "PendingItem", "url": "https://b.example"}
                    }}
                ]
            },
            "tags": null
        }})
    }

    #[tokio::test]
    async fn test_total_only_when_requested() {
        let state =
            state(ScriptedBackend::new().reply(Operation::GetSavedItemsComplete, listing()));

        let with_total = send(
            &state,
            get(&format!("/v3/get?{CREDS}&detailType=complete&total=1")),
        )
        .await;
        assert_eq!(with_total.status(), StatusCode::OK);
        assert_eq!(with_total.headers()["x-source"], "relic-v3-proxy");
        let body = body_json(with_total).await;
        assert_eq!(body["total"], "2");

        for flag in ["", "&total=0"] {
            let url = format!("/v3/get?{CREDS}&detailType=complete{flag}");
            let response = send(&state, get(&url)).await;
            let body = body_json(response).await;
            assert!(body.get("total").is_none(), "total leaked with {flag:?}");
        }
    }

    #[tokio::test]
    async fn test_complete_listing_shape() {
        let state =
            state(ScriptedBackend::new().reply(Operation::GetSavedItemsComplete, listing()));
        let response = send(&state, get(&format!("/v3/fetch?{CREDS}&offset=4"))).await;
        let body = body_json(response).await;

        assert_eq!(body["status"], 1);
        assert_eq!(body["complete"], 1);
        assert_eq!(body["since"], NOW);
        assert_eq!(body["cachetype"], "db");

        let a = &body["list"]["11"];
        assert_eq!(a["given_title"], "A");
        assert_eq!(a["time_added"], "1709294400");
        assert_eq!(a["sort_id"], 4);
        assert_eq!(a["tags"], json!({"": {"item_id": "11", "tag": ""}}));
        assert_eq!(a["authors"]["1"]["name"], "Ann");
        assert!(a.get("images").is_none());

        let pending = &body["list"]["12"];
        assert_eq!(pending["given_url"], "https://b.example");
        assert_eq!(pending["sort_id"], 5);

        let call = &state.backend.calls()[0];
        assert_eq!(call.variables["pagination"], json!({"offset": 4, "limit": 30}));
        assert_eq!(call.caller.access_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_relevance_without_search_is_rejected() {
        let state = state(ScriptedBackend::new());
        let response = send(&state, get(&format!("/v3/get?{CREDS}&sort=relevance"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-error-code"], "130");
        assert_eq!(state.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_uses_search_operation() {
        let state = state(ScriptedBackend::new().reply(
            Operation::SearchSavedItemsSimple,
            json!({"user": {"searchSavedItems": {"totalCount": 0, "edges": []}}}),
        ));
        let response = send(
            &state,
            post_json(
                "/v3/get",
                json!({"consumer_key": "1-a", "access_token": "t", "search": "rust", "taglist": 1}),
            ),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["status"], 2);
        assert_eq!(body["list"], json!([]));
        assert_eq!(body["search_meta"], json!({"search_type": "normal"}));
        assert_eq!(body["tags"], json!([]));
        assert_eq!(state.backend.calls()[0].variables["term"], "rust");
    }

    #[tokio::test]
    async fn test_upstream_forbidden() {
        let state = state(ScriptedBackend::new().reply_error(
            Operation::GetSavedItemsSimple,
            "FORBIDDEN",
            "not yours",
        ));
        let response = send(&state, get(&format!("/v3/get?{CREDS}"))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["x-error-code"], "5200");
        assert_eq!(body_json(response).await, json!({"error": "Something Went Wrong"}));
    }

    #[tokio::test]
    async fn test_upstream_fault_is_500() {
        let backend = ScriptedBackend::new()
            .fail(Operation::GetSavedItemsSimple, "connection refused");
        let state = state(backend);
        let response = send(&state, get(&format!("/v3/get?{CREDS}"))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }
}
