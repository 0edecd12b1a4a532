use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use relic_core::config::UpstreamConfig;
use relic_core::credentials::Caller;
use relic_core::error::RelicError;
use relic_core::graph::{GraphBackend, GraphClient, Operation};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Seen {
    params: HashMap<String, String>,
    headers: HeaderMap,
    body: Value,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn graphql(
    State(log): State<Log>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let operation = body["operationName"].as_str().unwrap_or_default().to_string();
    log.lock().unwrap().push(Seen {
        params,
        headers,
        body,
    });

    match operation.as_str() {
        "DeleteById" => (
            StatusCode::OK,
            json!({"data": {"deleteSavedItem": {"id": "1"}}}).to_string(),
        ),
        "ArchiveById" => (
            StatusCode::OK,
            json!({
                "data": null,
                "errors": [{"message": "gone", "extensions": {"code": "NOT_FOUND"}}]
            })
            .to_string(),
        ),
        "FavoriteById" => (
            StatusCode::TOO_MANY_REQUESTS,
            json!({"errors": [{"message": "slow down"}]}).to_string(),
        ),
        "UnfavoriteById" => (StatusCode::OK, "<html>oops</html>".to_string()),
        "TagsClearById" => (StatusCode::OK, json!({"data": null}).to_string()),
        _ => (StatusCode::BAD_GATEWAY, String::new()),
    }
}

async fn spawn_upstream() -> (GraphClient, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/graphql", post(graphql))
        .with_state(log.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = GraphClient::from_config(&UpstreamConfig {
        url: format!("http://{addr}/graphql"),
        timeout_secs: 5,
        connect_timeout_secs: 2,
        client_name: "relic-test".to_string(),
    })
    .unwrap();
    (client, log)
}

fn caller() -> Caller {
    Caller::new("1234-key", &[])
        .with_access_token("tok")
        .with_locale("de")
        .with_forwarded([("User-Agent", "Legacy/1.0"), ("Cookie", "secret")])
}

#[tokio::test]
async fn test_request_shape() {
    let (client, log) = spawn_upstream().await;
    let data = client
        .execute(
            Operation::DeleteById,
            json!({"id": "1", "timestamp": "2024-01-01T00:00:00.000Z"}),
            &caller(),
        )
        .await
        .unwrap();
    assert_eq!(data, json!({"deleteSavedItem": {"id": "1"}}));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.params["consumer_key"], "1234-key");
    assert_eq!(seen.params["access_token"], "tok");
    assert_eq!(seen.params["locale_lang"], "de");
    assert!(!seen.params.contains_key("guid"));

    assert_eq!(seen.headers["apollographql-client-name"], "relic-test");
    assert_eq!(seen.headers["user-agent"], "Legacy/1.0");
    assert!(seen.headers.get("cookie").is_none());

    assert_eq!(seen.body["operationName"], "DeleteById");
    assert_eq!(seen.body["variables"]["id"], "1");
    assert!(seen.body["query"]
        .as_str()
        .unwrap()
        .contains("mutation DeleteById"));
}

#[tokio::test]
async fn test_error_list_on_200_uses_code() {
    let (client, _log) = spawn_upstream().await;
    let err = client
        .execute(Operation::ArchiveById, json!({}), &caller())
        .await
        .unwrap_err();
    match err {
        RelicError::Graph(ref errors) => {
            assert_eq!(errors.status, 404);
            assert_eq!(errors.first_message(), "gone");
        }
        other => panic!("expected graph error, got {other:?}"),
    }
    assert_eq!(err.graph_code(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_error_list_keeps_http_status() {
    let (client, _log) = spawn_upstream().await;
    let err = client
        .execute(Operation::FavoriteById, json!({}), &caller())
        .await
        .unwrap_err();
    match err {
        RelicError::Graph(errors) => assert_eq!(errors.status, 429),
        other => panic!("expected graph error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unstructured_failures() {
    let (client, _log) = spawn_upstream().await;

    let err = client
        .execute(Operation::UnfavoriteById, json!({}), &caller())
        .await
        .unwrap_err();
    assert!(matches!(err, RelicError::Upstream(ref m) if m.contains("<html>oops</html>")));

    let err = client
        .execute(Operation::TagsClearById, json!({}), &caller())
        .await
        .unwrap_err();
    assert!(matches!(err, RelicError::Upstream(ref m) if m.contains("no data")));

    let err = client
        .execute(Operation::RenameTag, json!({}), &caller())
        .await
        .unwrap_err();
    assert!(matches!(err, RelicError::Upstream(_)));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GraphClient::from_config(&UpstreamConfig {
        url: format!("http://{addr}/graphql"),
        ..UpstreamConfig::default()
    })
    .unwrap();
    let err = client
        .execute(Operation::DeleteById, json!({}), &caller())
        .await
        .unwrap_err();
    assert!(matches!(err, RelicError::Http(_)));
}
