use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::storage::Database;
use crate::ui::{self, Icons};

pub mod error;
pub mod routes;

pub use error::{ApiError, ErrorResponse, NOT_FOUND_DETAIL};

/// Server state
pub struct AppState {
    pub database: Database,
}

impl AppState {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

/// Build the item router; `/items` and `/items/` are both served
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/items", get(routes::list_items).post(routes::create_item))
        .route("/items/", get(routes::list_items).post(routes::create_item))
        .route(
            "/items/{id}",
            get(routes::get_item)
                .put(routes::update_item)
                .delete(routes::delete_item),
        )
        .fallback(routes::fallback)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C.
///
/// `database` must already be connected; the listener is only bound
/// afterwards, so no request is accepted before the store is reachable.
pub async fn start_server(addr: SocketAddr, database: Database) -> anyhow::Result<()> {
    let source = database.source().to_string();
    let state = Arc::new(AppState::new(database));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", addr);
    ui::status(Icons::DATABASE, "Database", &source);
    ui::success(&format!("Server running at http://{}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DataSource;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(Database::open_in_memory().unwrap()));
        (router(Arc::clone(&state)), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, body: Value) -> Value {
        let (status, created) = send(app, Method::POST, "/items/", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        created
    }

    fn count(state: &AppState) -> usize {
        state.database.session().unwrap().count().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let (app, _) = test_app();
        let created = create(&app, json!({"title": "A", "description": "B"})).await;
        assert_eq!(created["title"], "A");
        assert_eq!(created["description"], "B");

        let id = created["id"].as_i64().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_without_description_returns_null() {
        let (app, _) = test_app();
        let created = create(&app, json!({"title": "only"})).await;
        assert_eq!(created["description"], Value::Null);
    }

    #[tokio::test]
    async fn test_create_without_title_is_rejected() {
        let (app, state) = test_app();
        let (status, body) = send(&app, Method::POST, "/items/", Some(json!({"description": "B"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("title"));
        assert_eq!(count(&state), 0);
    }

    #[tokio::test]
    async fn test_create_with_wrong_type_is_rejected() {
        let (app, state) = test_app();
        let (status, body) = send(&app, Method::POST, "/items", Some(json!({"title": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
        assert_eq!(count(&state), 0);
    }

    #[tokio::test]
    async fn test_create_with_malformed_json_is_rejected() {
        let (app, _) = test_app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/items/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_storage_failure_is_bad_request() {
        let (app, state) = test_app();
        state
            .database
            .session()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_all BEFORE INSERT ON items \
                 BEGIN SELECT RAISE(ABORT, 'insert refused'); END;",
            )
            .unwrap();

        let (status, body) = send(&app, Method::POST, "/items/", Some(json!({"title": "A"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Erro ao criar item:"));
        assert!(detail.contains("insert refused"));
        assert_eq!(count(&state), 0);
    }

    #[tokio::test]
    async fn test_update_storage_failure_is_internal_error() {
        let (app, state) = test_app();
        let created = create(&app, json!({"title": "A", "description": "B"})).await;
        state
            .database
            .session()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_updates BEFORE UPDATE ON items \
                 BEGIN SELECT RAISE(ABORT, 'update refused'); END;",
            )
            .unwrap();

        let uri = format!("/items/{}", created["id"]);
        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"title": "C"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().starts_with("Erro interno:"));

        let (_, unchanged) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (app, _) = test_app();
        let created = create(&app, json!({"title": "A", "description": "B"})).await;
        let uri = format!("/items/{}", created["id"]);

        let (status, updated) = send(&app, Method::PUT, &uri, Some(json!({"title": "C"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "C");
        assert_eq!(updated["description"], "B");
        assert_eq!(updated["id"], created["id"]);

        let (status, cleared) = send(&app, Method::PUT, &uri, Some(json!({"description": null}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["title"], "C");
        assert_eq!(cleared["description"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_with_null_title_is_rejected() {
        let (app, _) = test_app();
        let created = create(&app, json!({"title": "A"})).await;
        let uri = format!("/items/{}", created["id"]);

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"title": null}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(fetched["title"], "A");
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let (app, _) = test_app();
        let expected = json!({"detail": NOT_FOUND_DETAIL});

        let (status, body) = send(&app, Method::GET, "/items/404", None).await;
        assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));

        let (status, body) = send(&app, Method::PUT, "/items/404", Some(json!({"title": "x"}))).await;
        assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));

        let (status, body) = send(&app, Method::DELETE, "/items/404", None).await;
        assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));
    }

    #[tokio::test]
    async fn test_delete_then_lookup() {
        let (app, _) = test_app();
        let created = create(&app, json!({"title": "A"})).await;
        let id = created["id"].as_i64().unwrap();
        let uri = format!("/items/{id}");

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "success", "message": "Item deletado com sucesso", "id": id})
        );

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Deleting again reports absence, not a failure
        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], NOT_FOUND_DETAIL);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let (app, _) = test_app();
        let first = create(&app, json!({"title": "a"})).await["id"].as_i64().unwrap();
        let second = create(&app, json!({"title": "b"})).await["id"].as_i64().unwrap();
        send(&app, Method::DELETE, &format!("/items/{second}"), None).await;
        let third = create(&app, json!({"title": "c"})).await["id"].as_i64().unwrap();

        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (app, _) = test_app();
        for i in 0..5 {
            create(&app, json!({"title": format!("item {i}")})).await;
        }

        let (status, all) = send(&app, Method::GET, "/items/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 5);
        assert_eq!(all[0]["title"], "item 0");

        let (_, page) = send(&app, Method::GET, "/items/?skip=1&limit=3", None).await;
        let titles: Vec<_> = page.as_array().unwrap().iter().map(|i| i["title"].clone()).collect();
        assert_eq!(titles, [json!("item 1"), json!("item 2"), json!("item 3")]);

        let (_, tail) = send(&app, Method::GET, "/items?skip=3&limit=10", None).await;
        assert_eq!(tail.as_array().unwrap().len(), 2);

        let (status, past_end) = send(&app, Method::GET, "/items/?skip=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(past_end, json!([]));
    }

    #[tokio::test]
    async fn test_list_rejects_negative_skip() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/items/?skip=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_non_integer_id_is_rejected() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/items/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_unsupported_method_is_json() {
        let (app, _) = test_app();
        let created = create(&app, json!({"title": "A"})).await;
        let uri = format!("/items/{}", created["id"]);

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"title": "B"}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"detail": "Method Not Allowed"}));

        let (status, body) = send(&app, Method::DELETE, "/items/", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["detail"], "Method Not Allowed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let database = Database::connect(DataSource::File(dir.path().join("items.db"))).unwrap();
        let app = router(Arc::new(AppState::new(database)));
        let created = create(&app, json!({"title": "A", "description": "B"})).await;
        let uri = format!("/items/{}", created["id"]);

        let requests: Vec<_> = (0..32)
            .map(|i| {
                let app = app.clone();
                let uri = uri.clone();
                tokio::spawn(async move {
                    send(&app, Method::PUT, &uri, Some(json!({"title": format!("t{i}")}))).await
                })
            })
            .collect();

        for request in requests {
            let (status, body) = request.await.unwrap();
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(body["description"], "B");
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Not Found");
    }
}
