use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use entity_crud::{
    router, AppError, AppState, ChangeSet, DataContext, Entity, EntityPredicate, InMemoryDataContext,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const BASE: &str = "/api/entities";

/// Wraps the in-memory context and counts commits.
struct CountingContext {
    inner: InMemoryDataContext,
    saves: AtomicUsize,
}

#[async_trait]
impl DataContext for CountingContext {
    async fn find(&self, id: i32) -> Result<Option<Entity>, AppError> {
        self.inner.find(id).await
    }

    async fn first(&self, predicate: &EntityPredicate) -> Result<Option<Entity>, AppError> {
        self.inner.first(predicate).await
    }

    async fn filter(&self, predicate: &EntityPredicate) -> Result<Vec<Entity>, AppError> {
        self.inner.filter(predicate).await
    }

    async fn save_changes(&self, changes: ChangeSet) -> Result<Vec<Entity>, AppError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_changes(changes).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

/// Every call fails like an unreachable database.
struct BrokenContext;

#[async_trait]
impl DataContext for BrokenContext {
    async fn find(&self, _id: i32) -> Result<Option<Entity>, AppError> {
        Err(AppError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn first(&self, _predicate: &EntityPredicate) -> Result<Option<Entity>, AppError> {
        Err(AppError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn filter(&self, _predicate: &EntityPredicate) -> Result<Vec<Entity>, AppError> {
        Err(AppError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn save_changes(&self, _changes: ChangeSet) -> Result<Vec<Entity>, AppError> {
        Err(AppError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(AppError::Db(sqlx::Error::PoolTimedOut))
    }
}

fn entity(id: i32, p1: &str, p2: &str) -> Entity {
    let mut e = Entity::new(p1, p2);
    e.id = id;
    e
}

fn setup(seed: Vec<Entity>) -> (Router, Arc<CountingContext>) {
    let ctx = Arc::new(CountingContext {
        inner: InMemoryDataContext::with_entities(seed),
        saves: AtomicUsize::new(0),
    });
    let state = AppState::new(ctx.clone(), BASE);
    (router(state, 64 * 1024), ctx)
}

fn seeded() -> (Router, Arc<CountingContext>) {
    setup(vec![
        entity(1, "red", "small"),
        entity(2, "red", "large"),
        entity(3, "blue", "small"),
        entity(4, "red", "small"),
    ])
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(s) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(s.to_string())
        }
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json, location)
}

// ── Reads ──

#[tokio::test]
async fn get_and_search_return_the_same_entity() {
    let (r, _) = seeded();
    for id in 1..=4 {
        let (s1, by_id, _) = call(&r, "GET", &format!("{BASE}/{id}"), None).await;
        let (s2, found, _) = call(&r, "GET", &format!("{BASE}/search/{id}"), None).await;
        assert_eq!(s1, StatusCode::OK);
        assert_eq!(s2, StatusCode::OK);
        assert_eq!(by_id, found);
        assert_eq!(by_id["id"], json!(id));
    }
}

#[tokio::test]
async fn missing_ids_are_not_found_with_empty_body() {
    let (r, _) = seeded();
    let (s, body, _) = call(&r, "GET", &format!("{BASE}/99"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
    let (s, body, _) = call(&r, "GET", &format!("{BASE}/search/99"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn non_integer_id_is_bad_request_with_empty_body() {
    let (r, ctx) = seeded();
    for (method, uri) in [
        ("GET", format!("{BASE}/abc")),
        ("GET", format!("{BASE}/search/abc")),
        ("DELETE", format!("{BASE}/1.5")),
        ("GET", format!("{BASE}/99999999999")),
    ] {
        let (s, body, _) = call(&r, method, &uri, None).await;
        assert_eq!(s, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body, Value::Null, "{method} {uri}");
    }
    let (s, body, _) = call(&r, "PUT", &format!("{BASE}/abc"), Some(r#"{"id": 1}"#)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn filter_returns_exact_matches_in_id_order() {
    let (r, _) = seeded();
    let (s, body, _) = call(&r, "GET", &format!("{BASE}/filter?property1=red&property2=small"), None).await;
    assert_eq!(s, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 4]);
}

#[tokio::test]
async fn filter_without_matches_is_empty_list() {
    let (r, _) = seeded();
    let (s, body, _) = call(&r, "GET", &format!("{BASE}/filter?property1=RED&property2=small"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body, json!([]));
}

// ── Create ──

#[tokio::test]
async fn create_assigns_id_and_sets_location() {
    let (r, ctx) = seeded();
    let (s, body, location) = call(
        &r,
        "POST",
        BASE,
        Some(r#"{"id": 500, "property1": "green", "property2": "tiny", "weight": 1.5}"#),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(body["id"], json!(5));
    assert_eq!(body["property1"], json!("green"));
    assert_eq!(body["weight"], json!(1.5));
    assert_eq!(location.as_deref(), Some("/api/entities/5"));
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 1);

    let (s, fetched, _) = call(&r, "GET", &location.unwrap(), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn create_without_body_is_bad_request() {
    let (r, ctx) = setup(Vec::new());
    let (s, _, _) = call(&r, "POST", BASE, None).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _, _) = call(&r, "POST", BASE, Some("null")).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _, _) = call(&r, "POST", BASE, Some("{broken")).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 0);
    assert!(ctx.inner.is_empty().await);
}

#[tokio::test]
async fn create_accepts_trailing_slash_and_null_properties() {
    let (r, _) = seeded();
    let (s, body, location) = call(
        &r,
        "POST",
        &format!("{BASE}/"),
        Some(r#"{"property1": null, "property2": "tiny"}"#),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 5, "property1": "", "property2": "tiny"}));
    assert_eq!(location.as_deref(), Some("/api/entities/5"));
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let ctx = Arc::new(InMemoryDataContext::new());
    let r = router(AppState::new(ctx.clone(), BASE), 64);
    let padding = "x".repeat(200);
    let body = format!(r#"{{"property1": "{padding}", "property2": "b"}}"#);
    let (s, body, _) = call(&r, "POST", BASE, Some(&body)).await;
    assert_eq!(s, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, Value::Null);
    assert!(ctx.is_empty().await);
}

// ── Update ──

#[tokio::test]
async fn update_overwrites_mutable_fields() {
    let (r, ctx) = seeded();
    let (s, _, _) = call(
        &r,
        "PUT",
        &format!("{BASE}/2"),
        Some(r#"{"id": 2, "property1": "violet", "property2": "medium", "note": "repainted"}"#),
    )
    .await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 1);

    let (_, body, _) = call(&r, "GET", &format!("{BASE}/2"), None).await;
    assert_eq!(
        body,
        json!({"id": 2, "property1": "violet", "property2": "medium", "note": "repainted"})
    );
}

#[tokio::test]
async fn update_rejects_id_mismatch_and_missing_body() {
    let (r, ctx) = seeded();
    let (s, _, _) = call(&r, "PUT", &format!("{BASE}/2"), Some(r#"{"id": 3, "property1": "x"}"#)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _, _) = call(&r, "PUT", &format!("{BASE}/2"), Some(r#"{"property1": "x"}"#)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _, _) = call(&r, "PUT", &format!("{BASE}/2"), None).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 0);

    let (_, body, _) = call(&r, "GET", &format!("{BASE}/2"), None).await;
    assert_eq!(body["property1"], json!("red"));
}

#[tokio::test]
async fn update_with_null_property_clears_it() {
    let (r, ctx) = seeded();
    let (s, _, _) = call(
        &r,
        "PUT",
        &format!("{BASE}/2"),
        Some(r#"{"id": 2, "property1": null, "property2": "z"}"#),
    )
    .await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 1);
    let (_, body, _) = call(&r, "GET", &format!("{BASE}/2"), None).await;
    assert_eq!(body, json!({"id": 2, "property1": "", "property2": "z"}));
}

#[tokio::test]
async fn update_of_missing_entity_is_not_found() {
    let (r, ctx) = seeded();
    let (s, _, _) = call(&r, "PUT", &format!("{BASE}/42"), Some(r#"{"id": 42, "property1": "x"}"#)).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 0);
}

// ── Delete ──

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let (r, ctx) = seeded();
    let (s, _, _) = call(&r, "DELETE", &format!("{BASE}/3"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    let (s, _, _) = call(&r, "GET", &format!("{BASE}/3"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    let (s, _, _) = call(&r, "DELETE", &format!("{BASE}/3"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.inner.len().await, 3);
}

#[tokio::test]
async fn bulk_delete_removes_all_matches_in_one_commit() {
    let (r, ctx) = seeded();
    let (s, _, _) = call(&r, "DELETE", &format!("{BASE}/bulk?property1=red&property2=small"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 1);

    let (s, body, _) = call(&r, "GET", &format!("{BASE}/filter?property1=red&property2=small"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body, json!([]));
    let (s, _, _) = call(&r, "GET", &format!("{BASE}/2"), None).await;
    assert_eq!(s, StatusCode::OK);
}

#[tokio::test]
async fn bulk_delete_without_matches_is_not_found() {
    let (r, ctx) = seeded();
    let (s, body, _) = call(&r, "DELETE", &format!("{BASE}/bulk?property1=green&property2=small"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
    assert_eq!(ctx.saves.load(Ordering::SeqCst), 0);
    assert_eq!(ctx.inner.len().await, 4);
}

// ── Failures and common routes ──

#[tokio::test]
async fn store_failure_is_server_error() {
    let state = AppState::new(Arc::new(BrokenContext), BASE);
    let r = router(state, 64 * 1024);
    let (s, body, _) = call(&r, "GET", &format!("{BASE}/1"), None).await;
    assert_eq!(s, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, Value::Null);
    let (s, body, _) = call(&r, "GET", "/ready", None).await;
    assert_eq!(s, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("degraded"));
}

#[tokio::test]
async fn health_ready_and_version() {
    let (r, _) = setup(Vec::new());
    let (s, body, _) = call(&r, "GET", "/health", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    let (s, body, _) = call(&r, "GET", "/ready", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["database"], json!("ok"));
    let (_, body, _) = call(&r, "GET", "/version", None).await;
    assert_eq!(body["name"], json!("entity-crud"));
}
