use std::sync::Arc;

use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use back::store::{
    memory::MemoryStore, NewTodo, StoreError, TodoChanges, TodoEntity, TodoId, TodoStore,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracker_api::v1::{ErrorBody, Priority, Status, Todo};

fn app() -> Router {
    back::app(Arc::new(MemoryStore::new()))
}

const DISK_ERROR: &str = "disk /dev/sda1 unreadable";

/// Fails every call the way a broken backend would.
struct BrokenStore;

impl BrokenStore {
    fn err() -> StoreError {
        StoreError::Io(std::io::Error::other(DISK_ERROR))
    }
}

#[async_trait]
impl TodoStore for BrokenStore {
    async fn get(&self, _id: TodoId) -> Result<TodoEntity, StoreError> {
        Err(Self::err())
    }

    async fn list(&self) -> Result<Vec<TodoEntity>, StoreError> {
        Err(Self::err())
    }

    async fn create(&self, _todo: NewTodo) -> Result<TodoEntity, StoreError> {
        Err(Self::err())
    }

    async fn update(&self, _id: TodoId, _changes: TodoChanges) -> Result<TodoEntity, StoreError> {
        Err(Self::err())
    }

    async fn delete(&self, _id: TodoId) -> Result<(), StoreError> {
        Err(Self::err())
    }
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn create(app: &Router, body: Value) -> Todo {
    let resp = send(app, json_request("POST", "/api/todos", body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- list ---

#[tokio::test]
async fn list_todos_empty_is_an_array() {
    let resp = send(&app(), empty_request("GET", "/api/todos")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!([]));
}

// --- create ---

#[tokio::test]
async fn create_todo_applies_defaults() {
    let app = app();
    let todo = create(&app, json!({ "name": "Buy milk", "estimatedTimeSec": 10 })).await;

    assert_eq!(todo.name, "Buy milk");
    assert_eq!(todo.estimated_time_sec, 10);
    assert_eq!(todo.actual_time_sec, 0);
    assert_eq!(todo.priority, Priority::Medium);
    assert_eq!(todo.status, Status::Todo);
    assert!(todo.description.is_none());
}

#[tokio::test]
async fn create_todo_wire_format() {
    let app = app();
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/todos",
            json!({
                "name": "Report",
                "estimatedTimeSec": 60,
                "dueDate": "2024-09-30",
                "priority": "low",
            }),
        ),
    )
    .await;

    let body: Value = body_json(resp).await;
    assert_eq!(body["dueDate"], "2024-09-30");
    assert_eq!(body["priority"], "low");
    assert_eq!(body["status"], "todo");
    assert!(body["id"].is_i64());
    assert!(body["createdAt"].is_string());
    assert!(body.get("reflectionMemo").is_none());
}

#[tokio::test]
async fn create_todo_validation_errors_are_400() {
    let app = app();

    for (body, message) in [
        (json!({ "name": "", "estimatedTimeSec": 1 }), "name is required"),
        (json!({ "name": "a", "estimatedTimeSec": 0 }), "validation failed"),
        (
            json!({ "name": "a", "estimatedTimeSec": 1, "priority": "urgent" }),
            "invalid priority value",
        ),
        (
            json!({ "name": "a", "estimatedTimeSec": 1, "status": "later" }),
            "invalid status value",
        ),
        (
            json!({ "name": "a", "estimatedTimeSec": 1, "dueDate": "soon" }),
            "validation failed",
        ),
    ] {
        let resp = send(&app, json_request("POST", "/api/todos", body.clone())).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");

        let error: ErrorBody = body_json(resp).await;
        assert_eq!(error.code, 400);
        assert!(error.message.starts_with(message), "{}", error.message);
    }

    let resp = send(&app, empty_request("GET", "/api/todos")).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

#[tokio::test]
async fn create_todo_malformed_json_is_400() {
    let resp = send(
        &app(),
        json_request("POST", "/api/todos", json!({ "title": "wrong shape" })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: ErrorBody = body_json(resp).await;
    assert!(error.message.starts_with("invalid request body"));
}

#[tokio::test]
async fn create_todo_constraint_violation_is_409() {
    let app = app();
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/todos",
            json!({ "name": "a", "estimatedTimeSec": 1, "ownerId": 0 }),
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let error: ErrorBody = body_json(resp).await;
    assert_eq!(error.code, 409);
    assert!(error.message.starts_with("constraint violation"), "{}", error.message);
    assert!(error.message.contains("owner_id must be positive"));
}

// --- store failures ---

#[tokio::test]
async fn store_failure_is_500_without_details() {
    let app = back::app(Arc::new(BrokenStore));

    for request in [
        empty_request("GET", "/api/todos"),
        empty_request("GET", "/api/todo/1"),
        empty_request("DELETE", "/api/todo/1"),
        json_request("POST", "/api/todos", json!({ "name": "a", "estimatedTimeSec": 1 })),
    ] {
        let uri = request.uri().to_string();
        let resp = send(&app, request).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");

        let error: ErrorBody = body_json(resp).await;
        assert_eq!(error.code, 500);
        assert_eq!(error.message, "internal server error");
        assert!(!error.message.contains(DISK_ERROR));
    }
}

// --- get ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = send(&app(), empty_request("GET", "/api/todo/41")).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let error: ErrorBody = body_json(resp).await;
    assert_eq!(error.code, 404);
}

#[tokio::test]
async fn get_todo_bad_id_is_400() {
    let resp = send(&app(), empty_request("GET", "/api/todo/not-a-number")).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- update ---

#[tokio::test]
async fn update_todo_not_found() {
    let resp = send(
        &app(),
        json_request("PUT", "/api/todo/41", json!({ "name": "Nope" })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_todo_empty_body_is_400() {
    let app = app();
    let todo = create(&app, json!({ "name": "a", "estimatedTimeSec": 1 })).await;

    let resp = send(
        &app,
        json_request("PUT", &format!("/api/todo/{}", todo.id), json!({})),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_todo_null_clears_due_date() {
    let app = app();
    let todo = create(
        &app,
        json!({ "name": "a", "estimatedTimeSec": 1, "dueDate": "2024-09-30" }),
    )
    .await;
    assert!(todo.due_date.is_some());

    let uri = format!("/api/todo/{}", todo.id);
    let resp = send(&app, json_request("PUT", &uri, json!({ "dueDate": null }))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, empty_request("GET", &uri)).await;
    let body: Value = body_json(resp).await;
    assert!(body.get("dueDate").is_none());
}

// --- delete ---

#[tokio::test]
async fn delete_todo_twice() {
    let app = app();
    let todo = create(&app, json!({ "name": "a", "estimatedTimeSec": 1 })).await;
    let uri = format!("/api/todo/{}", todo.id);

    let resp = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());

    let resp = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let app = app();

    // create
    let created = create(
        &app,
        json!({ "name": "Walk dog", "estimatedTimeSec": 1800, "description": "around the park" }),
    )
    .await;
    let uri = format!("/api/todo/{}", created.id);

    // list contains the one todo
    let resp = send(&app, empty_request("GET", "/api/todos")).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos, [created.clone()]);

    // partial update: status and actual time only
    let resp = send(
        &app,
        json_request(
            "PUT",
            &uri,
            json!({ "status": "done", "actualTimeSec": 2100, "reflectionMemo": "took longer" }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.status, Status::Done);
    assert_eq!(updated.actual_time_sec, 2100);
    assert_eq!(updated.reflection_memo.as_deref(), Some("took longer"));
    assert_eq!(updated.name, "Walk dog"); // unchanged
    assert_eq!(updated.description.as_deref(), Some("around the park")); // unchanged
    assert_eq!(updated.created_at, created.created_at);

    // partial update: clear the description
    let resp = send(&app, json_request("PUT", &uri, json!({ "description": null }))).await;
    let updated: Todo = body_json(resp).await;
    assert!(updated.description.is_none());
    assert_eq!(updated.status, Status::Done); // unchanged from previous update

    // get
    let resp = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Todo = body_json(resp).await;
    assert_eq!(fetched, updated);

    // delete
    let resp = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // gone
    let resp = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, empty_request("GET", "/api/todos")).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}
