use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;
use tracker_api::v1::{ErrorBody, Todo, TodoCreationRequest, TodoUpdateRequest};

use crate::{
    error::{ErrorKind, TodoError},
    store::TodoId,
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

async fn list_todos(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.service.list_todos().await?;
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TodoCreationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(request) = body?;
    let todo = state.service.create_todo(request).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(state): State<Arc<AppState>>,
    id: Result<Path<TodoId>, PathRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = id?;
    let todo = state.service.get_todo(id).await?;
    Ok(Json(todo))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    id: Result<Path<TodoId>, PathRejection>,
    body: Result<Json<TodoUpdateRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = id?;
    let Json(request) = body?;
    let todo = state.service.update_todo(id, request).await?;
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    id: Result<Path<TodoId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.service.delete_todo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// An error response carrying an [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NameRequired
        | ErrorKind::ValidationFailed
        | ErrorKind::PriorityInvalid
        | ErrorKind::StatusInvalid => StatusCode::BAD_REQUEST,
        ErrorKind::ConstraintViolation => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        let status = status_for(err.kind());

        // store details stay in the log
        let message = if err.kind() == ErrorKind::Internal {
            error!(error = %err, "todo operation failed");
            String::from("internal server error")
        } else {
            err.to_string()
        };

        Self { status, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(format!("invalid todo id: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}
