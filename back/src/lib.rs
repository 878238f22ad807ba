pub mod config;
pub mod error;
pub mod mapper;
pub mod service;
pub mod store;
pub mod v1;
pub mod validate;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{service::TodoService, store::TodoStore};

#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
}

/// Builds the HTTP application on top of `store`.
pub fn app(store: Arc<dyn TodoStore>) -> Router {
    let state = Arc::new(AppState {
        service: TodoService::new(store),
    });

    Router::new()
        .nest("/api", v1::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
