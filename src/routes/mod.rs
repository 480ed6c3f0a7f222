// src/routes/mod.rs
pub mod chat;
pub mod feedback;

use std::path::Path;

use crate::state::SharedState;
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use chat::{chat_handler, get_metrics_handler, health_handler};
use feedback::feedback_handler;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(static_dir: Option<&Path>) -> Router<SharedState> {
    let router = Router::new()
        .route("/", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/feedback", post(feedback_handler))
        .route("/api/metrics", get(get_metrics_handler));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Full application: routes, state and the CORS policy for the configured origin.
pub fn app(state: SharedState) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([state.config.allowed_origin.clone()]))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    create_router(state.config.static_dir.as_deref())
        .with_state(state)
        .layer(cors)
}
