use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{ChatResponse, HealthResponse},
    services::metrics_manager::MetricsData,
    state::SharedState,
};

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "DigiSathi API is running".to_string(),
    })
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request_id = Uuid::new_v4();

    async move {
        state.metrics.record_request().await;

        let result = match payload {
            Ok(Json(body)) => state.relay.handle_chat(&body).await,
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        };

        match result {
            Ok(completion) => {
                state.metrics.record_reply(completion.usage.as_ref()).await;
                info!(reply_len = completion.reply.len(), "reply delivered");
                Ok(Json(ChatResponse {
                    reply: completion.reply,
                    usage: completion.usage,
                }))
            }
            Err(err) => {
                state.metrics.record_error(err.kind()).await;
                if err.status().is_server_error() {
                    error!(error = %err, "chat request failed");
                } else {
                    warn!(error = %err, status = %err.status(), "chat request rejected");
                }
                Err(err)
            }
        }
    }
    .instrument(info_span!("chat", %request_id))
    .await
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}
