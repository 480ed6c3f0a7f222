use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::AppError,
    message::{Feedback, FeedbackReceipt},
    services::feedback::validate,
    state::SharedState,
};

pub async fn feedback_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Feedback>, JsonRejection>,
) -> Result<(StatusCode, Json<FeedbackReceipt>), AppError> {
    let Json(feedback) = payload.map_err(|r| AppError::InvalidFeedback(r.body_text()))?;
    let feedback = validate(feedback)?;

    let id = state.feedback.save(&feedback).await?;
    info!(%id, rating = feedback.rating, "feedback received");

    Ok((
        StatusCode::CREATED,
        Json(FeedbackReceipt {
            id,
            status: "received".to_string(),
        }),
    ))
}
