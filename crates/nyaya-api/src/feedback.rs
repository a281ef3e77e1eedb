//! Handler for `POST /feedback`.
//!
//! `message_id` may name a message, an LLM output or a case-search query;
//! the store links whichever one owns the UUID. Unparsable or unknown
//! identifiers are accepted and stored unlinked.

use axum::{Json, extract::State};
use nyaya_core::{
  records::NewFeedback,
  store::LogStore,
  wire::{FeedbackRequest, FeedbackResponse},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, resolve_user_id};

/// `POST /feedback`
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError>
where
  S: LogStore,
{
  if let Some(rating) = body.rating
    && !(1..=5).contains(&rating)
  {
    return Err(ApiError::BadRequest(format!(
      "rating must be between 1 and 5, got {rating}"
    )));
  }

  let user_id = resolve_user_id(&state, body.user_uuid.as_deref()).await?;
  let target_uuid = body
    .message_id
    .as_deref()
    .and_then(|s| Uuid::parse_str(s).ok());

  let feedback = state
    .store
    .add_feedback(NewFeedback {
      user_id,
      target_uuid,
      rating: body.rating,
      feedback_type: body.feedback_type,
      feedback_text: body.feedback_text,
    })
    .await
    .map_err(ApiError::store)?;

  Ok(Json(FeedbackResponse {
    success:     true,
    feedback_id: feedback.feedback_uuid.to_string(),
  }))
}
