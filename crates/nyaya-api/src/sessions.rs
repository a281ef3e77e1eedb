//! Handler for `POST /sessions/create`.

use axum::{Json, extract::State, http::StatusCode};
use nyaya_core::{
  records::NewChatSession,
  store::LogStore,
  wire::{SessionCreateRequest, SessionCreateResponse},
};

use crate::{ApiState, error::ApiError, resolve_user_id};

/// `POST /sessions/create` — body: `{"chat_mode":"PDF_CHAT","title":"..."}`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<SessionCreateRequest>,
) -> Result<(StatusCode, Json<SessionCreateResponse>), ApiError>
where
  S: LogStore,
{
  let user_id = resolve_user_id(&state, body.user_uuid.as_deref()).await?;

  let session = state
    .store
    .create_chat_session(NewChatSession {
      user_id,
      chat_mode: body.chat_mode,
      title: body.title,
      folder: None,
    })
    .await
    .map_err(ApiError::store)?;

  Ok((
    StatusCode::CREATED,
    Json(SessionCreateResponse {
      session_uuid: session.session_uuid.to_string(),
      title:        session.title,
      success:      true,
    }),
  ))
}
