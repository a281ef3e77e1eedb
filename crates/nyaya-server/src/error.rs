//! Server-level error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use nyaya_core::wire::ErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("rate limit exceeded: {limit} requests per minute")]
  RateLimited { limit: u32, retry_after_secs: i64 },

  #[error("request body too large")]
  PayloadTooLarge,

  #[error("database unavailable")]
  Unavailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

fn detail(status: StatusCode, message: String) -> Response {
  (status, Json(ErrorBody { detail: message })).into_response()
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match self {
      Error::Unauthorized => {
        let mut res = detail(StatusCode::UNAUTHORIZED, "Unauthorized".into());
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"nyaya\""),
        );
        res
      }
      Error::RateLimited { retry_after_secs, .. } => {
        let mut res = detail(StatusCode::TOO_MANY_REQUESTS, message);
        if let Ok(v) = HeaderValue::from_str(&retry_after_secs.max(1).to_string()) {
          res.headers_mut().insert(header::RETRY_AFTER, v);
        }
        res
      }
      Error::PayloadTooLarge => detail(StatusCode::PAYLOAD_TOO_LARGE, message),
      Error::Unavailable => detail(StatusCode::SERVICE_UNAVAILABLE, message),
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        detail(StatusCode::INTERNAL_SERVER_ERROR, message)
      }
    }
  }
}
