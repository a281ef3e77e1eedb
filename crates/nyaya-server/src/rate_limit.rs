//! Fixed-window rate limiting for `/api` routes, backed by the store's
//! `api_rate_limits` table.

use axum::{
  extract::{Request, State},
  middleware::Next,
  response::Response,
};
use chrono::{Duration, Utc};
use nyaya_core::{records::RateLimitKey, store::LogStore};

use crate::{AppState, access_log::client_ip, error::Error, header_user_id};

pub async fn enforce<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: LogStore + 'static,
{
  let limit = state.config.rate_limit_per_minute;
  if limit == 0 || !req.uri().path().starts_with("/api/") {
    return Ok(next.run(req).await);
  }

  let key = RateLimitKey {
    user_id:    header_user_id(&state, req.headers()).await,
    ip_address: client_ip(&req),
    endpoint:   req.uri().path().to_owned(),
  };

  let now = Utc::now();
  match state
    .api
    .store
    .hit_rate_limit(key.clone(), Duration::minutes(1), now)
    .await
  {
    Ok(window) if window.request_count > limit => {
      tracing::debug!(
        endpoint = %key.endpoint,
        ip = ?key.ip_address,
        count = window.request_count,
        "rate limit exceeded"
      );
      return Err(Error::RateLimited {
        limit,
        retry_after_secs: (window.window_end - now).num_seconds(),
      });
    }
    Ok(_) => {}
    Err(e) => tracing::warn!(error = %e, "rate limit check failed; allowing request"),
  }

  Ok(next.run(req).await)
}
