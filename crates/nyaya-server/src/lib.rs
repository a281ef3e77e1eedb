//! HTTP service for NyayAssist.
//!
//! Mounts the JSON API from [`nyaya_api`] under `/api` and wraps it with
//! per-request access logging, fixed-window rate limiting and an
//! admin-only analytics endpoint.

pub mod access_log;
pub mod auth;
pub mod error;
pub mod rate_limit;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  http::HeaderMap,
  middleware,
  routing::get,
};
use chrono::{Duration, Utc};
use nyaya_api::ApiState;
use nyaya_core::{
  records::MetricType,
  store::LogStore,
  wire::{HealthResponse, StatsResponse},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use access_log::USER_UUID_HEADER;
use auth::{AuthConfig, Authenticated};

const STATS_WINDOW_DAYS: i64 = 30;
const POPULAR_SEARCH_LIMIT: usize = 10;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `NYAYA_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub mapping_path:          PathBuf,
  pub admin_username:        String,
  pub admin_password_hash:   String,
  /// Requests per client per endpoint per minute. `0` disables limiting.
  pub rate_limit_per_minute: u32,
}

// ─── Application state ────────────────────────────────────────────────────────

pub struct AppState<S> {
  pub api:    ApiState<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

impl<S> AppState<S> {
  pub fn new(api: ApiState<S>, config: ServerConfig) -> Self {
    let auth = AuthConfig {
      username:      config.admin_username.clone(),
      password_hash: config.admin_password_hash.clone(),
    };
    Self { api, config: Arc::new(config), auth: Arc::new(auth) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      api:    self.api.clone(),
      config: Arc::clone(&self.config),
      auth:   Arc::clone(&self.auth),
    }
  }
}

/// Resolve the `X-User-UUID` header to a user row id. Lookup failures are
/// logged and treated as anonymous.
pub(crate) async fn header_user_id<S>(state: &AppState<S>, headers: &HeaderMap) -> Option<i64>
where
  S: LogStore,
{
  let uuid = headers
    .get(USER_UUID_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| Uuid::parse_str(s).ok())?;
  match state.api.store.get_user_by_uuid(uuid).await {
    Ok(user) => user.map(|u| u.id),
    Err(e) => {
      tracing::warn!(error = %e, %uuid, "failed to resolve user header");
      None
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S>(state: AppState<S>) -> Router
where
  S: LogStore + 'static,
{
  let api = nyaya_api::api_router(state.api.clone());

  Router::new()
    .route("/", get(root))
    .route("/health", get(health::<S>))
    .route("/api/analytics/stats", get(stats::<S>))
    .with_state(state.clone())
    .nest("/api", api)
    .layer(middleware::from_fn_with_state(state.clone(), rate_limit::enforce::<S>))
    .layer(middleware::from_fn_with_state(state, access_log::record::<S>))
    .layer(TraceLayer::new_for_http())
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RootResponse {
  message: &'static str,
  version: &'static str,
}

async fn root() -> Json<RootResponse> {
  Json(RootResponse {
    message: "NyayAssist API",
    version: env!("CARGO_PKG_VERSION"),
  })
}

async fn health<S>(State(state): State<AppState<S>>) -> Result<Json<HealthResponse>, Error>
where
  S: LogStore + 'static,
{
  let today = Utc::now().date_naive();
  match state.api.store.metric(today, MetricType::DailyUsers).await {
    Ok(_) => Ok(Json(HealthResponse {
      status:   "healthy".into(),
      database: "connected".into(),
    })),
    Err(e) => {
      tracing::error!(error = %e, "health probe failed");
      Err(Error::Unavailable)
    }
  }
}

async fn stats<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<StatsResponse>, Error>
where
  S: LogStore + 'static,
{
  let since = Utc::now() - Duration::days(STATS_WINDOW_DAYS);
  let daily_stats = state.api.store.daily_stats(since).await.map_err(Error::store)?;
  let popular_searches = state
    .api
    .store
    .popular_searches(POPULAR_SEARCH_LIMIT)
    .await
    .map_err(Error::store)?;

  Ok(Json(StatsResponse { success: true, daily_stats, popular_searches }))
}
