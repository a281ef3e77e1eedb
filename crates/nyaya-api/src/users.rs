//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/send-otp` | Issues a verification code; 400 if the e-mail is registered |
//! | `POST` | `/users/register` | Requires the code issued for the same e-mail |
//! | `POST` | `/users/login` | 401 on unknown e-mail or wrong password |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{Json, extract::State};
use nyaya_core::{
  records::{NewUser, User, UserRole},
  store::LogStore,
  wire::{LoginRequest, RegisterRequest, SendCodeRequest, SendCodeResponse, UserResponse},
};
use rand_core::OsRng;

use crate::{ApiState, error::ApiError};

const EMAIL_TAKEN: &str = "Email already registered";
const BAD_CODE: &str = "Invalid or expired verification code";
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// `false` for a wrong password or an unparsable stored hash.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

fn user_response(user: User) -> UserResponse {
  UserResponse {
    user_uuid: user.user_uuid.to_string(),
    full_name: user.full_name,
    email:     user.email,
    success:   true,
  }
}

/// `POST /users/send-otp`
pub async fn send_code<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError>
where
  S: LogStore,
{
  let email = body.email.trim().to_owned();
  if email.is_empty() {
    return Err(ApiError::BadRequest("email is required".into()));
  }

  let existing = state
    .store
    .get_user_by_email(email.clone())
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::BadRequest(EMAIL_TAKEN.into()));
  }

  let code = state.codes.issue(&email).await;
  tracing::info!(%email, "verification code issued");
  tracing::debug!(%email, %code, "verification code");

  Ok(Json(SendCodeResponse {
    success: true,
    message: "Verification code sent to email".into(),
  }))
}

/// `POST /users/register`
pub async fn register<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError>
where
  S: LogStore,
{
  let email = body.email.trim().to_owned();
  if !state.codes.redeem(&email, body.otp.trim()).await {
    return Err(ApiError::BadRequest(BAD_CODE.into()));
  }

  let existing = state
    .store
    .get_user_by_email(email.clone())
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::BadRequest(EMAIL_TAKEN.into()));
  }

  let user = state
    .store
    .create_user(NewUser {
      full_name:     body.full_name,
      email,
      phone:         body.phone,
      password_hash: hash_password(&body.password)?,
      role:          UserRole::User,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_uuid = %user.user_uuid, "registered user");
  Ok(Json(user_response(user)))
}

/// `POST /users/login`
pub async fn login<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError>
where
  S: LogStore,
{
  let user = state
    .store
    .get_user_by_email(body.email.trim().to_owned())
    .await
    .map_err(ApiError::store)?
    .filter(|u| u.is_active && verify_password(&body.password, &u.password_hash))
    .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.into()))?;

  state
    .store
    .update_last_login(user.id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(user_response(user)))
}
