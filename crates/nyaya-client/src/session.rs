//! The signed-in user, persisted between runs.
//!
//! Stored as a JSON object with the user record under the `nyaya_user` key,
//! in `session.json` inside the client's config directory.

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use nyaya_core::wire::UserResponse;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

pub const SESSION_KEY: &str = "nyaya_user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
  pub user_uuid: String,
  pub full_name: String,
  pub email:     String,
}

impl From<UserResponse> for CurrentUser {
  fn from(r: UserResponse) -> Self {
    Self { user_uuid: r.user_uuid, full_name: r.full_name, email: r.email }
  }
}

#[derive(Serialize, Deserialize, Default)]
struct SessionFile {
  #[serde(rename = "nyaya_user", default, skip_serializing_if = "Option::is_none")]
  user: Option<CurrentUser>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
  path: PathBuf,
}

impl SessionStore {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  /// `<config dir>/nyaya/session.json`, if the platform has a config dir.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nyaya").join("session.json"))
  }

  pub fn path(&self) -> &Path { &self.path }

  fn io_error(&self, source: std::io::Error) -> SessionError {
    SessionError::Io { path: self.path.clone(), source }
  }

  /// The stored user, or `None` when nobody is signed in.
  pub fn load(&self) -> Result<Option<CurrentUser>, SessionError> {
    let raw = match fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(self.io_error(e)),
    };
    let file: SessionFile = serde_json::from_str(&raw)?;
    Ok(file.user)
  }

  pub fn save(&self, user: &CurrentUser) -> Result<(), SessionError> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
    }
    let file = SessionFile { user: Some(user.clone()) };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(&self.path, json).map_err(|e| self.io_error(e))
  }

  /// Sign out. Clearing an absent session is not an error.
  pub fn clear(&self) -> Result<(), SessionError> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(self.io_error(e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> CurrentUser {
    CurrentUser {
      user_uuid: "5b0d7c1e-0000-4000-8000-000000000001".into(),
      full_name: "Meera Iyer".into(),
      email:     "meera@example.in".into(),
    }
  }

  #[test]
  fn missing_file_means_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    assert_eq!(store.load().unwrap(), None);
    store.clear().unwrap();
  }

  #[test]
  fn save_load_clear() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("nested").join("session.json"));

    store.save(&user()).unwrap();
    assert_eq!(store.load().unwrap(), Some(user()));

    let raw: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw[SESSION_KEY]["email"], "meera@example.in");

    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
  }

  #[test]
  fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(SessionStore::new(path).load(), Err(SessionError::Json(_))));
  }
}
