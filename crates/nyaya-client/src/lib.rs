//! Terminal client for NyayAssist.
//!
//! [`chat::Chat`] is the orchestrator: mode switching, the append-only
//! transcript, multi-section comparison handling and upload state. It talks
//! to the server through [`backend::Backend`], implemented by
//! [`client::ApiClient`]. [`app`] and [`ui`] are the ratatui front end.

pub mod app;
pub mod backend;
pub mod chat;
pub mod client;
pub mod error;
pub mod session;
pub mod ui;

pub use client::{ApiClient, ApiConfig};
pub use error::{ClientError, SessionError};

#[cfg(test)]
mod tests;
