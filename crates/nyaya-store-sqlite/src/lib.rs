//! SQLite backend for the NyayAssist logging and analytics schema.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod rows;
mod schema;
mod store;

pub mod error;

pub use encode::sha256_hex;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
