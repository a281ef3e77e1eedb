//! Short-lived e-mail verification codes.
//!
//! Codes live in memory only; a restart invalidates every outstanding code.
//! Expired entries are evicted by the cache itself, whether or not anyone
//! tries to redeem them.

use std::{
  sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
  },
  time::Duration,
};

use moka::future::Cache;
use rand_core::{OsRng, RngCore as _};

/// How long an issued code stays redeemable.
pub const CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrong guesses allowed before a code is thrown away.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// Upper bound on outstanding codes.
const MAX_OUTSTANDING: u64 = 100_000;

#[derive(Debug, Clone)]
struct Issued {
  code:     Arc<str>,
  failures: Arc<AtomicU32>,
}

#[derive(Debug)]
pub struct CodeBook {
  codes: Cache<String, Issued>,
}

impl Default for CodeBook {
  fn default() -> Self { Self::new() }
}

impl CodeBook {
  pub fn new() -> Self { Self::with_ttl(CODE_TTL) }

  pub fn with_ttl(ttl: Duration) -> Self {
    let codes = Cache::builder()
      .max_capacity(MAX_OUTSTANDING)
      .time_to_live(ttl)
      .build();
    Self { codes }
  }

  /// Issue a fresh six-digit code for `email`, replacing any earlier one.
  pub async fn issue(&self, email: &str) -> String {
    let code = format!("{:06}", OsRng.next_u32() % 1_000_000);
    let issued = Issued {
      code:     Arc::from(code.as_str()),
      failures: Arc::new(AtomicU32::new(0)),
    };
    self.codes.insert(email.to_owned(), issued).await;
    code
  }

  /// Consume the code for `email`. Succeeds once per issued code; after
  /// [`MAX_FAILED_ATTEMPTS`] wrong guesses the code is discarded.
  pub async fn redeem(&self, email: &str, code: &str) -> bool {
    let Some(issued) = self.codes.get(email).await else {
      tracing::debug!(email, "no outstanding verification code");
      return false;
    };

    if *issued.code != *code {
      let failures = issued.failures.fetch_add(1, Ordering::SeqCst) + 1;
      if failures >= MAX_FAILED_ATTEMPTS {
        tracing::info!(email, failures, "verification code discarded after failed attempts");
        self.codes.invalidate(email).await;
      }
      return false;
    }

    // Concurrent redeemers race on the removal; only one gets this entry.
    match self.codes.remove(email).await {
      Some(removed) => Arc::ptr_eq(&removed.failures, &issued.failures),
      None => false,
    }
  }

  /// Number of codes still held, after pending evictions have run.
  pub async fn outstanding(&self) -> u64 {
    self.codes.run_pending_tasks().await;
    self.codes.entry_count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn code_is_single_use() {
    let book = CodeBook::new();
    let code = book.issue("a@example.in").await;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    assert!(!book.redeem("a@example.in", "not-it").await);
    assert!(book.redeem("a@example.in", &code).await);
    assert!(!book.redeem("a@example.in", &code).await);
  }

  #[tokio::test]
  async fn reissue_replaces_the_earlier_code() {
    let book = CodeBook::new();
    let first = book.issue("r@example.in").await;
    let mut second = book.issue("r@example.in").await;
    while second == first {
      second = book.issue("r@example.in").await;
    }
    assert!(!book.redeem("r@example.in", &first).await);
    assert!(book.redeem("r@example.in", &second).await);
  }

  #[tokio::test]
  async fn expired_codes_are_evicted_without_redeem() {
    let book = CodeBook::with_ttl(Duration::from_millis(50));
    for i in 0..100 {
      book.issue(&format!("user{i}@example.in")).await;
    }
    let code = book.issue("b@example.in").await;
    assert_eq!(book.outstanding().await, 101);

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(book.outstanding().await, 0);
    assert!(!book.redeem("b@example.in", &code).await);
  }

  #[tokio::test]
  async fn repeated_wrong_guesses_discard_the_code() {
    let book = CodeBook::new();
    let code = book.issue("c@example.in").await;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..MAX_FAILED_ATTEMPTS {
      assert!(!book.redeem("c@example.in", wrong).await);
    }
    assert!(!book.redeem("c@example.in", &code).await);
    assert_eq!(book.outstanding().await, 0);
  }

  #[tokio::test]
  async fn a_few_wrong_guesses_still_allow_the_right_code() {
    let book = CodeBook::new();
    let code = book.issue("d@example.in").await;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
      assert!(!book.redeem("d@example.in", wrong).await);
    }
    assert!(book.redeem("d@example.in", &code).await);
  }
}
