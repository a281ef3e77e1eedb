//! The chat orchestrator.
//!
//! [`Chat`] owns the session transcript and decides, per mode, what a
//! submission turns into. It never performs I/O itself: an accepted
//! submission yields a [`Ticket`], the caller runs it with [`execute`] on a
//! worker task, and hands the resulting [`Completion`] back to
//! [`Chat::complete`], which appends the outcome to the transcript.
//!
//! Every ticket carries the session generation it was issued under. Starting
//! a new session bumps the generation, so results still in flight from the
//! old session are dropped on arrival.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use nyaya_core::{
  law::{ComparisonQuery, LawComparison},
  message::{Message, MessageBody},
  mode::ChatMode,
  wire::{ChatResponse, CompareResponse, SearchResponse, UploadResponse},
};

use crate::{backend::Backend, error::ClientError};

const PDF_MIME: &str = "application/pdf";

// ─── Jobs ─────────────────────────────────────────────────────────────────────

/// Backend work produced by an accepted submission or upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
  Ask { question: String },
  Search { query: String },
  Compare(ComparisonQuery),
  Upload { files: Vec<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
  pub generation: u64,
  pub job:        Job,
}

/// Result of one section lookup. Every failure mode collapses to `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
  Found { section: String, comparison: LawComparison },
  NotFound(String),
}

#[derive(Debug)]
pub enum Outcome {
  Answer(Result<ChatResponse, ClientError>),
  Cases {
    query:  String,
    result: Result<SearchResponse, ClientError>,
  },
  Comparisons {
    query:   ComparisonQuery,
    lookups: Vec<Lookup>,
  },
  Uploaded {
    files:  Vec<String>,
    result: Result<UploadResponse, ClientError>,
  },
  /// The worker task died before producing a result.
  Crashed(String),
}

#[derive(Debug)]
pub struct Completion {
  pub generation: u64,
  pub outcome:    Outcome,
}

impl Job {
  pub async fn run<B: Backend>(self, backend: &B) -> Outcome {
    match self {
      Job::Ask { question } => Outcome::Answer(backend.ask(question).await),
      Job::Search { query } => {
        let result = backend.search(query.clone(), 0).await;
        Outcome::Cases { query, result }
      }
      Job::Compare(query) => {
        let lookups = lookup_sections(backend, &query).await;
        Outcome::Comparisons { query, lookups }
      }
      Job::Upload { files } => {
        let names = files
          .iter()
          .map(|p| {
            p.file_name()
              .map(|n| n.to_string_lossy().into_owned())
              .unwrap_or_else(|| p.display().to_string())
          })
          .collect();
        let result = backend.upload(files).await;
        Outcome::Uploaded { files: names, result }
      }
    }
  }
}

/// Look sections up one after another, in the order they were requested.
async fn lookup_sections<B: Backend>(backend: &B, query: &ComparisonQuery) -> Vec<Lookup> {
  let mut lookups = Vec::with_capacity(query.sections.len());
  for section in &query.sections {
    let lookup = match backend.compare(query.code, section.clone()).await {
      Ok(CompareResponse { success: true, comparison: Some(comparison), .. }) => {
        Lookup::Found { section: section.clone(), comparison }
      }
      Ok(resp) => {
        tracing::debug!(
          code = %query.code,
          %section,
          reason = resp.error.as_deref().unwrap_or("no comparison in response"),
          "section not found"
        );
        Lookup::NotFound(section.clone())
      }
      Err(e) => {
        tracing::debug!(code = %query.code, %section, error = %e, "section lookup failed");
        Lookup::NotFound(section.clone())
      }
    };
    lookups.push(lookup);
  }
  lookups
}

/// Run `ticket` on its own task. A panicking worker becomes
/// [`Outcome::Crashed`] rather than leaving the session pending forever.
pub async fn execute<B: Backend>(backend: Arc<B>, ticket: Ticket) -> Completion {
  let Ticket { generation, job } = ticket;
  let worker = tokio::spawn(async move { job.run(backend.as_ref()).await });
  let outcome = match worker.await {
    Ok(outcome) => outcome,
    Err(e) => {
      tracing::error!(error = %e, "chat worker died");
      Outcome::Crashed(e.to_string())
    }
  };
  Completion { generation, outcome }
}

// ─── Comparison reporting ─────────────────────────────────────────────────────

/// Split lookups into found `(section, comparison)` pairs and missing
/// sections, both in request order.
pub fn partition(lookups: Vec<Lookup>) -> (Vec<(String, LawComparison)>, Vec<String>) {
  lookups
    .into_iter()
    .fold((Vec::new(), Vec::new()), |(mut found, mut missing), lookup| {
      match lookup {
        Lookup::Found { section, comparison } => found.push((section, comparison)),
        Lookup::NotFound(section) => missing.push(section),
      }
      (found, missing)
    })
}

/// The transcript entries for a finished comparison query: a comparisons
/// message plus a warning for any misses, or a single failure when nothing
/// was found.
pub fn comparison_report(query: &ComparisonQuery, lookups: Vec<Lookup>) -> Vec<MessageBody> {
  let code = query.code;
  let (found, missing) = partition(lookups);

  if found.is_empty() {
    return vec![MessageBody::error(format!(
      "No comparison found for {code} sections: {}",
      query.sections.join(", ")
    ))];
  }

  let content = match found.as_slice() {
    [(section, _)] => format!("Comparison for {code} Section {section}:"),
    _ => format!("Found {} comparisons for {code} sections:", found.len()),
  };
  let comparisons = found.into_iter().map(|(_, c)| c).collect();

  let mut report = vec![MessageBody::Comparisons { content, comparisons }];
  if !missing.is_empty() {
    report.push(MessageBody::warning(format!(
      "Could not find comparison for {code} sections: {}",
      missing.join(", ")
    )));
  }
  report
}

pub fn is_pdf(path: &Path) -> bool {
  mime_guess::from_path(path).first_raw() == Some(PDF_MIME)
}

// ─── Chat ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Chat {
  transcript:    Vec<Message>,
  mode:          ChatMode,
  pending:       bool,
  pdf_ready:     bool,
  generation:    u64,
  upload_status: Option<String>,
}

impl Chat {
  pub fn new(mode: ChatMode) -> Self { Self { mode, ..Self::default() } }

  pub fn transcript(&self) -> &[Message] { &self.transcript }

  pub fn mode(&self) -> ChatMode { self.mode }

  pub fn pending(&self) -> bool { self.pending }

  pub fn pdf_ready(&self) -> bool { self.pdf_ready }

  pub fn generation(&self) -> u64 { self.generation }

  pub fn upload_status(&self) -> Option<&str> { self.upload_status.as_deref() }

  /// Switch modes. The transcript is kept.
  pub fn set_mode(&mut self, mode: ChatMode) {
    if mode != self.mode {
      tracing::debug!(from = %self.mode, to = %mode, "mode switched");
      self.mode = mode;
    }
  }

  /// Discard the transcript and attachment state. Results still in flight
  /// for the old session will be ignored.
  pub fn new_session(&mut self) {
    self.transcript.clear();
    self.pending = false;
    self.pdf_ready = false;
    self.upload_status = None;
    self.generation = self.generation.wrapping_add(1);
    tracing::info!(generation = self.generation, "new chat session");
  }

  fn reply(&mut self, body: MessageBody) { self.transcript.push(Message::assistant(body)); }

  fn start(&mut self, job: Job) -> Ticket {
    self.pending = true;
    Ticket { generation: self.generation, job }
  }

  /// Accept user input. Returns `None` when there is nothing to run: the
  /// input was blank, a call is already pending, or a validation warning
  /// was appended instead.
  pub fn submit(&mut self, input: &str) -> Option<Ticket> {
    let text = input.trim();
    if text.is_empty() || self.pending {
      return None;
    }
    self.transcript.push(Message::user(text));

    let job = match self.mode {
      ChatMode::PdfChat if !self.pdf_ready => {
        self.reply(MessageBody::warning(
          "Please upload a PDF before asking questions about it.",
        ));
        return None;
      }
      ChatMode::PdfChat => Job::Ask { question: text.to_owned() },
      ChatMode::KanoonSearch => Job::Search { query: text.to_owned() },
      ChatMode::LawComparison => {
        let query = ComparisonQuery::parse(text);
        if query.sections.is_empty() {
          self.reply(MessageBody::warning(
            "No section numbers found. Try \"IPC 302\" or \"CrPC 154, 156\".",
          ));
          return None;
        }
        Job::Compare(query)
      }
    };
    Some(self.start(job))
  }

  /// Start an upload of the PDFs among `paths`. Other files are ignored.
  pub fn upload(&mut self, paths: Vec<PathBuf>) -> Option<Ticket> {
    if self.pending {
      return None;
    }
    let files: Vec<PathBuf> = paths.into_iter().filter(|p| is_pdf(p)).collect();
    if files.is_empty() {
      self.upload_status = Some("No PDF files selected".to_owned());
      return None;
    }
    self.upload_status = Some(format!("Processing {} file(s)…", files.len()));
    Some(self.start(Job::Upload { files }))
  }

  /// Apply a finished job. Returns `false` if it belonged to an earlier
  /// session and was discarded.
  pub fn complete(&mut self, completion: Completion) -> bool {
    if completion.generation != self.generation {
      tracing::debug!(
        stale = completion.generation,
        current = self.generation,
        "discarding result from a previous session"
      );
      return false;
    }
    self.pending = false;

    match completion.outcome {
      Outcome::Answer(Ok(resp)) if resp.success => self.reply(MessageBody::Text {
        content:     resp.answer,
        comparisons: resp.law_comparisons.unwrap_or_default(),
      }),
      Outcome::Answer(Ok(resp)) => {
        let reason = if resp.answer.is_empty() { "Failed to get answer".to_owned() } else { resp.answer };
        self.reply(MessageBody::error(reason));
      }
      Outcome::Answer(Err(e)) => self.reply(MessageBody::error(format!("Error: {e}"))),

      Outcome::Cases { query, result: Ok(resp) } if resp.success => {
        if resp.cases.is_empty() {
          self.reply(MessageBody::text(format!("No cases found for \"{query}\".")));
        } else {
          self.reply(MessageBody::Cases {
            content:     format!(
              "Found {} cases (showing {}):",
              resp.total_found,
              resp.cases.len()
            ),
            cases:       resp.cases,
            comparisons: resp.law_comparisons.unwrap_or_default(),
          });
        }
      }
      Outcome::Cases { result: Ok(_), .. } => self.reply(MessageBody::error("Search failed")),
      Outcome::Cases { result: Err(e), .. } => {
        self.reply(MessageBody::error(format!("Error: {e}")))
      }

      Outcome::Comparisons { query, lookups } => {
        for body in comparison_report(&query, lookups) {
          self.reply(body);
        }
      }

      Outcome::Uploaded { files, result: Ok(resp) } if resp.success => {
        self.pdf_ready = true;
        self.upload_status = Some(format!("✅ Processed {} chunks", resp.chunks_processed));
        self.reply(MessageBody::system(format!(
          "Uploaded {} ({} chunks). {}",
          files.join(", "),
          resp.chunks_processed,
          resp.message
        )));
      }
      Outcome::Uploaded { result: Ok(resp), .. } => {
        self.upload_status = Some(format!("❌ Upload failed: {}", resp.message));
      }
      Outcome::Uploaded { result: Err(e), .. } => {
        self.upload_status = Some(format!("❌ Upload failed: {e}"));
      }

      Outcome::Crashed(reason) => {
        self.reply(MessageBody::error(format!("Request aborted: {reason}")))
      }
    }
    true
  }
}
