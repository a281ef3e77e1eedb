//! Terminal application state and key dispatch.
//!
//! Backend calls never block the UI: [`App`] hands tickets to spawned tasks,
//! which report back over an unbounded channel drained by the event loop.

use std::{path::PathBuf, sync::Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
  backend::Backend,
  chat::{Chat, Completion, Ticket, execute},
  session::CurrentUser,
};

const PAGE: u16 = 10;

/// What the input line is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
  Message,
  /// Whitespace-separated file paths to upload.
  Upload,
}

pub struct App<B> {
  pub chat:       Chat,
  pub input:      String,
  pub prompt:     Prompt,
  /// Transcript lines scrolled up from the bottom.
  pub scroll:     u16,
  pub user:       Option<CurrentUser>,
  pub server_up:  bool,
  pub status_msg: String,
  backend:        Arc<B>,
  tx:             UnboundedSender<Completion>,
}

impl<B: Backend> App<B> {
  pub fn new(backend: Arc<B>, chat: Chat, tx: UnboundedSender<Completion>) -> Self {
    Self {
      chat,
      input: String::new(),
      prompt: Prompt::Message,
      scroll: 0,
      user: None,
      server_up: false,
      status_msg: String::new(),
      backend,
      tx,
    }
  }

  fn dispatch(&self, ticket: Ticket) {
    let backend = Arc::clone(&self.backend);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let completion = execute(backend, ticket).await;
      if tx.send(completion).is_err() {
        tracing::debug!("result arrived after the UI closed");
      }
    });
  }

  /// Apply a finished backend call.
  pub fn on_completion(&mut self, completion: Completion) {
    if self.chat.complete(completion) {
      self.scroll = 0;
      self.status_msg.clear();
    }
  }

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return false,

      KeyCode::Char('n') if ctrl => {
        self.chat.new_session();
        self.input.clear();
        self.prompt = Prompt::Message;
        self.scroll = 0;
        self.status_msg = "Started a new session".into();
      }
      KeyCode::Char('u') if ctrl => {
        self.prompt = Prompt::Upload;
        self.input.clear();
      }
      KeyCode::Tab => {
        self.chat.set_mode(self.chat.mode().next());
        self.status_msg = format!("Mode: {}", self.chat.mode().label());
      }
      KeyCode::Esc => {
        self.input.clear();
        self.prompt = Prompt::Message;
      }

      KeyCode::Enter => self.enter(),
      KeyCode::Backspace => {
        self.input.pop();
      }
      KeyCode::Char(c) if !ctrl => self.input.push(c),

      KeyCode::Up => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::PageUp => self.scroll = self.scroll.saturating_add(PAGE),
      KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(PAGE),

      _ => {}
    }
    true
  }

  fn enter(&mut self) {
    if self.chat.pending() {
      self.status_msg = "Waiting for the previous request…".into();
      return;
    }

    match self.prompt {
      Prompt::Message => {
        let before = self.chat.transcript().len();
        let ticket = self.chat.submit(&self.input);
        if ticket.is_some() || self.chat.transcript().len() != before {
          self.input.clear();
          self.scroll = 0;
        }
        if let Some(ticket) = ticket {
          self.dispatch(ticket);
        }
      }
      Prompt::Upload => {
        let paths: Vec<PathBuf> = self.input.split_whitespace().map(expand_tilde).collect();
        let ticket = self.chat.upload(paths);
        self.input.clear();
        self.prompt = Prompt::Message;
        if let Some(ticket) = ticket {
          self.dispatch(ticket);
        }
      }
    }
  }
}

fn expand_tilde(raw: &str) -> PathBuf {
  if let Some(rest) = raw.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyEventKind;
  use nyaya_core::{
    law::LawCode,
    mode::ChatMode,
    wire::{ChatResponse, CompareResponse, SearchResponse, UploadResponse},
  };
  use tokio::sync::mpsc;

  use super::*;
  use crate::error::ClientError;

  /// Answers every call with an empty success.
  struct QuietBackend;

  impl Backend for QuietBackend {
    async fn ask(&self, _question: String) -> Result<ChatResponse, ClientError> {
      Ok(ChatResponse { answer: "ok".into(), success: true, message_id: None, law_comparisons: None })
    }

    async fn search(&self, _query: String, _page: u32) -> Result<SearchResponse, ClientError> {
      Ok(SearchResponse {
        cases:           Vec::new(),
        total_found:     0,
        success:         true,
        query_id:        None,
        law_comparisons: None,
      })
    }

    async fn compare(&self, _code: LawCode, _section: String) -> Result<CompareResponse, ClientError> {
      Ok(CompareResponse { success: false, comparison: None, error: None })
    }

    async fn upload(&self, _files: Vec<PathBuf>) -> Result<UploadResponse, ClientError> {
      Ok(UploadResponse {
        message:          "done".into(),
        chunks_processed: 3,
        success:          true,
        upload_id:        None,
      })
    }
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
  }

  fn ctrl(c: char) -> KeyEvent { KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL) }

  fn type_text<B: Backend>(app: &mut App<B>, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn app(mode: ChatMode) -> (App<QuietBackend>, mpsc::UnboundedReceiver<Completion>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (App::new(Arc::new(QuietBackend), Chat::new(mode), tx), rx)
  }

  #[tokio::test]
  async fn tab_cycles_modes() {
    let (mut app, _rx) = app(ChatMode::PdfChat);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.chat.mode(), ChatMode::KanoonSearch);
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.chat.mode(), ChatMode::PdfChat);
  }

  #[tokio::test]
  async fn ctrl_c_quits() {
    let (mut app, _rx) = app(ChatMode::PdfChat);
    assert!(app.handle_key(key(KeyCode::Char('c'))));
    assert!(!app.handle_key(ctrl('c')));
  }

  #[tokio::test]
  async fn search_round_trip_through_channel() {
    let (mut app, mut rx) = app(ChatMode::KanoonSearch);
    type_text(&mut app, "cheque bounce");
    app.handle_key(key(KeyCode::Enter));
    assert!(app.input.is_empty());
    assert!(app.chat.pending());

    let completion = rx.recv().await.unwrap();
    app.on_completion(completion);
    assert!(!app.chat.pending());
    assert_eq!(app.chat.transcript().len(), 2);
  }

  #[tokio::test]
  async fn validation_warning_clears_input_but_blank_does_not_submit() {
    let (mut app, _rx) = app(ChatMode::LawComparison);
    app.handle_key(key(KeyCode::Enter));
    assert!(app.chat.transcript().is_empty());

    type_text(&mut app, "murder");
    app.handle_key(key(KeyCode::Enter));
    assert!(app.input.is_empty());
    assert_eq!(app.chat.transcript().len(), 2);
    assert!(!app.chat.pending());
  }

  #[tokio::test]
  async fn upload_prompt_resets_after_attempt() {
    let (mut app, mut rx) = app(ChatMode::PdfChat);
    app.handle_key(ctrl('u'));
    assert_eq!(app.prompt, Prompt::Upload);
    type_text(&mut app, "notes.txt");
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.prompt, Prompt::Message);
    assert_eq!(app.chat.upload_status(), Some("No PDF files selected"));

    app.handle_key(ctrl('u'));
    type_text(&mut app, "bail-order.pdf");
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.prompt, Prompt::Message);
    app.on_completion(rx.recv().await.unwrap());
    assert!(app.chat.pdf_ready());
  }

  #[tokio::test]
  async fn new_session_discards_in_flight_result() {
    let (mut app, mut rx) = app(ChatMode::KanoonSearch);
    type_text(&mut app, "section 498A");
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(ctrl('n'));

    app.on_completion(rx.recv().await.unwrap());
    assert!(app.chat.transcript().is_empty());
  }
}
