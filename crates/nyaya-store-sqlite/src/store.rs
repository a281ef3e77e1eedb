//! [`SqliteStore`], the SQLite implementation of [`LogStore`].

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use nyaya_core::{
  records::{
    AccessLog, AccessLogQuery, AnalyticsRow, ChatSession, DEFAULT_EMBEDDING_MODEL,
    DailyStat, Feedback, KanoonCaseResult, KanoonQuery, LlmOutput, LlmOutputQuery,
    MetricType, NewAccessLog, NewChatSession, NewFeedback, NewKanoonQuery, NewLlmOutput,
    NewMessage, NewPdfUpload, NewUser, NewUserSession, PdfStatusUpdate, PdfTextChunk,
    PdfUpload, PopularSearch, RateLimitKey, RateLimitWindow, StoredMessage, User,
    UserSession,
  },
  store::LogStore,
};

use crate::{
  Error, Result,
  encode::{
    decode_date, decode_dt, decode_enum, encode_date, encode_dt, encode_json, encode_uuid,
    sha256_hex,
  },
  rows::{
    ACCESS_LOG_COLUMNS, CASE_RESULT_COLUMNS, CHAT_SESSION_COLUMNS, FEEDBACK_COLUMNS,
    KANOON_QUERY_COLUMNS, LLM_OUTPUT_COLUMNS, MESSAGE_COLUMNS, PDF_CHUNK_COLUMNS,
    PDF_UPLOAD_COLUMNS, RawAccessLog, RawCaseResult, RawChatSession, RawFeedback,
    RawKanoonQuery, RawLlmOutput, RawMessage, RawPdfChunk, RawPdfUpload, RawUser,
    RawUserSession, USER_COLUMNS, USER_SESSION_COLUMNS,
  },
  schema::SCHEMA,
};

const DEFAULT_SESSION_TITLE: &str = "New Chat";
const PDF_MIME_TYPE: &str = "application/pdf";
const DEFAULT_CHUNK_SIZE: i64 = 10_000;
const DEFAULT_CHUNK_OVERLAP: i64 = 1_000;

/// SQLite reads a negative `LIMIT` as "no limit".
fn limit_param(limit: Option<usize>) -> i64 {
  limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A NyayAssist log store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_where(&self, clause: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::decode).transpose()
  }

  pub(crate) async fn pdf_upload_by_id(&self, upload_id: i64) -> Result<Option<PdfUpload>> {
    let raw: Option<RawPdfUpload> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PDF_UPLOAD_COLUMNS} FROM pdf_uploads WHERE id = ?1"),
            rusqlite::params![upload_id],
            RawPdfUpload::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPdfUpload::decode).transpose()
  }

  /// Fetch the most recent feedback rows; not part of the store trait.
  pub async fn feedback(&self, limit: usize) -> Result<Vec<Feedback>> {
    let limit = limit_param(Some(limit));
    let raws: Vec<RawFeedback> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FEEDBACK_COLUMNS} FROM feedback ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawFeedback::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeedback::decode).collect()
  }
}

// ─── LogStore impl ───────────────────────────────────────────────────────────

impl LogStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user_uuid = Uuid::new_v4();

    let uuid_str = encode_uuid(user_uuid);
    let at_str   = encode_dt(now);
    let role_str = input.role.as_str();
    let email    = input.email.clone();
    let name     = input.full_name.clone();
    let phone    = input.phone.clone();
    let hash     = input.password_hash.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO users
             (user_uuid, full_name, email, phone, password_hash, role, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![uuid_str, name, email, phone, hash, role_str, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Some(id))
      })
      .await?;

    let Some(id) = id else {
      return Err(Error::EmailTaken(input.email));
    };

    tracing::debug!(user_id = id, "created user");

    Ok(User {
      id,
      user_uuid,
      full_name: input.full_name,
      email: input.email,
      phone: input.phone,
      password_hash: input.password_hash,
      is_active: true,
      is_verified: false,
      role: input.role,
      created_at: now,
      updated_at: now,
      last_login_at: None,
    })
  }

  async fn get_user_by_email(&self, email: String) -> Result<Option<User>> {
    self.user_where("email = ?1", email).await
  }

  async fn get_user_by_uuid(&self, user_uuid: Uuid) -> Result<Option<User>> {
    self.user_where("user_uuid = ?1", encode_uuid(user_uuid)).await
  }

  async fn update_last_login(&self, user_id: i64) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET last_login_at = ?1, updated_at = ?1 WHERE id = ?2",
          rusqlite::params![at_str, user_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  async fn delete_user(&self, user_id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![user_id])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    tracing::info!(user_id, "deleted user");
    Ok(())
  }

  async fn create_user_session(&self, input: NewUserSession) -> Result<UserSession> {
    let now = Utc::now();

    let token      = input.session_token.clone();
    let ip         = input.ip_address.clone();
    let agent      = input.user_agent.clone();
    let user_id    = input.user_id;
    let at_str     = encode_dt(now);
    let expires_at = encode_dt(input.expires_at);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_sessions
             (session_token, user_id, ip_address, user_agent, created_at, expires_at,
              last_activity_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5)",
          rusqlite::params![token, user_id, ip, agent, at_str, expires_at],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(UserSession {
      id,
      session_token: input.session_token,
      user_id,
      ip_address: input.ip_address,
      user_agent: input.user_agent,
      is_active: true,
      created_at: now,
      expires_at: input.expires_at,
      last_activity_at: now,
    })
  }

  async fn get_user_session(&self, session_token: String) -> Result<Option<UserSession>> {
    let raw: Option<RawUserSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {USER_SESSION_COLUMNS} FROM user_sessions WHERE session_token = ?1"
            ),
            rusqlite::params![session_token],
            RawUserSession::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUserSession::decode).transpose()
  }

  // ── Chat sessions & messages ──────────────────────────────────────────────

  async fn create_chat_session(&self, input: NewChatSession) -> Result<ChatSession> {
    let now = Utc::now();
    let session_uuid = Uuid::new_v4();
    let title = input.title.unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_owned());

    let uuid_str = encode_uuid(session_uuid);
    let at_str   = encode_dt(now);
    let mode_str = input.chat_mode.as_str();
    let title_c  = title.clone();
    let folder   = input.folder.clone();
    let user_id  = input.user_id;

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO chat_sessions
             (session_uuid, user_id, title, chat_mode, folder, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![uuid_str, user_id, title_c, mode_str, folder, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ChatSession {
      id,
      session_uuid,
      user_id,
      title,
      chat_mode: input.chat_mode,
      folder: input.folder,
      is_archived: false,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get_chat_session(&self, session_uuid: Uuid) -> Result<Option<ChatSession>> {
    let uuid_str = encode_uuid(session_uuid);

    let raw: Option<RawChatSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CHAT_SESSION_COLUMNS} FROM chat_sessions WHERE session_uuid = ?1"),
            rusqlite::params![uuid_str],
            RawChatSession::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawChatSession::decode).transpose()
  }

  async fn user_chat_sessions(&self, user_id: i64, limit: usize) -> Result<Vec<ChatSession>> {
    let limit = limit_param(Some(limit));

    let raws: Vec<RawChatSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHAT_SESSION_COLUMNS} FROM chat_sessions
           WHERE user_id = ?1
           ORDER BY updated_at DESC, id DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id, limit], RawChatSession::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChatSession::decode).collect()
  }

  async fn update_session_title(&self, session_id: i64, title: String) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE chat_sessions SET title = ?1, updated_at = ?2 WHERE id = ?3",
          rusqlite::params![title, at_str, session_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SessionNotFound(session_id));
    }
    Ok(())
  }

  async fn set_session_archived(&self, session_id: i64, archived: bool) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE chat_sessions SET is_archived = ?1, updated_at = ?2 WHERE id = ?3",
          rusqlite::params![archived, at_str, session_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SessionNotFound(session_id));
    }
    Ok(())
  }

  async fn add_message(&self, input: NewMessage) -> Result<StoredMessage> {
    let now = Utc::now();
    let message_uuid = Uuid::new_v4();

    let uuid_str   = encode_uuid(message_uuid);
    let at_str     = encode_dt(now);
    let role_str   = input.role.as_str();
    let type_str   = input.message_type.as_str();
    let content    = input.content.clone();
    let session_id = input.session_id;

    // Touching the parent first doubles as the existence check.
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let touched = tx.execute(
          "UPDATE chat_sessions SET updated_at = ?1 WHERE id = ?2",
          rusqlite::params![at_str, session_id],
        )?;
        if touched == 0 {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO messages
             (message_uuid, session_id, role, content, message_type, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![uuid_str, session_id, role_str, content, type_str, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Some(id))
      })
      .await?;

    let id = id.ok_or(Error::SessionNotFound(session_id))?;

    Ok(StoredMessage {
      id,
      message_uuid,
      session_id,
      role: input.role,
      content: input.content,
      message_type: input.message_type,
      created_at: now,
    })
  }

  async fn session_messages(&self, session_id: i64) -> Result<Vec<StoredMessage>> {
    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![session_id], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::decode).collect()
  }

  // ── Backend call logs ─────────────────────────────────────────────────────

  async fn log_llm_output(&self, input: NewLlmOutput) -> Result<LlmOutput> {
    let now = Utc::now();
    let output_uuid = Uuid::new_v4();

    let uuid_str = encode_uuid(output_uuid);
    let at_str   = encode_dt(now);
    let row      = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO llm_outputs
             (output_uuid, user_id, session_id, message_id, model_name, prompt_template,
              context_provided, user_question, llm_response, tokens_used, response_time_ms,
              temperature, success, error_message, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          rusqlite::params![
            uuid_str,
            row.user_id,
            row.session_id,
            row.message_id,
            row.model_name,
            row.prompt_template,
            row.context_provided,
            row.user_question,
            row.llm_response,
            row.tokens_used,
            row.response_time_ms,
            row.temperature,
            row.success,
            row.error_message,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(LlmOutput {
      id,
      output_uuid,
      user_id: input.user_id,
      session_id: input.session_id,
      message_id: input.message_id,
      model_name: input.model_name,
      prompt_template: input.prompt_template,
      context_provided: input.context_provided,
      user_question: input.user_question,
      llm_response: input.llm_response,
      tokens_used: input.tokens_used,
      response_time_ms: input.response_time_ms,
      temperature: input.temperature,
      success: input.success,
      error_message: input.error_message,
      created_at: now,
    })
  }

  async fn llm_outputs(&self, query: LlmOutputQuery) -> Result<Vec<LlmOutput>> {
    let limit = limit_param(query.limit);

    let raws: Vec<RawLlmOutput> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LLM_OUTPUT_COLUMNS} FROM llm_outputs
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR session_id = ?2)
           ORDER BY created_at DESC, id DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![query.user_id, query.session_id, limit],
            RawLlmOutput::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLlmOutput::decode).collect()
  }

  async fn log_kanoon_query(&self, input: NewKanoonQuery) -> Result<KanoonQuery> {
    let now = Utc::now();
    let query_uuid = Uuid::new_v4();

    let uuid_str = encode_uuid(query_uuid);
    let at_str   = encode_dt(now);
    let raw_json = encode_json(input.raw_api_response.as_ref())?;
    let row      = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO kanoon_queries
             (query_uuid, user_id, session_id, message_id, search_query, page_number,
              total_results_found, results_returned, response_time_ms, success,
              error_message, raw_api_response, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            uuid_str,
            row.user_id,
            row.session_id,
            row.message_id,
            row.search_query,
            row.page_number,
            row.total_results_found,
            row.results_returned,
            row.response_time_ms,
            row.success,
            row.error_message,
            raw_json,
            at_str,
          ],
        )?;
        let query_id = tx.last_insert_rowid();

        {
          let mut stmt = tx.prepare(
            "INSERT INTO kanoon_case_results
               (query_id, doc_id, title, snippet, case_link, headline, result_rank, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          for (rank, case) in (1_i64..).zip(&row.case_results) {
            stmt.execute(rusqlite::params![
              query_id,
              case.doc_id,
              case.title,
              case.snippet,
              case.case_link,
              case.headline,
              rank,
              at_str,
            ])?;
          }
        }

        tx.commit()?;
        Ok(query_id)
      })
      .await?;

    tracing::debug!(
      query_id = id,
      results = input.case_results.len(),
      "logged case search"
    );

    Ok(KanoonQuery {
      id,
      query_uuid,
      user_id: input.user_id,
      session_id: input.session_id,
      message_id: input.message_id,
      search_query: input.search_query,
      page_number: input.page_number,
      total_results_found: input.total_results_found,
      results_returned: input.results_returned,
      response_time_ms: input.response_time_ms,
      success: input.success,
      error_message: input.error_message,
      raw_api_response: input.raw_api_response,
      created_at: now,
    })
  }

  async fn kanoon_queries(
    &self,
    search_term: Option<String>,
    limit: usize,
  ) -> Result<Vec<KanoonQuery>> {
    let limit = limit_param(Some(limit));

    let raws: Vec<RawKanoonQuery> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {KANOON_QUERY_COLUMNS} FROM kanoon_queries
           WHERE (?1 IS NULL OR search_query LIKE '%' || ?1 || '%')
           ORDER BY created_at DESC, id DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![search_term, limit], RawKanoonQuery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawKanoonQuery::decode).collect()
  }

  async fn case_results(&self, query_id: i64) -> Result<Vec<KanoonCaseResult>> {
    let raws: Vec<RawCaseResult> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CASE_RESULT_COLUMNS} FROM kanoon_case_results
           WHERE query_id = ?1 ORDER BY result_rank"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![query_id], RawCaseResult::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaseResult::decode).collect()
  }

  // ── PDF uploads ───────────────────────────────────────────────────────────

  async fn log_pdf_upload(&self, input: NewPdfUpload) -> Result<PdfUpload> {
    let now = Utc::now();
    let upload_uuid = Uuid::new_v4();

    let file_size_bytes = input
      .content
      .as_ref()
      .map(|bytes| i64::try_from(bytes.len()).unwrap_or(i64::MAX));
    let file_hash = input.content.as_deref().map(sha256_hex);
    let processed_at = input.processing_status.is_terminal().then_some(now);

    let uuid_str      = encode_uuid(upload_uuid);
    let at_str        = encode_dt(now);
    let processed_str = processed_at.map(encode_dt);
    let status_str    = input.processing_status.as_str();
    let filename      = input.original_filename.clone();
    let hash          = file_hash.clone();
    let (user_id, session_id, pages) = (input.user_id, input.session_id, input.pages_count);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pdf_uploads
             (upload_uuid, user_id, session_id, original_filename, file_size_bytes, file_hash,
              mime_type, pages_count, chunk_size, chunk_overlap, embedding_model,
              processing_status, created_at, processed_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            uuid_str,
            user_id,
            session_id,
            filename,
            file_size_bytes,
            hash,
            PDF_MIME_TYPE,
            pages,
            DEFAULT_CHUNK_SIZE,
            DEFAULT_CHUNK_OVERLAP,
            DEFAULT_EMBEDDING_MODEL,
            status_str,
            at_str,
            processed_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(PdfUpload {
      id,
      upload_uuid,
      user_id: input.user_id,
      session_id: input.session_id,
      original_filename: input.original_filename,
      file_size_bytes,
      file_hash,
      mime_type: PDF_MIME_TYPE.to_owned(),
      pages_count: input.pages_count,
      chunks_processed: 0,
      chunk_size: DEFAULT_CHUNK_SIZE,
      chunk_overlap: DEFAULT_CHUNK_OVERLAP,
      index_path: None,
      embedding_model: DEFAULT_EMBEDDING_MODEL.to_owned(),
      processing_status: input.processing_status,
      error_message: None,
      created_at: now,
      processed_at,
    })
  }

  async fn update_pdf_status(&self, update: PdfStatusUpdate) -> Result<PdfUpload> {
    let upload_id     = update.upload_id;
    let status_str    = update.status.as_str();
    let processed_str = update.status.is_terminal().then(|| encode_dt(Utc::now()));

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE pdf_uploads
           SET processing_status = ?1,
               chunks_processed  = COALESCE(?2, chunks_processed),
               error_message     = COALESCE(?3, error_message),
               processed_at      = COALESCE(?4, processed_at)
           WHERE id = ?5
             AND processing_status NOT IN ('completed', 'failed')",
          rusqlite::params![
            status_str,
            update.chunks_processed,
            update.error_message,
            processed_str,
            upload_id,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(match self.pdf_upload_by_id(upload_id).await? {
        Some(_) => Error::UploadFinished(upload_id),
        None => Error::UploadNotFound(upload_id),
      });
    }

    tracing::debug!(upload_id, status = status_str, "pdf status updated");

    self
      .pdf_upload_by_id(upload_id)
      .await?
      .ok_or(Error::UploadNotFound(upload_id))
  }

  async fn add_pdf_chunks(&self, upload_id: i64, chunks: Vec<String>) -> Result<usize> {
    let at_str = encode_dt(Utc::now());
    let hashed: Vec<(String, String)> = chunks
      .into_iter()
      .map(|text| {
        let hash = sha256_hex(text.as_bytes());
        (text, hash)
      })
      .collect();

    let added: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM pdf_uploads WHERE id = ?1",
            rusqlite::params![upload_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let start: i64 = tx.query_row(
          "SELECT COALESCE(MAX(chunk_index) + 1, 0) FROM pdf_text_chunks WHERE upload_id = ?1",
          rusqlite::params![upload_id],
          |r| r.get(0),
        )?;

        {
          let mut stmt = tx.prepare(
            "INSERT INTO pdf_text_chunks (upload_id, chunk_index, chunk_text, chunk_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (index, (text, hash)) in (start..).zip(&hashed) {
            stmt.execute(rusqlite::params![upload_id, index, text, hash, at_str])?;
          }
        }

        tx.commit()?;
        Ok(Some(hashed.len()))
      })
      .await?;

    added.ok_or(Error::UploadNotFound(upload_id))
  }

  async fn pdf_chunks(&self, upload_id: i64) -> Result<Vec<PdfTextChunk>> {
    let raws: Vec<RawPdfChunk> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PDF_CHUNK_COLUMNS} FROM pdf_text_chunks
           WHERE upload_id = ?1 ORDER BY chunk_index"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![upload_id], RawPdfChunk::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPdfChunk::decode).collect()
  }

  // ── Access logs, feedback, rate limits ────────────────────────────────────

  async fn log_access(&self, input: NewAccessLog) -> Result<AccessLog> {
    let now = Utc::now();

    let at_str    = encode_dt(now);
    let body_json = encode_json(input.request_body.as_ref())?;
    let row       = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO access_logs
             (user_id, user_uuid, session_id, ip_address, user_agent, endpoint, http_method,
              request_body, response_status_code, response_time_ms, error_message, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            row.user_id,
            row.user_uuid,
            row.session_id,
            row.ip_address,
            row.user_agent,
            row.endpoint,
            row.http_method,
            body_json,
            row.response_status_code,
            row.response_time_ms,
            row.error_message,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AccessLog {
      id,
      user_id: input.user_id,
      user_uuid: input.user_uuid,
      session_id: input.session_id,
      ip_address: input.ip_address,
      user_agent: input.user_agent,
      endpoint: input.endpoint,
      http_method: input.http_method,
      request_body: input.request_body,
      response_status_code: input.response_status_code,
      response_time_ms: input.response_time_ms,
      error_message: input.error_message,
      created_at: now,
    })
  }

  async fn access_logs(&self, query: AccessLogQuery) -> Result<Vec<AccessLog>> {
    let limit = limit_param(query.limit);

    let raws: Vec<RawAccessLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACCESS_LOG_COLUMNS} FROM access_logs
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR endpoint = ?2)
           ORDER BY created_at DESC, id DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![query.user_id, query.endpoint, limit],
            RawAccessLog::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccessLog::decode).collect()
  }

  async fn add_feedback(&self, input: NewFeedback) -> Result<Feedback> {
    if let Some(rating) = input.rating {
      if !(1..=5).contains(&rating) {
        return Err(Error::InvalidRating(rating));
      }
    }

    let now = Utc::now();
    let feedback_uuid = Uuid::new_v4();

    let uuid_str   = encode_uuid(feedback_uuid);
    let at_str     = encode_dt(now);
    let target     = input.target_uuid.map(encode_uuid);
    let type_str   = input.feedback_type.as_str();
    let text       = input.feedback_text.clone();
    let (user_id, rating) = (input.user_id, input.rating);

    let (id, message_id, llm_output_id, kanoon_query_id) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let resolve = |sql: &str| -> rusqlite::Result<Option<i64>> {
          match &target {
            Some(t) => tx.query_row(sql, rusqlite::params![t], |r| r.get(0)).optional(),
            None => Ok(None),
          }
        };
        let message_id = resolve("SELECT id FROM messages WHERE message_uuid = ?1")?;
        let llm_output_id = resolve("SELECT id FROM llm_outputs WHERE output_uuid = ?1")?;
        let kanoon_query_id = resolve("SELECT id FROM kanoon_queries WHERE query_uuid = ?1")?;

        tx.execute(
          "INSERT INTO feedback
             (feedback_uuid, user_id, message_id, llm_output_id, kanoon_query_id, rating,
              feedback_type, feedback_text, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            uuid_str,
            user_id,
            message_id,
            llm_output_id,
            kanoon_query_id,
            rating,
            type_str,
            text,
            at_str,
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok((id, message_id, llm_output_id, kanoon_query_id))
      })
      .await?;

    if input.target_uuid.is_some()
      && message_id.is_none()
      && llm_output_id.is_none()
      && kanoon_query_id.is_none()
    {
      tracing::debug!(feedback_id = id, "feedback target not found; stored unlinked");
    }

    Ok(Feedback {
      id,
      feedback_uuid,
      user_id: input.user_id,
      message_id,
      llm_output_id,
      kanoon_query_id,
      rating: input.rating,
      feedback_type: input.feedback_type,
      feedback_text: input.feedback_text,
      created_at: now,
    })
  }

  async fn hit_rate_limit(
    &self,
    key: RateLimitKey,
    window: Duration,
    now: DateTime<Utc>,
  ) -> Result<RateLimitWindow> {
    let now_str = encode_dt(now);
    let end_str = encode_dt(now + window);

    let (count, start, end): (u32, String, String) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "DELETE FROM api_rate_limits WHERE window_end <= ?1",
          rusqlite::params![now_str],
        )?;

        let live: Option<(i64, u32, String, String)> = tx
          .query_row(
            "SELECT id, request_count, window_start, window_end FROM api_rate_limits
             WHERE endpoint = ?1 AND user_id IS ?2 AND ip_address IS ?3
               AND window_start <= ?4 AND window_end > ?4
             ORDER BY id DESC
             LIMIT 1",
            rusqlite::params![key.endpoint, key.user_id, key.ip_address, now_str],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
          )
          .optional()?;

        let state = match live {
          Some((id, count, start, end)) => {
            tx.execute(
              "UPDATE api_rate_limits SET request_count = request_count + 1 WHERE id = ?1",
              rusqlite::params![id],
            )?;
            (count.saturating_add(1), start, end)
          }
          None => {
            tx.execute(
              "INSERT INTO api_rate_limits
                 (user_id, ip_address, endpoint, request_count, window_start, window_end)
               VALUES (?1, ?2, ?3, 1, ?4, ?5)",
              rusqlite::params![key.user_id, key.ip_address, key.endpoint, now_str, end_str],
            )?;
            (1, now_str, end_str)
          }
        };

        tx.commit()?;
        Ok(state)
      })
      .await?;

    Ok(RateLimitWindow {
      request_count: count,
      window_start:  decode_dt(&start)?,
      window_end:    decode_dt(&end)?,
    })
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  async fn metric(&self, date: NaiveDate, metric: MetricType) -> Result<i64> {
    let date_str   = encode_date(date);
    let metric_str = metric.as_str();

    let value: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT metric_value FROM analytics WHERE date = ?1 AND metric_type = ?2",
            rusqlite::params![date_str, metric_str],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(value.unwrap_or(0))
  }

  async fn analytics(&self, since: NaiveDate) -> Result<Vec<AnalyticsRow>> {
    let since_str = encode_date(since);

    let raws: Vec<(String, String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT date, metric_type, metric_value FROM analytics
           WHERE date >= ?1
           ORDER BY date DESC, metric_type",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since_str], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(date, metric_type, metric_value)| {
        Ok(AnalyticsRow {
          date: decode_date(&date)?,
          metric_type: decode_enum(&metric_type)?,
          metric_value,
        })
      })
      .collect()
  }

  async fn daily_stats(&self, since: DateTime<Utc>) -> Result<Vec<DailyStat>> {
    let since_str = encode_dt(since);

    let raws: Vec<(String, i64, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT substr(created_at, 1, 10) AS day, COUNT(*), COUNT(DISTINCT user_id)
           FROM access_logs
           WHERE created_at >= ?1
           GROUP BY day
           ORDER BY day DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since_str], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(day, total_requests, unique_users)| {
        Ok(DailyStat { date: decode_date(&day)?, total_requests, unique_users })
      })
      .collect()
  }

  async fn popular_searches(&self, limit: usize) -> Result<Vec<PopularSearch>> {
    let limit = limit_param(Some(limit));

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT search_query, COUNT(*) AS hits FROM kanoon_queries
           WHERE success = 1
           GROUP BY search_query
           ORDER BY hits DESC, search_query
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |r| {
            Ok(PopularSearch { query: r.get(0)?, count: r.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}
