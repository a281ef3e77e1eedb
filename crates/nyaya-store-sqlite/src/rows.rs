//! Raw row types read inside a `tokio_rusqlite` call and decoded afterwards.
//!
//! Reading happens on the database thread and can only fail with
//! `rusqlite::Error`; decoding text columns into domain types happens back on
//! the caller's task, where it can fail with [`crate::Error`].

use nyaya_core::records::{
  AccessLog, ChatSession, Feedback, KanoonCaseResult, KanoonQuery, LlmOutput,
  PdfTextChunk, PdfUpload, StoredMessage, User, UserSession,
};
use rusqlite::Row;

use crate::{
  Result,
  encode::{decode_dt, decode_enum, decode_json, decode_opt_dt, decode_uuid},
};

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, user_uuid, full_name, email, phone, password_hash, \
   is_active, is_verified, role, created_at, updated_at, last_login_at";

pub struct RawUser {
  id:            i64,
  user_uuid:     String,
  full_name:     String,
  email:         String,
  phone:         Option<String>,
  password_hash: String,
  is_active:     bool,
  is_verified:   bool,
  role:          String,
  created_at:    String,
  updated_at:    String,
  last_login_at: Option<String>,
}

impl RawUser {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            r.get(0)?,
      user_uuid:     r.get(1)?,
      full_name:     r.get(2)?,
      email:         r.get(3)?,
      phone:         r.get(4)?,
      password_hash: r.get(5)?,
      is_active:     r.get(6)?,
      is_verified:   r.get(7)?,
      role:          r.get(8)?,
      created_at:    r.get(9)?,
      updated_at:    r.get(10)?,
      last_login_at: r.get(11)?,
    })
  }

  pub fn decode(self) -> Result<User> {
    Ok(User {
      id:            self.id,
      user_uuid:     decode_uuid(&self.user_uuid)?,
      full_name:     self.full_name,
      email:         self.email,
      phone:         self.phone,
      password_hash: self.password_hash,
      is_active:     self.is_active,
      is_verified:   self.is_verified,
      role:          decode_enum(&self.role)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      last_login_at: decode_opt_dt(self.last_login_at)?,
    })
  }
}

pub const USER_SESSION_COLUMNS: &str = "id, session_token, user_id, ip_address, user_agent, \
   is_active, created_at, expires_at, last_activity_at";

pub struct RawUserSession {
  id:               i64,
  session_token:    String,
  user_id:          i64,
  ip_address:       Option<String>,
  user_agent:       Option<String>,
  is_active:        bool,
  created_at:       String,
  expires_at:       String,
  last_activity_at: String,
}

impl RawUserSession {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               r.get(0)?,
      session_token:    r.get(1)?,
      user_id:          r.get(2)?,
      ip_address:       r.get(3)?,
      user_agent:       r.get(4)?,
      is_active:        r.get(5)?,
      created_at:       r.get(6)?,
      expires_at:       r.get(7)?,
      last_activity_at: r.get(8)?,
    })
  }

  pub fn decode(self) -> Result<UserSession> {
    Ok(UserSession {
      id:               self.id,
      session_token:    self.session_token,
      user_id:          self.user_id,
      ip_address:       self.ip_address,
      user_agent:       self.user_agent,
      is_active:        self.is_active,
      created_at:       decode_dt(&self.created_at)?,
      expires_at:       decode_dt(&self.expires_at)?,
      last_activity_at: decode_dt(&self.last_activity_at)?,
    })
  }
}

// ─── Chat ────────────────────────────────────────────────────────────────────

pub const CHAT_SESSION_COLUMNS: &str = "id, session_uuid, user_id, title, chat_mode, folder, \
   is_archived, created_at, updated_at";

pub struct RawChatSession {
  id:           i64,
  session_uuid: String,
  user_id:      Option<i64>,
  title:        String,
  chat_mode:    String,
  folder:       Option<String>,
  is_archived:  bool,
  created_at:   String,
  updated_at:   String,
}

impl RawChatSession {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           r.get(0)?,
      session_uuid: r.get(1)?,
      user_id:      r.get(2)?,
      title:        r.get(3)?,
      chat_mode:    r.get(4)?,
      folder:       r.get(5)?,
      is_archived:  r.get(6)?,
      created_at:   r.get(7)?,
      updated_at:   r.get(8)?,
    })
  }

  pub fn decode(self) -> Result<ChatSession> {
    Ok(ChatSession {
      id:           self.id,
      session_uuid: decode_uuid(&self.session_uuid)?,
      user_id:      self.user_id,
      title:        self.title,
      chat_mode:    decode_enum(&self.chat_mode)?,
      folder:       self.folder,
      is_archived:  self.is_archived,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "id, message_uuid, session_id, role, content, message_type, created_at";

pub struct RawMessage {
  id:           i64,
  message_uuid: String,
  session_id:   i64,
  role:         String,
  content:      String,
  message_type: String,
  created_at:   String,
}

impl RawMessage {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           r.get(0)?,
      message_uuid: r.get(1)?,
      session_id:   r.get(2)?,
      role:         r.get(3)?,
      content:      r.get(4)?,
      message_type: r.get(5)?,
      created_at:   r.get(6)?,
    })
  }

  pub fn decode(self) -> Result<StoredMessage> {
    Ok(StoredMessage {
      id:           self.id,
      message_uuid: decode_uuid(&self.message_uuid)?,
      session_id:   self.session_id,
      role:         decode_enum(&self.role)?,
      content:      self.content,
      message_type: decode_enum(&self.message_type)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

// ─── LLM outputs ─────────────────────────────────────────────────────────────

pub const LLM_OUTPUT_COLUMNS: &str = "id, output_uuid, user_id, session_id, message_id, \
   model_name, prompt_template, context_provided, user_question, llm_response, tokens_used, \
   response_time_ms, temperature, success, error_message, created_at";

pub struct RawLlmOutput {
  id:               i64,
  output_uuid:      String,
  user_id:          Option<i64>,
  session_id:       Option<i64>,
  message_id:       Option<i64>,
  model_name:       String,
  prompt_template:  Option<String>,
  context_provided: Option<String>,
  user_question:    String,
  llm_response:     String,
  tokens_used:      Option<i64>,
  response_time_ms: Option<i64>,
  temperature:      f64,
  success:          bool,
  error_message:    Option<String>,
  created_at:       String,
}

impl RawLlmOutput {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               r.get(0)?,
      output_uuid:      r.get(1)?,
      user_id:          r.get(2)?,
      session_id:       r.get(3)?,
      message_id:       r.get(4)?,
      model_name:       r.get(5)?,
      prompt_template:  r.get(6)?,
      context_provided: r.get(7)?,
      user_question:    r.get(8)?,
      llm_response:     r.get(9)?,
      tokens_used:      r.get(10)?,
      response_time_ms: r.get(11)?,
      temperature:      r.get(12)?,
      success:          r.get(13)?,
      error_message:    r.get(14)?,
      created_at:       r.get(15)?,
    })
  }

  pub fn decode(self) -> Result<LlmOutput> {
    Ok(LlmOutput {
      id:               self.id,
      output_uuid:      decode_uuid(&self.output_uuid)?,
      user_id:          self.user_id,
      session_id:       self.session_id,
      message_id:       self.message_id,
      model_name:       self.model_name,
      prompt_template:  self.prompt_template,
      context_provided: self.context_provided,
      user_question:    self.user_question,
      llm_response:     self.llm_response,
      tokens_used:      self.tokens_used,
      response_time_ms: self.response_time_ms,
      temperature:      self.temperature,
      success:          self.success,
      error_message:    self.error_message,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── Case search ─────────────────────────────────────────────────────────────

pub const KANOON_QUERY_COLUMNS: &str = "id, query_uuid, user_id, session_id, message_id, \
   search_query, page_number, total_results_found, results_returned, response_time_ms, \
   success, error_message, raw_api_response, created_at";

pub struct RawKanoonQuery {
  id:                  i64,
  query_uuid:          String,
  user_id:             Option<i64>,
  session_id:          Option<i64>,
  message_id:          Option<i64>,
  search_query:        String,
  page_number:         i64,
  total_results_found: i64,
  results_returned:    i64,
  response_time_ms:    Option<i64>,
  success:             bool,
  error_message:       Option<String>,
  raw_api_response:    Option<String>,
  created_at:          String,
}

impl RawKanoonQuery {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  r.get(0)?,
      query_uuid:          r.get(1)?,
      user_id:             r.get(2)?,
      session_id:          r.get(3)?,
      message_id:          r.get(4)?,
      search_query:        r.get(5)?,
      page_number:         r.get(6)?,
      total_results_found: r.get(7)?,
      results_returned:    r.get(8)?,
      response_time_ms:    r.get(9)?,
      success:             r.get(10)?,
      error_message:       r.get(11)?,
      raw_api_response:    r.get(12)?,
      created_at:          r.get(13)?,
    })
  }

  pub fn decode(self) -> Result<KanoonQuery> {
    Ok(KanoonQuery {
      id:                  self.id,
      query_uuid:          decode_uuid(&self.query_uuid)?,
      user_id:             self.user_id,
      session_id:          self.session_id,
      message_id:          self.message_id,
      search_query:        self.search_query,
      page_number:         self.page_number,
      total_results_found: self.total_results_found,
      results_returned:    self.results_returned,
      response_time_ms:    self.response_time_ms,
      success:             self.success,
      error_message:       self.error_message,
      raw_api_response:    decode_json(self.raw_api_response)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub const CASE_RESULT_COLUMNS: &str =
  "id, query_id, doc_id, title, snippet, case_link, headline, result_rank, created_at";

pub struct RawCaseResult {
  id:          i64,
  query_id:    i64,
  doc_id:      String,
  title:       Option<String>,
  snippet:     Option<String>,
  case_link:   Option<String>,
  headline:    Option<String>,
  result_rank: i64,
  created_at:  String,
}

impl RawCaseResult {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          r.get(0)?,
      query_id:    r.get(1)?,
      doc_id:      r.get(2)?,
      title:       r.get(3)?,
      snippet:     r.get(4)?,
      case_link:   r.get(5)?,
      headline:    r.get(6)?,
      result_rank: r.get(7)?,
      created_at:  r.get(8)?,
    })
  }

  pub fn decode(self) -> Result<KanoonCaseResult> {
    Ok(KanoonCaseResult {
      id:          self.id,
      query_id:    self.query_id,
      doc_id:      self.doc_id,
      title:       self.title,
      snippet:     self.snippet,
      case_link:   self.case_link,
      headline:    self.headline,
      result_rank: self.result_rank,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── PDF uploads ─────────────────────────────────────────────────────────────

pub const PDF_UPLOAD_COLUMNS: &str = "id, upload_uuid, user_id, session_id, original_filename, \
   file_size_bytes, file_hash, mime_type, pages_count, chunks_processed, chunk_size, \
   chunk_overlap, index_path, embedding_model, processing_status, error_message, created_at, \
   processed_at";

pub struct RawPdfUpload {
  id:                i64,
  upload_uuid:       String,
  user_id:           Option<i64>,
  session_id:        Option<i64>,
  original_filename: String,
  file_size_bytes:   Option<i64>,
  file_hash:         Option<String>,
  mime_type:         String,
  pages_count:       Option<i64>,
  chunks_processed:  i64,
  chunk_size:        i64,
  chunk_overlap:     i64,
  index_path:        Option<String>,
  embedding_model:   String,
  processing_status: String,
  error_message:     Option<String>,
  created_at:        String,
  processed_at:      Option<String>,
}

impl RawPdfUpload {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                r.get(0)?,
      upload_uuid:       r.get(1)?,
      user_id:           r.get(2)?,
      session_id:        r.get(3)?,
      original_filename: r.get(4)?,
      file_size_bytes:   r.get(5)?,
      file_hash:         r.get(6)?,
      mime_type:         r.get(7)?,
      pages_count:       r.get(8)?,
      chunks_processed:  r.get(9)?,
      chunk_size:        r.get(10)?,
      chunk_overlap:     r.get(11)?,
      index_path:        r.get(12)?,
      embedding_model:   r.get(13)?,
      processing_status: r.get(14)?,
      error_message:     r.get(15)?,
      created_at:        r.get(16)?,
      processed_at:      r.get(17)?,
    })
  }

  pub fn decode(self) -> Result<PdfUpload> {
    Ok(PdfUpload {
      id:                self.id,
      upload_uuid:       decode_uuid(&self.upload_uuid)?,
      user_id:           self.user_id,
      session_id:        self.session_id,
      original_filename: self.original_filename,
      file_size_bytes:   self.file_size_bytes,
      file_hash:         self.file_hash,
      mime_type:         self.mime_type,
      pages_count:       self.pages_count,
      chunks_processed:  self.chunks_processed,
      chunk_size:        self.chunk_size,
      chunk_overlap:     self.chunk_overlap,
      index_path:        self.index_path,
      embedding_model:   self.embedding_model,
      processing_status: decode_enum(&self.processing_status)?,
      error_message:     self.error_message,
      created_at:        decode_dt(&self.created_at)?,
      processed_at:      decode_opt_dt(self.processed_at)?,
    })
  }
}

pub const PDF_CHUNK_COLUMNS: &str =
  "id, upload_id, chunk_index, chunk_text, chunk_hash, created_at";

pub struct RawPdfChunk {
  id:          i64,
  upload_id:   i64,
  chunk_index: i64,
  chunk_text:  String,
  chunk_hash:  String,
  created_at:  String,
}

impl RawPdfChunk {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          r.get(0)?,
      upload_id:   r.get(1)?,
      chunk_index: r.get(2)?,
      chunk_text:  r.get(3)?,
      chunk_hash:  r.get(4)?,
      created_at:  r.get(5)?,
    })
  }

  pub fn decode(self) -> Result<PdfTextChunk> {
    Ok(PdfTextChunk {
      id:          self.id,
      upload_id:   self.upload_id,
      chunk_index: self.chunk_index,
      chunk_text:  self.chunk_text,
      chunk_hash:  self.chunk_hash,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Access logs ─────────────────────────────────────────────────────────────

pub const ACCESS_LOG_COLUMNS: &str = "id, user_id, user_uuid, session_id, ip_address, \
   user_agent, endpoint, http_method, request_body, response_status_code, response_time_ms, \
   error_message, created_at";

pub struct RawAccessLog {
  id:                   i64,
  user_id:              Option<i64>,
  user_uuid:            Option<String>,
  session_id:           Option<String>,
  ip_address:           Option<String>,
  user_agent:           Option<String>,
  endpoint:             String,
  http_method:          String,
  request_body:         Option<String>,
  response_status_code: Option<u16>,
  response_time_ms:     Option<i64>,
  error_message:        Option<String>,
  created_at:           String,
}

impl RawAccessLog {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   r.get(0)?,
      user_id:              r.get(1)?,
      user_uuid:            r.get(2)?,
      session_id:           r.get(3)?,
      ip_address:           r.get(4)?,
      user_agent:           r.get(5)?,
      endpoint:             r.get(6)?,
      http_method:          r.get(7)?,
      request_body:         r.get(8)?,
      response_status_code: r.get(9)?,
      response_time_ms:     r.get(10)?,
      error_message:        r.get(11)?,
      created_at:           r.get(12)?,
    })
  }

  pub fn decode(self) -> Result<AccessLog> {
    Ok(AccessLog {
      id:                   self.id,
      user_id:              self.user_id,
      user_uuid:            self.user_uuid,
      session_id:           self.session_id,
      ip_address:           self.ip_address,
      user_agent:           self.user_agent,
      endpoint:             self.endpoint,
      http_method:          self.http_method,
      request_body:         decode_json(self.request_body)?,
      response_status_code: self.response_status_code,
      response_time_ms:     self.response_time_ms,
      error_message:        self.error_message,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

// ─── Feedback ────────────────────────────────────────────────────────────────

pub const FEEDBACK_COLUMNS: &str = "id, feedback_uuid, user_id, message_id, llm_output_id, \
   kanoon_query_id, rating, feedback_type, feedback_text, created_at";

pub struct RawFeedback {
  id:              i64,
  feedback_uuid:   String,
  user_id:         Option<i64>,
  message_id:      Option<i64>,
  llm_output_id:   Option<i64>,
  kanoon_query_id: Option<i64>,
  rating:          Option<u8>,
  feedback_type:   String,
  feedback_text:   Option<String>,
  created_at:      String,
}

impl RawFeedback {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              r.get(0)?,
      feedback_uuid:   r.get(1)?,
      user_id:         r.get(2)?,
      message_id:      r.get(3)?,
      llm_output_id:   r.get(4)?,
      kanoon_query_id: r.get(5)?,
      rating:          r.get(6)?,
      feedback_type:   r.get(7)?,
      feedback_text:   r.get(8)?,
      created_at:      r.get(9)?,
    })
  }

  pub fn decode(self) -> Result<Feedback> {
    Ok(Feedback {
      id:              self.id,
      feedback_uuid:   decode_uuid(&self.feedback_uuid)?,
      user_id:         self.user_id,
      message_id:      self.message_id,
      llm_output_id:   self.llm_output_id,
      kanoon_query_id: self.kanoon_query_id,
      rating:          self.rating,
      feedback_type:   decode_enum(&self.feedback_type)?,
      feedback_text:   self.feedback_text,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
