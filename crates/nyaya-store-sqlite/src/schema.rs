//! SQL schema for the NyayAssist SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision; future migrations will be gated on it.
//!
//! Timestamps are fixed-width RFC 3339 UTC strings
//! (`YYYY-MM-DDTHH:MM:SS.ffffffZ`), so `substr(ts, 1, 10)` is the UTC
//! calendar date and text ordering is chronological.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Users ────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS users (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_uuid           TEXT NOT NULL UNIQUE,
    full_name           TEXT NOT NULL,
    email               TEXT NOT NULL UNIQUE,
    phone               TEXT,
    password_hash       TEXT NOT NULL,
    is_active           INTEGER NOT NULL DEFAULT 1,
    is_verified         INTEGER NOT NULL DEFAULT 0,
    profile_picture_url TEXT,
    role                TEXT NOT NULL DEFAULT 'user'
                        CHECK (role IN ('user', 'admin', 'moderator')),
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    last_login_at       TEXT
);

CREATE TABLE IF NOT EXISTS user_sessions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    session_token    TEXT NOT NULL UNIQUE,
    user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    ip_address       TEXT,
    user_agent       TEXT,
    is_active        INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT NOT NULL,
    expires_at       TEXT NOT NULL,
    last_activity_at TEXT NOT NULL
);

-- ── Access logs ──────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS access_logs (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id              INTEGER REFERENCES users(id) ON DELETE SET NULL,
    user_uuid            TEXT,
    session_id           TEXT,
    ip_address           TEXT,
    user_agent           TEXT,
    endpoint             TEXT NOT NULL,
    http_method          TEXT NOT NULL,
    request_body         TEXT,             -- JSON
    response_status_code INTEGER,
    response_time_ms     INTEGER,
    error_message        TEXT,
    created_at           TEXT NOT NULL
);

-- ── Chat ─────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS chat_sessions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    session_uuid TEXT NOT NULL UNIQUE,
    user_id      INTEGER REFERENCES users(id) ON DELETE CASCADE,
    title        TEXT NOT NULL DEFAULT 'New Chat',
    chat_mode    TEXT NOT NULL CHECK (chat_mode IN ('PDF_CHAT', 'KANOON_SEARCH')),
    folder       TEXT,
    is_archived  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    message_uuid TEXT NOT NULL UNIQUE,
    session_id   INTEGER NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
    role         TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
    content      TEXT NOT NULL,
    message_type TEXT NOT NULL DEFAULT 'text'
                 CHECK (message_type IN ('text', 'cases', 'error', 'system')),
    created_at   TEXT NOT NULL
);

-- ── Backend call logs ────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS llm_outputs (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    output_uuid      TEXT NOT NULL UNIQUE,
    user_id          INTEGER REFERENCES users(id) ON DELETE SET NULL,
    session_id       INTEGER REFERENCES chat_sessions(id) ON DELETE SET NULL,
    message_id       INTEGER REFERENCES messages(id) ON DELETE SET NULL,
    model_name       TEXT NOT NULL DEFAULT 'gemini-2.5-flash',
    prompt_template  TEXT,
    context_provided TEXT,
    user_question    TEXT NOT NULL,
    llm_response     TEXT NOT NULL,
    tokens_used      INTEGER,
    response_time_ms INTEGER,
    temperature      REAL NOT NULL DEFAULT 0.30,
    success          INTEGER NOT NULL DEFAULT 1,
    error_message    TEXT,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kanoon_queries (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    query_uuid          TEXT NOT NULL UNIQUE,
    user_id             INTEGER REFERENCES users(id) ON DELETE SET NULL,
    session_id          INTEGER REFERENCES chat_sessions(id) ON DELETE SET NULL,
    message_id          INTEGER REFERENCES messages(id) ON DELETE SET NULL,
    search_query        TEXT NOT NULL,
    page_number         INTEGER NOT NULL DEFAULT 0,
    total_results_found INTEGER NOT NULL DEFAULT 0,
    results_returned    INTEGER NOT NULL DEFAULT 0,
    response_time_ms    INTEGER,
    success             INTEGER NOT NULL DEFAULT 1,
    error_message       TEXT,
    raw_api_response    TEXT,              -- JSON
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kanoon_case_results (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    query_id    INTEGER NOT NULL REFERENCES kanoon_queries(id) ON DELETE CASCADE,
    doc_id      TEXT NOT NULL,
    title       TEXT,
    snippet     TEXT,
    case_link   TEXT,
    headline    TEXT,
    result_rank INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

-- ── PDF uploads ──────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS pdf_uploads (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    upload_uuid       TEXT NOT NULL UNIQUE,
    user_id           INTEGER REFERENCES users(id) ON DELETE SET NULL,
    session_id        INTEGER REFERENCES chat_sessions(id) ON DELETE SET NULL,
    original_filename TEXT NOT NULL,
    file_size_bytes   INTEGER,
    file_hash         TEXT,
    mime_type         TEXT NOT NULL DEFAULT 'application/pdf',
    pages_count       INTEGER,
    chunks_processed  INTEGER NOT NULL DEFAULT 0,
    chunk_size        INTEGER NOT NULL DEFAULT 10000,
    chunk_overlap     INTEGER NOT NULL DEFAULT 1000,
    index_path        TEXT,
    embedding_model   TEXT NOT NULL DEFAULT 'sentence-transformers/all-MiniLM-L6-v2',
    processing_status TEXT NOT NULL DEFAULT 'pending'
                      CHECK (processing_status IN ('pending', 'processing', 'completed', 'failed')),
    error_message     TEXT,
    created_at        TEXT NOT NULL,
    processed_at      TEXT
);

CREATE TABLE IF NOT EXISTS pdf_text_chunks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    upload_id   INTEGER NOT NULL REFERENCES pdf_uploads(id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    chunk_text  TEXT NOT NULL,
    chunk_hash  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (upload_id, chunk_index)
);

-- ── Rate limits, analytics, feedback ─────────────────────────────────────

CREATE TABLE IF NOT EXISTS api_rate_limits (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER REFERENCES users(id) ON DELETE CASCADE,
    ip_address    TEXT,
    endpoint      TEXT NOT NULL,
    request_count INTEGER NOT NULL DEFAULT 1,
    window_start  TEXT NOT NULL,
    window_end    TEXT NOT NULL
);

-- One row per (date, metric); only ever written by the triggers below.
CREATE TABLE IF NOT EXISTS analytics (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    date            TEXT NOT NULL,          -- YYYY-MM-DD (UTC)
    metric_type     TEXT NOT NULL CHECK (metric_type IN
                    ('daily_users', 'daily_queries', 'pdf_uploads', 'kanoon_searches', 'llm_calls')),
    metric_value    INTEGER NOT NULL DEFAULT 0,
    additional_data TEXT,                   -- JSON
    created_at      TEXT NOT NULL,
    UNIQUE (date, metric_type)
);

CREATE TABLE IF NOT EXISTS feedback (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    feedback_uuid   TEXT NOT NULL UNIQUE,
    user_id         INTEGER REFERENCES users(id) ON DELETE SET NULL,
    message_id      INTEGER REFERENCES messages(id) ON DELETE SET NULL,
    llm_output_id   INTEGER REFERENCES llm_outputs(id) ON DELETE SET NULL,
    kanoon_query_id INTEGER REFERENCES kanoon_queries(id) ON DELETE SET NULL,
    rating          INTEGER CHECK (rating BETWEEN 1 AND 5),
    feedback_type   TEXT NOT NULL CHECK (feedback_type IN
                    ('helpful', 'not_helpful', 'incorrect', 'offensive', 'other')),
    feedback_text   TEXT,
    created_at      TEXT NOT NULL
);

-- ── Indexes ──────────────────────────────────────────────────────────────

CREATE INDEX IF NOT EXISTS access_logs_created_idx    ON access_logs(created_at);
CREATE INDEX IF NOT EXISTS access_logs_endpoint_idx   ON access_logs(endpoint);
CREATE INDEX IF NOT EXISTS chat_sessions_user_idx     ON chat_sessions(user_id);
CREATE INDEX IF NOT EXISTS messages_session_idx       ON messages(session_id);
CREATE INDEX IF NOT EXISTS llm_outputs_created_idx    ON llm_outputs(created_at);
CREATE INDEX IF NOT EXISTS kanoon_queries_created_idx ON kanoon_queries(created_at);
CREATE INDEX IF NOT EXISTS rate_limits_key_idx        ON api_rate_limits(endpoint, ip_address, user_id);

-- ── Daily counters ───────────────────────────────────────────────────────
-- Insert-or-increment: concurrent writers can never create a duplicate row
-- or lose an increment.

CREATE TRIGGER IF NOT EXISTS count_llm_calls
AFTER INSERT ON llm_outputs
BEGIN
    INSERT INTO analytics (date, metric_type, metric_value, created_at)
    VALUES (substr(NEW.created_at, 1, 10), 'llm_calls', 1, NEW.created_at)
    ON CONFLICT (date, metric_type) DO UPDATE SET metric_value = metric_value + 1;
END;

CREATE TRIGGER IF NOT EXISTS count_kanoon_searches
AFTER INSERT ON kanoon_queries
BEGIN
    INSERT INTO analytics (date, metric_type, metric_value, created_at)
    VALUES (substr(NEW.created_at, 1, 10), 'kanoon_searches', 1, NEW.created_at)
    ON CONFLICT (date, metric_type) DO UPDATE SET metric_value = metric_value + 1;
END;

CREATE TRIGGER IF NOT EXISTS count_pdf_uploads
AFTER INSERT ON pdf_uploads
BEGIN
    INSERT INTO analytics (date, metric_type, metric_value, created_at)
    VALUES (substr(NEW.created_at, 1, 10), 'pdf_uploads', 1, NEW.created_at)
    ON CONFLICT (date, metric_type) DO UPDATE SET metric_value = metric_value + 1;
END;

CREATE TRIGGER IF NOT EXISTS count_daily_queries
AFTER INSERT ON messages
WHEN NEW.role = 'user'
BEGIN
    INSERT INTO analytics (date, metric_type, metric_value, created_at)
    VALUES (substr(NEW.created_at, 1, 10), 'daily_queries', 1, NEW.created_at)
    ON CONFLICT (date, metric_type) DO UPDATE SET metric_value = metric_value + 1;
END;

-- First login of the day for a user bumps daily_users.
CREATE TRIGGER IF NOT EXISTS count_daily_users
AFTER UPDATE OF last_login_at ON users
WHEN NEW.last_login_at IS NOT NULL
 AND (OLD.last_login_at IS NULL
      OR substr(OLD.last_login_at, 1, 10) <> substr(NEW.last_login_at, 1, 10))
BEGIN
    INSERT INTO analytics (date, metric_type, metric_value, created_at)
    VALUES (substr(NEW.last_login_at, 1, 10), 'daily_users', 1, NEW.last_login_at)
    ON CONFLICT (date, metric_type) DO UPDATE SET metric_value = metric_value + 1;
END;

PRAGMA user_version = 1;
";
