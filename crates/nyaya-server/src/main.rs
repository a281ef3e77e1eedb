//! nyaya-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `NYAYA_*`
//! environment variables, opens the SQLite log store, loads the law mapping
//! and serves the JSON API over HTTP.
//!
//! # Admin password hash
//!
//! ```
//! cargo run -p nyaya-server -- --hash-password
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use nyaya_api::ApiState;
use nyaya_core::mapping::LawMapping;
use nyaya_server::{AppState, ServerConfig};
use nyaya_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "NyayAssist API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8000)?
    .set_default("store_path", "nyaya.db")?
    .set_default("mapping_path", "data/law_mapping.json")?
    .set_default("admin_username", "")?
    .set_default("admin_password_hash", "")?
    .set_default("rate_limit_per_minute", 60)?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("NYAYA"))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.admin_username.is_empty() {
    tracing::warn!("no admin_username configured; analytics endpoint is disabled");
  }

  let mapping_path = expand_tilde(&server_cfg.mapping_path);
  let mapping = match LawMapping::load(&mapping_path) {
    Ok(mapping) => {
      tracing::info!(path = ?mapping_path, sections = mapping.len(), "loaded law mapping");
      mapping
    }
    Err(e) => {
      tracing::warn!(path = ?mapping_path, error = %e, "law mapping unavailable; comparisons will find nothing");
      LawMapping::default()
    }
  };

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(
    ApiState::new(Arc::new(store), Arc::new(mapping)),
    server_cfg,
  );
  let app = nyaya_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
