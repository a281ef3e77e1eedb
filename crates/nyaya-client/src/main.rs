//! `nyaya`: terminal client for NyayAssist.
//!
//! # Usage
//!
//! ```
//! nyaya                                   # interactive chat
//! nyaya --url http://localhost:8000 chat --mode compare
//! nyaya ask --mode compare "IPC 302, 120-B"
//! nyaya login --email meera@example.in
//! ```

use std::{
  fs::{self, OpenOptions},
  io,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use nyaya_client::{
  ApiClient, ApiConfig,
  app::App,
  chat::{Chat, execute as run_ticket},
  session::{CurrentUser, SessionStore},
  ui,
};
use nyaya_core::{
  law::LawCode,
  mode::ChatMode,
  records::FeedbackType,
  wire::{FeedbackRequest, LoginRequest, RegisterRequest},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "nyaya", version, about = "Terminal client for NyayAssist legal research")]
struct Args {
  /// Path to a TOML config file (url, session_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the NyayAssist server.
  #[arg(long, env = "NYAYA_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Interactive chat (the default).
  Chat {
    #[arg(long, value_enum, default_value_t = ModeArg::Pdf)]
    mode: ModeArg,
  },
  /// Run one query without the TUI and print the replies.
  Ask {
    #[arg(long, value_enum, default_value_t = ModeArg::Compare)]
    mode: ModeArg,
    /// PDFs to upload before asking (PDF mode).
    #[arg(long = "pdf", value_name = "FILE")]
    pdfs: Vec<PathBuf>,
    #[arg(required = true)]
    text: Vec<String>,
  },
  /// Email a verification code for registration.
  SendCode { email: String },
  Register {
    #[arg(long)]
    name:     String,
    #[arg(long)]
    email:    String,
    #[arg(long)]
    phone:    Option<String>,
    #[arg(long)]
    otp:      String,
    #[arg(long, env = "NYAYA_PASSWORD")]
    password: Option<String>,
  },
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "NYAYA_PASSWORD")]
    password: Option<String>,
  },
  Logout,
  /// Check whether the server is reachable.
  Health,
  /// List the mapped sections of IPC, CRPC or IEA.
  Sections { law_type: LawCode },
  /// Rate an answer or search result.
  Feedback {
    #[arg(long = "type")]
    feedback_type: FeedbackType,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating:        Option<u8>,
    #[arg(long)]
    message_id:    Option<String>,
    #[arg(long)]
    text:          Option<String>,
  },
  /// Usage statistics (administrators only).
  Stats {
    #[arg(long, env = "NYAYA_ADMIN_USER")]
    admin_user:     String,
    #[arg(long, env = "NYAYA_ADMIN_PASSWORD")]
    admin_password: String,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
  Pdf,
  Search,
  Compare,
}

impl From<ModeArg> for ChatMode {
  fn from(m: ModeArg) -> Self {
    match m {
      ModeArg::Pdf => ChatMode::PdfChat,
      ModeArg::Search => ChatMode::KanoonSearch,
      ModeArg::Compare => ChatMode::LawComparison,
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  session_file: Option<PathBuf>,
}

fn load_config(explicit: Option<&PathBuf>) -> Result<ConfigFile> {
  let path = match explicit {
    Some(p) => p.clone(),
    None => match dirs::config_dir().map(|d| d.join("nyaya").join("config.toml")) {
      Some(p) if p.exists() => p,
      _ => return Ok(ConfigFile::default()),
    },
  };
  let raw = fs::read_to_string(&path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

fn init_logging() -> Result<()> {
  let dir = dirs::state_dir()
    .or_else(dirs::data_local_dir)
    .unwrap_or_else(std::env::temp_dir)
    .join("nyaya");
  fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(dir.join("nyaya.log"))
    .context("opening nyaya.log")?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

fn read_password(given: Option<String>) -> Result<String> {
  use std::io::{BufRead, Write};
  if let Some(p) = given {
    return Ok(p);
  }
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  init_logging()?;
  let args = Args::parse();
  let file_cfg = load_config(args.config.as_ref())?;

  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let sessions = match file_cfg.session_file.or_else(SessionStore::default_path) {
    Some(path) => SessionStore::new(path),
    None => bail!("no config directory available; set session_file in the config file"),
  };
  let user = sessions.load().unwrap_or_else(|e| {
    tracing::warn!(error = %e, "ignoring unreadable session file");
    None
  });

  let client = ApiClient::new(ApiConfig {
    base_url:  base_url.clone(),
    user_uuid: user.as_ref().map(|u| u.user_uuid.clone()),
  })
  .context("building HTTP client")?;

  match args.command.unwrap_or(Command::Chat { mode: ModeArg::Pdf }) {
    Command::Chat { mode } => run_tui(client, mode.into(), user).await,
    Command::Ask { mode, pdfs, text } => ask_once(client, mode.into(), pdfs, &text.join(" ")).await,

    Command::SendCode { email } => {
      let resp = client.send_code(&email).await?;
      println!("{}", resp.message);
      Ok(())
    }
    Command::Register { name, email, phone, otp, password } => {
      let request = RegisterRequest {
        full_name: name,
        email,
        phone,
        password: read_password(password)?,
        otp,
      };
      let user = CurrentUser::from(client.register(&request).await?);
      sessions.save(&user)?;
      println!("Registered and signed in as {} <{}>", user.full_name, user.email);
      Ok(())
    }
    Command::Login { email, password } => {
      let request = LoginRequest { email, password: read_password(password)? };
      let user = CurrentUser::from(client.login(&request).await?);
      sessions.save(&user)?;
      tracing::info!(email = %user.email, "signed in");
      println!("Signed in as {} <{}>", user.full_name, user.email);
      Ok(())
    }
    Command::Logout => {
      sessions.clear()?;
      println!("Signed out");
      Ok(())
    }

    Command::Health => {
      if client.health().await {
        println!("{base_url}: healthy");
        Ok(())
      } else {
        bail!("{base_url}: unreachable or unhealthy")
      }
    }
    Command::Sections { law_type } => {
      let listing = client.sections(law_type).await?;
      println!(
        "{} → {} ({} sections)",
        law_type.full_name(),
        law_type.successor_full_name(),
        listing.total_sections
      );
      for s in listing.sections {
        println!("{:>6}  → {} {:<8} {}", s.section, s.new_law, s.new_section, s.title);
      }
      Ok(())
    }
    Command::Feedback { feedback_type, rating, message_id, text } => {
      let request = FeedbackRequest {
        feedback_type,
        message_id,
        rating,
        feedback_text: text,
        user_uuid: user.map(|u| u.user_uuid),
      };
      let resp = client.feedback(&request).await?;
      println!("Feedback recorded ({})", resp.feedback_id);
      Ok(())
    }
    Command::Stats { admin_user, admin_password } => {
      let stats = client.stats(&admin_user, &admin_password).await?;
      println!("{:<12} {:>9} {:>7}", "date", "requests", "users");
      for day in stats.daily_stats {
        println!("{:<12} {:>9} {:>7}", day.date.to_string(), day.total_requests, day.unique_users);
      }
      println!();
      println!("Popular searches:");
      for s in stats.popular_searches {
        println!("{:>5}  {}", s.count, s.query);
      }
      Ok(())
    }
  }
}

// ─── One-shot query ───────────────────────────────────────────────────────────

async fn ask_once(client: ApiClient, mode: ChatMode, pdfs: Vec<PathBuf>, text: &str) -> Result<()> {
  let backend = Arc::new(client);
  let mut chat = Chat::new(mode);

  if !pdfs.is_empty() {
    if let Some(ticket) = chat.upload(pdfs) {
      chat.complete(run_ticket(Arc::clone(&backend), ticket).await);
    }
    if let Some(status) = chat.upload_status() {
      eprintln!("{status}");
    }
  }

  let skip = chat.transcript().len() + 1;
  if let Some(ticket) = chat.submit(text) {
    chat.complete(run_ticket(backend, ticket).await);
  }

  for message in chat.transcript().iter().skip(skip) {
    for line in ui::transcript::message_lines(message, 100).iter().skip(1) {
      let row: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
      println!("{row}");
    }
    println!();
  }
  Ok(())
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui(client: ApiClient, mode: ChatMode, user: Option<CurrentUser>) -> Result<()> {
  let server_up = client.health().await;
  if !server_up {
    tracing::warn!(url = client.base_url(), "server health check failed");
  }

  let (tx, mut rx) = mpsc::unbounded_channel();
  let mut app = App::new(Arc::new(client), Chat::new(mode), tx);
  app.user = user;
  app.server_up = server_up;
  if !server_up {
    app.status_msg = "Server unreachable; requests will fail".into();
  }

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;

  let result = event_loop(&mut terminal, &mut app, &mut rx).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  result
}

async fn event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<ApiClient>,
  rx: &mut mpsc::UnboundedReceiver<nyaya_client::chat::Completion>,
) -> Result<()> {
  loop {
    while let Ok(completion) = rx.try_recv() {
      app.on_completion(completion);
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key)
    {
      break;
    }
  }
  Ok(())
}
