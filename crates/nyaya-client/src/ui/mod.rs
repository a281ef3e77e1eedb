//! TUI rendering. Every function here is a pure projection of [`App`] state.

pub mod sidebar;
pub mod transcript;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Prompt};

pub fn draw<B>(f: &mut Frame, app: &App<B>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(3), // input
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
    .split(rows[1]);
  transcript::draw(f, cols[0], app);
  sidebar::draw(f, cols[1], app);

  draw_input(f, rows[2], app);
  draw_status(f, rows[3], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<B>(f: &mut Frame, area: Rect, app: &App<B>) {
  let left = Span::styled(
    " NyayAssist  [Tab] mode  [Ctrl-U] upload  [Ctrl-N] new  [Ctrl-C] quit",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let who = app
    .user
    .as_ref()
    .map(|u| u.full_name.clone())
    .unwrap_or_else(|| "guest".to_owned());
  let dot_color = if app.server_up { Color::Green } else { Color::Red };
  let right = format!("{who} ");

  let used = left.content.chars().count() + right.chars().count() + 2;
  let pad = (area.width as usize).saturating_sub(used);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad)),
    Span::styled("●", Style::default().fg(dot_color)),
    Span::raw(" "),
    Span::styled(right, Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Input ────────────────────────────────────────────────────────────────────

fn draw_input<B>(f: &mut Frame, area: Rect, app: &App<B>) {
  let (title, color) = match app.prompt {
    Prompt::Message => (" Message ", Color::Cyan),
    Prompt::Upload => (" PDF paths (space separated) ", Color::Yellow),
  };
  let border = if app.chat.pending() { Color::DarkGray } else { color };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let inner_width = area.width.saturating_sub(3) as usize;
  let chars: Vec<char> = app.input.chars().collect();
  let shown: String = chars[chars.len().saturating_sub(inner_width)..].iter().collect();

  f.render_widget(Paragraph::new(format!("{shown}_")).block(block), area);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<B>(f: &mut Frame, area: Rect, app: &App<B>) {
  let mode_span = Span::styled(
    format!(" {} ", app.chat.mode().as_str()),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let status = if app.status_msg.is_empty() {
    "Enter send  ↑↓/PgUp/PgDn scroll  Esc clear".to_owned()
  } else {
    app.status_msg.clone()
  };
  let line = Line::from(vec![
    mode_span,
    Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
