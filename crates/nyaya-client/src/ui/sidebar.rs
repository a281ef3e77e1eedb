//! Right-hand pane: modes, attachment state and session info.

use nyaya_core::mode::ChatMode;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

pub fn draw<B>(f: &mut Frame, area: Rect, app: &App<B>) {
  let block = Block::default()
    .title(" Session ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut lines = vec![Line::from(Span::styled(
    "Modes",
    Style::default().add_modifier(Modifier::BOLD),
  ))];
  for mode in ChatMode::ALL {
    let active = mode == app.chat.mode();
    let style = if active {
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    let marker = if active { "▶ " } else { "  " };
    lines.push(Line::from(Span::styled(format!("{marker}{}", mode.label()), style)));
  }

  lines.push(Line::default());
  lines.push(Line::from(Span::styled(
    "Documents",
    Style::default().add_modifier(Modifier::BOLD),
  )));
  let (ready, color) = if app.chat.pdf_ready() {
    ("PDF ready", Color::Green)
  } else {
    ("No PDF uploaded", Color::DarkGray)
  };
  lines.push(Line::from(Span::styled(ready, Style::default().fg(color))));
  if let Some(status) = app.chat.upload_status() {
    lines.push(Line::from(status.to_owned()));
  }

  lines.push(Line::default());
  lines.push(Line::from(Span::styled(
    "Account",
    Style::default().add_modifier(Modifier::BOLD),
  )));
  match &app.user {
    Some(user) => {
      lines.push(Line::from(user.full_name.clone()));
      lines.push(Line::from(Span::styled(
        user.email.clone(),
        Style::default().fg(Color::Gray),
      )));
    }
    None => lines.push(Line::from(Span::styled(
      "Not signed in (nyaya login)",
      Style::default().fg(Color::DarkGray),
    ))),
  }
  lines.push(Line::from(Span::styled(
    format!("{} messages", app.chat.transcript().len()),
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
    area,
  );
}
