//! Transcript pane: every message rendered as pre-wrapped lines so the view
//! can be pinned to the bottom and scrolled by line.

use nyaya_core::{
  law::LawComparison,
  message::{Message, MessageBody, Role},
  search::CaseResult,
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn draw<B>(f: &mut Frame, area: Rect, app: &App<B>) {
  let block = Block::default()
    .title(format!(" {} ", app.chat.mode().label()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines: Vec<Line<'static>> = Vec::new();
  for message in app.chat.transcript() {
    lines.extend(message_lines(message, inner.width as usize));
    lines.push(Line::default());
  }
  if app.chat.pending() {
    lines.push(Line::from(Span::styled(
      "… working",
      Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
    )));
  }
  if lines.is_empty() {
    lines.push(Line::from(Span::styled(
      hint(app.chat.mode()),
      Style::default().fg(Color::DarkGray),
    )));
  }

  let height = inner.height as usize;
  let bottom = lines.len().saturating_sub(height);
  let top = bottom.saturating_sub(app.scroll as usize);
  let visible: Vec<Line<'static>> = lines.into_iter().skip(top).take(height).collect();
  f.render_widget(Paragraph::new(visible), inner);
}

fn hint(mode: nyaya_core::mode::ChatMode) -> &'static str {
  use nyaya_core::mode::ChatMode;
  match mode {
    ChatMode::PdfChat => "Press Ctrl-U to upload PDFs, then ask about them.",
    ChatMode::KanoonSearch => "Describe the facts or legal issue to search case law.",
    ChatMode::LawComparison => "Enter sections to compare, e.g. \"IPC 302, 120-B\".",
  }
}

fn role_line(message: &Message) -> Line<'static> {
  let (label, color) = match message.role {
    Role::User => ("You", Color::Cyan),
    Role::Assistant => ("NyayAssist", Color::Green),
    Role::System => ("System", Color::Magenta),
  };
  Line::from(vec![
    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    Span::styled(
      format!("  {}", message.created_at.with_timezone(&chrono::Local).format("%H:%M")),
      Style::default().fg(Color::DarkGray),
    ),
  ])
}

/// Render one message into lines no wider than `width`.
pub fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
  let mut lines = vec![role_line(message)];
  let body_style = match &message.body {
    MessageBody::Warning { .. } => Style::default().fg(Color::Yellow),
    MessageBody::Error { .. } => Style::default().fg(Color::Red),
    MessageBody::System { .. } => Style::default().fg(Color::Magenta),
    _ => Style::default(),
  };
  push_wrapped(&mut lines, message.content(), width, body_style);

  if let MessageBody::Cases { cases, .. } = &message.body {
    for (i, case) in cases.iter().enumerate() {
      case_lines(&mut lines, i + 1, case, width);
    }
  }
  for comparison in message.body.comparisons() {
    comparison_lines(&mut lines, comparison, width);
  }
  lines
}

fn case_lines(lines: &mut Vec<Line<'static>>, rank: usize, case: &CaseResult, width: usize) {
  push_wrapped(
    lines,
    &format!("{rank}. {}", case.title),
    width,
    Style::default().add_modifier(Modifier::BOLD),
  );
  push_wrapped(lines, &format!("   {}", case.snippet), width, Style::default());
  push_wrapped(
    lines,
    &format!("   {}", case.case_link),
    width,
    Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
  );
}

fn comparison_lines(lines: &mut Vec<Line<'static>>, c: &LawComparison, width: usize) {
  let heading = if c.is_omitted() {
    format!("{} {} → OMITTED in {}", c.old_law, c.old_section, c.new_law)
  } else {
    format!("{} {} → {} {}", c.old_law, c.old_section, c.new_law, c.new_section)
  };
  lines.push(Line::default());
  push_wrapped(
    lines,
    &heading,
    width,
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
  );
  push_wrapped(lines, &format!("  Old: {}", c.old_title), width, Style::default());
  if !c.is_omitted() {
    push_wrapped(lines, &format!("  New: {}", c.new_title), width, Style::default());
  }
  let label = if c.is_omitted() { "Why removed" } else { "Changes" };
  push_wrapped(
    lines,
    &format!("  {label}: {}", c.changes),
    width,
    Style::default().fg(Color::Gray),
  );
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
  for row in wrap(text, width) {
    lines.push(Line::from(Span::styled(row, style)));
  }
}

/// Greedy word wrap by character count. Words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
  let width = width.max(1);
  let mut rows = Vec::new();
  for paragraph in text.split('\n') {
    let mut row = String::new();
    let mut len = 0;
    for word in paragraph.split(' ') {
      let mut word: Vec<char> = word.chars().collect();
      while word.len() > width {
        if len > 0 {
          rows.push(std::mem::take(&mut row));
          len = 0;
        }
        rows.push(word.drain(..width).collect());
      }
      let wlen = word.len();
      if len > 0 && len + 1 + wlen > width {
        rows.push(std::mem::take(&mut row));
        len = 0;
      }
      if len > 0 {
        row.push(' ');
        len += 1;
      }
      row.extend(word);
      len += wlen;
    }
    rows.push(row);
  }
  rows
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(lines: &[Line<'_>]) -> Vec<String> {
    lines
      .iter()
      .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
      .collect()
  }

  #[test]
  fn wraps_on_word_boundaries() {
    assert_eq!(wrap("the quick brown fox", 10), ["the quick", "brown fox"]);
    assert_eq!(wrap("abcdefghij", 4), ["abcd", "efgh", "ij"]);
    assert_eq!(wrap("a\nb", 10), ["a", "b"]);
  }

  #[test]
  fn omitted_sections_are_labelled() {
    let message = Message::assistant(MessageBody::Comparisons {
      content:     "Comparison for IPC Section 377:".into(),
      comparisons: vec![LawComparison {
        old_law:       "IPC".into(),
        old_section:   "377".into(),
        old_title:     "Unnatural offences".into(),
        new_law:       "BNS".into(),
        new_section:   "OMITTED".into(),
        new_title:     String::new(),
        changes:       "Read down by the Supreme Court in 2018.".into(),
        original_text: None,
      }],
    });
    let rendered = text(&message_lines(&message, 80));
    assert!(rendered.iter().any(|l| l == "IPC 377 → OMITTED in BNS"));
    assert!(rendered.iter().any(|l| l.starts_with("  Why removed:")));
    assert!(!rendered.iter().any(|l| l.starts_with("  New:")));
  }
}
