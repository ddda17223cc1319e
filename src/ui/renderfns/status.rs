use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const HINT: &str = " :command  Tab:list/history  m:members  ?:help  q:quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
  Info,
  Error,
}

/// Last message for the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
  pub text: String,
  pub level: StatusLevel,
}

impl StatusMessage {
  pub fn info(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      level: StatusLevel::Info,
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      level: StatusLevel::Error,
    }
  }
}

/// Status bar: the last message, or key hints when there is none
pub fn draw_status_bar(frame: &mut Frame, area: Rect, status: Option<&StatusMessage>) {
  let (content, style) = match status {
    Some(StatusMessage {
      text,
      level: StatusLevel::Error,
    }) => (format!(" ! {}", text), Style::default().fg(Color::Red)),
    Some(StatusMessage {
      text,
      level: StatusLevel::Info,
    }) => (format!(" {}", text), Style::default().fg(Color::Green)),
    None => (HINT.to_string(), Style::default().fg(Color::DarkGray)),
  };

  frame.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::render_to_text;

  #[test]
  fn test_status_bar_variants() {
    let text = render_to_text(60, 1, |frame| draw_status_bar(frame, frame.area(), None));
    assert!(text.starts_with(" :command"));

    let error = StatusMessage::error("could not join family 999999");
    let text = render_to_text(60, 1, |frame| draw_status_bar(frame, frame.area(), Some(&error)));
    assert!(text.starts_with(" ! could not join family 999999"));

    let info = StatusMessage::info("Fetched 3 items.");
    let text = render_to_text(60, 1, |frame| draw_status_bar(frame, frame.area(), Some(&info)));
    assert!(text.starts_with(" Fetched 3 items."));
  }
}
