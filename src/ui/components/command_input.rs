use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 8;

/// Events emitted by command input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Command line submitted
  Submitted(String),
  /// Command cancelled
  Cancelled,
}

/// The `:` command line with command-name completion
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  /// Picked with Tab or arrows; None while just typing
  selected_suggestion: Option<usize>,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the command line with `text` already typed
  pub fn activate_with(&mut self, text: &str) {
    self.active = true;
    self.input.set_value(text);
    self.selected_suggestion = None;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.selected_suggestion = None;
  }

  /// Completions for the command word, empty once arguments are being typed
  pub fn suggestions(&self) -> Vec<&'static Command> {
    let value = self.input.value().trim_start();
    if value.contains(char::is_whitespace) {
      return Vec::new();
    }
    commands::get_suggestions(value)
      .into_iter()
      .take(MAX_SUGGESTIONS)
      .collect()
  }

  /// Handle a key event.
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate_with("");
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(CommandEvent::Cancelled);
      }
      KeyCode::Enter => {
        let line = self.resolve_line();
        self.close();
        return KeyResult::Event(CommandEvent::Submitted(line));
      }
      KeyCode::Tab | KeyCode::Down => {
        let count = self.suggestions().len();
        if count > 0 {
          self.selected_suggestion = Some(self.selected_suggestion.map_or(0, |i| (i + 1) % count));
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        let count = self.suggestions().len();
        if count > 0 {
          self.selected_suggestion = Some(match self.selected_suggestion {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
          });
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    match self.input.handle_key(key) {
      InputResult::Consumed => {
        self.selected_suggestion = None;
        KeyResult::Handled
      }
      InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
      // Swallow everything else so keys never leak to the view behind
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// The typed line, with a picked suggestion standing in for the command word
  fn resolve_line(&self) -> String {
    let typed = self.input.value().trim();
    match self.selected_suggestion {
      Some(i) => match self.suggestions().get(i) {
        Some(cmd) => cmd.name.to_string(),
        None => typed.to_string(),
      },
      None => typed.to_string(),
    }
  }

  /// Render the command overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = (3 + suggestions.len() as u16).min(area.height);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Input line
        Constraint::Min(0),    // Suggestions
      ])
      .split(inner);

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(before.to_string()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after.to_string()),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    if !suggestions.is_empty() && chunks[1].height > 0 {
      let items: Vec<ListItem> = suggestions
        .iter()
        .map(|cmd| {
          ListItem::new(Line::from(vec![
            Span::styled(format!("{:<10}", cmd.name), Style::default().fg(Color::Cyan)),
            Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
          ]))
        })
        .collect();

      let list =
        List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

      let mut state = ListState::default();
      state.select(self.selected_suggestion);
      frame.render_stateful_widget(list, chunks[1], &mut state);
    }
  }
}
