pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use renderfns::{draw_header, draw_status_bar};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let shortcuts = app.view().shortcuts();
  draw_header(
    frame,
    chunks[0],
    app.family(),
    app.members(),
    app.backend_label(),
    &shortcuts,
  );
  app.view_mut().render(frame, chunks[1]);
  draw_status_bar(frame, chunks[2], app.status());
  app.command().render_overlay(frame, chunks[1]);
}

/// Draw into an in-memory terminal and return its rows joined by newlines
#[cfg(test)]
pub fn render_to_text(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> String {
  use ratatui::backend::TestBackend;

  let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
  terminal.draw(draw).unwrap();
  terminal
    .backend()
    .buffer()
    .content
    .chunks(width as usize)
    .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
    .collect::<Vec<_>>()
    .join("\n")
}
