use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// What a view asks the app to do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// Key handled inside the view, or ignored
  None,
  /// Key not used by the view
  NotHandled,
  /// Flip the completed flag of an item
  Toggle(String),
  /// Delete an item
  Delete(String),
  /// Archive every bought item on the list
  ClearCompleted,
  /// Re-fetch the list from the backend
  Refresh,
  /// Add an item by voice
  Voice,
  /// Open the command line with this text typed in
  Prompt(&'static str),
}

/// Trait for view behavior
///
/// Views own their state and are fed by the app as data arrives. Key
/// presses come back as a [`ViewAction`] for the app to carry out against
/// the repository.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Resolve a user reference (row number or id) to an item id
  fn resolve(&self, _reference: &str) -> Option<String> {
    None
  }

  /// Keys this view understands, for the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    Vec::new()
  }
}
