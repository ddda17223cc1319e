mod command_input;
mod filters;
mod input;

pub use command_input::{CommandEvent, CommandInput};
pub use filters::{categories_in, FilterField, ListFilters};

/// Generic result type for component key handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
