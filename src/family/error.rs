use thiserror::Error;

/// Input rejected before anything is mutated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("item name cannot be empty")]
  EmptyName,
  #[error("no family selected")]
  MissingFamily,
  #[error("{0} cannot be empty")]
  MissingField(&'static str),
  #[error("family code must be 6 digits")]
  InvalidFamilyCode,
}

/// Failure reported by a backend call
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("rejected by server: {0}")]
  Rejected(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("backend unavailable: {0}")]
  Unavailable(String),
  #[error("HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),
  #[error("invalid URL: {0}")]
  Url(#[from] url::ParseError),
  #[error("invalid response: {0}")]
  Decode(#[from] serde_json::Error),
  #[error(transparent)]
  Validation(#[from] ValidationError),
}
