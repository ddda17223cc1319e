use chrono::{DateTime, Utc};

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Coarse "how long ago" label
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let elapsed = now.signed_duration_since(then);
  if elapsed.num_minutes() < 1 {
    "just now".to_string()
  } else if elapsed.num_hours() < 1 {
    format!("{}m ago", elapsed.num_minutes())
  } else if elapsed.num_days() < 1 {
    format!("{}h ago", elapsed.num_hours())
  } else if elapsed.num_days() < 30 {
    format!("{}d ago", elapsed.num_days())
  } else {
    then.format("%Y-%m-%d").to_string()
  }
}

pub fn presence_dot(online: bool) -> &'static str {
  if online {
    "●"
  } else {
    "○"
  }
}
