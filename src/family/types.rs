use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::cache::Cacheable;

/// Prefix marking identifiers the remote has not confirmed yet
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Shopping item priority tier
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Urgent,
  #[default]
  Normal,
  Low,
}

impl Priority {
  pub fn label(self) -> &'static str {
    match self {
      Priority::Urgent => "urgent",
      Priority::Normal => "normal",
      Priority::Low => "low",
    }
  }

  pub fn badge(self) -> &'static str {
    match self {
      Priority::Urgent => "🔴",
      Priority::Normal => "🟡",
      Priority::Low => "🟢",
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Priority {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "urgent" | "high" | "u" | "!" => Ok(Priority::Urgent),
      "normal" | "medium" | "n" => Ok(Priority::Normal),
      "low" | "l" => Ok(Priority::Low),
      other => Err(format!("unknown priority '{}'", other)),
    }
  }
}

/// One shopping list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub id: String,
  pub name: String,
  pub completed: bool,
  #[serde(default)]
  pub priority: Priority,
  pub added_by: String,
  pub added_by_name: Option<String>,
  pub created_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub category: Option<String>,
  pub quantity: Option<String>,
  pub unit: Option<String>,
  pub location: Option<String>,
  /// Hidden from the active list, still part of history
  #[serde(default)]
  pub archived: bool,
}

impl Item {
  /// Whether the remote has assigned this item its canonical id.
  pub fn is_synced(&self) -> bool {
    !self.id.starts_with(TEMP_ID_PREFIX)
  }

  /// Set the completed flag together with its timestamp.
  ///
  /// Reopening an item also brings it back from the archive.
  pub fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
    self.completed = completed;
    if completed {
      self.completed_at = Some(self.completed_at.unwrap_or(at));
    } else {
      self.completed_at = None;
      self.archived = false;
    }
  }

  /// Copy of this item with the completed flag flipped.
  pub fn toggled(&self, at: DateTime<Utc>) -> Item {
    let mut next = self.clone();
    next.completed_at = None;
    next.set_completed(!self.completed, at);
    next
  }

  /// Restore the completed/timestamp pairing on data from outside.
  pub fn normalized(mut self) -> Item {
    match (self.completed, self.completed_at) {
      (true, None) => self.completed_at = Some(self.created_at),
      (false, Some(_)) => self.completed_at = None,
      _ => {}
    }
    self
  }

  /// Timestamp used to order history: completion time, else creation time.
  pub fn history_time(&self) -> DateTime<Utc> {
    self.completed_at.unwrap_or(self.created_at)
  }

  /// Take identity and server fields from `self`, descriptive fields from
  /// the locally built `local` version.
  pub fn merged_with_local(self, local: &Item) -> Item {
    Item {
      priority: local.priority,
      category: local.category.clone(),
      quantity: local.quantity.clone(),
      unit: local.unit.clone(),
      location: local.location.clone(),
      added_by_name: self.added_by_name.or_else(|| local.added_by_name.clone()),
      ..self
    }
  }

  /// Short "2 L" style amount, if any quantity is set
  pub fn amount(&self) -> Option<String> {
    match (&self.quantity, &self.unit) {
      (Some(q), Some(u)) => Some(format!("{} {}", q, u)),
      (Some(q), None) => Some(q.clone()),
      (None, Some(u)) => Some(u.clone()),
      (None, None) => None,
    }
  }
}

impl Cacheable for Item {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn entity_type() -> &'static str {
    "item"
  }
}

/// Everything the user supplies when adding an item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
  pub name: String,
  pub added_by: String,
  pub added_by_name: Option<String>,
  pub priority: Priority,
  pub category: Option<String>,
  pub quantity: Option<String>,
  pub unit: Option<String>,
  pub location: Option<String>,
}

impl NewItem {
  pub fn new(name: impl Into<String>, added_by: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      added_by: added_by.into(),
      ..Self::default()
    }
  }

  pub fn with_priority(mut self, priority: Priority) -> Self {
    self.priority = priority;
    self
  }

  pub fn with_added_by_name(mut self, name: impl Into<String>) -> Self {
    self.added_by_name = Some(name.into());
    self
  }

  /// Build the unsynced local item carrying a temporary id.
  pub fn into_pending(self, now: DateTime<Utc>) -> Item {
    Item {
      id: temp_id(),
      name: self.name.trim().to_string(),
      completed: false,
      priority: self.priority,
      added_by: self.added_by,
      added_by_name: self.added_by_name,
      created_at: now,
      completed_at: None,
      category: non_blank(self.category),
      quantity: non_blank(self.quantity),
      unit: non_blank(self.unit),
      location: non_blank(self.location),
      archived: false,
    }
  }
}

fn temp_id() -> String {
  format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4().simple())
}

fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

/// Family member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub nickname: String,
  #[serde(default)]
  pub avatar: String,
  pub last_seen: Option<DateTime<Utc>>,
  #[serde(default)]
  pub is_online: bool,
}

impl User {
  pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      nickname: nickname.into(),
      avatar: String::new(),
      last_seen: None,
      is_online: false,
    }
  }

  /// Recompute `is_online` from `last_seen`.
  pub fn with_presence(mut self, now: DateTime<Utc>, window: Duration) -> Self {
    self.is_online = self.last_seen.is_some_and(|seen| now - seen <= window);
    self
  }
}

/// A family group sharing one list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
  pub id: String,
  pub name: String,
  pub code: String,
  #[serde(default)]
  pub members: Vec<User>,
}

/// Family join codes are exactly six ASCII digits.
pub fn is_valid_family_code(code: &str) -> bool {
  code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Random six-digit join code. Callers check uniqueness.
pub fn random_family_code() -> String {
  let n = Uuid::new_v4().as_u128() % 900_000 + 100_000;
  n.to_string()
}

/// Completed items, most recently completed first.
pub fn completed_sorted(items: Vec<Item>) -> Vec<Item> {
  let mut done: Vec<Item> = items.into_iter().filter(|i| i.completed).collect();
  done.sort_by(|a, b| b.history_time().cmp(&a.history_time()));
  done
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
  }

  fn item(id: &str) -> Item {
    Item {
      id: id.to_string(),
      name: format!("item {}", id),
      completed: false,
      priority: Priority::Normal,
      added_by: "u1".to_string(),
      added_by_name: None,
      created_at: at(0),
      completed_at: None,
      category: None,
      quantity: None,
      unit: None,
      location: None,
      archived: false,
    }
  }

  #[test]
  fn test_priority_parsing() {
    assert_eq!("urgent".parse::<Priority>(), Ok(Priority::Urgent));
    assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::Urgent));
    assert_eq!(" low ".parse::<Priority>(), Ok(Priority::Low));
    assert_eq!("medium".parse::<Priority>(), Ok(Priority::Normal));
    assert!("sometime".parse::<Priority>().is_err());
  }

  #[test]
  fn test_pending_item_has_temp_id() {
    let pending = NewItem::new("  Milk ", "u1").into_pending(at(5));
    assert!(pending.id.starts_with(TEMP_ID_PREFIX));
    assert!(!pending.is_synced());
    assert_eq!(pending.name, "Milk");
    assert!(!pending.completed);
    assert_eq!(pending.completed_at, None);
  }

  #[test]
  fn test_pending_ids_are_unique() {
    let a = NewItem::new("a", "u1").into_pending(at(5));
    let b = NewItem::new("b", "u1").into_pending(at(5));
    assert_ne!(a.id, b.id);
  }

  #[test]
  fn test_blank_optional_fields_are_dropped() {
    let new = NewItem {
      category: Some("  ".to_string()),
      unit: Some(" kg ".to_string()),
      ..NewItem::new("Rice", "u1")
    };
    let pending = new.into_pending(at(0));
    assert_eq!(pending.category, None);
    assert_eq!(pending.unit.as_deref(), Some("kg"));
  }

  #[test]
  fn test_toggle_keeps_timestamp_invariant() {
    let open = item("1");
    let done = open.toggled(at(100));
    assert!(done.completed);
    assert_eq!(done.completed_at, Some(at(100)));

    let reopened = done.toggled(at(200));
    assert!(!reopened.completed);
    assert_eq!(reopened.completed_at, None);
  }

  #[test]
  fn test_reopening_unarchives() {
    let mut archived = item("1").toggled(at(100));
    archived.archived = true;
    let reopened = archived.toggled(at(200));
    assert!(!reopened.archived);
  }

  #[test]
  fn test_normalized_repairs_invariant() {
    let mut done = item("1");
    done.completed = true;
    assert_eq!(done.normalized().completed_at, Some(at(0)));

    let mut open = item("2");
    open.completed_at = Some(at(9));
    assert_eq!(open.normalized().completed_at, None);
  }

  #[test]
  fn test_merge_keeps_local_descriptive_fields() {
    let local = Item {
      priority: Priority::Urgent,
      category: Some("Dairy".to_string()),
      quantity: Some("2".to_string()),
      unit: Some("L".to_string()),
      location: Some("Market".to_string()),
      added_by_name: Some("Mom".to_string()),
      ..item("temp_x")
    };
    let remote = Item {
      created_at: at(42),
      ..item("R1")
    };

    let merged = remote.merged_with_local(&local);
    assert_eq!(merged.id, "R1");
    assert_eq!(merged.created_at, at(42));
    assert_eq!(merged.priority, Priority::Urgent);
    assert_eq!(merged.category.as_deref(), Some("Dairy"));
    assert_eq!(merged.amount().as_deref(), Some("2 L"));
    assert_eq!(merged.location.as_deref(), Some("Market"));
    assert_eq!(merged.added_by_name.as_deref(), Some("Mom"));
  }

  #[test]
  fn test_completed_sorted_orders_by_completion_time() {
    let items = vec![
      item("a").toggled(at(100)),
      item("b").toggled(at(300)),
      item("open"),
      item("c").toggled(at(200)),
    ];
    let sorted: Vec<_> = completed_sorted(items)
      .into_iter()
      .map(|i| i.completed_at)
      .collect();
    assert_eq!(sorted, vec![Some(at(300)), Some(at(200)), Some(at(100))]);
  }

  #[test]
  fn test_history_time_falls_back_to_creation() {
    let mut done = item("a");
    done.completed = true;
    done.created_at = at(50);
    assert_eq!(done.history_time(), at(50));
  }

  #[test]
  fn test_family_code_validation() {
    assert!(is_valid_family_code("123456"));
    assert!(!is_valid_family_code("12345"));
    assert!(!is_valid_family_code("12345a"));
    assert!(!is_valid_family_code("１２３４５６"));
  }

  #[test]
  fn test_random_codes_are_valid() {
    for _ in 0..50 {
      assert!(is_valid_family_code(&random_family_code()));
    }
  }

  #[test]
  fn test_presence_window() {
    let now = at(1_000);
    let mut user = User::new("u1", "Dad");
    user.last_seen = Some(at(900));
    assert!(user.clone().with_presence(now, Duration::seconds(200)).is_online);
    assert!(!user.with_presence(now, Duration::seconds(50)).is_online);
    assert!(!User::new("u2", "Mom").with_presence(now, Duration::seconds(50)).is_online);
  }
}
