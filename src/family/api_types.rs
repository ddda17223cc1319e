//! Serde types matching the PostgREST tables of the hosted backend.
//!
//! Rows are kept apart from the domain types so column names and nullable
//! columns stay out of the rest of the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Family, Item, Priority, User};

pub const ITEMS_TABLE: &str = "shopping_items";
pub const FAMILIES_TABLE: &str = "families";
pub const MEMBERS_TABLE: &str = "family_members";

// ============================================================================
// shopping_items
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiItemRow {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub is_bought: bool,
  #[serde(default)]
  pub priority: Option<Priority>,
  pub added_by_user_id: String,
  pub added_by_name: Option<String>,
  pub created_at: DateTime<Utc>,
  pub bought_at: Option<DateTime<Utc>>,
  pub category: Option<String>,
  pub quantity: Option<String>,
  pub unit: Option<String>,
  pub location: Option<String>,
  #[serde(default)]
  pub archived: bool,
}

impl ApiItemRow {
  pub fn into_item(self) -> Item {
    Item {
      id: self.id,
      name: self.name,
      completed: self.is_bought,
      priority: self.priority.unwrap_or_default(),
      added_by: self.added_by_user_id,
      added_by_name: self.added_by_name,
      created_at: self.created_at,
      completed_at: self.bought_at,
      category: self.category,
      quantity: self.quantity,
      unit: self.unit,
      location: self.location,
      archived: self.archived,
    }
    .normalized()
  }
}

/// Insert payload; id and created_at are assigned by the database.
#[derive(Debug, Serialize)]
pub struct ApiNewItem<'a> {
  pub family_id: &'a str,
  pub name: &'a str,
  pub priority: Priority,
  pub added_by_user_id: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub added_by_name: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quantity: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<&'a str>,
}

impl<'a> ApiNewItem<'a> {
  pub fn new(family_id: &'a str, item: &'a Item) -> Self {
    Self {
      family_id,
      name: &item.name,
      priority: item.priority,
      added_by_user_id: &item.added_by,
      added_by_name: item.added_by_name.as_deref(),
      category: item.category.as_deref(),
      quantity: item.quantity.as_deref(),
      unit: item.unit.as_deref(),
      location: item.location.as_deref(),
    }
  }
}

/// Full-row PATCH body. Nulls are sent so cleared fields are cleared remotely.
#[derive(Debug, Serialize)]
pub struct ApiItemPatch<'a> {
  pub name: &'a str,
  pub is_bought: bool,
  pub bought_at: Option<DateTime<Utc>>,
  pub priority: Priority,
  pub category: Option<&'a str>,
  pub quantity: Option<&'a str>,
  pub unit: Option<&'a str>,
  pub location: Option<&'a str>,
  pub archived: bool,
}

impl<'a> From<&'a Item> for ApiItemPatch<'a> {
  fn from(item: &'a Item) -> Self {
    Self {
      name: &item.name,
      is_bought: item.completed,
      bought_at: item.completed_at,
      priority: item.priority,
      category: item.category.as_deref(),
      quantity: item.quantity.as_deref(),
      unit: item.unit.as_deref(),
      location: item.location.as_deref(),
      archived: item.archived,
    }
  }
}

// ============================================================================
// families / family_members
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiFamilyRow {
  #[serde(default, skip_serializing)]
  pub id: String,
  pub name: String,
  pub family_code: String,
}

impl ApiFamilyRow {
  pub fn into_family(self, members: Vec<User>) -> Family {
    Family {
      id: self.id,
      name: self.name,
      code: self.family_code,
      members,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiMemberRow {
  pub id: String,
  pub nickname: String,
  pub avatar: Option<String>,
  pub last_seen: Option<DateTime<Utc>>,
}

impl ApiMemberRow {
  pub fn into_user(self) -> User {
    User {
      id: self.id,
      nickname: self.nickname,
      avatar: self.avatar.unwrap_or_default(),
      last_seen: self.last_seen,
      is_online: false,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ApiNewMember<'a> {
  pub family_id: &'a str,
  pub nickname: &'a str,
  pub avatar: &'a str,
  pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiHeartbeat {
  pub last_seen: DateTime<Utc>,
}

/// Body of the `notify-urgent` edge function
#[derive(Debug, Serialize)]
pub struct ApiUrgentNotice<'a> {
  pub family_id: &'a str,
  pub item_name: &'a str,
  pub actor_name: &'a str,
}

/// Error body returned by PostgREST
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  pub code: Option<String>,
  pub message: Option<String>,
  pub details: Option<String>,
  pub hint: Option<String>,
}

impl ApiErrorBody {
  pub fn summary(&self) -> String {
    [&self.code, &self.message, &self.details, &self.hint]
      .into_iter()
      .flatten()
      .cloned()
      .collect::<Vec<_>>()
      .join(": ")
  }
}
