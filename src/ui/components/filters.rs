use crate::family::{Item, Priority, User};
use std::collections::BTreeSet;

/// Field a list filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  Category,
  Member,
  Priority,
}

impl FilterField {
  pub fn label(&self) -> &'static str {
    match self {
      FilterField::Category => "Category",
      FilterField::Member => "Member",
      FilterField::Priority => "Priority",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "category" | "cat" | "c" => Some(FilterField::Category),
      "member" | "user" | "by" | "m" => Some(FilterField::Member),
      "priority" | "prio" | "p" => Some(FilterField::Priority),
      _ => None,
    }
  }
}

/// Active list filters. An empty set means the field is not filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
  pub categories: BTreeSet<String>,
  pub user_ids: BTreeSet<String>,
  pub priorities: BTreeSet<Priority>,
}

impl ListFilters {
  pub fn is_empty(&self) -> bool {
    self.categories.is_empty() && self.user_ids.is_empty() && self.priorities.is_empty()
  }

  pub fn has_member_filter(&self) -> bool {
    !self.user_ids.is_empty()
  }

  /// Whether `item` passes every active filter.
  pub fn matches(&self, item: &Item) -> bool {
    let category = self.categories.is_empty()
      || item
        .category
        .as_ref()
        .is_some_and(|c| self.categories.contains(c));
    let member = self.user_ids.is_empty() || self.user_ids.contains(&item.added_by);
    let priority = self.priorities.is_empty() || self.priorities.contains(&item.priority);
    category && member && priority
  }

  /// Select or deselect a value. Returns true if it is now selected.
  pub fn toggle_category(&mut self, category: &str) -> bool {
    toggle(&mut self.categories, category.to_string())
  }

  pub fn toggle_member(&mut self, user_id: &str) -> bool {
    toggle(&mut self.user_ids, user_id.to_string())
  }

  pub fn toggle_priority(&mut self, priority: Priority) -> bool {
    toggle(&mut self.priorities, priority)
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  /// One-line summary such as `Priority: urgent | Member: Mom`.
  pub fn describe(&self, members: &[User]) -> String {
    let mut parts = Vec::new();
    if !self.categories.is_empty() {
      let values: Vec<&str> = self.categories.iter().map(String::as_str).collect();
      parts.push(format!("{}: {}", FilterField::Category.label(), values.join(", ")));
    }
    if !self.user_ids.is_empty() {
      let values: Vec<&str> = self
        .user_ids
        .iter()
        .map(|id| {
          members
            .iter()
            .find(|m| &m.id == id)
            .map(|m| m.nickname.as_str())
            .unwrap_or(id.as_str())
        })
        .collect();
      parts.push(format!("{}: {}", FilterField::Member.label(), values.join(", ")));
    }
    if !self.priorities.is_empty() {
      let values: Vec<&str> = self.priorities.iter().map(|p| p.label()).collect();
      parts.push(format!("{}: {}", FilterField::Priority.label(), values.join(", ")));
    }
    parts.join(" | ")
  }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
  if set.remove(&value) {
    false
  } else {
    set.insert(value);
    true
  }
}

/// Distinct categories used by `items`, sorted.
pub fn categories_in(items: &[Item]) -> Vec<String> {
  items
    .iter()
    .filter_map(|i| i.category.clone())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}
