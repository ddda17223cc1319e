use crate::family::{Item, Priority, User};
use crate::ui::components::ListFilters;
use crate::ui::renderfns::{presence_dot, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

const NAME_WIDTH: usize = 28;

/// Items added by one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberGroup {
  pub member: User,
  pub items: Vec<Item>,
}

/// The active shopping list, grouped by who added each item
pub struct ShoppingListView {
  items: Vec<Item>,
  members: Vec<User>,
  pub filters: ListFilters,
  loading: bool,
  last_error: Option<String>,
  /// Index into the visible items, header rows not counted
  selected: usize,
  list_state: ListState,
}

impl Default for ShoppingListView {
  fn default() -> Self {
    Self::new()
  }
}

impl ShoppingListView {
  pub fn new() -> Self {
    Self {
      items: Vec::new(),
      members: Vec::new(),
      filters: ListFilters::default(),
      loading: true,
      last_error: None,
      selected: 0,
      list_state: ListState::default(),
    }
  }

  pub fn set_items(&mut self, items: Vec<Item>) {
    self.items = items;
    self.loading = false;
  }

  pub fn set_members(&mut self, members: Vec<User>) {
    self.members = members;
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn members(&self) -> &[User] {
    &self.members
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn set_error(&mut self, message: impl Into<String>) {
    self.last_error = Some(message.into());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Member matching a nickname (case-insensitive) or id
  pub fn find_member(&self, name_or_id: &str) -> Option<&User> {
    self
      .members
      .iter()
      .find(|m| m.id == name_or_id || m.nickname.eq_ignore_ascii_case(name_or_id))
  }

  /// Filtered items grouped by creator, in member order.
  ///
  /// Without a member filter a group is shown when it has items or the
  /// member is online. With one, only selected members with items are
  /// shown. Items whose creator is not a known member go in a trailing
  /// "Others" group.
  pub fn groups(&self) -> Vec<MemberGroup> {
    let filtered: Vec<Item> = self
      .items
      .iter()
      .filter(|i| self.filters.matches(i))
      .cloned()
      .map(|mut item| {
        if let Some(member) = self.members.iter().find(|m| m.id == item.added_by) {
          item.added_by_name = Some(member.nickname.clone());
        }
        item
      })
      .collect();

    let member_filter = self.filters.has_member_filter();
    let mut groups: Vec<MemberGroup> = self
      .members
      .iter()
      .map(|member| MemberGroup {
        member: member.clone(),
        items: filtered
          .iter()
          .filter(|i| i.added_by == member.id)
          .cloned()
          .collect(),
      })
      .filter(|group| {
        if member_filter {
          self.filters.user_ids.contains(&group.member.id) && !group.items.is_empty()
        } else {
          !group.items.is_empty() || group.member.is_online
        }
      })
      .collect();

    let others: Vec<Item> = filtered
      .into_iter()
      .filter(|i| !self.members.iter().any(|m| m.id == i.added_by))
      .collect();
    if !others.is_empty() {
      groups.push(MemberGroup {
        member: User::new("", "Others"),
        items: others,
      });
    }
    groups
  }

  /// Item ids in the order they are numbered on screen
  fn visible_ids(&self) -> Vec<String> {
    self
      .groups()
      .into_iter()
      .flat_map(|g| g.items.into_iter().map(|i| i.id))
      .collect()
  }

  pub fn selected_id(&self) -> Option<String> {
    let ids = self.visible_ids();
    ids
      .get(self.selected.min(ids.len().saturating_sub(1)))
      .cloned()
  }

  fn select_next(&mut self) {
    let count = self.visible_ids().len();
    if count > 0 {
      self.selected = (self.selected + 1).min(count - 1);
    }
  }

  fn select_previous(&mut self) {
    self.selected = self.selected.saturating_sub(1);
  }

  fn on_selected(&self, action: fn(String) -> ViewAction) -> ViewAction {
    self.selected_id().map_or(ViewAction::None, action)
  }
}

fn group_line(member: &User) -> Line<'static> {
  let dot = if member.id.is_empty() {
    Span::raw(" ")
  } else if member.is_online {
    Span::styled(presence_dot(true), Style::default().fg(Color::Green))
  } else {
    Span::styled(presence_dot(false), Style::default().fg(Color::DarkGray))
  };
  Line::from(vec![
    dot,
    Span::raw(format!(" {} ", member.avatar)),
    Span::styled(member.nickname.clone(), Style::default().bold()),
  ])
}

fn item_line(index: usize, item: &Item) -> Line<'static> {
  let name_style = if item.completed {
    Style::default().fg(Color::DarkGray).crossed_out()
  } else if item.priority == Priority::Urgent {
    Style::default().fg(Color::Red).bold()
  } else {
    Style::default()
  };

  let mut spans = vec![
    Span::styled(format!("  {:>2}. ", index), Style::default().fg(Color::DarkGray)),
    Span::raw(if item.completed { "[x] " } else { "[ ] " }),
    Span::raw(format!("{} ", item.priority.badge())),
    Span::styled(
      format!("{:<width$}", truncate(&item.name, NAME_WIDTH), width = NAME_WIDTH),
      name_style,
    ),
  ];

  let mut details = Vec::new();
  if let Some(amount) = item.amount() {
    details.push(amount);
  }
  if let Some(category) = &item.category {
    details.push(category.clone());
  }
  if let Some(location) = &item.location {
    details.push(format!("@ {}", location));
  }
  if !details.is_empty() {
    spans.push(Span::styled(
      format!(" {}", details.join(" · ")),
      Style::default().fg(Color::DarkGray),
    ));
  }
  if !item.is_synced() {
    spans.push(Span::styled(" (unsynced)", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
}

impl View for ShoppingListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.select_next();
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.select_previous();
        ViewAction::None
      }
      KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Enter => {
        self.on_selected(ViewAction::Toggle)
      }
      KeyCode::Char('d') | KeyCode::Delete => self.on_selected(ViewAction::Delete),
      KeyCode::Char('a') => ViewAction::Prompt("add "),
      KeyCode::Char('c') => ViewAction::ClearCompleted,
      KeyCode::Char('r') => ViewAction::Refresh,
      KeyCode::Char('v') => ViewAction::Voice,
      _ => ViewAction::NotHandled,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let groups = self.groups();
    let count: usize = groups.iter().map(|g| g.items.len()).sum();

    let mut title = format!(" Shopping list ({}) ", count);
    if !self.filters.is_empty() {
      title.push_str(&format!("[{}] ", self.filters.describe(&self.members)));
    }
    let mut block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    if let Some(error) = &self.last_error {
      block = block.title_bottom(Line::styled(
        format!(" ! {} ", error),
        Style::default().fg(Color::Red),
      ));
    }

    if count == 0 {
      let message = if self.loading {
        "Loading..."
      } else if self.filters.is_empty() {
        "Nothing on the list. Press a to add something."
      } else {
        "No items match the current filters."
      };
      let paragraph = Paragraph::new(message)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    self.selected = self.selected.min(count - 1);
    let mut rows = Vec::new();
    let mut selected_row = None;
    let mut number = 0;
    for group in &groups {
      rows.push(ListItem::new(group_line(&group.member)));
      for item in &group.items {
        if number == self.selected {
          selected_row = Some(rows.len());
        }
        number += 1;
        rows.push(ListItem::new(item_line(number, item)));
      }
    }

    let list = List::new(rows)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).bold())
      .highlight_symbol("> ");
    self.list_state.select(selected_row);
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn resolve(&self, reference: &str) -> Option<String> {
    resolve_reference(&self.visible_ids(), &self.items, reference)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("a", "add"),
      ShortcutInfo::new("x", "done"),
      ShortcutInfo::new("d", "delete"),
      ShortcutInfo::new("c", "clear bought"),
      ShortcutInfo::new("v", "voice"),
    ]
  }
}

/// Row number as shown on screen, or an exact item id.
pub(crate) fn resolve_reference(shown: &[String], items: &[Item], reference: &str) -> Option<String> {
  let reference = reference.trim();
  if let Ok(n) = reference.parse::<usize>() {
    return n.checked_sub(1).and_then(|i| shown.get(i)).cloned();
  }
  items
    .iter()
    .find(|i| i.id == reference)
    .map(|i| i.id.clone())
}
