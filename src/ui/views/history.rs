use crate::family::{Item, User};
use crate::ui::renderfns::{relative_time, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::shopping_list::resolve_reference;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};

/// Bought items, most recent first
#[derive(Default)]
pub struct HistoryView {
  items: Vec<Item>,
  members: Vec<User>,
  table_state: TableState,
}

impl HistoryView {
  pub fn new() -> Self {
    Self::default()
  }

  /// Items as produced by `get_completed_items`
  pub fn set_items(&mut self, items: Vec<Item>) {
    self.items = items;
  }

  pub fn set_members(&mut self, members: Vec<User>) {
    self.members = members;
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  fn buyer_name<'a>(&'a self, item: &'a Item) -> &'a str {
    self
      .members
      .iter()
      .find(|m| m.id == item.added_by)
      .map(|m| m.nickname.as_str())
      .or(item.added_by_name.as_deref())
      .unwrap_or("someone")
  }

  fn selected(&self) -> usize {
    self
      .table_state
      .selected()
      .unwrap_or(0)
      .min(self.items.len().saturating_sub(1))
  }

  fn selected_id(&self) -> Option<String> {
    self.items.get(self.selected()).map(|i| i.id.clone())
  }

  fn render_at(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
    let block = Block::default()
      .title(format!(" History ({} bought) ", self.items.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.items.is_empty() {
      let paragraph = Paragraph::new("Nothing bought yet.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let rows: Vec<Row> = self
      .items
      .iter()
      .enumerate()
      .map(|(i, item)| {
        Row::new(vec![
          Line::styled(format!("{:>2}.", i + 1), Style::default().fg(Color::DarkGray)),
          Line::raw(truncate(&item.name, 28)),
          Line::raw(self.buyer_name(item).to_string()),
          Line::raw(relative_time(item.history_time(), now)),
          if item.archived {
            Line::raw("")
          } else {
            Line::styled("on list", Style::default().fg(Color::Yellow))
          },
        ])
      })
      .collect();

    let widths = [
      Constraint::Length(3),
      Constraint::Min(12),
      Constraint::Length(14),
      Constraint::Length(10),
      Constraint::Length(7),
    ];
    let header = Row::new(vec!["#", "Item", "Added by", "Bought", ""])
      .style(Style::default().fg(Color::Cyan).bold());
    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().bg(Color::DarkGray).bold())
      .highlight_symbol("> ");

    self.table_state.select(Some(self.selected()));
    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl View for HistoryView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        let next = (self.selected() + 1).min(self.items.len().saturating_sub(1));
        self.table_state.select(Some(next));
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select(Some(self.selected().saturating_sub(1)));
        ViewAction::None
      }
      // Unticking puts an item still on the list back to buy
      KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Enter => {
        self.selected_id().map_or(ViewAction::None, ViewAction::Toggle)
      }
      KeyCode::Char('d') | KeyCode::Delete => {
        self.selected_id().map_or(ViewAction::None, ViewAction::Delete)
      }
      _ => ViewAction::NotHandled,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_at(frame, area, Utc::now());
  }

  fn resolve(&self, reference: &str) -> Option<String> {
    let shown: Vec<String> = self.items.iter().map(|i| i.id.clone()).collect();
    resolve_reference(&shown, &self.items, reference)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("x", "undo"), ShortcutInfo::new("d", "delete")]
  }
}
