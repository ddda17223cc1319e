use crate::family::User;
use crate::ui::renderfns::{presence_dot, relative_time};
use crate::ui::view::{View, ViewAction};
use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Row, Table};

/// Family members with presence
#[derive(Default)]
pub struct MembersView {
  members: Vec<User>,
  /// The signed-in member
  me: Option<String>,
}

impl MembersView {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_members(&mut self, members: Vec<User>) {
    self.members = members;
  }

  pub fn set_me(&mut self, user_id: impl Into<String>) {
    self.me = Some(user_id.into());
  }

  fn seen(member: &User, now: DateTime<Utc>) -> String {
    if member.is_online {
      return "online".to_string();
    }
    member
      .last_seen
      .map_or_else(|| "never seen".to_string(), |at| format!("seen {}", relative_time(at, now)))
  }

  fn render_at(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
    let rows: Vec<Row> = self
      .members
      .iter()
      .map(|member| {
        let dot_style = if member.is_online {
          Style::default().fg(Color::Green)
        } else {
          Style::default().fg(Color::DarkGray)
        };
        let you = if self.me.as_deref() == Some(member.id.as_str()) {
          " (you)"
        } else {
          ""
        };
        Row::new(vec![
          Line::styled(presence_dot(member.is_online), dot_style),
          Line::raw(format!("{} {}{}", member.avatar, member.nickname, you)),
          Line::styled(Self::seen(member, now), Style::default().fg(Color::DarkGray)),
        ])
      })
      .collect();

    let widths = [Constraint::Length(1), Constraint::Min(16), Constraint::Length(16)];
    let table = Table::new(rows, widths).block(
      Block::default()
        .title(format!(" Members ({}) ", self.members.len()))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(table, area);
  }
}

impl View for MembersView {
  fn handle_key(&mut self, _key: KeyEvent) -> ViewAction {
    ViewAction::NotHandled
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_at(frame, area, Utc::now());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::render_to_text;
  use chrono::{Duration, TimeZone};

  #[test]
  fn test_render_presence() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let mut dad = User::new("u1", "Dad");
    dad.is_online = true;
    let mut mom = User::new("u2", "Mom");
    mom.last_seen = Some(now - Duration::hours(3));
    let sam = User::new("u3", "Sam");

    let mut view = MembersView::new();
    view.set_members(vec![dad, mom, sam]);
    view.set_me("u2");

    let text = render_to_text(50, 6, |frame| view.render_at(frame, frame.area(), now));
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].contains(" Members (3) "));
    assert!(lines[1].contains("●"));
    assert!(lines[1].contains("Dad"));
    assert!(lines[1].contains("online"));
    assert!(lines[2].contains("Mom (you)"));
    assert!(lines[2].contains("seen 3h ago"));
    assert!(lines[3].contains("○"));
    assert!(lines[3].contains("never seen"));
  }
}
