use crate::commands::COMMANDS;
use crate::ui::view::{View, ViewAction};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Row, Table};

const KEYS: &[(&str, &str)] = &[
  (":", "open the command line"),
  ("j / k", "move down / up"),
  ("x / space", "tick the selected item off, or back on"),
  ("d", "delete the selected item"),
  ("a", "add an item"),
  ("c", "clear bought items"),
  ("v", "add by voice"),
  ("r", "refresh from the backend"),
  ("Tab", "switch list and history"),
  ("m", "members"),
  ("q", "quit"),
];

/// Commands and key bindings
#[derive(Default)]
pub struct HelpView;

impl View for HelpView {
  fn handle_key(&mut self, _key: KeyEvent) -> ViewAction {
    ViewAction::NotHandled
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let section = |title: &'static str| {
      Row::new(vec![Line::styled(title, Style::default().fg(Color::Yellow).bold())])
    };

    let mut rows = vec![section("Keys")];
    rows.extend(KEYS.iter().map(|(key, what)| {
      Row::new(vec![Line::styled(*key, key_style), Line::raw(*what)])
    }));
    rows.push(Row::new(vec![Line::raw("")]));
    rows.push(section("Commands"));
    for cmd in COMMANDS {
      let description = if cmd.aliases.is_empty() {
        cmd.description.to_string()
      } else {
        format!("{} (also: {})", cmd.description, cmd.aliases.join(", "))
      };
      rows.push(Row::new(vec![
        Line::styled(format!(":{}", cmd.usage), key_style),
        Line::raw(description),
      ]));
    }

    let table = Table::new(rows, [Constraint::Percentage(50), Constraint::Percentage(50)]).block(
      Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(table, area);
  }
}
