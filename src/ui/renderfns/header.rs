use crate::family::{Family, User};
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with family, join code, presence, backend and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  family: Option<&Family>,
  members: &[User],
  backend: &str,
  shortcuts: &[ShortcutInfo],
) {
  let header = header_line(family, members, backend, shortcuts);
  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

pub fn header_line(
  family: Option<&Family>,
  members: &[User],
  backend: &str,
  shortcuts: &[ShortcutInfo],
) -> Line<'static> {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));
  let mut spans = vec![
    Span::styled(" famlist ", Style::default().fg(Color::Cyan).bold()),
    separator(),
  ];

  match family {
    Some(family) => {
      let online = members.iter().filter(|m| m.is_online).count();
      spans.extend([
        Span::styled(format!(" {} ", family.name), Style::default().fg(Color::Yellow).bold()),
        separator(),
        Span::styled(format!(" code {} ", family.code), Style::default().fg(Color::White)),
        separator(),
        Span::styled(
          format!(" {}/{} online ", online, members.len()),
          Style::default().fg(Color::Green),
        ),
      ]);
    }
    None => spans.push(Span::styled(" no family ", Style::default().fg(Color::DarkGray))),
  }

  spans.push(separator());
  spans.push(Span::styled(
    format!(" {} ", extract_domain(backend)),
    Style::default().fg(Color::DarkGray),
  ));

  // Keys highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  Line::from(spans)
}

/// Host part of a backend URL; other labels pass through.
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
