//! Shell commands, autocomplete and argument parsing

use crate::family::catalog::{self, CATEGORIES, LOCATIONS, UNITS};
use crate::family::Priority;
use crate::ui::components::FilterField;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "create",
    aliases: &["new"],
    usage: "create <family name> [as <nickname>]",
    description: "Create a family and become its first member",
  },
  Command {
    name: "join",
    aliases: &["j"],
    usage: "join <6-digit code> [as <nickname>]",
    description: "Join a family by its code",
  },
  Command {
    name: "list",
    aliases: &["l", "ls"],
    usage: "list",
    description: "Show the shopping list",
  },
  Command {
    name: "history",
    aliases: &["h", "hist", "bought"],
    usage: "history",
    description: "Show bought items",
  },
  Command {
    name: "add",
    aliases: &["a", "+"],
    usage: "add <name> [!] [p=urgent|normal|low] [cat=..] [qty=..] [unit=..] [at=..]",
    description: "Add an item (use _ for spaces in option values)",
  },
  Command {
    name: "done",
    aliases: &["d", "x", "toggle"],
    usage: "done <n|id>",
    description: "Tick an item off, or back on",
  },
  Command {
    name: "rm",
    aliases: &["del", "delete", "remove"],
    usage: "rm <n|id>",
    description: "Delete an item",
  },
  Command {
    name: "clear",
    aliases: &["cc"],
    usage: "clear",
    description: "Move bought items off the list into history",
  },
  Command {
    name: "voice",
    aliases: &["v", "say"],
    usage: "voice",
    description: "Add an item by voice",
  },
  Command {
    name: "refresh",
    aliases: &["r", "sync"],
    usage: "refresh",
    description: "Reload the list from the backend",
  },
  Command {
    name: "filter",
    aliases: &["f"],
    usage: "filter <category|member|priority> <value> | filter clear",
    description: "Toggle a list filter",
  },
  Command {
    name: "members",
    aliases: &["m", "who"],
    usage: "members",
    description: "Show family members and who is online",
  },
  Command {
    name: "suggest",
    aliases: &["s"],
    usage: "suggest <prefix>",
    description: "Suggest item names",
  },
  Command {
    name: "help",
    aliases: &["?"],
    usage: "help",
    description: "Show this help",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit famlist",
  },
];

/// Ranked matches: 0 exact name, 1 exact alias, 2 name prefix,
/// 3 alias prefix, 4 name contains, 5 alias contains.
fn ranked(input: &str) -> Vec<(&'static Command, u32)> {
  let input_lower = input.to_lowercase();
  let mut matches: Vec<(&'static Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
    } else if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    } else if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);
  matches
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }
  ranked(input).into_iter().map(|(cmd, _)| cmd).collect()
}

/// Command named by `word`: an exact name or alias, else a unique prefix.
pub fn resolve(word: &str) -> Option<&'static Command> {
  let matches = ranked(word);
  match matches.first() {
    Some((cmd, rank)) if *rank <= 1 => Some(*cmd),
    _ => {
      let mut prefixed = matches.iter().filter(|(_, rank)| *rank <= 3);
      match (prefixed.next(), prefixed.next()) {
        (Some((cmd, _)), None) => Some(*cmd),
        _ => None,
      }
    }
  }
}

/// Arguments of `add`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddArgs {
  pub name: String,
  pub priority: Priority,
  pub category: Option<String>,
  pub quantity: Option<String>,
  pub unit: Option<String>,
  pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArgs {
  Clear,
  Category(String),
  Member(String),
  Priority(Priority),
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Create {
    family_name: String,
    nickname: Option<String>,
  },
  Join {
    code: String,
    nickname: Option<String>,
  },
  List,
  History,
  Add(AddArgs),
  Done(String),
  Remove(String),
  Clear,
  Voice,
  Refresh,
  Filter(FilterArgs),
  Members,
  Suggest(String),
  Help,
  Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("unknown command '{input}'{}", did_you_mean(.suggestions))]
  Unknown {
    input: String,
    suggestions: Vec<&'static str>,
  },
  #[error("usage: {0}")]
  Usage(&'static str),
  #[error("{0}")]
  Invalid(String),
}

fn did_you_mean(suggestions: &[&str]) -> String {
  if suggestions.is_empty() {
    String::new()
  } else {
    format!(", did you mean {}?", suggestions.join(" or "))
  }
}

/// Parse one command line. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Action>, ParseError> {
  let mut words = line.split_whitespace();
  let Some(word) = words.next() else {
    return Ok(None);
  };
  let args: Vec<&str> = words.collect();

  let Some(cmd) = resolve(word) else {
    return Err(ParseError::Unknown {
      input: word.to_string(),
      suggestions: get_suggestions(word).iter().take(3).map(|c| c.name).collect(),
    });
  };

  let action = match cmd.name {
    "create" => {
      let (name, nickname) = split_as(&args);
      if name.is_empty() {
        return Err(ParseError::Usage(cmd.usage));
      }
      Action::Create {
        family_name: name,
        nickname,
      }
    }
    "join" => {
      let (code, nickname) = split_as(&args);
      if code.is_empty() {
        return Err(ParseError::Usage(cmd.usage));
      }
      Action::Join { code, nickname }
    }
    "list" => Action::List,
    "history" => Action::History,
    "add" => Action::Add(parse_add(&args, cmd.usage)?),
    "done" => Action::Done(single(&args, cmd.usage)?),
    "rm" => Action::Remove(single(&args, cmd.usage)?),
    "clear" => Action::Clear,
    "voice" => Action::Voice,
    "refresh" => Action::Refresh,
    "filter" => Action::Filter(parse_filter(&args, cmd.usage)?),
    "members" => Action::Members,
    "suggest" => {
      if args.is_empty() {
        return Err(ParseError::Usage(cmd.usage));
      }
      Action::Suggest(args.join(" "))
    }
    "help" => Action::Help,
    "quit" => Action::Quit,
    _ => return Err(ParseError::Usage(cmd.usage)),
  };
  Ok(Some(action))
}

/// Split `words` at the last `as`, returning (before, after).
fn split_as(args: &[&str]) -> (String, Option<String>) {
  match args.iter().rposition(|w| w.eq_ignore_ascii_case("as")) {
    Some(pos) if pos > 0 && pos + 1 < args.len() => {
      (args[..pos].join(" "), Some(args[pos + 1..].join(" ")))
    }
    _ => (args.join(" "), None),
  }
}

fn single(args: &[&str], usage: &'static str) -> Result<String, ParseError> {
  match args {
    [one] => Ok(one.to_string()),
    _ => Err(ParseError::Usage(usage)),
  }
}

fn option_value(value: &str) -> String {
  value.replace('_', " ")
}

fn parse_add(args: &[&str], usage: &'static str) -> Result<AddArgs, ParseError> {
  let mut add = AddArgs::default();
  let mut name = Vec::new();

  for arg in args {
    if *arg == "!" {
      add.priority = Priority::Urgent;
      continue;
    }
    let Some((key, value)) = arg.split_once('=') else {
      name.push(*arg);
      continue;
    };
    let value = option_value(value);
    match key.to_lowercase().as_str() {
      "p" | "prio" | "priority" => {
        add.priority = value.parse().map_err(ParseError::Invalid)?;
      }
      "cat" | "category" => {
        add.category = Some(catalog::canonical(CATEGORIES, &value).map_or(value, String::from));
      }
      "qty" | "quantity" => add.quantity = Some(value),
      "unit" => add.unit = Some(catalog::canonical(UNITS, &value).map_or(value, String::from)),
      "at" | "loc" | "location" => {
        add.location = Some(catalog::canonical(LOCATIONS, &value).map_or(value, String::from));
      }
      other => return Err(ParseError::Invalid(format!("unknown option '{}'", other))),
    }
  }

  add.name = name.join(" ");
  if add.name.is_empty() {
    return Err(ParseError::Usage(usage));
  }
  Ok(add)
}

fn parse_filter(args: &[&str], usage: &'static str) -> Result<FilterArgs, ParseError> {
  match args {
    [] => Err(ParseError::Usage(usage)),
    [word] if matches!(word.to_lowercase().as_str(), "clear" | "none" | "off") => {
      Ok(FilterArgs::Clear)
    }
    [field, value @ ..] if !value.is_empty() => {
      let field = FilterField::parse(field)
        .ok_or_else(|| ParseError::Invalid(format!("unknown filter '{}'", field)))?;
      let value = value.join(" ");
      Ok(match field {
        FilterField::Category => {
          FilterArgs::Category(catalog::canonical(CATEGORIES, &value).map_or(value, String::from))
        }
        FilterField::Member => FilterArgs::Member(value),
        FilterField::Priority => FilterArgs::Priority(value.parse().map_err(ParseError::Invalid)?),
      })
    }
    _ => Err(ParseError::Usage(usage)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("history");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "history");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("ls");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "list");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("hist");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "history");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("ice");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "voice");
  }

  #[test]
  fn test_resolve_needs_unique_prefix() {
    assert_eq!(resolve("ref").map(|c| c.name), Some("refresh"));
    assert_eq!(resolve("d").map(|c| c.name), Some("done"));
    assert!(resolve("re").is_none());
    assert!(resolve("zzz").is_none());
  }

  #[test]
  fn test_blank_line() {
    assert_eq!(parse("   "), Ok(None));
  }

  #[test]
  fn test_parse_add_with_options() {
    let action = parse("add Oat milk ! qty=2 unit=l cat=dairy_&_eggs at=supermarket").unwrap();
    assert_eq!(
      action,
      Some(Action::Add(AddArgs {
        name: "Oat milk".to_string(),
        priority: Priority::Urgent,
        category: Some("Dairy & Eggs 🥛".to_string()),
        quantity: Some("2".to_string()),
        unit: Some("L".to_string()),
        location: Some("🏪 Supermarket".to_string()),
      }))
    );
  }

  #[test]
  fn test_parse_add_errors() {
    assert_eq!(parse("add"), Err(ParseError::Usage(COMMANDS[4].usage)));
    assert!(matches!(parse("add tea p=someday"), Err(ParseError::Invalid(_))));
    assert!(matches!(parse("add tea colour=red"), Err(ParseError::Invalid(_))));
  }

  #[test]
  fn test_parse_create_and_join() {
    assert_eq!(
      parse("create The Smiths as Dad").unwrap(),
      Some(Action::Create {
        family_name: "The Smiths".to_string(),
        nickname: Some("Dad".to_string()),
      })
    );
    assert_eq!(
      parse("join 123456").unwrap(),
      Some(Action::Join {
        code: "123456".to_string(),
        nickname: None,
      })
    );
    assert!(matches!(parse("join"), Err(ParseError::Usage(_))));
  }

  #[test]
  fn test_parse_item_references() {
    assert_eq!(parse("done 3").unwrap(), Some(Action::Done("3".to_string())));
    assert_eq!(parse("del abc").unwrap(), Some(Action::Remove("abc".to_string())));
    assert!(matches!(parse("done 1 2"), Err(ParseError::Usage(_))));
  }

  #[test]
  fn test_parse_filter() {
    assert_eq!(parse("filter clear").unwrap(), Some(Action::Filter(FilterArgs::Clear)));
    assert_eq!(
      parse("f prio urgent").unwrap(),
      Some(Action::Filter(FilterArgs::Priority(Priority::Urgent)))
    );
    assert_eq!(
      parse("filter member Mom").unwrap(),
      Some(Action::Filter(FilterArgs::Member("Mom".to_string())))
    );
    assert!(matches!(parse("filter size 3"), Err(ParseError::Invalid(_))));
    assert!(matches!(parse("filter member"), Err(ParseError::Usage(_))));
  }

  #[test]
  fn test_unknown_command_suggests() {
    let err = parse("hisotry").unwrap_err();
    assert!(matches!(err, ParseError::Unknown { .. }));
    assert_eq!(
      parse("xyz").unwrap_err().to_string(),
      "unknown command 'xyz'"
    );
  }

  #[test]
  fn test_every_command_parses_to_its_own_action() {
    let sample_args = |name: &str| match name {
      "create" => "Smiths",
      "join" => "123456",
      "add" => "milk",
      "done" | "rm" => "1",
      "filter" => "clear",
      "suggest" => "mi",
      _ => "",
    };
    for cmd in COMMANDS {
      let line = format!("{} {}", cmd.name, sample_args(cmd.name));
      let action = parse(&line).unwrap().unwrap();
      assert_eq!(action == Action::Quit, cmd.name == "quit", "{}", cmd.name);
    }
    assert_eq!(parse("quit").unwrap(), Some(Action::Quit));
  }
}
