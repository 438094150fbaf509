//! Line commands for the interactive browser.

use thiserror::Error;

use crate::session::snap_min_score;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Goto(u32),
    Category(String),
    Source(String),
    /// Already snapped to the selectable range.
    MinScore(u32),
    Search(String),
    /// Reset every filter.
    Clear,
    Retry,
    Show(i64),
    Filters,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'h' for help.")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
Commands:
  n, next          next page
  p, prev          previous page
  g <page>         go to page
  c <category>     filter by category (c - to clear)
  s <source>       filter by source (s - to clear)
  m <score>        minimum quality score (0-90, step 10), 0 to clear
  / <text>         search titles and summaries (/ alone clears)
  clear            reset all filters
  show <id>        show one article
  f, filters       show active filters
  r, retry         repeat the last request
  h, help          this help
  q, quit          leave";

/// Parse a line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    // `/text` needs no space after the slash.
    if let Some(rest) = line.strip_prefix('/') {
        return Ok(Some(Command::Search(rest.trim().to_string())));
    }

    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" => Command::Prev,
        "g" | "go" | "page" => Command::Goto(number(arg, "g")?),
        "c" | "category" => Command::Category(filter_value(arg, "c")?),
        "s" | "source" => Command::Source(filter_value(arg, "s")?),
        "m" | "min" | "score" => Command::MinScore(snap_min_score(number(arg, "m")?)),
        "clear" => Command::Clear,
        "r" | "retry" => Command::Retry,
        "show" | "o" => Command::Show(number(arg, "show")?),
        "f" | "filters" => Command::Filters,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Some(command))
}

fn number<T: std::str::FromStr>(arg: &str, name: &'static str) -> Result<T, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(name));
    }
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

/// `-` clears the filter.
fn filter_value(arg: &str, name: &'static str) -> Result<String, CommandError> {
    match arg {
        "" => Err(CommandError::MissingArgument(name)),
        "-" => Ok(String::new()),
        value => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_navigation() {
        assert_eq!(parse_command("n"), Ok(Some(Command::Next)));
        assert_eq!(parse_command("PREV"), Ok(Some(Command::Prev)));
        assert_eq!(parse_command("g 3"), Ok(Some(Command::Goto(3))));
        assert_eq!(
            parse_command("g"),
            Err(CommandError::MissingArgument("g"))
        );
        assert_eq!(
            parse_command("g three"),
            Err(CommandError::InvalidNumber("three".into()))
        );
    }

    #[test]
    fn test_filters() {
        assert_eq!(
            parse_command("c llm"),
            Ok(Some(Command::Category("llm".into())))
        );
        assert_eq!(parse_command("s -"), Ok(Some(Command::Source(String::new()))));
        assert_eq!(parse_command("m 70"), Ok(Some(Command::MinScore(70))));
        assert_eq!(parse_command("clear"), Ok(Some(Command::Clear)));
    }

    #[test]
    fn test_min_score_is_snapped() {
        assert_eq!(parse_command("m 95"), Ok(Some(Command::MinScore(90))));
        assert_eq!(parse_command("m 75"), Ok(Some(Command::MinScore(70))));
        assert_eq!(parse_command("m 0"), Ok(Some(Command::MinScore(0))));
        assert_eq!(
            parse_command("m -5"),
            Err(CommandError::InvalidNumber("-5".into()))
        );
    }

    #[test]
    fn test_search_keeps_spaces() {
        assert_eq!(
            parse_command("/  large language models "),
            Ok(Some(Command::Search("large language models".into())))
        );
        assert_eq!(parse_command("/"), Ok(Some(Command::Search(String::new()))));
    }

    #[test]
    fn test_show_and_unknown() {
        assert_eq!(parse_command("show 42"), Ok(Some(Command::Show(42))));
        assert_eq!(
            parse_command("frobnicate"),
            Err(CommandError::Unknown("frobnicate".into()))
        );
    }
}
