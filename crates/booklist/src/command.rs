//! Command line parsing for the interactive front end

use std::fmt;

/// One user action typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fill both form buffers and save
    Add { name: String, author: String },
    /// Set the name buffer
    Name(String),
    /// Set the author buffer
    Author(String),
    /// Save the form buffers
    Save,
    /// Print the list
    List,
    /// Edit a field of the n-th listed book (1-based)
    Edit {
        index: usize,
        field: Field,
        value: String,
    },
    /// Push the edit buffer
    Update,
    /// Delete the n-th listed book (1-based)
    Delete(usize),
    /// Reload from the store
    Reload,
    Help,
    Quit,
}

/// Editable book field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Author,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type `help` for commands)", self.0)
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
commands:
  add <name> | <author>      add a book
  name <text>                set the name input
  author <text>              set the author input
  save                       add a book from the inputs
  list                       show the list
  edit <n> name|author <text>  edit the n-th book in place
  update                     send the pending edit
  delete <n>                 delete the n-th book
  reload                     reload the list
  help                       show this help
  quit                       exit";

impl Command {
    /// Parse one input line
    ///
    /// Returns `Ok(None)` for blank lines. Text arguments are taken
    /// verbatim after the keyword's separating space.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }

        let (keyword, rest) = match line.trim_start().split_once(' ') {
            Some((keyword, rest)) => (keyword, rest),
            None => (line.trim(), ""),
        };

        let command = match keyword {
            "add" => {
                let (name, author) = rest
                    .split_once('|')
                    .ok_or_else(|| ParseError("usage: add <name> | <author>".into()))?;
                Command::Add {
                    name: name.trim().to_string(),
                    author: author.trim().to_string(),
                }
            }
            "name" => Command::Name(rest.to_string()),
            "author" => Command::Author(rest.to_string()),
            "save" => Command::Save,
            "list" | "ls" => Command::List,
            "edit" => Self::parse_edit(rest)?,
            "update" => Command::Update,
            "delete" | "rm" => Command::Delete(parse_index(rest.trim())?),
            "reload" => Command::Reload,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError(format!("unknown command `{}`", other))),
        };

        Ok(Some(command))
    }

    fn parse_edit(rest: &str) -> Result<Self, ParseError> {
        let usage = || ParseError("usage: edit <n> name|author <text>".into());

        let mut parts = rest.splitn(3, ' ');
        let index = parse_index(parts.next().ok_or_else(usage)?)?;
        let field = match parts.next() {
            Some("name") => Field::Name,
            Some("author") => Field::Author,
            _ => return Err(usage()),
        };
        let value = parts.next().unwrap_or_default().to_string();

        Ok(Command::Edit {
            index,
            field,
            value,
        })
    }
}

fn parse_index(raw: &str) -> Result<usize, ParseError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError(format!("`{}` is not a list position", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_ignored() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   \n").unwrap(), None);
    }

    #[test]
    fn test_add_splits_on_pipe() {
        assert_eq!(
            Command::parse("add The Left Hand of Darkness | Ursula K. Le Guin").unwrap(),
            Some(Command::Add {
                name: "The Left Hand of Darkness".into(),
                author: "Ursula K. Le Guin".into(),
            })
        );
        assert!(Command::parse("add Dune").is_err());
    }

    #[test]
    fn test_add_keeps_empty_sides() {
        assert_eq!(
            Command::parse("add | Herbert").unwrap(),
            Some(Command::Add {
                name: String::new(),
                author: "Herbert".into(),
            })
        );
    }

    #[test]
    fn test_buffer_commands_take_text_verbatim() {
        assert_eq!(
            Command::parse("name  Dune ").unwrap(),
            Some(Command::Name(" Dune ".into()))
        );
        assert_eq!(
            Command::parse("author").unwrap(),
            Some(Command::Author(String::new()))
        );
    }

    #[test]
    fn test_edit() {
        assert_eq!(
            Command::parse("edit 2 author Frank Herbert").unwrap(),
            Some(Command::Edit {
                index: 2,
                field: Field::Author,
                value: "Frank Herbert".into(),
            })
        );
        assert!(Command::parse("edit 2 isbn 123").is_err());
        assert!(Command::parse("edit x name Dune").is_err());
    }

    #[test]
    fn test_delete_positions_are_one_based() {
        assert_eq!(Command::parse("delete 1").unwrap(), Some(Command::Delete(1)));
        assert!(Command::parse("delete 0").is_err());
        assert!(Command::parse("rm").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::parse("frobnicate").unwrap_err();
        assert!(err.to_string().contains("unknown command `frobnicate`"));
    }
}
