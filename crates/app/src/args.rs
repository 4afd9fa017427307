use std::fmt;
use std::path::{Path, PathBuf};

use practice_core::model::{Role, TopicId};

pub const DEFAULT_DB_URL: &str = "sqlite://practice.sqlite3";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidRole { raw: String },
    InvalidSwitch { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidRole { raw } => write!(f, "unknown role {raw}, expected DE, DS or DA"),
            ArgsError::InvalidSwitch { raw } => write!(f, "expected on or off, got {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicsCommand {
    Show,
    Select(TopicId),
    Remove(TopicId),
    IncludeChildren(TopicId, bool),
    ActiveRole(Role),
    ToggleRole(Role),
    Add {
        level: u32,
        label: String,
        parent: Option<TopicId>,
    },
    /// Practice the whole selection, or one topic.
    Practice(Option<TopicId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarksCommand {
    List,
    Toggle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Practice,
    Topics(TopicsCommand),
    History { limit: usize },
    Bookmarks(BookmarksCommand),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub verbose: bool,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [--db <sqlite_url>] [--verbose] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  practice                          resume or start a practice session (default)");
    eprintln!("  topics                            show the topic picker for the active role");
    eprintln!("  topics select <topic_id>");
    eprintln!("  topics remove <topic_id>");
    eprintln!("  topics include <topic_id> on|off");
    eprintln!("  topics role <DE|DS|DA>            make a role active");
    eprintln!("  topics toggle-role <DE|DS|DA>");
    eprintln!("  topics add <level> <label> [--parent <topic_id>]");
    eprintln!("  topics practice [<topic_id>]      scope practice to the selection or one topic");
    eprintln!("  history [--limit <n>]");
    eprintln!("  bookmarks [toggle <question_id>]");
    eprintln!("  reset                             clear all local state");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PRACTICE_DB_URL (default {DEFAULT_DB_URL}), RUST_LOG,");
    eprintln!("  PRACTICE_REMOVAL_SCOPE, PRACTICE_REVIEW_INJECTION_RATE,");
    eprintln!("  PRACTICE_HISTORY_LIMIT, PRACTICE_DEFAULT_ROLE");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_role(raw: String) -> Result<Role, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidRole { raw })
}

fn topic_arg(
    iter: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<TopicId, ArgsError> {
    require_value(iter, flag).map(TopicId::new)
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

impl Args {
    /// Parse everything after the program name. `env_db_url` is `PRACTICE_DB_URL`.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env_db_url: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env_db_url.map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let mut verbose = false;
        let mut positional = Vec::new();

        let mut iter = argv.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--verbose" | "-v" => verbose = true,
                _ => positional.push(arg),
            }
        }

        let command = parse_command(positional)?;
        Ok(Self {
            db_url,
            verbose,
            command,
        })
    }
}

fn parse_command(positional: Vec<String>) -> Result<Command, ArgsError> {
    let mut iter = positional.into_iter();
    let Some(name) = iter.next() else {
        return Ok(Command::Practice);
    };

    let command = match name.as_str() {
        "practice" => Command::Practice,
        "topics" => Command::Topics(parse_topics(&mut iter)?),
        "history" => {
            let mut limit = 20;
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--limit" => limit = parse_number("--limit", require_value(&mut iter, "--limit")?)?,
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            Command::History { limit }
        }
        "bookmarks" => match iter.next().as_deref() {
            None => Command::Bookmarks(BookmarksCommand::List),
            Some("toggle") => Command::Bookmarks(BookmarksCommand::Toggle(require_value(
                &mut iter,
                "toggle",
            )?)),
            Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
        },
        "reset" => Command::Reset,
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = iter.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(command)
}

fn parse_topics(iter: &mut impl Iterator<Item = String>) -> Result<TopicsCommand, ArgsError> {
    let Some(action) = iter.next() else {
        return Ok(TopicsCommand::Show);
    };
    match action.as_str() {
        "select" => Ok(TopicsCommand::Select(topic_arg(iter, "select")?)),
        "remove" => Ok(TopicsCommand::Remove(topic_arg(iter, "remove")?)),
        "include" => {
            let id = topic_arg(iter, "include")?;
            let switch = require_value(iter, "include")?;
            let on = match switch.as_str() {
                "on" => true,
                "off" => false,
                _ => return Err(ArgsError::InvalidSwitch { raw: switch }),
            };
            Ok(TopicsCommand::IncludeChildren(id, on))
        }
        "role" => Ok(TopicsCommand::ActiveRole(parse_role(require_value(iter, "role")?)?)),
        "toggle-role" => Ok(TopicsCommand::ToggleRole(parse_role(require_value(
            iter,
            "toggle-role",
        )?)?)),
        "add" => {
            let level = parse_number("add", require_value(iter, "add")?)?;
            let label = require_value(iter, "add")?;
            let parent = match iter.next().as_deref() {
                None => None,
                Some("--parent") => Some(topic_arg(iter, "--parent")?),
                Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
            };
            Ok(TopicsCommand::Add {
                level,
                label,
                parent,
            })
        }
        "practice" => Ok(TopicsCommand::Practice(iter.next().map(TopicId::new))),
        _ => Err(ArgsError::UnknownArg(action)),
    }
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its directory so `sqlx` can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
