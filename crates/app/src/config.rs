use std::fmt;
use std::path::PathBuf;

use services::{BankSource, ImportMode};
use url::Url;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_BANK: &str = "quiz_data.json";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidAssetUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => {
                write!(f, "{command} requires {flag}")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAssetUrl { raw } => write!(f, "invalid --assets value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app rounds                                   list rounds and subjects");
    eprintln!("  app quiz --round <r> --subject <s>...        start a quiz");
    eprintln!("  app continue                                 resume the last quiz");
    eprintln!("  app checked --subject <s>...                 quiz over bookmarked questions");
    eprintln!("  app continue-checked                         resume the last bookmark quiz");
    eprintln!("  app export-checked                           print bookmarks as JSON");
    eprintln!("  app import-checked <file> [--merge]          load bookmarks from JSON");
    eprintln!("  app export-explanations                      print saved notes");
    eprintln!("  app clear-explanations                       delete saved notes");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>     default {DEFAULT_DB_URL}");
    eprintln!("  --bank <path|url>     default {DEFAULT_BANK}");
    eprintln!("  --assets <url>        base URL for image references");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK, QUIZ_ASSET_BASE_URL, RUST_LOG");
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Rounds,
    Quiz { round: String, subjects: Vec<String> },
    Continue,
    Checked { subjects: Vec<String> },
    ContinueChecked,
    ExportChecked,
    ImportChecked { path: PathBuf, mode: ImportMode },
    ExportExplanations,
    ClearExplanations,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub bank: BankSource,
    pub asset_base: Option<Url>,
}

impl Config {
    fn from_env(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        let db_url = env("QUIZ_DB_URL")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.to_owned(), normalize_sqlite_url);
        let bank = BankSource::parse(&env("QUIZ_BANK").unwrap_or_else(|| DEFAULT_BANK.into()));
        let asset_base = env("QUIZ_ASSET_BASE_URL")
            .filter(|value| !value.trim().is_empty())
            .map(parse_asset_base)
            .transpose()?;
        Ok(Self {
            db_url,
            bank,
            asset_base,
        })
    }
}

/// Parse `argv` (without the program name), falling back to `env` for
/// anything not given on the command line.
pub fn parse_args(
    argv: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(Command, Config), ArgsError> {
    let mut config = Config::from_env(&env)?;
    let mut args = argv.into_iter().peekable();

    let name = match args.peek() {
        Some(first) if !first.starts_with('-') => args.next().unwrap_or_default(),
        _ => "rounds".to_owned(),
    };

    let mut round = None;
    let mut subjects = Vec::new();
    let mut merge = false;
    let mut positional = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = require_value(&mut args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                config.db_url = normalize_sqlite_url(value);
            }
            "--bank" => config.bank = BankSource::parse(&require_value(&mut args, "--bank")?),
            "--assets" => {
                config.asset_base = Some(parse_asset_base(require_value(&mut args, "--assets")?)?);
            }
            "--round" => round = Some(require_value(&mut args, "--round")?),
            "--subject" => {
                let value = require_value(&mut args, "--subject")?;
                subjects.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned),
                );
            }
            "--merge" => merge = true,
            "--help" | "-h" => return Ok((Command::Help, config)),
            _ if !arg.starts_with('-') && positional.is_none() => positional = Some(arg),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    let command = match name.as_str() {
        "rounds" => Command::Rounds,
        "quiz" => Command::Quiz {
            round: round.ok_or(ArgsError::MissingFlag {
                command: "quiz",
                flag: "--round",
            })?,
            subjects,
        },
        "continue" => Command::Continue,
        "checked" => Command::Checked { subjects },
        "continue-checked" => Command::ContinueChecked,
        "export-checked" => Command::ExportChecked,
        "import-checked" => Command::ImportChecked {
            path: positional.map(PathBuf::from).ok_or(ArgsError::MissingFlag {
                command: "import-checked",
                flag: "<file>",
            })?,
            mode: if merge {
                ImportMode::Merge
            } else {
                ImportMode::Overwrite
            },
        },
        "export-explanations" => Command::ExportExplanations,
        "clear-explanations" => Command::ClearExplanations,
        "help" => Command::Help,
        other => return Err(ArgsError::UnknownCommand(other.to_owned())),
    };

    Ok((command, config))
}

fn parse_asset_base(raw: String) -> Result<Url, ArgsError> {
    // Without a trailing slash `join` would replace the last path segment.
    let with_slash = if raw.ends_with('/') {
        raw.clone()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|_| ArgsError::InvalidAssetUrl { raw })
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so `SQLite` can open it.
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

    let path = std::path::Path::new(path);
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
