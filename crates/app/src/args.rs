use std::fmt;

use chrono::NaiveDate;
use scent_core::model::{Gender, ProfileDraft, ProfileError, SmokingStatus};

pub use scent_core::progress::MAX_WEEKS;
pub use storage::sqlite::DEFAULT_DB_URL;

pub const DEFAULT_WEEKS: usize = 4;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidToday { raw: String },
    InvalidWeeks { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidAnswer { flag: &'static str, raw: String },
    Profile(ProfileError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidToday { raw } => {
                write!(f, "invalid --today value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::InvalidWeeks { raw } => {
                write!(f, "invalid --weeks value (expected 1-{MAX_WEEKS}): {raw}")
            }
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidAnswer { flag, raw } => {
                write!(f, "invalid {flag} answer (expected <choice>:<0|1>): {raw}")
            }
            ArgsError::Profile(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<ProfileError> for ArgsError {
    fn from(err: ProfileError) -> Self {
        ArgsError::Profile(err)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Answers for one assessment given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessArgs {
    pub threshold_cm: Option<u8>,
    pub discrimination: Vec<(u8, bool)>,
    pub identification: Vec<(String, bool)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Assess(AssessArgs),
    History,
    Export,
    Onboard(ProfileDraft),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Assess(_) => "assess",
            Command::History => "history",
            Command::Export => "export",
            Command::Onboard(_) => "onboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub today: Option<NaiveDate>,
    pub weeks: usize,
    pub command: Command,
}

/// Flags shared by every subcommand, seeded from the environment.
struct Globals {
    db_url: String,
    today: Option<NaiveDate>,
    weeks: usize,
}

impl Globals {
    fn from_env(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        let db_url = env("SCENT_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let today = env("SCENT_TODAY").map(|raw| parse_date(&raw)).transpose()?;
        let weeks = env("SCENT_WEEKS")
            .map(parse_weeks)
            .transpose()?
            .unwrap_or(DEFAULT_WEEKS);
        Ok(Self {
            db_url,
            today,
            weeks,
        })
    }

    /// Consume `flag` if it is global. Returns false for anything else.
    fn accept(
        &mut self,
        flag: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match flag {
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                self.db_url = normalize_sqlite_url(value);
            }
            "--today" => {
                let value = require_value(args, "--today")?;
                self.today = Some(parse_date(&value)?);
            }
            "--weeks" => {
                self.weeks = parse_weeks(require_value(args, "--weeks")?)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidToday {
        raw: raw.to_owned(),
    })
}

/// Week windows run from 1 to `MAX_WEEKS`.
fn parse_weeks(raw: String) -> Result<usize, ArgsError> {
    match raw.trim().parse::<usize>() {
        Ok(weeks) if (1..=MAX_WEEKS).contains(&weeks) => Ok(weeks),
        _ => Err(ArgsError::InvalidWeeks { raw }),
    }
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

/// Split `a:1,b:0` into `(choice, correct)` pairs.
fn parse_answers(flag: &'static str, raw: &str) -> Result<Vec<(String, bool)>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let invalid = || ArgsError::InvalidAnswer {
                flag,
                raw: item.to_owned(),
            };
            let (choice, correct) = item.rsplit_once(':').ok_or_else(invalid)?;
            let correct = match correct.trim() {
                "1" | "y" | "true" => true,
                "0" | "n" | "false" => false,
                _ => return Err(invalid()),
            };
            Ok((choice.trim().to_owned(), correct))
        })
        .collect()
}

impl Args {
    pub fn parse() -> Result<Self, ArgsError> {
        Self::parse_from(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Parse `argv` (without the program name). The first non-flag argument
    /// selects the subcommand; `status` is the default.
    pub fn parse_from(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut globals = Globals::from_env(&env)?;
        let mut args = argv.into_iter().peekable();

        let name = if args.peek().is_some_and(|first| !first.starts_with('-')) {
            args.next()
        } else {
            None
        };

        let command = match name.as_deref() {
            None | Some("status") => {
                Self::parse_plain(&mut globals, &mut args)?;
                Command::Status
            }
            Some("history") => {
                Self::parse_plain(&mut globals, &mut args)?;
                Command::History
            }
            Some("export") => {
                Self::parse_plain(&mut globals, &mut args)?;
                Command::Export
            }
            Some("assess") => Command::Assess(Self::parse_assess(&mut globals, &mut args)?),
            Some("onboard") => Command::Onboard(Self::parse_onboard(&mut globals, &mut args)?),
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };

        Ok(Self {
            db_url: globals.db_url,
            today: globals.today,
            weeks: globals.weeks,
            command,
        })
    }

    fn parse_plain(
        globals: &mut Globals,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<(), ArgsError> {
        while let Some(arg) = args.next() {
            if !globals.accept(&arg, args)? {
                return Err(ArgsError::UnknownArg(arg));
            }
        }
        Ok(())
    }

    fn parse_assess(
        globals: &mut Globals,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<AssessArgs, ArgsError> {
        let mut assess = AssessArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--threshold" => {
                    let value = require_value(args, "--threshold")?;
                    assess.threshold_cm = Some(parse_number("--threshold", value)?);
                }
                "--discrimination" => {
                    let value = require_value(args, "--discrimination")?;
                    for (choice, correct) in parse_answers("--discrimination", &value)? {
                        let index = choice.parse::<u8>().map_err(|_| ArgsError::InvalidAnswer {
                            flag: "--discrimination",
                            raw: choice.clone(),
                        })?;
                        assess.discrimination.push((index, correct));
                    }
                }
                "--identification" => {
                    let value = require_value(args, "--identification")?;
                    assess
                        .identification
                        .extend(parse_answers("--identification", &value)?);
                }
                _ => {
                    if !globals.accept(&arg, args)? {
                        return Err(ArgsError::UnknownArg(arg));
                    }
                }
            }
        }
        Ok(assess)
    }

    fn parse_onboard(
        globals: &mut Globals,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<ProfileDraft, ArgsError> {
        let mut age: Option<u16> = None;
        let mut gender: Option<Gender> = None;
        let mut smoking_status: Option<SmokingStatus> = None;
        let mut has_rhinitis = false;
        let mut is_menopausal = false;
        let mut preferred_perfume: Option<String> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--age" => {
                    let value = require_value(args, "--age")?;
                    age = Some(parse_number("--age", value)?);
                }
                "--gender" => {
                    let value = require_value(args, "--gender")?;
                    gender = Some(value.trim().parse()?);
                }
                "--smoking" => {
                    let value = require_value(args, "--smoking")?;
                    smoking_status = Some(value.trim().parse()?);
                }
                "--rhinitis" => has_rhinitis = true,
                "--menopausal" => is_menopausal = true,
                "--perfume" => preferred_perfume = Some(require_value(args, "--perfume")?),
                _ => {
                    if !globals.accept(&arg, args)? {
                        return Err(ArgsError::UnknownArg(arg));
                    }
                }
            }
        }

        Ok(ProfileDraft {
            age: age.ok_or(ArgsError::MissingFlag { flag: "--age" })?,
            gender: gender.ok_or(ArgsError::MissingFlag { flag: "--gender" })?,
            is_menopausal,
            smoking_status: smoking_status.ok_or(ArgsError::MissingFlag { flag: "--smoking" })?,
            has_rhinitis,
            preferred_perfume,
        })
    }
}

/// Turn a bare or relative path into an absolute `sqlite://` URL.
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
