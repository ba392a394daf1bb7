use std::fmt;

use chrono::{Days, NaiveDate, Utc};
use scent_core::TrialRecorder;
use scent_core::model::{DailyRecord, History, ScoredSession, TrialConfig};
use scent_core::scoring;
use storage::repository::Storage;
use storage::snapshot::PersistedSnapshot;
use storage::sqlite::DEFAULT_DB_URL;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    days: u32,
    skip_every: u32,
    today: Option<NaiveDate>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDays { raw: String },
    InvalidSkipEvery { raw: String },
    InvalidDbUrl { raw: String },
    InvalidToday { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidSkipEvery { raw } => write!(f, "invalid --skip-every value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidToday { raw } => {
                write!(f, "invalid --today value (expected YYYY-MM-DD): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("SCENT_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
        let mut days = std::env::var("SCENT_SEED_DAYS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(21);
        let mut skip_every = std::env::var("SCENT_SEED_SKIP_EVERY")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut today: Option<NaiveDate> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--skip-every" => {
                    let value = require_value(&mut args, "--skip-every")?;
                    skip_every = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSkipEvery { raw: value.clone() })?;
                }
                "--today" => {
                    let value = require_value(&mut args, "--today")?;
                    let parsed = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .map_err(|_| ArgsError::InvalidToday { raw: value.clone() })?;
                    today = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            days,
            skip_every,
            today,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL, created if missing (default: {DEFAULT_DB_URL})");
    eprintln!("  --days <n>                Days of history ending today (default: 21)");
    eprintln!("  --skip-every <n>          Leave every nth day unpractised, 0 for none (default: 5)");
    eprintln!("  --today <YYYY-MM-DD>      Fixed current date for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SCENT_DB_URL, SCENT_SEED_DAYS, SCENT_SEED_SKIP_EVERY");
}

/// Answers for day `index` of the demo: every sub-test improves slowly.
fn demo_session(
    config: &TrialConfig,
    index: u32,
) -> Result<TrialRecorder, Box<dyn std::error::Error>> {
    let mut recorder = TrialRecorder::new(config.clone());
    let distances = config.distances();
    let step = usize::try_from(index / 7)?.min(distances.len().saturating_sub(1));
    if let Some(distance) = distances.get(step) {
        recorder.record_threshold(distance.cm())?;
    }

    let discrimination_correct = (1 + index / 3).min(5);
    for trial in 0..5 {
        let choice = u8::try_from(trial % 3)?;
        recorder.record_discrimination_answer(choice, trial < discrimination_correct)?;
    }

    let labels = ["Rose", "Lemon", "Eucalyptus", "Clove", "Vanilla"];
    let identification_correct = (2 + index / 4).min(5);
    for (trial, label) in (0_u32..).zip(labels) {
        recorder.record_identification_answer(label, trial < identification_correct)?;
    }
    Ok(recorder)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    // Keep an onboarded profile if one is already stored.
    let profile = match storage.snapshots.load().await? {
        Some(snapshot) => snapshot.into_parts()?.0,
        None => None,
    };

    let config = TrialConfig::reference();
    let mut history = History::new();
    let mut completed = 0_u32;
    for index in 0..args.days {
        let days_ago = u64::from(args.days - 1 - index);
        let date = today
            .checked_sub_days(Days::new(days_ago))
            .ok_or("date out of range")?;

        if args.skip_every > 0 && index % args.skip_every == args.skip_every - 1 {
            history.upsert_record(DailyRecord::missed(date));
            continue;
        }

        let recorder = demo_session(&config, index)?;
        let score = scoring::score(recorder.data(), recorder.config());
        history.push_session(ScoredSession::new(date, score));
        history.upsert_record(DailyRecord::completed(date, score.total()));
        completed += 1;
    }

    let snapshot = PersistedSnapshot::capture(profile.as_ref(), &history);
    storage.snapshots.save(&snapshot).await?;

    println!(
        "Seeded {} days ({} sessions) ending {} into {}",
        args.days, completed, today, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
