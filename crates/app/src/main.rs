use std::sync::Arc;

use scent_core::model::{Score, TrialConfig};
use services::{AssessmentEngine, Clock, ProgressReport};
use storage::repository::Storage;
use storage::snapshot::PersistedSnapshot;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod args;

use args::{ArgsError, AssessArgs, Args, Command, DEFAULT_DB_URL, DEFAULT_WEEKS, MAX_WEEKS};

const DEFAULT_LOG_DIRECTIVES: &str = "info";

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  scent [status]  [global options]");
    eprintln!("  scent assess    --threshold <cm> --discrimination <idx:0|1,...>");
    eprintln!("                  --identification <label:0|1,...> [global options]");
    eprintln!("  scent history   [global options]");
    eprintln!("  scent export    [global options]");
    eprintln!("  scent onboard   --age <n> --gender <g> --smoking <never|former|current>");
    eprintln!("                  [--rhinitis] [--menopausal] [--perfume <name>] [global options]");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --today <YYYY-MM-DD>  Fix the current date");
    eprintln!("  --weeks <n>           Weeks shown in progress views, 1-{MAX_WEEKS} (default: {DEFAULT_WEEKS})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SCENT_DB_URL, SCENT_TODAY, SCENT_WEEKS, RUST_LOG");
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))?;
    // Logs go to stderr so `export` output stays machine-readable.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

async fn run_assessment(
    engine: &mut AssessmentEngine,
    answers: AssessArgs,
) -> Result<Score, services::EngineError> {
    engine.start_session()?;
    if let Some(cm) = answers.threshold_cm {
        engine.record_threshold(cm)?;
    }
    engine.advance()?;
    for (index, correct) in answers.discrimination {
        engine.record_discrimination_answer(index, correct)?;
    }
    engine.advance()?;
    for (label, correct) in answers.identification {
        engine.record_identification_answer(&label, correct)?;
    }
    engine.complete_session().await
}

fn print_score(score: &Score) {
    println!("Score: {score}");
    println!("  {}", score.band().message());
}

fn print_status(engine: &AssessmentEngine, weeks: usize) {
    let report = ProgressReport::from_engine(engine, weeks);

    println!("Today: {}", report.today);
    match engine.profile() {
        Some(profile) => println!(
            "Profile: age {}, {} programme",
            profile.age(),
            profile.training_class().as_str()
        ),
        None => println!("Profile: not onboarded (run `scent onboard`)"),
    }

    match report.latest {
        Some(score) => {
            print_score(&score);
            for insight in &report.insights {
                println!("  {}: {}", insight.title(), insight.message());
            }
        }
        None => println!("Score: no sessions yet"),
    }

    println!(
        "Sessions: {}  Streak: {} day(s)  Best: {} day(s)",
        report.sessions_completed, report.streak, report.best_streak
    );

    println!("Weekly averages (T / D / I, sessions):");
    for week in &report.weeks {
        println!(
            "  {}  {:>5.1} / {:>5.1} / {:>5.1}  {}",
            week.week_start,
            week.avg_threshold,
            week.avg_discrimination,
            week.avg_identification,
            week.sessions_completed
        );
    }
    println!("{}", report.trend);
}

fn print_history(engine: &AssessmentEngine) {
    if engine.history().is_empty() {
        println!("No history yet.");
        return;
    }
    println!("Sessions:");
    for session in engine.history().sessions() {
        println!("  {}  {}", session.completed_on, session.score);
    }
    println!("Days:");
    for record in engine.daily_records() {
        match record.score {
            Some(total) if record.completed => println!("  {}  done  {total}/48", record.date),
            _ => println!("  {}  missed", record.date),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    let clock = parsed.today.map_or_else(Clock::default_clock, Clock::on_date);
    info!(
        target: "scent::app",
        command = parsed.command.name(),
        db = %parsed.db_url,
        today = %clock.today(),
        "running command"
    );
    let mut engine =
        AssessmentEngine::open(clock, Arc::clone(&storage.snapshots), TrialConfig::reference())
            .await;

    match parsed.command {
        Command::Status => print_status(&engine, parsed.weeks),
        Command::History => print_history(&engine),
        Command::Export => {
            let snapshot = PersistedSnapshot::capture(engine.profile(), engine.history());
            println!("{}", snapshot.to_json()?);
        }
        Command::Assess(answers) => {
            let score = run_assessment(&mut engine, answers).await?;
            // The engine only logs write failures; surface them here.
            engine.persist().await?;
            info!(target: "scent::app", total = score.total(), "assessment saved");
            print_score(&score);
            println!("Streak: {} day(s)", engine.streak());
        }
        Command::Onboard(draft) => {
            let profile = engine.complete_onboarding(draft).await?;
            engine.persist().await?;
            println!(
                "Welcome! Your training programme: {}",
                profile.training_class().as_str()
            );
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
