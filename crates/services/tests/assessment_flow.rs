use std::sync::Arc;

use chrono::NaiveDate;
use scent_core::model::{AssessmentStage, ScoreBand, TrialConfig};
use scent_core::progress::TrendComment;
use scent_core::time::{fixed_clock, fixed_today};
use services::{AssessmentEngine, Clock, ProgressReport};
use storage::repository::{InMemoryRepository, SnapshotRepository};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn run_session(
    engine: &mut AssessmentEngine,
    distance_cm: u8,
    discrimination: &[bool],
    identification: &[bool],
) -> scent_core::model::Score {
    engine.start_session().unwrap();
    engine.record_threshold(distance_cm).unwrap();
    engine.advance().unwrap();
    for (i, &correct) in (0_u8..).zip(discrimination) {
        engine.record_discrimination_answer(i % 3, correct).unwrap();
    }
    engine.advance().unwrap();
    for &correct in identification {
        engine.record_identification_answer("Lavender", correct).unwrap();
    }
    engine.complete_session().await.unwrap()
}

#[tokio::test]
async fn full_session_is_scored_persisted_and_restored() {
    let repo = InMemoryRepository::new();
    let mut engine = AssessmentEngine::open(
        fixed_clock(),
        Arc::new(repo.clone()),
        TrialConfig::reference(),
    )
    .await;
    assert_eq!(engine.stage(), AssessmentStage::Idle);

    let score = run_session(
        &mut engine,
        15,
        &[true, true, false, true, true],
        &[true; 5],
    )
    .await;
    assert_eq!(score.total(), 41);
    assert_eq!(score.percentile(), 85);
    assert_eq!(score.band(), ScoreBand::from_total(41));
    assert!(engine.recorder().is_complete());
    assert_eq!(engine.stage(), AssessmentStage::Complete);

    let stored = repo.load().await.unwrap().expect("snapshot saved");
    assert_eq!(stored.scores.len(), 1);
    assert_eq!(stored.daily_records.len(), 1);

    let reopened =
        AssessmentEngine::open(fixed_clock(), Arc::new(repo), TrialConfig::reference()).await;
    assert_eq!(reopened.stage(), AssessmentStage::Idle);
    assert_eq!(reopened.current_score(), None);
    assert_eq!(reopened.scores().collect::<Vec<_>>(), vec![score]);
    assert_eq!(reopened.streak(), 1);
}

#[tokio::test]
async fn second_session_on_same_day_replaces_daily_record() {
    let mut engine = AssessmentEngine::new(
        fixed_clock(),
        Arc::new(InMemoryRepository::new()),
        TrialConfig::reference(),
    );
    run_session(&mut engine, 30, &[false; 5], &[false; 5]).await;
    let second = run_session(&mut engine, 5, &[true; 5], &[true; 5]).await;

    assert_eq!(engine.scores().count(), 2);
    let records: Vec<_> = engine.daily_records().copied().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, fixed_today());
    assert_eq!(records[0].score, Some(second.total()));
}

#[tokio::test]
async fn streak_counts_consecutive_days_ending_today() {
    let mut engine = AssessmentEngine::new(
        Clock::on_date(day(2023, 11, 10)),
        Arc::new(InMemoryRepository::new()),
        TrialConfig::reference(),
    );
    // 11-10, then a gap, then 11-12 through 11-14.
    for date in [day(2023, 11, 10), day(2023, 11, 12), day(2023, 11, 13), day(2023, 11, 14)] {
        engine.set_clock(Clock::on_date(date));
        run_session(&mut engine, 15, &[true; 5], &[true; 5]).await;
    }
    assert_eq!(engine.streak(), 3);
    assert_eq!(engine.best_streak(), 3);

    engine.set_clock(Clock::on_date(day(2023, 11, 16)));
    assert_eq!(engine.streak(), 0);
    assert_eq!(engine.best_streak(), 3);
}

#[tokio::test]
async fn weekly_trend_prefers_discrimination_gains() {
    let mut engine = AssessmentEngine::new(
        Clock::on_date(day(2023, 11, 8)),
        Arc::new(InMemoryRepository::new()),
        TrialConfig::reference(),
    );
    run_session(&mut engine, 30, &[true, true, true, false, false], &[true; 5]).await;

    engine.set_clock(fixed_clock());
    assert!(matches!(engine.weekly_trend(4), TrendComment::Maintain));

    run_session(&mut engine, 15, &[true; 5], &[true; 5]).await;

    let weeks = engine.weekly_stats(4);
    assert_eq!(weeks.len(), 4);
    assert_eq!(weeks[3].week_start, day(2023, 11, 13));
    assert_eq!(weeks[3].sessions_completed, 1);
    assert_eq!(weeks[2].sessions_completed, 1);

    // Discrimination 10 -> 16 (+60 %) beats threshold 8 -> 12 (+50 %).
    match engine.weekly_trend(4) {
        TrendComment::Discrimination { change_pct } => assert!((change_pct - 60.0).abs() < 1e-9),
        other => panic!("unexpected trend: {other:?}"),
    }
}

#[tokio::test]
async fn first_week_gets_welcome_message() {
    let mut engine = AssessmentEngine::new(
        fixed_clock(),
        Arc::new(InMemoryRepository::new()),
        TrialConfig::reference(),
    );
    assert!(matches!(engine.weekly_trend(4), TrendComment::Welcome));
    run_session(&mut engine, 15, &[true; 5], &[true; 5]).await;
    assert!(matches!(engine.weekly_trend(4), TrendComment::Welcome));
}

#[tokio::test]
async fn progress_report_summarises_engine_state() {
    let mut engine = AssessmentEngine::new(
        fixed_clock(),
        Arc::new(InMemoryRepository::new()),
        TrialConfig::reference(),
    );
    let empty = ProgressReport::from_engine(&engine, 4);
    assert!(empty.latest.is_none());
    assert!(empty.insights.is_empty());
    assert_eq!(empty.sessions_completed, 0);

    let score = run_session(&mut engine, 5, &[true; 5], &[true, true, true, false, false]).await;
    let report = ProgressReport::from_engine(&engine, 4);
    assert_eq!(report.today, fixed_today());
    assert_eq!(report.latest, Some(score));
    assert_eq!(report.band, Some(score.band()));
    assert_eq!(report.insights.len(), 3);
    assert_eq!(report.streak, 1);
    assert_eq!(report.weeks.len(), 4);
}
