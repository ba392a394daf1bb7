//! Time-based summaries over the daily records and scored sessions.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{DailyRecord, ScoredSession, WeeklyStats};

//
// ─── STREAKS ───────────────────────────────────────────────────────────────────
//

/// Consecutive completed days ending at `today`.
///
/// Completed records are walked newest first; the record at position `i` must
/// be dated exactly `today - i` days. The first mismatch ends the count, so a
/// missing `today` yields 0 regardless of older runs.
pub fn streak<'a>(records: impl IntoIterator<Item = &'a DailyRecord>, today: NaiveDate) -> u32 {
    let mut completed: Vec<NaiveDate> = records
        .into_iter()
        .filter(|r| r.completed)
        .map(|r| r.date)
        .collect();
    completed.sort_unstable_by(|a, b| b.cmp(a));
    completed.dedup();

    let mut count = 0_u32;
    for (i, date) in completed.iter().enumerate() {
        let days_back = (today - *date).num_days();
        if usize::try_from(days_back).is_ok_and(|d| d == i) {
            count += 1;
        } else {
            break;
        }
    }
    count
}

/// Longest run of consecutive completed days anywhere in the records.
pub fn best_streak<'a>(records: impl IntoIterator<Item = &'a DailyRecord>) -> u32 {
    let mut completed: Vec<NaiveDate> = records
        .into_iter()
        .filter(|r| r.completed)
        .map(|r| r.date)
        .collect();
    completed.sort_unstable();
    completed.dedup();

    let mut best = 0_u32;
    let mut run = 0_u32;
    let mut previous: Option<NaiveDate> = None;
    for date in completed {
        run = match previous {
            Some(prev) if date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(date);
    }
    best
}

//
// ─── WEEKLY STATS ──────────────────────────────────────────────────────────────
//

/// Longest window `weekly_series` will build. Larger requests are clamped.
pub const MAX_WEEKS: usize = 520;

/// Monday of the week containing `date`.
///
/// Saturates at `NaiveDate::MIN` for dates in the first partial week of the calendar.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(
        date.weekday().num_days_from_monday(),
    )))
    .unwrap_or(NaiveDate::MIN)
}

/// `(current - previous) / previous * 100`, with a zero or non-finite base read as no change.
#[must_use]
pub fn relative_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Aggregate the sessions completed in the week starting at `week_start`.
///
/// `improvement` compares the average total against `previous`; it is 0 when
/// there is no previous week or either week has no sessions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weekly_stats(
    sessions: &[ScoredSession],
    week_start: NaiveDate,
    previous: Option<&WeeklyStats>,
) -> WeeklyStats {
    let week_end = week_start.checked_add_signed(Duration::days(7));
    let in_week: Vec<&ScoredSession> = sessions
        .iter()
        .filter(|s| {
            s.completed_on >= week_start && week_end.is_none_or(|end| s.completed_on < end)
        })
        .collect();

    let count = in_week.len();
    let avg = |f: fn(&ScoredSession) -> u8| -> f64 {
        if count == 0 {
            return 0.0;
        }
        let sum: u32 = in_week.iter().map(|s| u32::from(f(*s))).sum();
        f64::from(sum) / count as f64
    };

    let mut stats = WeeklyStats {
        week_start,
        avg_threshold: avg(|s| s.score.threshold()),
        avg_discrimination: avg(|s| s.score.discrimination()),
        avg_identification: avg(|s| s.score.identification()),
        sessions_completed: u32::try_from(count).unwrap_or(u32::MAX),
        improvement: 0.0,
    };

    if let Some(prev) = previous {
        if prev.sessions_completed > 0 && stats.sessions_completed > 0 {
            stats.improvement = relative_change(stats.avg_total(), prev.avg_total());
        }
    }
    stats
}

/// The last `weeks` Monday-based weeks ending with the week containing `today`,
/// oldest first, each compared against its predecessor.
///
/// `weeks` is clamped to [`MAX_WEEKS`]. Weeks that would start before the
/// earliest representable date are left out.
#[must_use]
pub fn weekly_series(
    sessions: &[ScoredSession],
    weeks: usize,
    today: NaiveDate,
) -> Vec<WeeklyStats> {
    let weeks = weeks.min(MAX_WEEKS);
    let current = week_start(today);

    let mut series: Vec<WeeklyStats> = Vec::with_capacity(weeks);
    for back in (0..weeks).rev() {
        let Some(start) = i64::try_from(back)
            .ok()
            .and_then(|back| current.checked_sub_signed(Duration::weeks(back)))
        else {
            continue;
        };
        let stats = weekly_stats(sessions, start, series.last());
        series.push(stats);
    }
    series
}

//
// ─── TREND COMMENT ─────────────────────────────────────────────────────────────
//

const DISCRIMINATION_TREND_PCT: f64 = 10.0;
const THRESHOLD_TREND_PCT: f64 = 8.0;
const IDENTIFICATION_TREND_PCT: f64 = 5.0;

/// Qualitative comment on week-over-week progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendComment {
    Welcome,
    Discrimination { change_pct: f64 },
    Threshold { change_pct: f64 },
    Identification { change_pct: f64 },
    Steady { improvement_pct: f64 },
    Maintain,
}

impl fmt::Display for TrendComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendComment::Welcome => f.write_str(
                "Welcome to your olfactory journey! Complete more sessions to track your progress.",
            ),
            TrendComment::Discrimination { change_pct } => write!(
                f,
                "Impressive! Your discrimination ability improved by {change_pct:.1}% this week. You're developing a refined palate."
            ),
            TrendComment::Threshold { change_pct } => write!(
                f,
                "Your scent detection range has expanded by {change_pct:.1}%. You're becoming more sensitive to subtle notes."
            ),
            TrendComment::Identification { change_pct } => write!(
                f,
                "Great progress in identification! You correctly named {change_pct:.1}% more scents this week."
            ),
            TrendComment::Steady { improvement_pct } => write!(
                f,
                "Steady improvement of {improvement_pct:.1}% overall. Keep up the consistent practice!"
            ),
            TrendComment::Maintain => f.write_str(
                "Maintain your training routine. Olfactory skills develop gradually with practice.",
            ),
        }
    }
}

/// Pick the comment for `current` against `previous`.
///
/// Checked in order: discrimination > 10 %, threshold > 8 %,
/// identification > 5 %, positive overall improvement, otherwise maintain.
#[must_use]
pub fn weekly_trend_comment(current: &WeeklyStats, previous: Option<&WeeklyStats>) -> TrendComment {
    let Some(previous) = previous else {
        return TrendComment::Welcome;
    };

    let threshold = relative_change(current.avg_threshold, previous.avg_threshold);
    let discrimination = relative_change(current.avg_discrimination, previous.avg_discrimination);
    let identification = relative_change(current.avg_identification, previous.avg_identification);

    if discrimination > DISCRIMINATION_TREND_PCT {
        TrendComment::Discrimination {
            change_pct: discrimination,
        }
    } else if threshold > THRESHOLD_TREND_PCT {
        TrendComment::Threshold {
            change_pct: threshold,
        }
    } else if identification > IDENTIFICATION_TREND_PCT {
        TrendComment::Identification {
            change_pct: identification,
        }
    } else if current.improvement > 0.0 {
        TrendComment::Steady {
            improvement_pct: current.improvement,
        }
    } else {
        TrendComment::Maintain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Score;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week(t: f64, d: f64, i: f64, improvement: f64) -> WeeklyStats {
        WeeklyStats {
            week_start: day(2024, 7, 1),
            avg_threshold: t,
            avg_discrimination: d,
            avg_identification: i,
            sessions_completed: 5,
            improvement,
        }
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = day(2024, 7, 14);
        let records = vec![
            DailyRecord::completed(today, 37),
            DailyRecord::completed(day(2024, 7, 13), 36),
            DailyRecord::completed(day(2024, 7, 12), 35),
            DailyRecord::missed(day(2024, 7, 11)),
            DailyRecord::completed(day(2024, 7, 10), 34),
        ];
        assert_eq!(streak(&records, today), 3);
    }

    #[test]
    fn streak_is_zero_without_today() {
        let today = day(2024, 7, 15);
        let records = vec![
            DailyRecord::completed(day(2024, 7, 14), 37),
            DailyRecord::completed(day(2024, 7, 13), 36),
        ];
        assert_eq!(streak(&records, today), 0);
        assert_eq!(streak(&[], today), 0);
    }

    #[test]
    fn future_record_breaks_streak() {
        let today = day(2024, 7, 14);
        let records = vec![
            DailyRecord::completed(day(2024, 7, 15), 30),
            DailyRecord::completed(today, 30),
        ];
        assert_eq!(streak(&records, today), 0);
    }

    #[test]
    fn best_streak_finds_longest_run() {
        let records = vec![
            DailyRecord::completed(day(2024, 7, 1), 29),
            DailyRecord::completed(day(2024, 7, 2), 30),
            DailyRecord::missed(day(2024, 7, 3)),
            DailyRecord::completed(day(2024, 7, 11), 35),
            DailyRecord::completed(day(2024, 7, 12), 35),
            DailyRecord::completed(day(2024, 7, 13), 36),
            DailyRecord::completed(day(2024, 7, 14), 37),
        ];
        assert_eq!(best_streak(&records), 4);
        assert_eq!(best_streak(&[]), 0);
    }

    #[test]
    fn discrimination_wins_over_threshold() {
        let previous = week(8.0, 10.0, 11.0, 0.0);
        let current = week(9.0, 12.0, 11.0, 8.5);
        let comment = weekly_trend_comment(&current, Some(&previous));
        assert_eq!(comment, TrendComment::Discrimination { change_pct: 20.0 });
        assert!(comment.to_string().contains("improved by 20.0%"));
    }

    #[test]
    fn welcome_without_previous_week() {
        let current = week(16.0, 16.0, 16.0, 50.0);
        assert_eq!(weekly_trend_comment(&current, None), TrendComment::Welcome);
    }

    #[test]
    fn trend_priority_falls_through() {
        let previous = week(10.0, 10.0, 10.0, 0.0);
        assert!(matches!(
            weekly_trend_comment(&week(11.0, 10.5, 10.0, 0.0), Some(&previous)),
            TrendComment::Threshold { .. }
        ));
        assert!(matches!(
            weekly_trend_comment(&week(10.0, 10.0, 10.6, 0.0), Some(&previous)),
            TrendComment::Identification { .. }
        ));
        assert_eq!(
            weekly_trend_comment(&week(10.0, 10.0, 10.0, 2.5), Some(&previous)),
            TrendComment::Steady {
                improvement_pct: 2.5
            }
        );
        assert_eq!(
            weekly_trend_comment(&week(10.0, 10.0, 10.0, 0.0), Some(&previous)),
            TrendComment::Maintain
        );
    }

    #[test]
    fn zero_previous_average_is_no_change() {
        let previous = week(0.0, 0.0, 0.0, 0.0);
        let current = week(12.0, 12.0, 12.0, 0.0);
        assert_eq!(
            weekly_trend_comment(&current, Some(&previous)),
            TrendComment::Maintain
        );
    }

    #[test]
    fn weekly_series_averages_and_chains_improvement() {
        // 2024-07-08 and 2024-07-15 are Mondays.
        let s = |d: u32, t: u8, dis: u8, i: u8| {
            ScoredSession::new(day(2024, 7, d), Score::from_parts(t, dis, i).unwrap())
        };
        let sessions = vec![
            s(8, 8, 10, 12),
            s(10, 10, 10, 10),
            s(15, 12, 13, 13),
            s(17, 12, 13, 15),
        ];

        let series = weekly_series(&sessions, 3, day(2024, 7, 18));
        assert_eq!(series.len(), 3);

        assert_eq!(series[0].week_start, day(2024, 7, 1));
        assert_eq!(series[0].sessions_completed, 0);

        assert_eq!(series[1].week_start, day(2024, 7, 8));
        assert_eq!(series[1].sessions_completed, 2);
        assert!((series[1].avg_threshold - 9.0).abs() < 1e-9);
        assert!((series[1].avg_identification - 11.0).abs() < 1e-9);
        assert!(series[1].improvement.abs() < 1e-9);

        assert_eq!(series[2].sessions_completed, 2);
        assert!((series[2].avg_total() - 39.0).abs() < 1e-9);
        // 39 against 30
        assert!((series[2].improvement - 30.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_window_is_clamped() {
        let sessions = vec![ScoredSession::new(
            day(2024, 7, 15),
            Score::from_parts(10, 10, 10).unwrap(),
        )];
        let series = weekly_series(&sessions, usize::MAX, day(2024, 7, 18));
        assert_eq!(series.len(), MAX_WEEKS);
        assert_eq!(series.last().unwrap().week_start, day(2024, 7, 15));
        assert_eq!(series.last().unwrap().sessions_completed, 1);

        let series = weekly_series(&sessions, 50_000_000, day(2024, 7, 18));
        assert_eq!(series.len(), MAX_WEEKS);
        assert!(weekly_series(&sessions, 0, day(2024, 7, 18)).is_empty());
    }

    #[test]
    fn window_stops_at_calendar_edges() {
        let series = weekly_series(&[], 3, NaiveDate::MIN);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].week_start, NaiveDate::MIN);

        let series = weekly_series(&[], 2, NaiveDate::MAX);
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].week_start, week_start(NaiveDate::MAX));
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start(day(2024, 7, 14)), day(2024, 7, 8));
        assert_eq!(week_start(day(2024, 7, 8)), day(2024, 7, 8));
    }
}
