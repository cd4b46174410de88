//! Cycle prediction.
//!
//! A pure function from historical daily records to projected future
//! period, fertile-window, and ovulation dates. No I/O, no state; the
//! caller owns the data and recomputes predictions whenever it likes.
//!
//! # Algorithm
//!
//! 1. Extract cycle starts: maximal runs of consecutive cycle-flagged
//!    days; the first day of each run is a start.
//! 2. Estimate cycle length and period duration from the observed starts
//!    (defaults of 28 / 5 days until two starts have been observed).
//! 3. Fast-forward from the last known start to the cycle containing
//!    today, then project forward to the horizon.
//!
//! A date the user has actually logged with a cycle value is never
//! claimed by any predicted set.

use crate::types::DailyRecord;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Cycle length assumed until two cycle starts have been observed.
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
/// Period duration assumed until two cycle starts have been observed.
pub const DEFAULT_PERIOD_DURATION: i64 = 5;

const MIN_CYCLE_LENGTH: i64 = 21;
const MAX_CYCLE_LENGTH: i64 = 45;
const MIN_PERIOD_DURATION: i64 = 2;
const MAX_PERIOD_DURATION: i64 = 10;
/// Bound on the per-start scan for consecutive flagged days.
const PERIOD_SCAN_CAP: i64 = 10;
/// Ovulation is assumed this many days before the next cycle start.
const LUTEAL_PHASE_DAYS: i64 = 14;
/// The fertile window spans this many days before ovulation, inclusive
/// of the ovulation day itself (6 days total).
const FERTILE_WINDOW_DAYS: i64 = 5;

/// Projected future dates, as sets of calendar days.
///
/// `fertile` and `ovulation` may overlap on the ovulation day itself;
/// consumers treat ovulation as a refinement of fertile, not as a
/// mutually exclusive set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CyclePredictions {
    /// Predicted period days.
    pub period: BTreeSet<NaiveDate>,
    /// Predicted fertile-window days.
    pub fertile: BTreeSet<NaiveDate>,
    /// Predicted ovulation days.
    pub ovulation: BTreeSet<NaiveDate>,
}

impl CyclePredictions {
    /// Returns true if no dates were predicted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.period.is_empty() && self.fertile.is_empty() && self.ovulation.is_empty()
    }

    /// Returns true if any set contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.period.contains(&date) || self.fertile.contains(&date) || self.ovulation.contains(&date)
    }
}

/// Projects period, fertile, and ovulation days from `today` (inclusive)
/// up to `horizon_end`.
///
/// With no cycle-flagged history this returns three empty sets; that is
/// not an error.
#[must_use]
pub fn predict(
    daily: &BTreeMap<NaiveDate, DailyRecord>,
    today: NaiveDate,
    horizon_end: NaiveDate,
) -> CyclePredictions {
    let starts = cycle_starts(daily);
    let Some(&last_start) = starts.last() else {
        return CyclePredictions::default();
    };

    let cycle_length = estimate_cycle_length(&starts);
    let period_duration = estimate_period_duration(daily, &starts);

    // Fast-forward to the cycle containing today.
    let mut cycle_start = last_start;
    while cycle_start + Duration::days(cycle_length) < today {
        cycle_start = cycle_start + Duration::days(cycle_length);
    }

    let logged = |date: NaiveDate| daily.get(&date).is_some_and(|r| r.cycle.is_some());

    let mut predictions = CyclePredictions::default();
    while cycle_start <= horizon_end {
        for offset in 0..period_duration {
            let date = cycle_start + Duration::days(offset);
            if date >= today && date <= horizon_end && !logged(date) {
                predictions.period.insert(date);
            }
        }

        let next_start = cycle_start + Duration::days(cycle_length);
        let ovulation = next_start - Duration::days(LUTEAL_PHASE_DAYS);
        if ovulation >= today && !logged(ovulation) && !predictions.period.contains(&ovulation) {
            predictions.ovulation.insert(ovulation);
        }
        for back in 0..=FERTILE_WINDOW_DAYS {
            let date = ovulation - Duration::days(back);
            if date >= today && !logged(date) && !predictions.period.contains(&date) {
                predictions.fertile.insert(date);
            }
        }

        cycle_start = next_start;
    }

    predictions
}

/// [`predict`] with `today` taken from the system clock.
#[must_use]
pub fn predict_from_today(
    daily: &BTreeMap<NaiveDate, DailyRecord>,
    horizon_end: NaiveDate,
) -> CyclePredictions {
    predict(daily, Utc::now().date_naive(), horizon_end)
}

/// Extracts the start date of every maximal run of consecutive
/// cycle-flagged days, in ascending order.
fn cycle_starts(daily: &BTreeMap<NaiveDate, DailyRecord>) -> Vec<NaiveDate> {
    let mut starts = Vec::new();
    let mut previous: Option<NaiveDate> = None;

    // BTreeMap iteration is already date-ascending.
    for (&date, record) in daily {
        if record.cycle.is_none() {
            continue;
        }
        let consecutive = previous.is_some_and(|prev| (date - prev).num_days() <= 1);
        if !consecutive {
            starts.push(date);
        }
        previous = Some(date);
    }

    starts
}

/// Average gap between consecutive cycle starts, rounded and clamped.
fn estimate_cycle_length(starts: &[NaiveDate]) -> i64 {
    if starts.len() < 2 {
        return DEFAULT_CYCLE_LENGTH;
    }

    let total: i64 = starts
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .sum();
    let average = total as f64 / (starts.len() - 1) as f64;
    (average.round() as i64).clamp(MIN_CYCLE_LENGTH, MAX_CYCLE_LENGTH)
}

/// Average run length of logged period days, rounded and clamped.
///
/// Only active once a full historical cycle is observable (two starts);
/// before that the 5-day default applies.
fn estimate_period_duration(
    daily: &BTreeMap<NaiveDate, DailyRecord>,
    starts: &[NaiveDate],
) -> i64 {
    if starts.len() < 2 {
        return DEFAULT_PERIOD_DURATION;
    }

    let total: i64 = starts
        .iter()
        .map(|&start| {
            let mut length = 0;
            while length < PERIOD_SCAN_CAP {
                let date = start + Duration::days(length);
                match daily.get(&date) {
                    Some(record) if record.cycle.is_some() => length += 1,
                    _ => break,
                }
            }
            length
        })
        .sum();
    let average = total as f64 / starts.len() as f64;
    (average.round() as i64).clamp(MIN_PERIOD_DURATION, MAX_PERIOD_DURATION)
}
