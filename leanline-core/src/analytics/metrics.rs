//! Metrics engine: pure derivations over readings and the user profile.
//!
//! Every function here is total. Empty or single-element inputs, zero
//! heights and equal start/target weights all map to a fixed neutral value
//! instead of an error. Inputs are never mutated; functions that care about
//! time order sort a private copy first.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, Weekday};
use serde::Serialize;

use super::units::{cm_to_m, lb_to_kg};
use crate::types::{Reading, UserProfile};

/// First day of the week used for bucketing unless configured otherwise.
pub const DEFAULT_WEEK_START: Weekday = Weekday::Sun;

/// Weight-loss taper used for the predicted curve: (weeks, pounds per week).
///
/// Rates are in pounds regardless of the user's display preference.
pub const TAPER_SCHEDULE: [(u32, f64); 4] = [(4, 2.0), (4, 1.8), (4, 1.5), (4, 1.2)];

/// Score reported when there has been no net weight loss yet.
pub const NEUTRAL_MUSCLE_SCORE: u8 = 50;

/// Minimum history for the hydration check: the latest reading plus a
/// four-reading baseline.
const HYDRATION_MIN_READINGS: usize = 5;
const HYDRATION_BASELINE_LEN: usize = 4;
/// Percentage points below baseline that count as a hydration dip.
const HYDRATION_DROP_PCT: f64 = 2.0;

/// Floor for the weight-loss denominator in the muscle score.
const MIN_WEIGHT_DELTA_KG: f64 = 0.1;

/// One point on the predicted weight curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedPoint {
    /// Week number, starting at 1
    pub week: u32,
    pub weight_kg: f64,
}

/// Mean weight for one calendar week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyWeight {
    /// First day of the week
    pub week_start: NaiveDate,
    /// `YYYY-MM-DD` of `week_start`
    pub label: String,
    pub mean_weight_kg: f64,
}

// ============================================
// Ordering helpers
// ============================================

/// Readings sorted oldest first. Ties keep their input order.
pub fn sorted_ascending(readings: &[Reading]) -> Vec<&Reading> {
    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.recorded_at);
    sorted
}

/// Readings sorted newest first.
pub fn sorted_descending(readings: &[Reading]) -> Vec<&Reading> {
    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    sorted
}

// ============================================
// Body measures
// ============================================

/// Body mass index: weight / height².
///
/// Returns 0 when height is 0.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = cm_to_m(height_cm);
    if height_m == 0.0 {
        return 0.0;
    }
    weight_kg / (height_m * height_m)
}

/// Fat mass in kg for a given weight and body-fat percentage.
pub fn fat_mass(weight_kg: f64, body_fat_pct: f64) -> f64 {
    weight_kg * body_fat_pct / 100.0
}

/// Lean mass in kg; always `weight_kg - fat_mass(..)`.
pub fn lean_mass(weight_kg: f64, body_fat_pct: f64) -> f64 {
    weight_kg - fat_mass(weight_kg, body_fat_pct)
}

// ============================================
// Progress
// ============================================

/// Weight change (kg) between the latest reading and the first reading at
/// least seven days older. Negative means loss.
///
/// The comparison reading is whichever logged reading first crosses the
/// seven-day boundary, so with sparse logging it may be several weeks old.
/// Returns 0 with fewer than two readings or when every reading falls inside
/// the last seven days.
pub fn weekly_change(readings: &[Reading]) -> f64 {
    if readings.len() < 2 {
        return 0.0;
    }

    let sorted = sorted_descending(readings);
    let latest = sorted[0];
    let cutoff = latest.recorded_at - Duration::days(7);

    match sorted.iter().find(|r| r.recorded_at <= cutoff) {
        Some(previous) => latest.weight_kg - previous.weight_kg,
        None => 0.0,
    }
}

/// Fraction of the way from start weight to target weight, clamped to [0, 1].
///
/// Returns 0 when start and target are equal.
pub fn progress_to_goal(user: &UserProfile, current_weight_kg: f64) -> f64 {
    let span = user.start_weight_kg - user.target_weight_kg;
    if span == 0.0 {
        return 0.0;
    }
    ((user.start_weight_kg - current_weight_kg) / span).clamp(0.0, 1.0)
}

/// Sixteen-week predicted weight curve following [`TAPER_SCHEDULE`].
///
/// Each point is floored at the target weight.
pub fn predicted_curve(user: &UserProfile) -> Vec<PredictedPoint> {
    let mut points = Vec::with_capacity(16);
    let mut cumulative_lb = 0.0;
    let mut week = 0;

    for &(weeks, lb_per_week) in TAPER_SCHEDULE.iter() {
        for _ in 0..weeks {
            week += 1;
            cumulative_lb += lb_per_week;
            let predicted = user.start_weight_kg - lb_to_kg(cumulative_lb);
            points.push(PredictedPoint {
                week,
                weight_kg: predicted.max(user.target_weight_kg),
            });
        }
    }

    points
}

/// How well muscle has been kept while losing weight, 0-100.
///
/// Losing proportionally less muscle than total weight scores higher.
/// Returns [`NEUTRAL_MUSCLE_SCORE`] until there is a net loss.
pub fn muscle_preservation_score(
    start_weight_kg: f64,
    current_weight_kg: f64,
    start_muscle_kg: f64,
    current_muscle_kg: f64,
) -> u8 {
    let weight_delta = start_weight_kg - current_weight_kg;
    if weight_delta <= 0.0 {
        return NEUTRAL_MUSCLE_SCORE;
    }

    let muscle_delta = start_muscle_kg - current_muscle_kg;
    let ratio = 1.0 - muscle_delta / weight_delta.max(MIN_WEIGHT_DELTA_KG);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// True when the latest body-water reading is more than two points below the
/// mean of the four readings before it.
///
/// Needs at least five readings, otherwise false.
pub fn hydration_flag(readings: &[Reading]) -> bool {
    if readings.len() < HYDRATION_MIN_READINGS {
        return false;
    }

    let sorted = sorted_ascending(readings);
    let n = sorted.len();
    let latest = sorted[n - 1];
    let baseline = &sorted[n - 1 - HYDRATION_BASELINE_LEN..n - 1];
    let baseline_mean = mean(baseline.iter().map(|r| r.body_water_pct));

    latest.body_water_pct < baseline_mean - HYDRATION_DROP_PCT
}

/// Percent of starting fat mass lost between the first and latest reading.
///
/// A fat-mass increase reports 0. Returns 0 for an empty list or when the
/// first reading has no fat mass.
pub fn cumulative_fat_loss_pct(readings: &[Reading]) -> f64 {
    let sorted = sorted_ascending(readings);
    let (Some(first), Some(latest)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };

    let first_fat = fat_mass(first.weight_kg, first.body_fat_pct);
    if first_fat == 0.0 {
        return 0.0;
    }
    let latest_fat = fat_mass(latest.weight_kg, latest.body_fat_pct);

    ((first_fat - latest_fat) / first_fat * 100.0).max(0.0)
}

// ============================================
// Calendar bucketing
// ============================================

/// First day of the calendar week containing `date`.
pub fn week_start_for(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let offset = (date.weekday().num_days_from_sunday() + 7 - first_day.num_days_from_sunday()) % 7;
    date - Duration::days(offset as i64)
}

/// Group readings by the start of their calendar week.
///
/// Readings are placed on the calendar of `offset`, so a Saturday evening
/// reading stays in Saturday's week. Every reading lands in exactly one
/// bucket; buckets are contiguous, non-overlapping seven-day spans. Keys
/// iterate oldest first and each bucket is in time order.
pub fn derive_week_buckets(
    readings: &[Reading],
    first_day: Weekday,
    offset: FixedOffset,
) -> BTreeMap<NaiveDate, Vec<&Reading>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&Reading>> = BTreeMap::new();
    for reading in sorted_ascending(readings) {
        buckets
            .entry(week_start_for(reading.local_date(offset), first_day))
            .or_default()
            .push(reading);
    }
    buckets
}

/// Mean weight per calendar week, oldest week first.
pub fn weekly_weight_series(
    readings: &[Reading],
    first_day: Weekday,
    offset: FixedOffset,
) -> Vec<WeeklyWeight> {
    derive_week_buckets(readings, first_day, offset)
        .into_iter()
        .map(|(week_start, bucket)| WeeklyWeight {
            week_start,
            label: week_start.format("%Y-%m-%d").to_string(),
            mean_weight_kg: mean(bucket.iter().map(|r| r.weight_kg)),
        })
        .collect()
}

/// Number of readings on the last `window_days` calendar days, today
/// included. Dates are taken on the calendar of `offset`; time of day is
/// ignored.
pub fn logs_in_window(
    readings: &[Reading],
    today: NaiveDate,
    window_days: u32,
    offset: FixedOffset,
) -> usize {
    if window_days == 0 {
        return 0;
    }
    let first = today - Duration::days(window_days as i64 - 1);
    readings
        .iter()
        .filter(|r| {
            let date = r.local_date(offset);
            date >= first && date <= today
        })
        .count()
}

/// Arithmetic mean; 0 for an empty iterator.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
