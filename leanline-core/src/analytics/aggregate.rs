//! Analytics aggregator.
//!
//! [`compute_analytics`] is the single entry point the presentation layer
//! calls: it takes a profile and an unordered list of readings and returns a
//! fresh [`Analytics`] value. It never fails; missing data resolves to
//! neutral values.
//!
//! Callers that render repeatedly can hold an [`AnalyticsMemo`], which
//! recomputes only when the (user, readings, options) fingerprint changes.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Weekday};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::metrics::{
    bmi, cumulative_fat_loss_pct, hydration_flag, logs_in_window, mean,
    muscle_preservation_score, predicted_curve, progress_to_goal, sorted_ascending,
    weekly_change, weekly_weight_series, PredictedPoint, WeeklyWeight, DEFAULT_WEEK_START,
    NEUTRAL_MUSCLE_SCORE,
};
use super::units::kg_to_display;
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::types::{Reading, UnitSystem, UserProfile};

/// Changes smaller than this (in the display unit) read as "holding steady".
const STEADY_THRESHOLD: f64 = 0.1;

/// Label used when the weekly change is below [`STEADY_THRESHOLD`].
pub const STEADY_LABEL: &str = "Holding steady";

/// Default trailing window for the log count, in days.
pub const DEFAULT_LOG_WINDOW_DAYS: u32 = 7;

/// Inputs to the aggregator besides the data itself.
///
/// "Today" is passed in rather than read from the clock so that the same
/// inputs always give the same output. `today` and `utc_offset` should come
/// from the same clock reading.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsOptions {
    /// Date the trailing log window ends on, in `utc_offset`'s calendar
    pub today: NaiveDate,
    /// Offset whose calendar days are used for week buckets and the log window
    pub utc_offset: FixedOffset,
    /// First day of the calendar week for bucketing
    pub week_start: Weekday,
    /// Length of the trailing log window in days
    pub log_window_days: u32,
    /// Unit system for the weekly change label
    pub unit_system: UnitSystem,
}

impl AnalyticsOptions {
    /// Defaults anchored at the local clock: today's local date and the
    /// local UTC offset.
    pub fn for_today(unit_system: UnitSystem) -> Self {
        let now = Local::now();
        Self {
            today: now.date_naive(),
            utc_offset: now.offset().fix(),
            week_start: DEFAULT_WEEK_START,
            log_window_days: DEFAULT_LOG_WINDOW_DAYS,
            unit_system,
        }
    }

    /// Options from the `[analytics]` config section, anchored at `now`.
    pub fn from_config(
        config: &AnalyticsConfig,
        unit_system: UnitSystem,
        now: DateTime<FixedOffset>,
    ) -> Result<Self> {
        Ok(Self {
            today: now.date_naive(),
            utc_offset: now.offset().fix(),
            week_start: config.week_start_day()?,
            log_window_days: config.log_window_days,
            unit_system,
        })
    }
}

/// How much history the analytics were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsStatus {
    /// No profile or no readings; every value is the neutral default
    #[default]
    NoData,
    /// A single reading; time-relative values are neutral
    InsufficientHistory,
    /// Two or more readings
    Ready,
}

/// Average body-fat and lean percentages for one calendar week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyComposition {
    pub week_start: NaiveDate,
    pub label: String,
    /// Mean body fat, clamped to [0, 100]
    pub fat_pct: f64,
    /// 100 minus fat, clamped to [0, 100]
    pub lean_pct: f64,
}

/// Derived analytics for one (user, readings) pair.
///
/// A transient projection: recomputed on every call, never stored.
/// Weights are in kilograms, progress is a 0-1 fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub status: AnalyticsStatus,
    /// Signed kg change vs the reading a week back (negative = loss)
    pub weekly_change_kg: f64,
    /// Progress toward goal, 0-1
    pub progress: f64,
    pub predicted_curve: Vec<PredictedPoint>,
    pub weekly_weights: Vec<WeeklyWeight>,
    /// Muscle preservation, 0-100
    pub muscle_score: u8,
    pub hydration_low: bool,
    pub composition_by_week: Vec<WeeklyComposition>,
    /// Percent of starting fat mass lost
    pub fat_loss_pct: f64,
    /// Readings logged in the trailing window
    pub logs_this_week: usize,
    /// Ready-to-display weekly change in the requested unit system
    pub weekly_change_label: String,
    /// Weight of the latest reading
    pub current_weight_kg: Option<f64>,
    /// Kilograms left to reach the target (0 once reached)
    pub remaining_kg: f64,
    /// BMI at the latest reading
    pub latest_bmi: f64,
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            status: AnalyticsStatus::NoData,
            weekly_change_kg: 0.0,
            progress: 0.0,
            predicted_curve: Vec::new(),
            weekly_weights: Vec::new(),
            muscle_score: NEUTRAL_MUSCLE_SCORE,
            hydration_low: false,
            composition_by_week: Vec::new(),
            fat_loss_pct: 0.0,
            logs_this_week: 0,
            weekly_change_label: STEADY_LABEL.to_string(),
            current_weight_kg: None,
            remaining_kg: 0.0,
            latest_bmi: 0.0,
        }
    }
}

impl Analytics {
    /// Progress as a whole percentage (e.g., 42).
    pub fn progress_percent(&self) -> u8 {
        (self.progress * 100.0).round() as u8
    }
}

/// Compute the full analytics object.
///
/// Readings may be in any order and may be empty.
pub fn compute_analytics(
    user: Option<&UserProfile>,
    readings: &[Reading],
    options: &AnalyticsOptions,
) -> Analytics {
    let Some(user) = user else {
        tracing::debug!("No user profile, returning default analytics");
        return Analytics::default();
    };

    let sorted = sorted_ascending(readings);
    let (Some(&first), Some(&latest)) = (sorted.first(), sorted.last()) else {
        tracing::debug!(user_id = %user.id, "No readings, returning default analytics");
        return Analytics::default();
    };

    let status = if readings.len() == 1 {
        AnalyticsStatus::InsufficientHistory
    } else {
        AnalyticsStatus::Ready
    };

    let weekly_change_kg = weekly_change(readings);
    let weekly_weights = weekly_weight_series(readings, options.week_start, options.utc_offset);
    let composition_by_week = weekly_composition(readings, &weekly_weights, options.utc_offset);

    tracing::debug!(
        user_id = %user.id,
        readings = readings.len(),
        weeks = weekly_weights.len(),
        ?status,
        "Computed analytics"
    );

    Analytics {
        status,
        weekly_change_kg,
        progress: progress_to_goal(user, latest.weight_kg),
        predicted_curve: predicted_curve(user),
        weekly_weights,
        muscle_score: muscle_preservation_score(
            user.start_weight_kg,
            latest.weight_kg,
            first.muscle_mass_kg,
            latest.muscle_mass_kg,
        ),
        hydration_low: hydration_flag(readings),
        composition_by_week,
        fat_loss_pct: cumulative_fat_loss_pct(readings),
        logs_this_week: logs_in_window(
            readings,
            options.today,
            options.log_window_days,
            options.utc_offset,
        ),
        weekly_change_label: weekly_change_label(weekly_change_kg, options.unit_system),
        current_weight_kg: Some(latest.weight_kg),
        remaining_kg: (latest.weight_kg - user.target_weight_kg).max(0.0),
        latest_bmi: bmi(latest.weight_kg, user.height_cm),
    }
}

/// Average fat/lean split for each week already in the weekly series.
fn weekly_composition(
    readings: &[Reading],
    weeks: &[WeeklyWeight],
    offset: FixedOffset,
) -> Vec<WeeklyComposition> {
    weeks
        .iter()
        .map(|week| {
            let end = week.week_start + Duration::days(7);
            let fat_pct = mean(
                readings
                    .iter()
                    .filter(|r| {
                        let date = r.local_date(offset);
                        date >= week.week_start && date < end
                    })
                    .map(|r| r.body_fat_pct),
            )
            .clamp(0.0, 100.0);

            WeeklyComposition {
                week_start: week.week_start,
                label: week.label.clone(),
                fat_pct,
                lean_pct: (100.0 - fat_pct).clamp(0.0, 100.0),
            }
        })
        .collect()
}

/// Human-readable weekly change, e.g. "Down 1.8 lb vs last week".
pub fn weekly_change_label(change_kg: f64, units: UnitSystem) -> String {
    let value = kg_to_display(change_kg, units);
    if value.abs() < STEADY_THRESHOLD {
        return STEADY_LABEL.to_string();
    }

    let direction = if value < 0.0 { "Down" } else { "Up" };
    format!(
        "{} {:.1} {} vs last week",
        direction,
        value.abs(),
        units.weight_suffix()
    )
}

// ============================================
// Memoization
// ============================================

/// Caller-owned memo for [`compute_analytics`].
///
/// Keyed by a SHA-256 fingerprint of every input the computation reads.
/// Recomputation is always safe; the memo only skips redundant work within
/// one render or query.
#[derive(Debug, Default)]
pub struct AnalyticsMemo {
    cached: Option<(String, Analytics)>,
}

impl AnalyticsMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached analytics if the inputs are unchanged, else recompute.
    pub fn get_or_compute(
        &mut self,
        user: Option<&UserProfile>,
        readings: &[Reading],
        options: &AnalyticsOptions,
    ) -> &Analytics {
        let key = fingerprint(user, readings, options);
        let fresh = matches!(&self.cached, Some((cached_key, _)) if *cached_key == key);

        if fresh {
            tracing::trace!(fingerprint = %key, "Using memoized analytics");
        } else {
            self.cached = None;
        }

        let (_, analytics) = self
            .cached
            .get_or_insert_with(|| (key, compute_analytics(user, readings, options)));
        analytics
    }

    /// Fingerprint of the cached inputs, if any.
    pub fn cached_fingerprint(&self) -> Option<&str> {
        self.cached.as_ref().map(|(key, _)| key.as_str())
    }

    /// Drop the cached value.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

/// Hex SHA-256 over every field the aggregator reads.
pub fn fingerprint(
    user: Option<&UserProfile>,
    readings: &[Reading],
    options: &AnalyticsOptions,
) -> String {
    let mut hasher = Sha256::new();

    match user {
        Some(user) => {
            hasher.update(b"user");
            hasher.update(user.id.as_bytes());
            hasher.update(user.height_cm.to_le_bytes());
            hasher.update(user.start_weight_kg.to_le_bytes());
            hasher.update(user.target_weight_kg.to_le_bytes());
        }
        None => hasher.update(b"no-user"),
    }

    hasher.update(options.today.to_string().as_bytes());
    hasher.update(options.utc_offset.local_minus_utc().to_le_bytes());
    hasher.update([options.week_start.num_days_from_sunday() as u8]);
    hasher.update(options.log_window_days.to_le_bytes());
    hasher.update(options.unit_system.as_str().as_bytes());

    for reading in readings {
        hasher.update(reading.id.as_bytes());
        hasher.update(reading.recorded_at.timestamp_millis().to_le_bytes());
        for value in [
            reading.weight_kg,
            reading.body_fat_pct,
            reading.body_water_pct,
            reading.muscle_mass_kg,
        ] {
            hasher.update(value.to_le_bytes());
        }
    }

    hex::encode(hasher.finalize())
}
