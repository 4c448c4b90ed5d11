//! Demo profile and readings.
//!
//! A 182 lb → 150 lb goal with twelve weekly weigh-ins: about 2 lb/week at
//! first, tapering off, with body fat slowly falling and muscle holding.
//! Used by `leanline seed` and in tests.

use chrono::{DateTime, Duration, Utc};

use crate::analytics::units::{kg_to_lb, lb_to_kg};
use crate::types::{Reading, Sex, UnitSystem, UserProfile};

/// Default user id for the demo profile.
pub const DEMO_USER_ID: &str = "me";

/// Number of weekly readings in the demo series.
pub const DEMO_WEEKS: usize = 12;

const START_WEIGHT_LB: f64 = 182.0;
const TARGET_WEIGHT_LB: f64 = 150.0;

/// Pounds lost going into each of weeks 2..=12.
const WEEKLY_LOSS_LB: [f64; DEMO_WEEKS - 1] =
    [2.0, 2.2, 1.9, 1.8, 1.8, 1.6, 1.5, 1.4, 1.3, 1.2, 1.1];

/// Body-water wobble around 52%, never a two-point dip.
const WATER_OFFSETS: [f64; DEMO_WEEKS] =
    [0.0, 0.4, -0.3, 0.2, 0.5, -0.4, 0.1, 0.3, -0.2, 0.4, 0.0, -0.5];

/// The demo profile.
pub fn demo_user(now: DateTime<Utc>) -> UserProfile {
    UserProfile {
        id: DEMO_USER_ID.to_string(),
        name: "Alex".to_string(),
        sex: Sex::Male,
        height_cm: 178.0,
        unit_system: UnitSystem::Imperial,
        start_weight_kg: lb_to_kg(START_WEIGHT_LB),
        target_weight_kg: lb_to_kg(TARGET_WEIGHT_LB),
        created_at: now,
    }
}

/// Twelve weekly readings for `user`, the first at `start`.
pub fn demo_readings(user: &UserProfile, start: DateTime<Utc>) -> Vec<Reading> {
    let mut weight_lb = kg_to_lb(user.start_weight_kg);

    (0..DEMO_WEEKS)
        .map(|week| {
            if week > 0 {
                weight_lb -= WEEKLY_LOSS_LB[week - 1];
            }
            let w = week as f64;
            let recorded_at = start + Duration::weeks(week as i64);

            let mut reading = Reading::new(&user.id, recorded_at, lb_to_kg(weight_lb));
            reading.body_fat_pct = 31.0 - 0.45 * w;
            reading.subcutaneous_fat_pct = 24.0 - 0.35 * w;
            reading.visceral_fat = 11.0 - 0.2 * w;
            reading.body_water_pct = 52.0 + WATER_OFFSETS[week];
            reading.skeletal_muscle_pct = 36.0 + 0.3 * w;
            reading.muscle_mass_kg = 34.2 - 0.03 * w;
            reading.bone_mass_kg = 3.3;
            reading.protein_pct = 16.5 + 0.1 * w;
            reading.bmr_kcal = 1780.0 - 6.0 * w;
            reading.metabolic_age = (44.0 - 0.5 * w).round();
            if week == 0 {
                reading.notes = Some("Starting point".to_string());
            }
            reading
        })
        .collect()
}
