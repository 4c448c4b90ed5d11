//! Core domain types for leanline
//!
//! These types are the records the storage layer hands to the analytics
//! layer: a [`UserProfile`] with the goal configuration, and a list of
//! [`Reading`]s (one body-composition measurement each).
//!
//! ## Units
//!
//! | Quantity | Stored as |
//! |----------|-----------|
//! | Weight, muscle mass, bone mass | kilograms |
//! | Height | centimeters |
//! | Fat, water, muscle, protein | percent (0-100, not clamped on input) |
//! | Timestamps | UTC, ISO 8601 |
//!
//! [`UnitSystem`] is a display preference only. Nothing stored is ever
//! converted to pounds; conversion happens when formatting.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================
// Enumerations
// ============================================

/// Biological sex as recorded in the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl Sex {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
            Sex::Other => "other",
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "female" => Ok(Sex::Female),
            "m" | "male" => Ok(Sex::Male),
            "o" | "other" => Ok(Sex::Other),
            _ => Err(format!("unknown sex: {}", s)),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferred unit system for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Returns the identifier used in database storage and config
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// Short suffix for weights in this unit system
    pub fn weight_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kg",
            UnitSystem::Imperial => "lb",
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "kg" => Ok(UnitSystem::Metric),
            "imperial" | "lb" | "lbs" => Ok(UnitSystem::Imperial),
            _ => Err(format!("unknown unit system: {}", s)),
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// User profile
// ============================================

/// A user and their goal configuration.
///
/// Created once at onboarding, edited through [`GoalUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    pub sex: Sex,
    pub height_cm: f64,
    /// Display preference; never changes stored units
    pub unit_system: UnitSystem,
    /// Weight when tracking started (kg)
    pub start_weight_kg: f64,
    /// Goal weight (kg)
    pub target_weight_kg: f64,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

/// Partial edit of a profile's goal fields.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub height_cm: Option<f64>,
    pub unit_system: Option<UnitSystem>,
    pub start_weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
}

impl GoalUpdate {
    /// Returns true if no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.height_cm.is_none()
            && self.unit_system.is_none()
            && self.start_weight_kg.is_none()
            && self.target_weight_kg.is_none()
    }

    /// Overwrite the fields that are set.
    pub fn apply(&self, user: &mut UserProfile) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(height) = self.height_cm {
            user.height_cm = height;
        }
        if let Some(units) = self.unit_system {
            user.unit_system = units;
        }
        if let Some(start) = self.start_weight_kg {
            user.start_weight_kg = start;
        }
        if let Some(target) = self.target_weight_kg {
            user.target_weight_kg = target;
        }
    }
}

// ============================================
// Readings
// ============================================

/// One body-composition measurement event.
///
/// Readings reference their owner by `user_id`. Lists of readings handed to
/// the analytics layer may arrive in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// When the measurement was taken
    pub recorded_at: DateTime<Utc>,
    pub weight_kg: f64,
    pub body_fat_pct: f64,
    pub subcutaneous_fat_pct: f64,
    /// Visceral fat index (unitless scale rating)
    pub visceral_fat: f64,
    pub body_water_pct: f64,
    pub skeletal_muscle_pct: f64,
    pub muscle_mass_kg: f64,
    pub bone_mass_kg: f64,
    pub protein_pct: f64,
    /// Basal metabolic rate (kcal/day)
    pub bmr_kcal: f64,
    /// Metabolic age in years
    pub metabolic_age: f64,
    pub notes: Option<String>,
}

impl Reading {
    /// Create a reading with only weight set; every composition field is zero.
    pub fn new(user_id: &str, recorded_at: DateTime<Utc>, weight_kg: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            recorded_at,
            weight_kg,
            body_fat_pct: 0.0,
            subcutaneous_fat_pct: 0.0,
            visceral_fat: 0.0,
            body_water_pct: 0.0,
            skeletal_muscle_pct: 0.0,
            muscle_mass_kg: 0.0,
            bone_mass_kg: 0.0,
            protein_pct: 0.0,
            bmr_kcal: 0.0,
            metabolic_age: 0.0,
            notes: None,
        }
    }

    /// Calendar date of the reading (UTC).
    pub fn date(&self) -> NaiveDate {
        self.recorded_at.date_naive()
    }

    /// Calendar date of the reading at a fixed UTC offset.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.recorded_at.with_timezone(&offset).date_naive()
    }

    /// Parse an ISO 8601 timestamp.
    ///
    /// Accepts RFC 3339 with an offset, or a bare `YYYY-MM-DDTHH:MM:SS[.fff]`
    /// or `YYYY-MM-DD`, both taken as UTC.
    pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        let value = value.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return Ok(ts.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(naive.and_utc());
        }

        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }

        Err(Error::invalid(
            "timestamp",
            format!("expected ISO 8601, got {:?}", value),
        ))
    }
}

/// Partial update of a stored reading.
///
/// `None` leaves a field untouched. For `notes`, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ReadingUpdate {
    pub recorded_at: Option<DateTime<Utc>>,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub subcutaneous_fat_pct: Option<f64>,
    pub visceral_fat: Option<f64>,
    pub body_water_pct: Option<f64>,
    pub skeletal_muscle_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub bone_mass_kg: Option<f64>,
    pub protein_pct: Option<f64>,
    pub bmr_kcal: Option<f64>,
    pub metabolic_age: Option<f64>,
    pub notes: Option<Option<String>>,
}

impl ReadingUpdate {
    /// Returns true if no field would change
    pub fn is_empty(&self) -> bool {
        self.recorded_at.is_none()
            && self.weight_kg.is_none()
            && self.body_fat_pct.is_none()
            && self.subcutaneous_fat_pct.is_none()
            && self.visceral_fat.is_none()
            && self.body_water_pct.is_none()
            && self.skeletal_muscle_pct.is_none()
            && self.muscle_mass_kg.is_none()
            && self.bone_mass_kg.is_none()
            && self.protein_pct.is_none()
            && self.bmr_kcal.is_none()
            && self.metabolic_age.is_none()
            && self.notes.is_none()
    }

    /// Overwrite the fields that are set.
    pub fn apply(&self, reading: &mut Reading) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut reading.recorded_at, &self.recorded_at);
        set(&mut reading.weight_kg, &self.weight_kg);
        set(&mut reading.body_fat_pct, &self.body_fat_pct);
        set(&mut reading.subcutaneous_fat_pct, &self.subcutaneous_fat_pct);
        set(&mut reading.visceral_fat, &self.visceral_fat);
        set(&mut reading.body_water_pct, &self.body_water_pct);
        set(&mut reading.skeletal_muscle_pct, &self.skeletal_muscle_pct);
        set(&mut reading.muscle_mass_kg, &self.muscle_mass_kg);
        set(&mut reading.bone_mass_kg, &self.bone_mass_kg);
        set(&mut reading.protein_pct, &self.protein_pct);
        set(&mut reading.bmr_kcal, &self.bmr_kcal);
        set(&mut reading.metabolic_age, &self.metabolic_age);
        set(&mut reading.notes, &self.notes);
    }
}
