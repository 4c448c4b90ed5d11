//! Unit conversions and unit-aware formatting.
//!
//! Everything is stored and computed in kilograms and centimeters. The
//! functions here are the only place pounds appear.

use crate::types::UnitSystem;

/// Kilograms per avoirdupois pound (exact by definition).
pub const KG_PER_LB: f64 = 0.45359237;

/// Convert pounds to kilograms.
pub fn lb_to_kg(lb: f64) -> f64 {
    lb * KG_PER_LB
}

/// Convert kilograms to pounds.
pub fn kg_to_lb(kg: f64) -> f64 {
    kg / KG_PER_LB
}

pub fn cm_to_m(cm: f64) -> f64 {
    cm / 100.0
}

pub fn m_to_cm(m: f64) -> f64 {
    m * 100.0
}

/// Express a stored kilogram value in the display unit.
pub fn kg_to_display(kg: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => kg,
        UnitSystem::Imperial => kg_to_lb(kg),
    }
}

/// Convert a value entered in the display unit back to kilograms.
pub fn display_to_kg(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => lb_to_kg(value),
    }
}

/// Format a weight for display (e.g., "182.0 lb").
pub fn format_weight(kg: f64, units: UnitSystem) -> String {
    format!("{:.1} {}", kg_to_display(kg, units), units.weight_suffix())
}

/// Format a signed weight change for display (e.g., "-1.8 lb", "+0.4 kg").
pub fn format_weight_delta(kg: f64, units: UnitSystem) -> String {
    let value = kg_to_display(kg, units);
    if value >= 0.0 {
        format!("+{:.1} {}", value, units.weight_suffix())
    } else {
        format!("{:.1} {}", value, units.weight_suffix())
    }
}
