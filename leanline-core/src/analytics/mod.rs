//! Analytics for leanline
//!
//! Turns a user profile and a list of readings into progress numbers:
//! - [`units`]: kg/lb and cm/m conversions, unit-aware formatting
//! - [`metrics`]: pure per-metric derivations (weekly change, goal progress,
//!   predicted curve, muscle score, hydration flag, week buckets)
//! - [`aggregate`]: composes the metrics into one [`Analytics`] value
//!
//! Nothing in this module touches storage or holds state between calls.
//! Values are computed in kilograms; only the weekly change label and the
//! `format_*` helpers know about the display unit.

pub mod aggregate;
pub mod metrics;
pub mod units;

pub use aggregate::{
    compute_analytics, weekly_change_label, Analytics, AnalyticsMemo, AnalyticsOptions,
    AnalyticsStatus, WeeklyComposition, STEADY_LABEL,
};
pub use metrics::{
    bmi, cumulative_fat_loss_pct, derive_week_buckets, fat_mass, hydration_flag, lean_mass,
    logs_in_window, muscle_preservation_score, predicted_curve, progress_to_goal,
    week_start_for, weekly_change, weekly_weight_series, PredictedPoint, WeeklyWeight,
    TAPER_SCHEDULE,
};
pub use units::{
    cm_to_m, display_to_kg, format_weight, format_weight_delta, kg_to_display, kg_to_lb,
    lb_to_kg, m_to_cm, KG_PER_LB,
};
