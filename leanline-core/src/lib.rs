//! # leanline-core
//!
//! Core library for leanline - a body-composition tracker.
//!
//! This library provides:
//! - Domain types for user profiles and readings
//! - Analytics: weekly change, goal progress, predicted curve, muscle
//!   preservation, hydration and weekly composition
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Storage and analytics never meet. The caller loads a profile and its
//! readings from [`Database`] and passes them to
//! [`analytics::compute_analytics`], which is pure and total: empty or
//! sparse data yields neutral values, never an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use leanline_core::analytics::{compute_analytics, AnalyticsOptions};
//! use leanline_core::{Config, Database};
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let user = db.get_user("me").expect("query failed");
//! let readings = db.list_readings("me").expect("query failed");
//! let options = AnalyticsOptions::for_today(Default::default());
//! let analytics = compute_analytics(user.as_ref(), &readings, &options);
//! println!("{}", analytics.weekly_change_label);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{compute_analytics, Analytics, AnalyticsMemo, AnalyticsOptions};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod demo;
pub mod error;
pub mod logging;
pub mod types;
