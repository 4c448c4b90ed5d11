//! Integration tests for leanline storage and analytics
//!
//! Readings go through a real SQLite file and come back in insertion order;
//! the analytics must not care.

use chrono::{DateTime, Duration, NaiveDate, Offset, TimeZone, Utc, Weekday};
use leanline_core::analytics::{
    compute_analytics, lb_to_kg, AnalyticsMemo, AnalyticsOptions, AnalyticsStatus, STEADY_LABEL,
};
use leanline_core::db::Database;
use leanline_core::demo::{demo_readings, demo_user, DEMO_WEEKS};
use leanline_core::types::{Reading, ReadingUpdate, UnitSystem};
use tempfile::TempDir;

/// Sunday 2024-01-07 07:00 UTC
fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 7, 7, 0, 0).unwrap()
}

fn options_for(today: NaiveDate) -> AnalyticsOptions {
    AnalyticsOptions {
        today,
        utc_offset: Utc.fix(),
        week_start: Weekday::Sun,
        log_window_days: 7,
        unit_system: UnitSystem::Imperial,
    }
}

fn seeded_db(dir: &TempDir) -> Database {
    let db = Database::open(&dir.path().join("leanline.db")).expect("open db");
    db.migrate().expect("migrate");

    let user = demo_user(start());
    db.upsert_user(&user).unwrap();
    // Insert newest first so storage order is the reverse of time order
    for reading in demo_readings(&user, start()).iter().rev() {
        db.insert_reading(reading).unwrap();
    }
    db
}

// ============================================
// Demo scenario
// ============================================

#[test]
fn test_demo_scenario_through_database() {
    let dir = TempDir::new().unwrap();
    {
        seeded_db(&dir);
    }

    // Reopen to make sure everything was persisted
    let db = Database::open(&dir.path().join("leanline.db")).unwrap();
    db.migrate().unwrap();

    let user = db.get_user("me").unwrap().expect("demo user");
    let readings = db.list_readings("me").unwrap();
    assert_eq!(readings.len(), DEMO_WEEKS);
    assert!(readings[0].recorded_at > readings[1].recorded_at);

    let today = (start() + Duration::weeks(11)).date_naive();
    let analytics = compute_analytics(Some(&user), &readings, &options_for(today));

    assert_eq!(analytics.status, AnalyticsStatus::Ready);

    // Last weekly delta in the demo is 1.1 lb
    assert!(analytics.weekly_change_kg < 0.0);
    assert!((analytics.weekly_change_kg - lb_to_kg(-1.1)).abs() < 1e-6);
    assert_eq!(analytics.weekly_change_label, "Down 1.1 lb vs last week");

    assert_eq!(analytics.weekly_weights.len(), DEMO_WEEKS);
    assert_eq!(analytics.composition_by_week.len(), DEMO_WEEKS);
    assert_eq!(analytics.weekly_weights[0].label, "2024-01-07");
    assert_eq!(analytics.predicted_curve.len(), 16);
    assert_eq!(analytics.logs_this_week, 1);
    assert!(!analytics.hydration_low);
    assert!(analytics.fat_loss_pct > 0.0);
    assert!(analytics.muscle_score > 90);
    assert!(analytics.progress > 0.5 && analytics.progress < 1.0);
}

#[test]
fn test_progress_increases_week_over_week() {
    let user = demo_user(start());
    let readings = demo_readings(&user, start());

    let mut last_progress = -1.0;
    let mut last_weekly_change = None;
    for weeks in 1..=readings.len() {
        let subset = &readings[..weeks];
        let today = subset[weeks - 1].date();
        let analytics = compute_analytics(Some(&user), subset, &options_for(today));

        assert!(
            analytics.progress > last_progress || (weeks == 1 && analytics.progress == 0.0),
            "progress should increase at week {}",
            weeks
        );
        last_progress = analytics.progress;

        if weeks >= 2 {
            let logged = subset[weeks - 1].weight_kg - subset[weeks - 2].weight_kg;
            assert!(analytics.weekly_change_kg < 0.0);
            assert!((analytics.weekly_change_kg - logged).abs() < 1e-9);
            last_weekly_change = Some(analytics.weekly_change_kg);
        }
    }
    assert!(last_weekly_change.is_some());
}

// ============================================
// Edge scenarios
// ============================================

#[test]
fn test_single_reading_scenario() {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let user = demo_user(start());
    db.upsert_user(&user).unwrap();
    db.insert_reading(&Reading::new("me", start(), user.start_weight_kg))
        .unwrap();

    let readings = db.list_readings("me").unwrap();
    let analytics = compute_analytics(Some(&user), &readings, &options_for(start().date_naive()));

    assert_eq!(analytics.status, AnalyticsStatus::InsufficientHistory);
    assert_eq!(analytics.weekly_change_kg, 0.0);
    assert!(!analytics.hydration_low);
    assert_eq!(analytics.fat_loss_pct, 0.0);
    assert_eq!(analytics.progress, 0.0);
    assert_eq!(analytics.weekly_change_label, STEADY_LABEL);
}

#[test]
fn test_hydration_dip_scenario() {
    let user = demo_user(start());
    let make = |water: &[f64]| -> Vec<Reading> {
        water
            .iter()
            .enumerate()
            .map(|(day, &w)| {
                let mut r = Reading::new("me", start() + Duration::days(day as i64), 80.0);
                r.body_water_pct = w;
                r
            })
            .rev()
            .collect()
    };
    let today = (start() + Duration::days(4)).date_naive();

    let dipped = make(&[52.0, 52.0, 52.0, 52.0, 42.0]);
    assert!(compute_analytics(Some(&user), &dipped, &options_for(today)).hydration_low);

    let slight = make(&[52.0, 52.0, 52.0, 52.0, 51.0]);
    assert!(!compute_analytics(Some(&user), &slight, &options_for(today)).hydration_low);
}

#[test]
fn test_sparse_logging_compares_against_stale_reading() {
    // Known boundary: with a three-week gap the "weekly" change spans all of it
    let user = demo_user(start());
    let readings = vec![
        Reading::new("me", start(), 82.0),
        Reading::new("me", start() + Duration::weeks(3), 79.0),
    ];
    let today = (start() + Duration::weeks(3)).date_naive();
    let analytics = compute_analytics(Some(&user), &readings, &options_for(today));

    assert!((analytics.weekly_change_kg - (-3.0)).abs() < 1e-9);
    assert_eq!(analytics.weekly_weights.len(), 2);
}

// ============================================
// Mutation flow
// ============================================

#[test]
fn test_edits_and_deletes_flow_into_analytics() {
    let dir = TempDir::new().unwrap();
    let db = seeded_db(&dir);
    let user = db.get_user("me").unwrap().unwrap();
    let today = (start() + Duration::weeks(11)).date_naive();
    let options = options_for(today);

    let mut memo = AnalyticsMemo::new();
    let readings = db.list_readings("me").unwrap();
    let before = memo.get_or_compute(Some(&user), &readings, &options).clone();

    // Newest reading is first in storage order
    let newest = readings[0].clone();
    let update = ReadingUpdate {
        weight_kg: Some(newest.weight_kg + 1.0),
        ..Default::default()
    };
    db.update_reading(&newest.id, &update).unwrap();

    let readings = db.list_readings("me").unwrap();
    let after_edit = memo.get_or_compute(Some(&user), &readings, &options).clone();
    assert!(after_edit.weekly_change_kg > before.weekly_change_kg);
    assert!(after_edit.progress < before.progress);

    db.delete_reading(&newest.id).unwrap();
    let readings = db.list_readings("me").unwrap();
    assert_eq!(readings.len(), DEMO_WEEKS - 1);
    let after_delete = memo.get_or_compute(Some(&user), &readings, &options).clone();
    assert_eq!(after_delete.weekly_weights.len(), DEMO_WEEKS - 1);
    assert_eq!(after_delete.logs_this_week, 0);
}

#[test]
fn test_missing_user_gives_default_analytics() {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();

    let user = db.get_user("nobody").unwrap();
    let readings = db.list_readings("nobody").unwrap();
    let analytics = compute_analytics(user.as_ref(), &readings, &options_for(start().date_naive()));

    assert_eq!(analytics.status, AnalyticsStatus::NoData);
    assert_eq!(analytics.muscle_score, 50);
    assert!(analytics.predicted_curve.is_empty());
}
