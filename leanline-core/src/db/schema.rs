//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: users and readings
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        sex              TEXT NOT NULL,
        height_cm        REAL NOT NULL,
        unit_system      TEXT NOT NULL DEFAULT 'metric',
        start_weight_kg  REAL NOT NULL,
        target_weight_kg REAL NOT NULL,
        created_at       DATETIME NOT NULL
    );

    -- All weights in kg; percentages are stored as entered (not clamped)
    CREATE TABLE IF NOT EXISTS readings (
        id                   TEXT PRIMARY KEY,
        user_id              TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        recorded_at          DATETIME NOT NULL,
        weight_kg            REAL NOT NULL,
        body_fat_pct         REAL NOT NULL DEFAULT 0,
        subcutaneous_fat_pct REAL NOT NULL DEFAULT 0,
        visceral_fat         REAL NOT NULL DEFAULT 0,
        body_water_pct       REAL NOT NULL DEFAULT 0,
        skeletal_muscle_pct  REAL NOT NULL DEFAULT 0,
        muscle_mass_kg       REAL NOT NULL DEFAULT 0,
        bone_mass_kg         REAL NOT NULL DEFAULT 0,
        protein_pct          REAL NOT NULL DEFAULT 0,
        bmr_kcal             REAL NOT NULL DEFAULT 0,
        metabolic_age        REAL NOT NULL DEFAULT 0,
        notes                TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_readings_user_time ON readings(user_id, recorded_at);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
