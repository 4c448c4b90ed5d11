//! Database repository layer
//!
//! Query, insert, update and delete operations for users and readings.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Statement};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

const READING_COLUMNS: &str = "id, user_id, recorded_at, weight_kg, body_fat_pct, \
    subcutaneous_fat_pct, visceral_fat, body_water_pct, skeletal_muscle_pct, \
    muscle_mass_kg, bone_mass_kg, protein_pct, bmr_kcal, metabolic_age, notes";

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        super::schema::run_migrations(&conn)
    }

    /// The connection guard. A panic while holding the lock cannot leave a
    /// half-applied statement behind, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================
    // User operations
    // ============================================

    /// Insert or update a user profile. `created_at` is kept on update.
    pub fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO users (id, name, sex, height_cm, unit_system,
                               start_weight_kg, target_weight_kg, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                sex = excluded.sex,
                height_cm = excluded.height_cm,
                unit_system = excluded.unit_system,
                start_weight_kg = excluded.start_weight_kg,
                target_weight_kg = excluded.target_weight_kg
            "#,
            params![
                user.id,
                user.name,
                user.sex.as_str(),
                user.height_cm,
                user.unit_system.as_str(),
                user.start_weight_kg,
                user.target_weight_kg,
                format_timestamp(&user.created_at),
            ],
        )?;
        tracing::debug!(user_id = %user.id, "Upserted user");
        Ok(())
    }

    /// Get a user by ID
    pub fn get_user(&self, id: &str) -> Result<Option<UserProfile>> {
        let conn = self.lock();
        Self::query_user(&conn, id)
    }

    /// List all users, oldest first
    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at, id")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Apply a partial goal/profile edit and return the updated profile
    pub fn update_goal(&self, id: &str, update: &GoalUpdate) -> Result<UserProfile> {
        let conn = self.lock();
        let mut user =
            Self::query_user(&conn, id)?.ok_or_else(|| Error::UserNotFound(id.to_string()))?;

        if update.is_empty() {
            return Ok(user);
        }
        update.apply(&mut user);

        conn.execute(
            r#"
            UPDATE users SET name = ?2, height_cm = ?3, unit_system = ?4,
                             start_weight_kg = ?5, target_weight_kg = ?6
            WHERE id = ?1
            "#,
            params![
                user.id,
                user.name,
                user.height_cm,
                user.unit_system.as_str(),
                user.start_weight_kg,
                user.target_weight_kg,
            ],
        )?;
        tracing::debug!(user_id = %id, "Updated goal");
        Ok(user)
    }

    fn query_user(conn: &Connection, id: &str) -> Result<Option<UserProfile>> {
        conn.query_row("SELECT * FROM users WHERE id = ?", [id], Self::row_to_user)
            .optional()
            .map_err(Error::from)
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<UserProfile> {
        Ok(UserProfile {
            id: row.get("id")?,
            name: row.get("name")?,
            sex: parse_column(row, "sex")?,
            height_cm: row.get("height_cm")?,
            unit_system: parse_column(row, "unit_system")?,
            start_weight_kg: row.get("start_weight_kg")?,
            target_weight_kg: row.get("target_weight_kg")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }

    // ============================================
    // Reading operations
    // ============================================

    /// Insert a reading. The owning user must exist.
    pub fn insert_reading(&self, reading: &Reading) -> Result<()> {
        let conn = self.lock();
        if Self::query_user(&conn, &reading.user_id)?.is_none() {
            return Err(Error::UserNotFound(reading.user_id.clone()));
        }

        conn.execute(
            &format!(
                "INSERT INTO readings ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                READING_COLUMNS
            ),
            params![
                reading.id,
                reading.user_id,
                format_timestamp(&reading.recorded_at),
                reading.weight_kg,
                reading.body_fat_pct,
                reading.subcutaneous_fat_pct,
                reading.visceral_fat,
                reading.body_water_pct,
                reading.skeletal_muscle_pct,
                reading.muscle_mass_kg,
                reading.bone_mass_kg,
                reading.protein_pct,
                reading.bmr_kcal,
                reading.metabolic_age,
                reading.notes,
            ],
        )?;
        tracing::debug!(reading_id = %reading.id, user_id = %reading.user_id, "Inserted reading");
        Ok(())
    }

    /// Get a reading by ID
    pub fn get_reading(&self, id: &str) -> Result<Option<Reading>> {
        let conn = self.lock();
        Self::query_reading(&conn, id)
    }

    /// All readings for a user in insertion order.
    ///
    /// No time ordering is promised; analytics sort for themselves.
    pub fn list_readings(&self, user_id: &str) -> Result<Vec<Reading>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM readings WHERE user_id = ? ORDER BY rowid",
            READING_COLUMNS
        ))?;
        let readings = stmt
            .query_map([user_id], Self::row_to_reading)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(readings)
    }

    /// Apply a partial update and return the updated reading
    pub fn update_reading(&self, id: &str, update: &ReadingUpdate) -> Result<Reading> {
        let conn = self.lock();
        let mut reading =
            Self::query_reading(&conn, id)?.ok_or_else(|| Error::ReadingNotFound(id.to_string()))?;

        if update.is_empty() {
            return Ok(reading);
        }
        update.apply(&mut reading);

        conn.execute(
            r#"
            UPDATE readings SET
                recorded_at = ?2, weight_kg = ?3, body_fat_pct = ?4,
                subcutaneous_fat_pct = ?5, visceral_fat = ?6, body_water_pct = ?7,
                skeletal_muscle_pct = ?8, muscle_mass_kg = ?9, bone_mass_kg = ?10,
                protein_pct = ?11, bmr_kcal = ?12, metabolic_age = ?13, notes = ?14
            WHERE id = ?1
            "#,
            params![
                reading.id,
                format_timestamp(&reading.recorded_at),
                reading.weight_kg,
                reading.body_fat_pct,
                reading.subcutaneous_fat_pct,
                reading.visceral_fat,
                reading.body_water_pct,
                reading.skeletal_muscle_pct,
                reading.muscle_mass_kg,
                reading.bone_mass_kg,
                reading.protein_pct,
                reading.bmr_kcal,
                reading.metabolic_age,
                reading.notes,
            ],
        )?;
        tracing::debug!(reading_id = %id, "Updated reading");
        Ok(reading)
    }

    /// Delete a reading by ID
    pub fn delete_reading(&self, id: &str) -> Result<()> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM readings WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(Error::ReadingNotFound(id.to_string()));
        }
        tracing::debug!(reading_id = %id, "Deleted reading");
        Ok(())
    }

    /// Delete every reading for a user, returning how many were removed
    pub fn clear_readings(&self, user_id: &str) -> Result<usize> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM readings WHERE user_id = ?", [user_id])?;
        tracing::info!(user_id = %user_id, deleted, "Cleared readings");
        Ok(deleted)
    }

    /// Number of readings for a user
    pub fn count_readings(&self, user_id: &str) -> Result<i64> {
        let conn = self.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM readings WHERE user_id = ?",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn query_reading(conn: &Connection, id: &str) -> Result<Option<Reading>> {
        conn.query_row(
            &format!("SELECT {} FROM readings WHERE id = ?", READING_COLUMNS),
            [id],
            Self::row_to_reading,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_reading(row: &Row) -> rusqlite::Result<Reading> {
        Ok(Reading {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            recorded_at: timestamp_column(row, "recorded_at")?,
            weight_kg: row.get("weight_kg")?,
            body_fat_pct: row.get("body_fat_pct")?,
            subcutaneous_fat_pct: row.get("subcutaneous_fat_pct")?,
            visceral_fat: row.get("visceral_fat")?,
            body_water_pct: row.get("body_water_pct")?,
            skeletal_muscle_pct: row.get("skeletal_muscle_pct")?,
            muscle_mass_kg: row.get("muscle_mass_kg")?,
            bone_mass_kg: row.get("bone_mass_kg")?,
            protein_pct: row.get("protein_pct")?,
            bmr_kcal: row.get("bmr_kcal")?,
            metabolic_age: row.get("metabolic_age")?,
            notes: row.get("notes")?,
        })
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, column, e.to_string()))
}

fn parse_column<T: FromStr<Err = String>>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let value: String = row.get(column)?;
    value
        .parse()
        .map_err(|e: String| conversion_error(row, column, e))
}

fn conversion_error(row: &Row, column: &str, message: String) -> rusqlite::Error {
    let stmt: &Statement<'_> = row.as_ref();
    let index = stmt.column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}
