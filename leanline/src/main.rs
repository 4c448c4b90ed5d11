//! leanline - body-composition tracker CLI
//!
//! Log weight and body-composition readings, then see weekly change,
//! progress toward your goal and composition trends.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/leanline/leanline.db (~/.local/share/leanline/leanline.db)
//! - Config: $XDG_CONFIG_HOME/leanline/config.toml (~/.config/leanline/config.toml)
//! - Logs: $XDG_STATE_HOME/leanline/ (~/.local/state/leanline/)

mod report;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Local, Utc};
use clap::{Args, Parser, Subcommand};
use leanline_core::analytics::metrics::sorted_descending;
use leanline_core::analytics::{compute_analytics, display_to_kg, format_weight, AnalyticsOptions};
use leanline_core::demo::{demo_readings, demo_user, DEMO_WEEKS};
use leanline_core::{
    Config, Database, GoalUpdate, Reading, ReadingUpdate, Sex, UnitSystem, UserProfile,
};

use report::{MarkdownReport, Report, TextReport};

#[derive(Parser, Debug)]
#[command(name = "leanline")]
#[command(about = "Track body composition and progress toward a goal weight")]
#[command(version)]
struct Cli {
    /// Profile to act on
    #[arg(long, global = true, default_value = "me")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or edit the profile and goal
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Log a new reading
    Log {
        /// Weight in your display unit
        #[arg(long)]
        weight: f64,

        #[command(flatten)]
        fields: MeasurementArgs,
    },

    /// List readings, newest first
    List {
        /// Show at most this many readings
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Change fields of an existing reading
    Edit {
        /// Reading ID
        id: String,

        /// Weight in your display unit
        #[arg(long)]
        weight: Option<f64>,

        #[command(flatten)]
        fields: MeasurementArgs,

        /// Remove the reading's notes
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,
    },

    /// Delete a reading
    Delete {
        /// Reading ID
        id: String,
    },

    /// Show progress analytics
    Report {
        /// Output format: text, md or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Load a demo profile with twelve weeks of readings
    Seed {
        /// Replace existing readings for this user
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// Create the profile, or update the given fields of an existing one
    Set {
        #[arg(long)]
        name: Option<String>,

        /// female, male or other
        #[arg(long)]
        sex: Option<Sex>,

        #[arg(long)]
        height_cm: Option<f64>,

        /// Starting weight in the chosen unit
        #[arg(long)]
        start_weight: Option<f64>,

        /// Goal weight in the chosen unit
        #[arg(long)]
        target_weight: Option<f64>,

        /// metric or imperial
        #[arg(long)]
        units: Option<UnitSystem>,
    },

    /// Print the profile
    Show,
}

/// Optional body-composition fields shared by `log` and `edit`.
#[derive(Args, Debug, Default)]
struct MeasurementArgs {
    /// Body fat %
    #[arg(long)]
    body_fat: Option<f64>,

    /// Subcutaneous fat %
    #[arg(long)]
    subcutaneous_fat: Option<f64>,

    /// Visceral fat index
    #[arg(long)]
    visceral_fat: Option<f64>,

    /// Body water %
    #[arg(long)]
    body_water: Option<f64>,

    /// Skeletal muscle %
    #[arg(long)]
    skeletal_muscle: Option<f64>,

    /// Muscle mass in your display unit
    #[arg(long)]
    muscle_mass: Option<f64>,

    /// Bone mass in your display unit
    #[arg(long)]
    bone_mass: Option<f64>,

    /// Protein %
    #[arg(long)]
    protein: Option<f64>,

    /// Basal metabolic rate (kcal)
    #[arg(long)]
    bmr: Option<f64>,

    /// Metabolic age (years)
    #[arg(long)]
    metabolic_age: Option<f64>,

    #[arg(long)]
    notes: Option<String>,

    /// When the reading was taken (ISO 8601; default: now)
    #[arg(long)]
    at: Option<String>,
}

impl MeasurementArgs {
    /// Convert to a partial update, taking mass fields from `units` to kg.
    fn to_update(&self, weight: Option<f64>, units: UnitSystem) -> Result<ReadingUpdate> {
        let recorded_at = self
            .at
            .as_deref()
            .map(Reading::parse_timestamp)
            .transpose()
            .context("invalid --at timestamp")?;

        Ok(ReadingUpdate {
            recorded_at,
            weight_kg: weight.map(|w| display_to_kg(w, units)),
            body_fat_pct: self.body_fat,
            subcutaneous_fat_pct: self.subcutaneous_fat,
            visceral_fat: self.visceral_fat,
            body_water_pct: self.body_water,
            skeletal_muscle_pct: self.skeletal_muscle,
            muscle_mass_kg: self.muscle_mass.map(|m| display_to_kg(m, units)),
            bone_mass_kg: self.bone_mass.map(|m| display_to_kg(m, units)),
            protein_pct: self.protein,
            bmr_kcal: self.bmr,
            metabolic_age: self.metabolic_age,
            notes: self.notes.clone().map(Some),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = leanline_core::logging::init(&config.logging).ok();

    let db = Database::open(&Config::database_path()).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    tracing::debug!(command = ?cli.command, user = %cli.user, "Running command");

    match cli.command {
        Command::Profile { action } => match action {
            ProfileAction::Set {
                name,
                sex,
                height_cm,
                start_weight,
                target_weight,
                units,
            } => cmd_profile_set(
                &db,
                &config,
                &cli.user,
                ProfileInput {
                    name,
                    sex,
                    height_cm,
                    start_weight,
                    target_weight,
                    units,
                },
            ),
            ProfileAction::Show => cmd_profile_show(&db, &cli.user),
        },
        Command::Log { weight, fields } => cmd_log(&db, &cli.user, weight, &fields),
        Command::List { limit } => cmd_list(&db, &cli.user, limit),
        Command::Edit {
            id,
            weight,
            fields,
            clear_notes,
        } => cmd_edit(&db, &id, weight, &fields, clear_notes),
        Command::Delete { id } => cmd_delete(&db, &id),
        Command::Report { format } => cmd_report(&db, &config, &cli.user, &format),
        Command::Seed { force } => cmd_seed(&db, &cli.user, force),
    }
}

// ============================================
// Profile
// ============================================

struct ProfileInput {
    name: Option<String>,
    sex: Option<Sex>,
    height_cm: Option<f64>,
    start_weight: Option<f64>,
    target_weight: Option<f64>,
    units: Option<UnitSystem>,
}

fn cmd_profile_set(db: &Database, config: &Config, user_id: &str, input: ProfileInput) -> Result<()> {
    let existing = db.get_user(user_id)?;

    let units = input
        .units
        .or(existing.as_ref().map(|u| u.unit_system))
        .unwrap_or(config.display.unit_system);
    let to_kg = |w: f64| display_to_kg(w, units);

    let user = match existing {
        Some(_) => {
            let goal = GoalUpdate {
                name: input.name,
                height_cm: input.height_cm,
                unit_system: input.units,
                start_weight_kg: input.start_weight.map(to_kg),
                target_weight_kg: input.target_weight.map(to_kg),
            };
            if goal.is_empty() && input.sex.is_none() {
                bail!("Nothing to change. Pass at least one field, e.g. --target-weight");
            }

            let mut user = db.update_goal(user_id, &goal)?;
            if let Some(sex) = input.sex {
                user.sex = sex;
                db.upsert_user(&user)?;
            }
            user
        }
        None => {
            let (Some(name), Some(sex), Some(height_cm), Some(start), Some(target)) = (
                input.name,
                input.sex,
                input.height_cm,
                input.start_weight,
                input.target_weight,
            ) else {
                bail!(
                    "No profile '{}' yet. Creating one needs --name, --sex, --height-cm, \
                     --start-weight and --target-weight",
                    user_id
                );
            };

            let user = UserProfile {
                id: user_id.to_string(),
                name,
                sex,
                height_cm,
                unit_system: units,
                start_weight_kg: to_kg(start),
                target_weight_kg: to_kg(target),
                created_at: Utc::now(),
            };
            db.upsert_user(&user)?;
            user
        }
    };

    tracing::info!(user_id = %user.id, "Profile saved");
    println!("Saved profile '{}'.", user.id);
    print_profile(&user);
    Ok(())
}

fn cmd_profile_show(db: &Database, user_id: &str) -> Result<()> {
    let user = require_user(db, user_id)?;
    print_profile(&user);
    Ok(())
}

fn print_profile(user: &UserProfile) {
    let units = user.unit_system;
    println!("Name:           {}", user.name);
    println!("Sex:            {}", user.sex);
    println!("Height:         {:.1} cm", user.height_cm);
    println!("Units:          {}", units);
    println!("Start weight:   {}", format_weight(user.start_weight_kg, units));
    println!("Target weight:  {}", format_weight(user.target_weight_kg, units));
}

fn require_user(db: &Database, user_id: &str) -> Result<UserProfile> {
    match db.get_user(user_id)? {
        Some(user) => Ok(user),
        None => bail!(
            "No profile '{}'. Create one with `leanline profile set` or run `leanline seed`",
            user_id
        ),
    }
}

// ============================================
// Readings
// ============================================

fn cmd_log(db: &Database, user_id: &str, weight: f64, fields: &MeasurementArgs) -> Result<()> {
    let user = require_user(db, user_id)?;
    check_weight(weight)?;

    let update = fields.to_update(Some(weight), user.unit_system)?;
    let mut reading = Reading::new(&user.id, Utc::now(), 0.0);
    update.apply(&mut reading);

    db.insert_reading(&reading)
        .context("failed to save reading")?;

    println!(
        "Logged {} at {} ({})",
        format_weight(reading.weight_kg, user.unit_system),
        format_local(&reading.recorded_at),
        reading.id
    );
    Ok(())
}

/// Weights must be finite and positive.
fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        bail!("Weight must be a positive number, got {}", weight);
    }
    Ok(())
}

fn cmd_list(db: &Database, user_id: &str, limit: Option<usize>) -> Result<()> {
    let user = require_user(db, user_id)?;
    let readings = db.list_readings(&user.id)?;

    if readings.is_empty() {
        println!("No readings yet. Log one with `leanline log --weight <w>`.");
        return Ok(());
    }

    println!(
        "{:<17} {:>10} {:>6} {:>6} {:>10}  ID",
        "WHEN", "WEIGHT", "FAT%", "WATER%", "MUSCLE"
    );
    let units = user.unit_system;
    for reading in sorted_descending(&readings)
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
    {
        println!(
            "{:<17} {:>10} {:>6.1} {:>6.1} {:>10}  {}",
            format_local(&reading.recorded_at),
            format_weight(reading.weight_kg, units),
            reading.body_fat_pct,
            reading.body_water_pct,
            format_weight(reading.muscle_mass_kg, units),
            reading.id
        );
    }
    Ok(())
}

fn cmd_edit(
    db: &Database,
    id: &str,
    weight: Option<f64>,
    fields: &MeasurementArgs,
    clear_notes: bool,
) -> Result<()> {
    let Some(existing) = db.get_reading(id)? else {
        bail!("No reading with ID {}", id);
    };
    let units = db
        .get_user(&existing.user_id)?
        .map(|u| u.unit_system)
        .unwrap_or_default();

    if let Some(weight) = weight {
        check_weight(weight)?;
    }
    let mut update = fields.to_update(weight, units)?;
    if clear_notes {
        update.notes = Some(None);
    }
    if update.is_empty() {
        bail!("Nothing to change. Pass at least one field, e.g. --weight");
    }

    let reading = db.update_reading(id, &update)?;
    println!(
        "Updated reading {}: {} at {}",
        reading.id,
        format_weight(reading.weight_kg, units),
        format_local(&reading.recorded_at)
    );
    Ok(())
}

fn cmd_delete(db: &Database, id: &str) -> Result<()> {
    db.delete_reading(id)
        .with_context(|| format!("failed to delete reading {}", id))?;
    println!("Deleted reading {}", id);
    Ok(())
}

// ============================================
// Report
// ============================================

fn cmd_report(db: &Database, config: &Config, user_id: &str, format: &str) -> Result<()> {
    let user = db.get_user(user_id)?;
    let readings = match &user {
        Some(user) => db.list_readings(&user.id)?,
        None => Vec::new(),
    };

    let units = user
        .as_ref()
        .map(|u| u.unit_system)
        .unwrap_or(config.display.unit_system);
    // Buckets and the log window follow the same local calendar `list` shows
    let local = Local::now();
    let now = local.with_timezone(local.offset());
    let options = AnalyticsOptions::from_config(&config.analytics, units, now)
        .context("invalid [analytics] configuration")?;

    let analytics = compute_analytics(user.as_ref(), &readings, &options);
    let report = Report {
        user: user.as_ref(),
        analytics: &analytics,
        units,
        log_window_days: options.log_window_days,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "md" => print!("{}", MarkdownReport(&report)),
        "text" => print!("{}", TextReport(&report)),
        other => bail!("Unknown format: {}. Use 'text', 'md' or 'json'", other),
    }
    Ok(())
}

// ============================================
// Seed
// ============================================

fn cmd_seed(db: &Database, user_id: &str, force: bool) -> Result<()> {
    let existing = db.count_readings(user_id)?;
    if !force {
        if existing > 0 {
            bail!(
                "Profile '{}' already has {} readings. Use --force to replace them",
                user_id,
                existing
            );
        }
        if db.get_user(user_id)?.is_some() {
            bail!(
                "Profile '{}' already exists. Use --force to replace it with the demo profile",
                user_id
            );
        }
    }
    if existing > 0 {
        db.clear_readings(user_id)?;
    }

    let now = Utc::now();
    let mut user = demo_user(now);
    user.id = user_id.to_string();
    db.upsert_user(&user)?;

    // Last demo reading lands on today
    let start = now - Duration::weeks(DEMO_WEEKS as i64 - 1);
    let readings = demo_readings(&user, start);
    for reading in &readings {
        db.insert_reading(reading)?;
    }

    tracing::info!(user_id = %user.id, readings = readings.len(), "Seeded demo data");
    println!(
        "Seeded profile '{}' with {} weekly readings.",
        user.id,
        readings.len()
    );
    Ok(())
}

fn format_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
