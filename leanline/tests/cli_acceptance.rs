use leanline_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("leanline/leanline.db")
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("leanline");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("leanline"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute leanline: {e}"))
}

fn render_args(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "leanline {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        render_args(args),
        output.status,
        stdout,
        stderr
    );
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn create_profile(env: &CliTestEnv) {
    run_ok(
        env,
        &[
            "profile",
            "set",
            "--name",
            "Sam",
            "--sex",
            "female",
            "--height-cm",
            "170",
            "--start-weight",
            "182",
            "--target-weight",
            "150",
            "--units",
            "imperial",
        ],
    );
}

#[test]
fn profile_set_and_show_round_trip() {
    let env = CliTestEnv::new();
    create_profile(&env);

    let stdout = run_ok(&env, &["profile", "show"]);
    assert!(stdout.contains("Sam"));
    assert!(stdout.contains("Start weight:   182.0 lb"));
    assert!(stdout.contains("Target weight:  150.0 lb"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let user = db.get_user("me").unwrap().expect("profile should exist");
    assert!((user.start_weight_kg - 82.55).abs() < 0.01);

    // Partial update keeps the other fields
    run_ok(&env, &["profile", "set", "--target-weight", "155"]);
    let stdout = run_ok(&env, &["profile", "show"]);
    assert!(stdout.contains("Target weight:  155.0 lb"));
    assert!(stdout.contains("Start weight:   182.0 lb"));
}

#[test]
fn profile_set_requires_all_fields_for_new_profile() {
    let env = CliTestEnv::new();
    let args = ["profile", "set", "--name", "Sam"];
    let output = run_bin(&env, &args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--height-cm"), "stderr was:\n{stderr}");
}

#[test]
fn log_list_edit_delete_flow() {
    let env = CliTestEnv::new();
    create_profile(&env);

    run_ok(
        &env,
        &[
            "log",
            "--weight",
            "182",
            "--body-fat",
            "31",
            "--body-water",
            "52",
            "--at",
            "2024-01-07T07:00:00Z",
        ],
    );
    run_ok(
        &env,
        &["log", "--weight", "180", "--body-fat", "30.5", "--at", "2024-01-14T08:00:00Z"],
    );

    let stdout = run_ok(&env, &["list"]);
    assert!(stdout.contains("180.0 lb"));
    assert!(stdout.contains("182.0 lb"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let readings = db.list_readings("me").unwrap();
    assert_eq!(readings.len(), 2);
    let second = readings
        .iter()
        .find(|r| r.body_fat_pct == 30.5)
        .expect("second reading")
        .id
        .clone();
    drop(db);

    run_ok(&env, &["edit", &second, "--weight", "179", "--notes", "post-holiday"]);
    let db = Database::open(&env.db_path()).expect("failed to open db");
    let edited = db.get_reading(&second).unwrap().expect("edited reading");
    assert!((edited.weight_kg - 179.0 * 0.45359237).abs() < 1e-9);
    assert_eq!(edited.notes.as_deref(), Some("post-holiday"));
    assert_eq!(edited.body_fat_pct, 30.5);
    drop(db);

    let stdout = run_ok(&env, &["report", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("report should be JSON");
    assert_eq!(json["analytics"]["status"], "ready");
    assert_eq!(json["analytics"]["weekly_change_label"], "Down 3.0 lb vs last week");

    run_ok(&env, &["delete", &second]);
    let db = Database::open(&env.db_path()).expect("failed to open db");
    assert_eq!(db.count_readings("me").unwrap(), 1);
    drop(db);

    let args = ["delete", second.as_str()];
    let output = run_bin(&env, &args);
    assert!(!output.status.success());
}

#[test]
fn seed_then_report_in_every_format() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["seed"]);
    assert!(stdout.contains("12 weekly readings"));

    let text = run_ok(&env, &["report"]);
    assert!(text.contains("PROGRESS"));
    assert!(text.contains("Down 1.1 lb vs last week"));
    assert!(text.contains("WEEKLY AVERAGES"));

    let md = run_ok(&env, &["report", "--format", "md"]);
    assert!(md.starts_with("# leanline report: Alex"));

    let json = run_ok(&env, &["report", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_str(&json).expect("report should be JSON");
    assert_eq!(json["analytics"]["predicted_curve"].as_array().unwrap().len(), 16);
    assert_eq!(json["analytics"]["logs_this_week"], 1);

    let args = ["report", "--format", "pdf"];
    let output = run_bin(&env, &args);
    assert!(!output.status.success());
}

#[test]
fn seed_refuses_to_overwrite_without_force() {
    let env = CliTestEnv::new();
    run_ok(&env, &["seed"]);

    let output = run_bin(&env, &["seed"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--force"), "stderr was:\n{stderr}");

    run_ok(&env, &["seed", "--force"]);
    let db = Database::open(&env.db_path()).expect("failed to open db");
    assert_eq!(db.count_readings("me").unwrap(), 12);
}

#[test]
fn seed_keeps_existing_profile_without_force() {
    let env = CliTestEnv::new();
    create_profile(&env);

    let output = run_bin(&env, &["seed"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--force"), "stderr was:\n{stderr}");

    let stdout = run_ok(&env, &["profile", "show"]);
    assert!(stdout.contains("Sam"));
    assert!(stdout.contains("Height:         170.0 cm"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    assert_eq!(db.count_readings("me").unwrap(), 0);
    drop(db);

    run_ok(&env, &["seed", "--force"]);
    let stdout = run_ok(&env, &["profile", "show"]);
    assert!(stdout.contains("Alex"));
}

#[test]
fn log_rejects_non_finite_weight() {
    let env = CliTestEnv::new();
    create_profile(&env);

    for weight in ["NaN", "inf", "-5", "0"] {
        let args = ["log", "--weight", weight];
        let output = run_bin(&env, &args);
        assert!(!output.status.success(), "weight {weight} was accepted");
    }

    run_ok(&env, &["log", "--weight", "181"]);
    let db = Database::open(&env.db_path()).expect("failed to open db");
    let readings = db.list_readings("me").unwrap();
    assert_eq!(readings.len(), 1);
    let id = readings[0].id.clone();
    drop(db);

    let args = ["edit", id.as_str(), "--weight", "NaN"];
    let output = run_bin(&env, &args);
    assert!(!output.status.success());
}

#[test]
fn logs_go_to_dated_files_in_state_dir() {
    let env = CliTestEnv::new();
    run_ok(&env, &["seed"]);

    let log_dir = env.xdg_state.join("leanline");
    let names: Vec<String> = fs::read_dir(&log_dir)
        .expect("log dir should exist")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(
        names.iter().any(|name| name.starts_with("leanline.log.")),
        "log files: {names:?}"
    );
    assert!(!log_dir.join("leanline.log").exists());
}

#[test]
fn report_without_profile_is_not_an_error() {
    let env = CliTestEnv::new();
    let stdout = run_ok(&env, &["report"]);
    assert!(stdout.contains("No profile yet"));

    let json = run_ok(&env, &["--user", "nobody", "report", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_str(&json).expect("report should be JSON");
    assert_eq!(json["analytics"]["status"], "no_data");
    assert_eq!(json["analytics"]["muscle_score"], 50);
}

#[test]
fn config_controls_log_window() {
    let env = CliTestEnv::new();
    env.write_config("[analytics]\nlog_window_days = 30\nweek_start = \"monday\"\n");
    run_ok(&env, &["seed"]);

    let json = run_ok(&env, &["report", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_str(&json).expect("report should be JSON");
    // Weekly readings: today, 7, 14, 21 and 28 days ago
    assert_eq!(json["analytics"]["logs_this_week"], 5);
    assert_eq!(json["log_window_days"], 30);

    env.write_config("[analytics]\nweek_start = \"someday\"\n");
    let output = run_bin(&env, &["report"]);
    assert!(!output.status.success());
}

#[test]
fn users_are_isolated() {
    let env = CliTestEnv::new();
    run_ok(&env, &["--user", "alex", "seed"]);

    let output = run_bin(&env, &["list"]);
    assert!(!output.status.success());

    let stdout = run_ok(&env, &["--user", "alex", "list"]);
    assert!(stdout.contains("lb"));
}
