//! End-to-end tests driving the `tm` binary against a temporary data directory.
//!
//! Every test runs offline: no credentials are configured, so the remote log
//! and the AI service are never contacted.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{NamedTempFile, TempDir};

struct Env {
    home: TempDir,
    config: NamedTempFile,
}

impl Env {
    fn new() -> Self {
        Self::with_settings("")
    }

    /// Like `new`, with extra TOML lines appended to the config file.
    fn with_settings(extra: &str) -> Self {
        let home = TempDir::new().unwrap();
        let data = home.path().join("data");
        let mut config = NamedTempFile::new().unwrap();
        writeln!(
            config,
            r#"
log_path = "{log}"
session_path = "{session}"
insights_path = "{insights}"
sync_on_start = false
{extra}
"#,
            log = data.join("TimeLog.json").display(),
            session = data.join("session.json").display(),
            insights = data.join("insights.json").display(),
        )
        .unwrap();
        config.flush().unwrap();
        Self { home, config }
    }

    fn data_dir(&self) -> std::path::PathBuf {
        self.home.path().join("data")
    }

    fn tm(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tm"))
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config.path())
            .args(args)
            .output()
            .expect("failed to run tm")
    }

    fn tm_ok(&self, args: &[&str]) -> String {
        let output = self.tm(args);
        assert!(
            output.status.success(),
            "tm {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn list_json(&self) -> Vec<serde_json::Value> {
        let stdout = self.tm_ok(&["list", "--json"]);
        let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        value.as_array().unwrap().clone()
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn session_survives_between_invocations() {
    let env = Env::new();

    assert_eq!(env.tm_ok(&["start", "Exercise"]), "Started logging Exercise.\n");
    assert!(env.data_dir().join("session.json").exists());

    let status = env.tm_ok(&["status"]);
    assert!(status.starts_with("Logging Exercise since "), "{status}");

    let again = env.tm_ok(&["start", "Rest"]);
    assert!(again.starts_with("Already logging Exercise"), "{again}");

    let stopped = env.tm_ok(&["stop"]);
    assert!(stopped.starts_with("Logged Exercise for "), "{stopped}");
    assert!(!env.data_dir().join("session.json").exists());

    let entries = env.list_json();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "Exercise");

    let on_disk = read_json(&env.data_dir().join("TimeLog.json"));
    assert_eq!(on_disk.as_array().unwrap().len(), 1);
    assert_eq!(on_disk[0]["id"], entries[0]["id"]);
}

#[test]
fn newest_entry_is_listed_first_and_counted_in_totals() {
    let env = Env::new();

    env.tm_ok(&["start"]);
    env.tm_ok(&["stop"]);
    env.tm_ok(&["start", "Gaming"]);
    env.tm_ok(&["stop"]);

    let entries = env.list_json();
    let categories: Vec<&str> = entries
        .iter()
        .map(|e| e["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["Gaming", "Work"]);

    let totals: serde_json::Value =
        serde_json::from_str(&env.tm_ok(&["totals", "--json"])).unwrap();
    assert_eq!(totals["entries"], 2);
    let buckets = totals["buckets"].as_array().unwrap();
    assert_eq!(buckets.first().unwrap()["name"], "Work");
    assert_eq!(buckets.first().unwrap()["entries"], 1);
    assert_eq!(buckets.last().unwrap()["name"], "Other");
    assert_eq!(buckets.last().unwrap()["entries"], 1);
}

#[test]
fn edit_and_delete_entries() {
    let env = Env::new();
    env.tm_ok(&["start", "Work"]);
    env.tm_ok(&["stop"]);
    env.tm_ok(&["start", "Rest"]);
    env.tm_ok(&["stop"]);

    let entries = env.list_json();
    let work_id = entries[1]["id"].as_str().unwrap().to_string();

    let edited = env.tm_ok(&[
        "edit",
        &work_id,
        "--category",
        "Social Media",
        "--start",
        "2025-05-17T09:00:00Z",
        "--end",
        "2025-05-17T09:45:00Z",
    ]);
    assert_eq!(edited, format!("Updated {work_id}: Social Media (45m 0s).\n"));

    let inverted = env.tm(&[
        "edit",
        &work_id,
        "--start",
        "2025-05-17T10:00:00Z",
        "--end",
        "2025-05-17T09:00:00Z",
    ]);
    assert!(!inverted.status.success());

    let entries = env.list_json();
    assert_eq!(entries[1]["category"], "Social Media");
    assert_eq!(entries[1]["start"], "2025-05-17T09:00:00Z");
    assert_eq!(entries[1]["end"], "2025-05-17T09:45:00Z");

    assert_eq!(env.tm_ok(&["delete", "1"]), "Deleted 1 entry.\n");
    assert_eq!(env.tm_ok(&["delete", "--id", &work_id]), "Deleted 1 entry.\n");
    assert_eq!(env.tm_ok(&["list"]), "No entries logged yet.\n");
}

#[test]
fn offline_refresh_fails_without_touching_log() {
    let env = Env::new();
    env.tm_ok(&["start"]);
    env.tm_ok(&["stop"]);

    let output = env.tm(&["refresh"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not configured"));
    assert_eq!(env.list_json().len(), 1);
}

#[test]
fn cached_insights_work_without_history() {
    let env = Env::new();
    assert_eq!(
        env.tm_ok(&["insights", "tips", "--cached"]),
        "No cached tips yet. Run 'tm insights tips' to generate them.\n"
    );
}

#[test]
fn blank_api_key_runs_offline() {
    let env = Env::with_settings("email = \"me@example.com\"\napi_key = \"   \"");

    assert_eq!(env.tm_ok(&["start", "Work"]), "Started logging Work.\n");
    env.tm_ok(&["stop"]);
    assert_eq!(env.list_json().len(), 1);

    let output = env.tm(&["refresh"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not configured"));
}
