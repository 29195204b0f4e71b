//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary HOME so the
//! database and config never touch the real user directory.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_oasis"));
        cmd.args(args)
            .env("HOME", self.home.path())
            .env_remove("OASIS_ENV")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run with stdin closed. Returns (code, stdout, stderr).
    fn run(&self, args: &[&str]) -> (i32, String, String) {
        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .expect("Failed to execute CLI command");
        collect(output)
    }

    fn run_with_input(&self, args: &[&str], input: &str) -> (i32, String, String) {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn CLI command");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        collect(child.wait_with_output().unwrap())
    }

    fn prefs(&self) -> serde_json::Value {
        let (code, stdout, stderr) = self.run(&["prefs", "show"]);
        assert_eq!(code, 0, "prefs show failed: {stderr}");
        serde_json::from_str(&stdout).unwrap()
    }
}

fn collect(output: std::process::Output) -> (i32, String, String) {
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_prefs_defaults() {
    let sb = Sandbox::new();
    let prefs = sb.prefs();
    assert_eq!(prefs["hasOnboarded"], false);
    assert_eq!(prefs["name"], "");
    assert_eq!(prefs["dailyScreenFreeGoal"], 60);
    assert!(prefs["primaryGoal"].is_null());
}

#[test]
fn test_prefs_set_and_reset() {
    let sb = Sandbox::new();
    let (code, _, stderr) = sb.run(&[
        "prefs", "set", "--name", "Lee", "--goal", "sleep", "--apps", "TikTok,News",
        "--risks", "late-night", "--goal-minutes", "90",
    ]);
    assert_eq!(code, 0, "{stderr}");

    let prefs = sb.prefs();
    assert_eq!(prefs["name"], "Lee");
    assert_eq!(prefs["primaryGoal"], "sleep");
    assert_eq!(prefs["problemApps"], serde_json::json!(["TikTok", "News"]));
    assert_eq!(prefs["riskTimes"], serde_json::json!(["late-night"]));
    assert_eq!(prefs["dailyScreenFreeGoal"], 90);
    assert_eq!(prefs["hasOnboarded"], false);

    let (code, _, _) = sb.run(&["prefs", "reset"]);
    assert_eq!(code, 0);
    let prefs = sb.prefs();
    assert!(prefs["primaryGoal"].is_null());
    assert_eq!(prefs["problemApps"], serde_json::json!([]));
    assert_eq!(prefs["name"], "Lee");
    assert_eq!(prefs["dailyScreenFreeGoal"], 90);
}

#[test]
fn test_prefs_rejects_off_grid_goal() {
    let sb = Sandbox::new();
    let (code, _, stderr) = sb.run(&["prefs", "set", "--goal-minutes", "100"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");
    assert_eq!(sb.prefs()["dailyScreenFreeGoal"], 60);
}

#[test]
fn test_onboard_interactive() {
    let sb = Sandbox::new();
    // name, goal #2, apps #1 + Reddit, risk #4, goal +15, accept
    let (code, stdout, stderr) =
        sb.run_with_input(&["onboard"], "Ada\n2\n1, reddit\n4\n+\n\n");
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("All set, Ada."), "{stdout}");

    let prefs = sb.prefs();
    assert_eq!(prefs["hasOnboarded"], true);
    assert_eq!(prefs["primaryGoal"], "sleep");
    assert_eq!(prefs["problemApps"], serde_json::json!(["Instagram", "Reddit"]));
    assert_eq!(prefs["riskTimes"], serde_json::json!(["late-night"]));
    assert_eq!(prefs["dailyScreenFreeGoal"], 75);

    let (code, stdout, _) = sb.run(&["onboard"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("already onboarded"));
}

#[test]
fn test_onboard_cancelled_on_eof() {
    let sb = Sandbox::new();
    let (code, _, stderr) = sb.run_with_input(&["onboard"], "Ada\n");
    assert_eq!(code, 1);
    assert!(stderr.contains("onboarding cancelled"), "{stderr}");
    assert_eq!(sb.prefs()["hasOnboarded"], false);
}

#[test]
fn test_focus_durations() {
    let sb = Sandbox::new();
    let (code, stdout, _) = sb.run(&["focus", "durations"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "[25,45,60]");
}

#[test]
fn test_focus_rejects_unknown_duration() {
    let sb = Sandbox::new();
    let (code, _, stderr) = sb.run(&["focus", "run", "--duration", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not one of 25, 45, 60"), "{stderr}");
}

#[test]
fn test_focus_run_records_history() {
    let sb = Sandbox::new();
    let (code, _, _) = sb.run(&["config", "set", "focus.tick_ms", "1"]);
    assert_eq!(code, 0);

    let (code, stdout, stderr) = sb.run(&["focus", "run", "--duration", "25"]);
    assert_eq!(code, 0, "{stderr}");
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["type"], "focus_started");
    assert_eq!(events.last().unwrap()["type"], "focus_completed");
    assert_eq!(events.last().unwrap()["record"]["duration_minutes"], 25);

    let (code, stdout, _) = sb.run(&["history"]);
    assert_eq!(code, 0);
    let history: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history["total_minutes"], 25);
    assert_eq!(history["sessions"].as_array().unwrap().len(), 1);
}

#[test]
fn test_focus_quit_needs_confirmation() {
    let sb = Sandbox::new();
    let (code, stdout, stderr) = sb.run_with_input(&["focus", "run"], "q\nn\nq\ny\n");
    assert_eq!(code, 0, "{stderr}");
    assert!(stderr.contains("staying focused"), "{stderr}");
    assert!(stdout.contains("focus_exited"), "{stdout}");
    assert!(!stdout.contains("focus_completed"));

    let (_, stdout, _) = sb.run(&["history"]);
    let history: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history["total_minutes"], 0);
}

#[test]
fn test_config_get_set() {
    let sb = Sandbox::new();
    let (code, stdout, _) = sb.run(&["config", "get", "focus.default_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = sb.run(&["config", "set", "focus.default_duration", "45"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = sb.run(&["config", "get", "focus.default_duration"]);
    assert_eq!(stdout.trim(), "45");

    let (code, _, stderr) = sb.run(&["config", "set", "focus.default_duration", "30"]);
    assert_eq!(code, 1, "{stderr}");
    let (_, stdout, _) = sb.run(&["config", "get", "focus.default_duration"]);
    assert_eq!(stdout.trim(), "45");

    let (code, stdout, _) = sb.run(&["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[focus]"), "{stdout}");
    assert!(stdout.contains("default_duration = 45"), "{stdout}");

    let (code, _, stderr) = sb.run(&["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"), "{stderr}");

    let (code, _, _) = sb.run(&["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = sb.run(&["config", "get", "focus.default_duration"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_auth_without_remote() {
    let sb = Sandbox::new();
    let (code, stdout, _) = sb.run(&["auth", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"signed_in\":false"), "{stdout}");

    let (code, _, stderr) = sb.run(&["auth", "login", "not-an-email"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Please enter a valid email address."), "{stderr}");

    let (code, _, stderr) = sb.run(&["auth", "login", "ada@example.com"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not configured"), "{stderr}");
}

#[test]
fn test_dashboard_local() {
    let sb = Sandbox::new();
    let (code, stdout, stderr) = sb.run(&["dashboard"]);
    assert_eq!(code, 0, "{stderr}");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["name"], "Friend");
    assert_eq!(summary["daily_goal"], 60);
    assert_eq!(summary["screen_free_minutes"], 0);
    assert_eq!(summary["remaining_minutes"], 60);
    assert_eq!(summary["source"], "local");
    assert!(summary["prompt"].as_str().is_some());
}
