use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper function to create a temporary directory holding a zero-delay config
fn create_cli_test_environment() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, r#"{ "step_delay_ms": 0 }"#).expect("Failed to write config");
    (temp_dir, config_path)
}

/// Helper function to write a plan file into the test directory
fn write_plan(temp_dir: &TempDir, json: &str) -> PathBuf {
    let path = temp_dir.path().join("plan.json");
    fs::write(&path, json).expect("Failed to write plan");
    path
}

/// Helper function to create a Command with --no-color and the test config
fn conductor_cmd(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("conductor").expect("Failed to find conductor binary");
    cmd.arg("--no-color")
        .arg("--config")
        .arg(config_path)
        .env("XDG_CONFIG_HOME", config_path.parent().unwrap());
    cmd
}

const WRITE_AND_CHECK: &str = r#"{
    "id": "p1",
    "title": "Write a greeting",
    "steps": [
        { "id": "s1", "type": "THINK", "thought": "Create the file, then check it" },
        { "id": "s2", "type": "CREATE_FILE", "filePath": "out/greeting.txt", "content": "hello" },
        { "id": "s3", "type": "RUN_COMMAND", "command": "cat out/greeting.txt" }
    ]
}"#;

const MISSING_CONTENT: &str = r#"{
    "id": "p2",
    "title": "Broken edit",
    "steps": [
        { "id": "s1", "type": "THINK", "thought": "Edit the file" },
        { "id": "s2", "type": "EDIT_FILE", "filePath": "a.ts" }
    ]
}"#;

#[test]
fn test_cli_run_plan_success() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    conductor_cmd(&config_path)
        .arg("run")
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("➤ 2/3 CREATE_FILE `s2`"))
        .stdout(predicate::str::contains("✓ 3/3 RUN_COMMAND `s3`"))
        .stdout(predicate::str::contains("# Write a greeting (p1)"))
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("Success: Plan 'p1' completed (3/3 steps)"));

    let written = fs::read_to_string(temp_dir.path().join("out/greeting.txt")).unwrap();
    assert_eq!(written, "hello");
}

#[test]
fn test_cli_run_missing_field_fails() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, MISSING_CONTENT);

    conductor_cmd(&config_path)
        .arg("run")
        .arg(&plan_path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ 2/2 EDIT_FILE `s2`"))
        .stderr(predicate::str::contains("content"));

    assert!(!temp_dir.path().join("a.ts").exists());
}

#[test]
fn test_cli_dry_run_touches_nothing() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    conductor_cmd(&config_path)
        .args(["run", "--dry-run"])
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));

    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_cli_continue_on_error_runs_remaining_steps() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(
        &temp_dir,
        r#"{
            "id": "p3",
            "title": "Keep going",
            "steps": [
                { "id": "s1", "type": "RUN_COMMAND", "command": "echo nope >&2; exit 1" },
                { "id": "s2", "type": "CREATE_FILE", "filePath": "after.txt", "content": "x" }
            ]
        }"#,
    );

    conductor_cmd(&config_path)
        .args(["run", "--continue-on-error"])
        .arg(&plan_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));

    assert!(temp_dir.path().join("after.txt").exists());
}

#[test]
fn test_cli_manual_mode_steps_from_stdin() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    conductor_cmd(&config_path)
        .args(["run", "--manual"])
        .arg(&plan_path)
        .write_stdin("next\nstatus\nnext\nnext\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[p1] running 1/3"))
        .stdout(predicate::str::contains("completed (3/3 steps)"));
}

#[test]
fn test_cli_manual_stop_exits_with_error() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    conductor_cmd(&config_path)
        .args(["run", "--manual"])
        .arg(&plan_path)
        .write_stdin("next\nbogus\nstop\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unknown command: bogus"))
        .stderr(predicate::str::contains("paused (1/3 steps)"));

    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_cli_save_writes_final_state() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);
    let saved = temp_dir.path().join("result.json");

    conductor_cmd(&config_path)
        .arg("run")
        .arg(&plan_path)
        .arg("--save")
        .arg(&saved)
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(value["status"], "completed");
    assert_eq!(value["steps"][2]["status"], "completed");
    assert_eq!(value["steps"][2]["output"], "hello");
}

#[test]
fn test_cli_validate() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    conductor_cmd(&config_path)
        .arg("validate")
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan 'p1' is valid (3 steps)"));

    let broken = write_plan(&temp_dir, MISSING_CONTENT);
    conductor_cmd(&config_path)
        .arg("validate")
        .arg(&broken)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "2. `s2`: EDIT_FILE step requires 'content'",
        ))
        .stderr(predicate::str::contains("1 invalid step"));
}

#[test]
fn test_cli_show_plan() {
    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    conductor_cmd(&config_path)
        .arg("show")
        .arg(&plan_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Write a greeting (p1)"))
        .stdout(predicate::str::contains("- Status: pending"))
        .stdout(predicate::str::contains("CREATE_FILE `out/greeting.txt` s2"));
}

#[test]
fn test_cli_missing_plan_file() {
    let (temp_dir, config_path) = create_cli_test_environment();

    conductor_cmd(&config_path)
        .arg("show")
        .arg(temp_dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load plan"));
}

#[test]
fn test_cli_config_prints_effective_values() {
    let (_temp_dir, config_path) = create_cli_test_environment();

    conductor_cmd(&config_path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"step_delay_ms\": 0"))
        .stdout(predicate::str::contains("\"pause_on_error\": true"));
}

#[test]
fn test_cli_config_init_writes_defaults() {
    let (temp_dir, config_path) = create_cli_test_environment();

    conductor_cmd(&config_path)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));

    let written = temp_dir.path().join("conductor").join("config.json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
    assert_eq!(value["step_delay_ms"], 100);
}

#[cfg(unix)]
#[test]
fn test_cli_interrupt_stops_manual_run_waiting_for_input() {
    use std::{
        io::{BufRead, BufReader, Read},
        process::{Command as StdCommand, Stdio},
        thread,
        time::Duration,
    };

    let (temp_dir, config_path) = create_cli_test_environment();
    let plan_path = write_plan(&temp_dir, WRITE_AND_CHECK);

    let mut child = StdCommand::new(assert_cmd::cargo::cargo_bin("conductor"))
        .arg("--no-color")
        .arg("--config")
        .arg(&config_path)
        .env("XDG_CONFIG_HOME", temp_dir.path())
        .args(["run", "--manual"])
        .arg(&plan_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn conductor");

    // Held open so the prompt keeps waiting for input.
    let _stdin = child.stdin.take();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        let read = stdout.read_line(&mut line).unwrap();
        assert!(read > 0, "conductor exited before prompting");
        if line.starts_with("Commands:") {
            break;
        }
    }
    thread::sleep(Duration::from_millis(300));

    let killed = StdCommand::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let status = child.wait().unwrap();
    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();

    assert!(!status.success());
    assert!(stderr.contains("paused (0/3 steps)"), "stderr: {stderr}");
    assert!(!temp_dir.path().join("out").exists());
}
