use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use tempfile::tempdir;

fn camsync_cmd() -> Command {
    Command::cargo_bin("camsync").expect("Failed to find camsync binary")
}

#[test]
fn test_help_lists_subcommands() -> Result<(), Box<dyn Error>> {
    camsync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("preprocess"))
        .stdout(contains("calibrate"))
        .stdout(contains("process"));
    Ok(())
}

#[test]
fn test_missing_workspace_argument_is_rejected() -> Result<(), Box<dyn Error>> {
    camsync_cmd()
        .arg("process")
        .assert()
        .failure()
        .stderr(contains("--workspace"));
    Ok(())
}

#[test]
fn test_non_existent_workspace() -> Result<(), Box<dyn Error>> {
    camsync_cmd()
        .arg("preprocess")
        .arg("--workspace")
        .arg("surely/this/does/not/exist")
        .assert()
        .failure()
        .stderr(contains("Invalid workspace path"));
    Ok(())
}

#[test]
fn test_preprocess_empty_workspace_succeeds() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    fs::write(workspace.path().join("config.json"), "{}")?;

    camsync_cmd()
        .arg("preprocess")
        .arg("--workspace")
        .arg(workspace.path())
        .arg("--skip-pose")
        .assert()
        .success();

    // Lock is released on exit
    assert!(!workspace.path().join(".camsync.lock").exists());
    Ok(())
}

#[test]
fn test_log_file_written_to_log_dir() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let logs = tempdir()?;
    fs::write(workspace.path().join("config.json"), "{}")?;

    camsync_cmd()
        .arg("process")
        .arg("--workspace")
        .arg(workspace.path())
        .arg("--log-dir")
        .arg(logs.path())
        .assert()
        .success();

    let names: Vec<String> = fs::read_dir(logs.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("camsync_process_") && n.ends_with(".log")));
    Ok(())
}

#[test]
fn test_held_lock_refuses_second_run() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    fs::write(workspace.path().join("config.json"), "{}")?;
    fs::write(workspace.path().join(".camsync.lock"), "pid=1\n")?;

    camsync_cmd()
        .arg("calibrate")
        .arg("--workspace")
        .arg(workspace.path())
        .assert()
        .failure()
        .stderr(contains("locked"));

    // Someone else's lock is left alone
    assert!(workspace.path().join(".camsync.lock").exists());
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    fs::write(workspace.path().join("config.json"), "{ not json")?;

    camsync_cmd()
        .arg("process")
        .arg("--workspace")
        .arg(workspace.path())
        .assert()
        .failure()
        .stderr(contains("Cannot parse"));
    Ok(())
}

#[test]
fn test_explicit_config_path_is_used() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let elsewhere = tempdir()?;
    let config = elsewhere.path().join("custom.json");
    fs::write(&config, "{ broken")?;

    camsync_cmd()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg("--workspace")
        .arg(workspace.path())
        .assert()
        .failure()
        .stderr(contains("custom.json"));
    Ok(())
}

#[test]
fn test_invalid_retry_policy_is_rejected() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let config = serde_json::json!({
        "retry": { "step": 5, "max_attempts": 3, "max_reprojection_error_threshold": 10 }
    });
    fs::write(workspace.path().join("config.json"), config.to_string())?;

    camsync_cmd()
        .arg("process")
        .arg("--workspace")
        .arg(workspace.path())
        .assert()
        .failure()
        .stderr(contains("Invalid configuration"));
    Ok(())
}
