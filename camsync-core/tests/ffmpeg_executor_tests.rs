// camsync-core/tests/ffmpeg_executor_tests.rs
//
// Deadline and failure handling of the ffmpeg job runner.

use camsync_core::CoreError;
use camsync_core::external::ffmpeg_executor::run_ffmpeg;
use camsync_core::external::mocks::MockFfmpegSpawner;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::time::{Duration, Instant};

fn transcode(input: &str) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.input(input);
    cmd.output("out.mp4");
    cmd
}

#[test]
fn test_silent_process_is_killed_at_deadline() -> Result<(), Box<dyn std::error::Error>> {
    let spawner = MockFfmpegSpawner::new();
    let process = spawner.add_silent_expectation("-i hang.mp4", Duration::from_secs(2));
    let limit = Duration::from_millis(100);

    let start = Instant::now();
    let result = run_ffmpeg(&spawner, transcode("hang.mp4"), "ffmpeg (hang)", Some(limit), None);

    assert!(matches!(result, Err(CoreError::CommandTimeout(_, l)) if l == limit));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(process.was_killed());
    Ok(())
}

#[test]
fn test_short_silence_within_deadline_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let spawner = MockFfmpegSpawner::new();
    let process = spawner.add_silent_expectation("-i slow.mp4", Duration::from_millis(50));

    run_ffmpeg(
        &spawner,
        transcode("slow.mp4"),
        "ffmpeg (slow)",
        Some(Duration::from_secs(5)),
        None,
    )?;
    assert!(!process.was_killed());
    Ok(())
}

#[test]
fn test_failed_exit_reports_error_lines() -> Result<(), Box<dyn std::error::Error>> {
    let spawner = MockFfmpegSpawner::new();
    spawner.add_exit_error_expectation(
        "-i broken.mp4",
        vec![FfmpegEvent::Log(LogLevel::Error, "moov atom not found".to_string())],
        1,
    );

    let err = run_ffmpeg(&spawner, transcode("broken.mp4"), "ffmpeg (broken)", None, None)
        .unwrap_err();
    assert!(err.to_string().contains("moov atom not found"));
    Ok(())
}
