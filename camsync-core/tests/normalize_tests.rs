// camsync-core/tests/normalize_tests.rs
//
// Normalizer tests against mocked ffmpeg/ffprobe.

use camsync_core::external::VideoProperties;
use camsync_core::external::mocks::{MockFfmpegSpawner, MockFfprobeExecutor};
use camsync_core::normalize::{destination_for, find_normalization_sources};
use camsync_core::{CoreError, NormalizationSetting, NormalizeOutcome, Normalizer};
use std::fs;
use std::path::{Path, PathBuf};

fn synced_raw(root: &Path) -> PathBuf {
    root.join("s1/__synced__/walk/unset_unset_unset_unset/all_cams/raw")
}

fn add_camera(raw: &Path, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(raw)?;
    let path = raw.join(name);
    fs::write(&path, "synced")?;
    Ok(path)
}

fn props(width: u32, height: u32, fps: f64) -> VideoProperties {
    VideoProperties {
        width,
        height,
        fps,
        duration_secs: 12.0,
    }
}

#[test]
fn test_portrait_source_keeps_orientation() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = add_camera(&synced_raw(dir.path()), "camA.mov")?;
    let setting = NormalizationSetting::new(Some(30), None, Some(960), Some("mp4"));

    let spawner = MockFfmpegSpawner::new();
    let prober = MockFfprobeExecutor::new();
    prober.expect_video_properties(&source, Ok(props(1080, 1920, 30.0)));
    spawner.add_success_expectation("fps=30,scale=960:1706", vec![], true);

    let normalizer = Normalizer::new(&spawner, &prober, None);
    let outcome = normalizer.normalize_file(&source, &setting)?;

    let expected = dir
        .path()
        .join("s1/__synced__/walk/30_unset_960_mp4/all_cams/raw/camA.mp4");
    assert_eq!(outcome, NormalizeOutcome::Created(expected.clone()));
    assert!(expected.exists());
    assert_eq!(spawner.remaining_expectations(), 0);
    Ok(())
}

#[test]
fn test_second_call_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = add_camera(&synced_raw(dir.path()), "camA.mp4")?;
    let setting = NormalizationSetting::new(Some(25), Some(720), Some(1280), None);

    let spawner = MockFfmpegSpawner::new();
    let prober = MockFfprobeExecutor::new();
    prober.expect_video_properties(&source, Ok(props(1920, 1080, 50.0)));
    spawner.add_success_expectation("scale=1280:720", vec![], true);

    let normalizer = Normalizer::new(&spawner, &prober, None);
    assert!(matches!(
        normalizer.normalize_file(&source, &setting)?,
        NormalizeOutcome::Created(_)
    ));
    assert!(matches!(
        normalizer.normalize_file(&source, &setting)?,
        NormalizeOutcome::Skipped(_)
    ));
    assert_eq!(spawner.get_received_calls().len(), 1);
    assert_eq!(prober.probed_paths().len(), 1);
    Ok(())
}

#[test]
fn test_upsampling_rejected_without_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = add_camera(&synced_raw(dir.path()), "camA.mp4")?;
    let setting = NormalizationSetting::new(Some(30), None, None, None);

    let spawner = MockFfmpegSpawner::new();
    let prober = MockFfprobeExecutor::new();
    prober.expect_video_properties(&source, Ok(props(1920, 1080, 24.0)));

    let normalizer = Normalizer::new(&spawner, &prober, None);
    let result = normalizer.normalize_file(&source, &setting);

    assert!(matches!(result, Err(CoreError::UpsamplingRejected { .. })));
    assert!(!destination_for(&source, &setting)?.exists());
    assert!(spawner.get_received_calls().is_empty());
    Ok(())
}

#[test]
fn test_rejection_stops_only_that_set() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let low_rate = synced_raw(dir.path());
    let low_a = add_camera(&low_rate, "camA.mp4")?;
    let low_b = add_camera(&low_rate, "camB.mp4")?;
    let other_raw = dir
        .path()
        .join("s2/__synced__/run/unset_unset_unset_unset/all_cams/raw");
    let other = add_camera(&other_raw, "camA.mp4")?;

    let spawner = MockFfmpegSpawner::new();
    let prober = MockFfprobeExecutor::new();
    prober.expect_video_properties(&low_a, Ok(props(1920, 1080, 24.0)));
    prober.expect_video_properties(&low_b, Ok(props(1920, 1080, 24.0)));
    prober.expect_video_properties(&other, Ok(props(1920, 1080, 60.0)));
    spawner.add_success_expectation("fps=30", vec![], true);

    let settings = vec![
        NormalizationSetting::new(Some(30), None, None, Some("mp4")),
        NormalizationSetting::new(None, None, None, None),
    ];
    let normalizer = Normalizer::new(&spawner, &prober, None);
    let report = normalizer.normalize_workspace(dir.path(), &settings)?;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, low_rate);
    assert_eq!(report.processed.len(), 1);
    assert!(!prober.probed_paths().contains(&low_b));
    assert!(
        dir.path()
            .join("s2/__synced__/run/30_unset_unset_mp4/all_cams/raw/camA.mp4")
            .exists()
    );
    Ok(())
}

#[test]
fn test_only_full_camera_sets_are_sources() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let full = add_camera(&synced_raw(dir.path()), "camA.mp4")?;
    add_camera(
        &dir.path().join("s1/__synced__/walk/unset_unset_unset_unset/camA_camB/raw"),
        "camA.mp4",
    )?;
    add_camera(
        &dir.path().join("s1/__synced__/walk/30_1280_720_mp4/all_cams/raw"),
        "camA.mp4",
    )?;

    assert_eq!(find_normalization_sources(dir.path())?, vec![full]);
    Ok(())
}
