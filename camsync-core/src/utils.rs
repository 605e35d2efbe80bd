//! Utility functions for formatting and path handling.
//!
//! General-purpose helpers used throughout the camsync-core library.

use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Parses an ffprobe frame rate such as `30000/1001` or `25`. Returns None for `0/0`.
#[must_use]
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Formats a frame rate for an ffmpeg `fps` filter: integral rates without decimals.
#[must_use]
pub fn format_frame_rate(fps: f64) -> String {
    if (fps - fps.round()).abs() < 1e-9 {
        format!("{}", fps.round() as u64)
    } else {
        format!("{fps:.3}")
    }
}

/// Safely extracts filename from a path with consistent error handling.
pub fn get_filename_safe(path: &Path) -> CoreResult<String> {
    Ok(path
        .file_name()
        .ok_or_else(|| {
            CoreError::PathError(format!("Failed to get filename for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Extracts the file stem, which is the camera identifier for camera files.
pub fn get_file_stem_safe(path: &Path) -> CoreResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::PathError(format!("Failed to get a UTF-8 file stem for {}", path.display()))
        })
}
