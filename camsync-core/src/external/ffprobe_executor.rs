//! FFprobe integration for media analysis.
//!
//! Stream layout, dimensions, durations and audio parameters come from the
//! `ffprobe` crate. Frame rates and display rotation are read with a second,
//! narrower ffprobe call whose JSON is parsed here, since the rotation lives in
//! stream tags or side data depending on the container.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::utils::parse_frame_rate;

use ffprobe::{FfProbeError, ffprobe};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

/// Display properties of a video stream. Width and height are as displayed,
/// i.e. swapped when the stream carries a ±90° rotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    /// Average frame rate; 0.0 when ffprobe reports none
    pub fps: f64,
    pub duration_secs: f64,
}

impl VideoProperties {
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Parameters of the first audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioProperties {
    pub sample_rate: u32,
    pub channels: u32,
}

/// Trait for probing media files.
pub trait FfprobeExecutor {
    /// Display dimensions, frame rate and container duration of the first video stream.
    fn get_video_properties(&self, input_path: &Path) -> CoreResult<VideoProperties>;

    /// Parameters of the first audio stream, or None when the file has no audio.
    fn get_audio_properties(&self, input_path: &Path) -> CoreResult<Option<AudioProperties>>;
}

/// `FfprobeExecutor` backed by the `ffprobe` crate and the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn get_video_properties(&self, input_path: &Path) -> CoreResult<VideoProperties> {
        log::debug!(
            "Running ffprobe (via crate) for video properties on: {}",
            input_path.display()
        );
        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!("ffprobe failed for video properties on {}: {:?}", input_path.display(), err);
            map_ffprobe_error(err, "video properties")
        })?;

        let duration_secs = metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| {
                CoreError::FfprobeParse(format!(
                    "Failed to parse duration from format for {}",
                    input_path.display()
                ))
            })?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                CoreError::VideoInfoError(format!("No video stream found in {}", input_path.display()))
            })?;

        let (width, height) = match (video_stream.width, video_stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
            (w, h) => {
                return Err(CoreError::VideoInfoError(format!(
                    "Invalid or missing dimensions in {}: width={:?}, height={:?}",
                    input_path.display(),
                    w,
                    h
                )));
            }
        };

        let details = probe_stream_details(input_path)?;
        let (width, height) = if is_quarter_turn(details.rotation) {
            log::debug!(
                "{} is rotated by {}°, swapping dimensions",
                input_path.display(),
                details.rotation
            );
            (height, width)
        } else {
            (width, height)
        };

        Ok(VideoProperties {
            width,
            height,
            fps: details.fps.unwrap_or(0.0),
            duration_secs,
        })
    }

    fn get_audio_properties(&self, input_path: &Path) -> CoreResult<Option<AudioProperties>> {
        log::debug!(
            "Running ffprobe (via crate) for audio properties on: {}",
            input_path.display()
        );
        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!("ffprobe failed for audio properties on {}: {:?}", input_path.display(), err);
            map_ffprobe_error(err, "audio properties")
        })?;

        let Some(stream) = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
        else {
            log::warn!("No audio streams found by ffprobe for {}", input_path.display());
            return Ok(None);
        };

        let sample_rate = stream
            .sample_rate
            .as_deref()
            .and_then(|r| r.parse::<u32>().ok())
            .filter(|r| *r > 0)
            .ok_or_else(|| {
                CoreError::FfprobeParse(format!(
                    "Audio stream of {} has no usable sample rate",
                    input_path.display()
                ))
            })?;
        let channels = stream
            .channels
            .filter(|c| *c > 0)
            .map(|c| c as u32)
            .ok_or_else(|| {
                CoreError::FfprobeParse(format!(
                    "Audio stream of {} has no usable channel count",
                    input_path.display()
                ))
            })?;

        Ok(Some(AudioProperties {
            sample_rate,
            channels,
        }))
    }
}

// ============================================================================
// FRAME RATE AND ROTATION
// ============================================================================

#[derive(Debug, Deserialize)]
struct StreamDetailsOutput {
    #[serde(default)]
    streams: Vec<RawStreamDetails>,
}

#[derive(Debug, Deserialize)]
struct RawStreamDetails {
    #[serde(default)]
    avg_frame_rate: Option<String>,
    #[serde(default)]
    r_frame_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<serde_json::Value>,
}

/// Frame rate and rotation of the first video stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamDetails {
    pub fps: Option<f64>,
    /// Rotation in degrees, 0 when absent
    pub rotation: i64,
}

fn is_quarter_turn(rotation: i64) -> bool {
    rotation.rem_euclid(180) == 90
}

/// Parses the JSON printed by the stream-details ffprobe call.
pub fn parse_stream_details(json: &str) -> CoreResult<StreamDetails> {
    let output: StreamDetailsOutput = serde_json::from_str(json)
        .map_err(|e| CoreError::FfprobeParse(format!("stream details: {e}")))?;
    let Some(stream) = output.streams.into_iter().next() else {
        return Ok(StreamDetails::default());
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate));

    let from_side_data = stream
        .side_data_list
        .iter()
        .find_map(|entry| entry.get("rotation").and_then(|r| r.as_f64()))
        .map(|r| r.round() as i64);
    let from_tags = stream.tags.get("rotate").and_then(|r| r.trim().parse::<i64>().ok());

    Ok(StreamDetails {
        fps,
        rotation: from_side_data.or(from_tags).unwrap_or(0),
    })
}

fn probe_stream_details(input_path: &Path) -> CoreResult<StreamDetails> {
    let mut cmd = Command::new("ffprobe");
    cmd.args(["-v", "error", "-select_streams", "v:0"])
        .args([
            "-show_entries",
            "stream=avg_frame_rate,r_frame_rate:stream_tags=rotate:stream_side_data=rotation",
        ])
        .args(["-of", "json"])
        .arg(input_path);

    let output = cmd
        .output()
        .map_err(|e| command_start_error("ffprobe (stream details)", e))?;
    if !output.status.success() {
        return Err(command_failed_error(
            "ffprobe (stream details)",
            output.status,
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }
    parse_stream_details(&String::from_utf8_lossy(&output.stdout))
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::FfprobeParse(format!("ffprobe {context} output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}
