//! Normalization settings and their path-segment encoding.
//!
//! A setting is written into artifact paths as `{fps}_{a}_{b}_{format}`,
//! where unconstrained parts are the literal `unset` and the two resolution
//! values are ordered larger first when both are given. An all-`unset`
//! segment is the placeholder that marks raw (un-normalized) synced material.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal used for an unconstrained part of a setting segment.
pub const UNSET: &str = "unset";

/// The segment produced by a fully unconstrained setting.
pub const PLACEHOLDER_SEGMENT: &str = "unset_unset_unset_unset";

/// A target for video normalization. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizationSetting {
    /// Target frame rate in frames per second
    #[serde(default)]
    pub fps: Option<u32>,

    /// Requested `[height, width]`; either may be null
    #[serde(default)]
    pub resolution: [Option<u32>; 2],

    /// Target container format, which also becomes the file extension
    #[serde(default)]
    pub format: Option<String>,
}

impl NormalizationSetting {
    pub fn new(fps: Option<u32>, height: Option<u32>, width: Option<u32>, format: Option<&str>) -> Self {
        Self {
            fps,
            resolution: [height, width],
            format: format.map(str::to_string),
        }
    }

    pub fn height(&self) -> Option<u32> {
        self.resolution[0]
    }

    pub fn width(&self) -> Option<u32> {
        self.resolution[1]
    }

    /// True when no part of the setting is constrained.
    pub fn is_placeholder(&self) -> bool {
        self.fps.is_none() && self.height().is_none() && self.width().is_none() && self.format.is_none()
    }

    /// Encodes the setting as a path segment.
    pub fn segment(&self) -> String {
        let part = |v: Option<u32>| v.map_or_else(|| UNSET.to_string(), |v| v.to_string());
        let (first, second) = match (self.height(), self.width()) {
            (Some(h), Some(w)) if w > h => (Some(w), Some(h)),
            (h, w) => (h, w),
        };
        format!(
            "{}_{}_{}_{}",
            part(self.fps),
            part(first),
            part(second),
            self.format.as_deref().unwrap_or(UNSET)
        )
    }

    /// Parses a path segment back into a setting.
    ///
    /// Because the resolution pair is stored larger-first, the parsed
    /// `[height, width]` order may differ from the configured one; callers
    /// only compare segments, never parsed resolutions.
    pub fn parse_segment(segment: &str) -> Option<Self> {
        let parts: Vec<&str> = segment.split('_').collect();
        if parts.len() != 4 {
            return None;
        }

        let number = |s: &str| -> Option<Option<u32>> {
            if s == UNSET {
                Some(None)
            } else {
                s.parse::<u32>().ok().map(Some)
            }
        };

        let fps = number(parts[0])?;
        let first = number(parts[1])?;
        let second = number(parts[2])?;
        let format = match parts[3] {
            UNSET => None,
            f if is_valid_format(f) => Some(f.to_string()),
            _ => return None,
        };

        Some(Self {
            fps,
            resolution: [first, second],
            format,
        })
    }
}

impl fmt::Display for NormalizationSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment())
    }
}

/// A container format must be usable both as a path part and as an extension.
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && format != UNSET && format.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_segment() {
        let setting = NormalizationSetting::default();
        assert!(setting.is_placeholder());
        assert_eq!(setting.segment(), PLACEHOLDER_SEGMENT);
    }

    #[test]
    fn test_segment_orders_resolution_larger_first() {
        let landscape = NormalizationSetting::new(Some(30), Some(720), Some(1280), Some("mp4"));
        assert_eq!(landscape.segment(), "30_1280_720_mp4");

        let portrait = NormalizationSetting::new(Some(30), Some(1280), Some(720), Some("mp4"));
        assert_eq!(portrait.segment(), "30_1280_720_mp4");
    }

    #[test]
    fn test_segment_with_partial_resolution() {
        let setting = NormalizationSetting::new(None, None, Some(960), None);
        assert_eq!(setting.segment(), "unset_unset_960_unset");
    }

    #[test]
    fn test_parse_segment() {
        let parsed = NormalizationSetting::parse_segment("25_unset_960_avi").unwrap();
        assert_eq!(parsed.fps, Some(25));
        assert_eq!(parsed.resolution, [None, Some(960)]);
        assert_eq!(parsed.format.as_deref(), Some("avi"));

        assert!(NormalizationSetting::parse_segment(PLACEHOLDER_SEGMENT).unwrap().is_placeholder());
    }

    #[test]
    fn test_parse_rejects_other_segments() {
        assert!(NormalizationSetting::parse_segment("all_cams").is_none());
        assert!(NormalizationSetting::parse_segment("camA_camB_camC_camD").is_none());
        assert!(NormalizationSetting::parse_segment("30_x_720_mp4").is_none());
        assert!(NormalizationSetting::parse_segment("raw").is_none());
    }

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{"fps": 30, "resolution": [null, 960], "format": "mp4"}"#;
        let setting: NormalizationSetting = serde_json::from_str(json).unwrap();
        assert_eq!(setting.fps, Some(30));
        assert_eq!(setting.height(), None);
        assert_eq!(setting.width(), Some(960));

        let empty: NormalizationSetting = serde_json::from_str("{}").unwrap();
        assert!(empty.is_placeholder());
    }
}
