//! Target geometry and frame-rate rules for normalization.

use crate::config::NormalizationSetting;
use crate::external::VideoProperties;

/// Target `(height, width)` for a source of `source_height` x `source_width`.
///
/// A missing axis is derived from the given one through the source aspect
/// ratio (truncating). The result keeps the source orientation: a portrait
/// source yields height >= width, any other source yields width >= height.
pub fn compute_target_resolution(
    source_height: u32,
    source_width: u32,
    requested: [Option<u32>; 2],
) -> (u32, u32) {
    let aspect = f64::from(source_width) / f64::from(source_height);
    let (height, width) = match requested {
        [None, None] => (source_height, source_width),
        [Some(h), Some(w)] => (h, w),
        [Some(h), None] => (h, (f64::from(h) * aspect) as u32),
        [None, Some(w)] => ((f64::from(w) / aspect) as u32, w),
    };

    let portrait = source_height > source_width;
    if (portrait && width > height) || (!portrait && height > width) {
        (width, height)
    } else {
        (height, width)
    }
}

/// Floors a dimension to an even value, as libx264 with yuv420p requires.
pub fn even_floor(value: u32) -> u32 {
    (value - value % 2).max(2)
}

/// Frame rate and dimensions a source is normalized to.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationTarget {
    pub fps: f64,
    pub height: u32,
    pub width: u32,
}

impl NormalizationTarget {
    /// Resolves a setting against the probed source.
    pub fn resolve(source: &VideoProperties, setting: &NormalizationSetting) -> Self {
        let (height, width) =
            compute_target_resolution(source.height, source.width, setting.resolution);
        Self {
            fps: setting.fps.map_or(source.fps, f64::from),
            height,
            width,
        }
    }

    /// Describes why the target would upsample the source, if it would.
    pub fn upsampling_violation(&self, source: &VideoProperties) -> Option<String> {
        if source.fps.ceil() < self.fps {
            return Some(format!(
                "target frame rate {} exceeds source frame rate {:.3}",
                self.fps, source.fps
            ));
        }
        if self.width > source.width || self.height > source.height {
            return Some(format!(
                "target resolution {}x{} exceeds source resolution {}x{}",
                self.width, self.height, source.width, source.height
            ));
        }
        None
    }

    /// Dimensions actually passed to the encoder.
    pub fn encoded_size(&self) -> (u32, u32) {
        (even_floor(self.width), even_floor(self.height))
    }
}
