// ============================================================================
// camsync-core/src/artifact.rs
// ============================================================================
//
// ARTIFACT PATHS: Typed Descriptors for Derived Workspace Files
//
// Every derived artifact lives at a path computed from its source path by
// swapping well-known segments: the stage marker (`original` -> `__synced__`),
// the setting placeholder (`unset_unset_unset_unset` -> `{fps}_{a}_{b}_{fmt}`)
// and the camera-set segment (`all_cams` -> `camA_camB`). ArtifactPath keeps
// those segments explicit; the directory layout is just its serialization.
//
// KEY COMPONENTS:
// - Stage: Which tree an artifact belongs to
// - ArtifactPath: Root + stage + relative segments, with builders

use crate::config::{NormalizationSetting, PLACEHOLDER_SEGMENT};

use std::path::{Component, Path, PathBuf};

// ============================================================================
// LAYOUT CONSTANTS
// ============================================================================

/// Marker directory holding raw footage.
pub const ORIGINAL_MARKER: &str = "original";

/// Marker directory holding synchronized and derived footage.
pub const SYNCED_MARKER: &str = "__synced__";

/// Directory holding one video per camera.
pub const RAW_DIR: &str = "raw";

/// Camera-set segment for the full camera set.
pub const ALL_CAMS: &str = "all_cams";

/// Directory holding calibration footage and results.
pub const CALIBRATION_DIR: &str = "Calibration";

/// Calibration result file inside `Calibration`.
pub const CALIBRATION_FILE: &str = "Calib_board.toml";

/// Directory holding 2D pose estimation output.
pub const POSE_DIR: &str = "pose";

/// Directory holding person association output.
pub const POSE_ASSOCIATED_DIR: &str = "pose-associated";

/// Directory holding triangulation and filtering output, plus audit files.
pub const POSE_3D_DIR: &str = "pose-3d";

/// Directories that live directly inside a camera-set directory.
const DATA_DIRS: [&str; 4] = [RAW_DIR, POSE_DIR, POSE_ASSOCIATED_DIR, POSE_3D_DIR];

// ============================================================================
// STAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Original,
    Synced,
}

impl Stage {
    pub fn marker(&self) -> &'static str {
        match self {
            Stage::Original => ORIGINAL_MARKER,
            Stage::Synced => SYNCED_MARKER,
        }
    }

    fn from_marker(segment: &str) -> Option<Self> {
        match segment {
            ORIGINAL_MARKER => Some(Stage::Original),
            SYNCED_MARKER => Some(Stage::Synced),
            _ => None,
        }
    }
}

// ============================================================================
// ARTIFACT PATH
// ============================================================================

/// A path inside a capture session, split at its stage marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath {
    root: PathBuf,
    stage: Stage,
    segments: Vec<String>,
}

impl ArtifactPath {
    pub fn new(root: impl Into<PathBuf>, stage: Stage, segments: Vec<String>) -> Self {
        Self {
            root: root.into(),
            stage,
            segments,
        }
    }

    /// Splits `path` at its first stage marker. Returns None when the path has
    /// no marker or a segment after the marker is not valid UTF-8.
    pub fn parse(path: &Path) -> Option<Self> {
        let mut root = PathBuf::new();
        let mut components = path.components();

        let stage = loop {
            let component = components.next()?;
            if let Component::Normal(name) = component {
                if let Some(stage) = name.to_str().and_then(Stage::from_marker) {
                    break stage;
                }
            }
            root.push(component.as_os_str());
        };

        let segments = components
            .map(|c| c.as_os_str().to_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()?;

        Some(Self {
            root,
            stage,
            segments,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn contains_segment(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s == name)
    }

    /// The same artifact in another stage tree.
    pub fn to_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }

    pub fn to_path(&self) -> PathBuf {
        let mut path = self.root.join(self.stage.marker());
        path.extend(&self.segments);
        path
    }

    /// Position of the setting segment. The placeholder is matched
    /// literally. A concrete setting sits two levels above the first data
    /// directory (`{setting}/{camera set}/raw`); paths that stop above the
    /// data directories use the last segment that reads as a setting.
    fn setting_index(&self) -> Option<usize> {
        if let Some(index) = self.segments.iter().position(|s| s == PLACEHOLDER_SEGMENT) {
            return Some(index);
        }
        let is_setting =
            |index: &usize| NormalizationSetting::parse_segment(&self.segments[*index]).is_some();
        match self.segments.iter().position(|s| DATA_DIRS.contains(&s.as_str())) {
            Some(data) => data.checked_sub(2).filter(is_setting),
            None => (0..self.segments.len()).rev().find(is_setting),
        }
    }

    /// The normalization setting segment, if the path has one.
    pub fn setting(&self) -> Option<NormalizationSetting> {
        self.setting_index()
            .and_then(|i| NormalizationSetting::parse_segment(&self.segments[i]))
    }

    /// True when the path lies under the all-unset placeholder segment.
    pub fn is_placeholder(&self) -> bool {
        self.setting().is_some_and(|s| s.is_placeholder())
    }

    /// Replaces the placeholder segment with `setting`'s segment and, when
    /// the setting names a format, the file extension with that format.
    /// Returns None unless the path contains the placeholder.
    pub fn with_setting(&self, setting: &NormalizationSetting) -> Option<Self> {
        let index = self.setting_index()?;
        if !self.is_placeholder() {
            return None;
        }

        let mut segments = self.segments.clone();
        segments[index] = setting.segment();

        if let Some(format) = setting.format.as_deref() {
            let last = segments.len() - 1;
            if last > index {
                let stem = Path::new(&segments[last])
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)?;
                segments[last] = format!("{stem}.{format}");
            }
        }

        Some(Self { segments, ..self.clone() })
    }

    /// The camera-set segment, which is `all_cams` or a sub-setup name.
    /// It is the segment following the setting segment.
    pub fn camera_set(&self) -> Option<&str> {
        let index = self.setting_index()?;
        self.segments.get(index + 1).map(String::as_str)
    }

    /// Replaces the `all_cams` segment with `name`.
    pub fn with_camera_set(&self, name: &str) -> Option<Self> {
        let index = self.segments.iter().position(|s| s == ALL_CAMS)?;
        let mut segments = self.segments.clone();
        segments[index] = name.to_string();
        Some(Self { segments, ..self.clone() })
    }
}
