//! Core library for preparing multi-camera recordings for 3D motion
//! reconstruction.
//!
//! The pipeline aligns independently started cameras on the audio spike of
//! a clap, re-encodes the aligned sets to the requested frame rate,
//! resolution and container, materializes every camera subset, runs 2D pose
//! estimation and finally drives the external reconstruction stages with
//! bounded triangulation retries.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use camsync_core::external::{CrateFfprobeExecutor, SidecarSpawner};
//! use camsync_core::{SyncEngine, WorkspaceConfig};
//! use std::path::Path;
//!
//! let workspace = Path::new("/data/campaign");
//! let config = WorkspaceConfig::load_from_workspace(workspace).unwrap();
//! config.validate().unwrap();
//!
//! let spawner = SidecarSpawner;
//! let prober = CrateFfprobeExecutor::new();
//! let engine = SyncEngine::new(&spawner, &prober, config.tools.timeout());
//! let report = engine.sync_workspace(workspace).unwrap();
//! println!("{}", report);
//! ```

pub mod artifact;
pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod lock;
pub mod normalize;
pub mod notifications;
pub mod orchestrator;
pub mod pose;
pub mod report;
pub mod subsetup;
pub mod sync;
pub mod temp_files;
pub mod terminal;
pub mod utils;

// Re-exports for public API
pub use artifact::{ArtifactPath, Stage};
pub use config::{NormalizationSetting, RetryPolicy, WorkspaceConfig};
pub use error::{CoreError, CoreResult};
pub use lock::WorkspaceLock;
pub use normalize::{NormalizeOutcome, Normalizer};
pub use notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
pub use orchestrator::{
    CommandBackend, Orchestrator, ReconstructionBackend, StageOutcome, SubprojectConfig,
};
pub use pose::{CommandPoseEstimator, PoseEstimator, estimate_workspace};
pub use report::BatchReport;
pub use subsetup::create_subsetups_in_workspace;
pub use sync::{SetOutcome, SyncEngine};
pub use utils::{format_duration, parse_ffmpeg_time};
