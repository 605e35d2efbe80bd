// camsync-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "camsync: multi-camera synchronization and 3D reconstruction pipeline",
    long_about = "Aligns multi-camera recordings on their audio spike, normalizes them, \
                  builds camera-subset setups and drives pose estimation, calibration \
                  and 3D reconstruction."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to WORKSPACE/config.json)
    #[arg(long, global = true, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Directory for run log files (defaults to the workspace)
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Show debug output on the console
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Optional: ntfy topic URL for run notifications (e.g., https://ntfy.sh/your_topic)
    /// Can also be set via the CAMSYNC_NTFY_TOPIC environment variable.
    #[arg(long, global = true, value_name = "TOPIC_URL", env = "CAMSYNC_NTFY_TOPIC")]
    pub ntfy: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronizes, normalizes and splits camera sets, then estimates 2D poses
    Preprocess(PreprocessArgs),
    /// Calibrates the cameras of every session
    Calibrate(WorkspaceArgs),
    /// Runs person association, triangulation and filtering
    Process(WorkspaceArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Preprocess(_) => "preprocess",
            Commands::Calibrate(_) => "calibrate",
            Commands::Process(_) => "process",
        }
    }

    pub fn workspace_args(&self) -> &WorkspaceArgs {
        match self {
            Commands::Preprocess(args) => &args.workspace,
            Commands::Calibrate(args) | Commands::Process(args) => args,
        }
    }
}

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    /// Workspace root holding config.json and the capture sessions
    #[arg(short = 'w', long = "workspace", required = true, value_name = "WORKSPACE")]
    pub workspace: PathBuf,
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Stop after sub-setup generation
    #[arg(long, default_value_t = false)]
    pub skip_pose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preprocess_args() {
        let cli = Cli::parse_from(["camsync", "preprocess", "-w", "data", "--skip-pose"]);
        match cli.command {
            Commands::Preprocess(args) => {
                assert_eq!(args.workspace.workspace, PathBuf::from("data"));
                assert!(args.skip_pose);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "camsync",
            "process",
            "--workspace",
            "data",
            "--verbose",
            "--log-dir",
            "logs",
        ]);
        assert_eq!(cli.command.name(), "process");
        assert_eq!(cli.command.workspace_args().workspace, PathBuf::from("data"));
        assert!(cli.verbose);
        assert_eq!(cli.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_workspace_is_required() {
        assert!(Cli::try_parse_from(["camsync", "calibrate"]).is_err());
    }
}
