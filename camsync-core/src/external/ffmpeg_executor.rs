// ============================================================================
// camsync-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes, plus the two ffmpeg jobs the pipeline needs: running a transcode
// to completion and decoding a camera's audio track into per-frame energies.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - run_ffmpeg / decode_audio_energy: Event-driven job runners with timeouts
//   enforced even while ffmpeg is silent

use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::external::ffprobe_executor::AudioProperties;
use crate::sync::energy::EnergyAccumulator;
use crate::terminal;
use crate::utils::parse_ffmpeg_time;

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::path::Path;
use std::process::ExitStatus;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

// --- FFmpeg Execution Abstraction ---

/// Result of polling a running process for its next event.
#[derive(Debug)]
pub enum ProcessEvent {
    Event(FfmpegEvent),
    /// Nothing arrived within the wait period.
    Idle,
    /// The event stream is closed.
    Finished,
}

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Returns the next event, waiting at most `wait` for it.
    fn next_event(&mut self, wait: Duration) -> CoreResult<ProcessEvent>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;

    /// Terminates the process.
    fn kill(&mut self) -> CoreResult<()>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
///
/// Events are read on a forwarding thread so that waiting for them can be
/// bounded even when ffmpeg stops writing anything.
pub struct SidecarProcess {
    child: SidecarChild,
    events: Option<Receiver<FfmpegEvent>>,
}

impl SidecarProcess {
    fn events(&mut self) -> CoreResult<&Receiver<FfmpegEvent>> {
        if self.events.is_none() {
            let iterator = self.child.iter().map_err(|e| {
                log::error!("Failed to get ffmpeg event iterator: {}", e);
                CoreError::OperationFailed(format!("ffmpeg event iterator unavailable: {e}"))
            })?;
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                for event in iterator {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            });
            self.events = Some(rx);
        }
        self.events
            .as_ref()
            .ok_or_else(|| CoreError::OperationFailed("ffmpeg event channel missing".to_string()))
    }
}

impl FfmpegProcess for SidecarProcess {
    fn next_event(&mut self, wait: Duration) -> CoreResult<ProcessEvent> {
        match self.events()?.recv_timeout(wait) {
            Ok(event) => Ok(ProcessEvent::Event(event)),
            Err(RecvTimeoutError::Timeout) => Ok(ProcessEvent::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(ProcessEvent::Finished),
        }
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.child
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.child.kill().map_err(CoreError::Io)
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(|child| SidecarProcess {
                child,
                events: None,
            })
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

// --- Job Runners ---

/// Longest single wait for an event; bounds how late a deadline is noticed.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Drives a spawned process to completion, feeding non-log events to
/// `on_event`. The process is killed once `timeout` has passed, whether or
/// not it is still producing output.
fn drive<P, F>(mut process: P, label: &str, timeout: Option<Duration>, mut on_event: F) -> CoreResult<()>
where
    P: FfmpegProcess,
    F: FnMut(FfmpegEvent),
{
    let start = Instant::now();
    let mut errors: Vec<String> = Vec::new();

    loop {
        let wait = match timeout {
            Some(limit) => {
                let elapsed = start.elapsed();
                if elapsed >= limit {
                    log::error!("{} exceeded its {:?} timeout; killing it", label, limit);
                    if let Err(kill_err) = process.kill() {
                        log::warn!("Failed to kill {}: {}", label, kill_err);
                    }
                    return Err(CoreError::CommandTimeout(label.to_string(), limit));
                }
                (limit - elapsed).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };

        let event = match process.next_event(wait) {
            Ok(ProcessEvent::Event(event)) => event,
            Ok(ProcessEvent::Idle) => continue,
            Ok(ProcessEvent::Finished) => break,
            Err(e) => {
                if let Err(kill_err) = process.kill() {
                    log::warn!("Failed to kill {}: {}", label, kill_err);
                }
                return Err(e);
            }
        };

        match event {
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                log::debug!("[{label}] {line}");
                errors.push(line);
            }
            FfmpegEvent::Log(_, line) => log::trace!("[{label}] {line}"),
            FfmpegEvent::Error(message) => {
                log::warn!("[{label}] {message}");
                errors.push(message);
            }
            other => on_event(other),
        }
    }

    let status = process.wait()?;
    if !status.success() {
        log::error!("{} failed with {}", label, status);
        return Err(command_failed_error(label, status, errors.join("\n")));
    }
    Ok(())
}

/// Runs an ffmpeg command to completion. When the expected output duration is
/// known, progress is shown on the terminal.
pub fn run_ffmpeg<S: FfmpegSpawner>(
    spawner: &S,
    cmd: FfmpegCommand,
    label: &str,
    timeout: Option<Duration>,
    duration_secs: Option<f64>,
) -> CoreResult<()> {
    log::debug!("Running {}: {:?}", label, cmd);
    let process = spawner.spawn(cmd)?;

    let result = drive(process, label, timeout, |event| {
        if let (FfmpegEvent::Progress(progress), Some(total)) = (&event, duration_secs) {
            if let Some(elapsed) = parse_ffmpeg_time(&progress.time) {
                terminal::print_progress_bar(label, elapsed, total);
            }
        }
    });
    terminal::clear_progress_bar();
    result
}

/// Builds the command decoding the first audio stream to raw f32 samples on stdout.
pub fn audio_decode_command(input_path: &Path, audio: &AudioProperties) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.input(input_path.to_string_lossy().as_ref());
    cmd.arg("-vn");
    cmd.args(["-map", "0:a:0"]);
    cmd.args(["-f", "f32le", "-acodec", "pcm_f32le"]);
    cmd.arg("-ar").arg(audio.sample_rate.to_string());
    cmd.arg("-ac").arg(audio.channels.to_string());
    cmd.output("-");
    cmd
}

/// Decodes the audio of `input_path` at its native rate and channel count and
/// returns the energy of every audio frame.
pub fn decode_audio_energy<S: FfmpegSpawner>(
    spawner: &S,
    input_path: &Path,
    audio: &AudioProperties,
    timeout: Option<Duration>,
) -> CoreResult<Vec<f64>> {
    log::debug!(
        "Decoding audio of {} ({} Hz, {} channel(s))",
        input_path.display(),
        audio.sample_rate,
        audio.channels
    );

    let label = "ffmpeg (audio decode)";
    let process = spawner.spawn(audio_decode_command(input_path, audio))?;

    let mut accumulator = EnergyAccumulator::new(audio.channels as usize);
    drive(process, label, timeout, |event| {
        if let FfmpegEvent::OutputChunk(bytes) = event {
            accumulator.push_bytes(&bytes);
        }
    })?;

    let energy = accumulator.finish();
    log::debug!(
        "Decoded {} audio frame(s) from {}",
        energy.len(),
        input_path.display()
    );
    Ok(energy)
}
