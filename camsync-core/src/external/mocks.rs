// camsync-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// This module is only compiled when the "test-mocks" feature is enabled.
#![cfg(feature = "test-mocks")]

use super::*;
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit, in order, from next_event.
    pub events_to_emit: Rc<RefCell<VecDeque<FfmpegEvent>>>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
    /// Set once kill has been called.
    pub killed: Rc<RefCell<bool>>,
    /// After its events, stay silent this long before closing the stream.
    pub silence: Option<Duration>,
    silence_started: Rc<RefCell<Option<Instant>>>,
}

impl MockFfmpegProcess {
    pub fn new(events: Vec<FfmpegEvent>, exit_status: ExitStatus) -> Self {
        Self {
            events_to_emit: Rc::new(RefCell::new(events.into())),
            exit_status,
            killed: Rc::new(RefCell::new(false)),
            silence: None,
            silence_started: Rc::new(RefCell::new(None)),
        }
    }

    pub fn was_killed(&self) -> bool {
        *self.killed.borrow()
    }
}

impl FfmpegProcess for MockFfmpegProcess {
    fn next_event(&mut self, wait: Duration) -> CoreResult<ProcessEvent> {
        if let Some(event) = self.events_to_emit.borrow_mut().pop_front() {
            return Ok(ProcessEvent::Event(event));
        }
        let Some(silence) = self.silence else {
            return Ok(ProcessEvent::Finished);
        };
        if self.was_killed() {
            return Ok(ProcessEvent::Finished);
        }
        let started = *self
            .silence_started
            .borrow_mut()
            .get_or_insert_with(Instant::now);
        let elapsed = started.elapsed();
        if elapsed >= silence {
            return Ok(ProcessEvent::Finished);
        }
        std::thread::sleep(wait.min(silence - elapsed));
        Ok(ProcessEvent::Idle)
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }

    fn kill(&mut self) -> CoreResult<()> {
        *self.killed.borrow_mut() = true;
        Ok(())
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
    pub create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each spawn consumes the first expectation whose pattern occurs in the
/// space-joined argument list.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
        });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess::new(events, ExitStatus::from_raw(0));
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    /// Expects a process that writes nothing for `silence` and then exits
    /// successfully. Returns a handle sharing the process state.
    pub fn add_silent_expectation(&self, arg_pattern: &str, silence: Duration) -> MockFfmpegProcess {
        let mut process = MockFfmpegProcess::new(Vec::new(), ExitStatus::from_raw(0));
        process.silence = Some(silence);
        self.add_expectation(arg_pattern, Ok(process.clone()), false);
        process
    }

    /// Expects an audio decode whose stdout carries `samples` as f32le.
    pub fn add_audio_expectation(&self, arg_pattern: &str, samples: &[f32]) {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.add_success_expectation(arg_pattern, vec![FfmpegEvent::OutputChunk(bytes)], false);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        // Raw wait status: the exit code lives in the second byte
        let process = MockFfmpegProcess::new(events, ExitStatus::from_raw(exit_code << 8));
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    pub fn remaining_expectations(&self) -> usize {
        self.expectations.borrow().len()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());
        let joined = args.join(" ");

        let mut expectations = self.expectations.borrow_mut();
        let found_index = expectations
            .iter()
            .position(|exp| joined.contains(&exp.arg_pattern));

        let Some(index) = found_index else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
            panic!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
        };

        let expectation = expectations.remove(index);
        log::info!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        match expectation.result {
            Ok(process) => {
                if expectation.create_dummy_output {
                    if let Some(output_path_str) = args.last() {
                        let output_path = PathBuf::from(output_path_str);
                        if let Some(parent) = output_path.parent() {
                            if let Err(e) = std::fs::create_dir_all(parent) {
                                log::error!("MockFfmpegSpawner failed to create parent dir {:?}: {}", parent, e);
                            }
                        }
                        if let Err(e) = std::fs::write(&output_path, b"mock video") {
                            log::error!("MockFfmpegSpawner failed to create dummy output file {:?}: {}", output_path, e);
                        }
                    }
                }
                Ok(process)
            }
            Err(err) => {
                log::warn!(
                    "MockFfmpegSpawner simulating spawn error for pattern '{}': {:?}",
                    expectation.arg_pattern,
                    err
                );
                Err(err)
            }
        }
    }
}

/// Mock implementation of FfprobeExecutor keyed by exact input path.
#[derive(Clone, Default)]
pub struct MockFfprobeExecutor {
    video_properties_results: Rc<RefCell<HashMap<PathBuf, CoreResult<VideoProperties>>>>,
    audio_properties_results: Rc<RefCell<HashMap<PathBuf, Option<AudioProperties>>>>,
    calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add an expected result for get_video_properties for a specific input path.
    pub fn expect_video_properties(&self, input_path: &Path, result: CoreResult<VideoProperties>) {
        self.video_properties_results
            .borrow_mut()
            .insert(input_path.to_path_buf(), result);
    }

    /// Add an expected result for get_audio_properties; None means "no audio stream".
    pub fn expect_audio_properties(&self, input_path: &Path, result: Option<AudioProperties>) {
        self.audio_properties_results
            .borrow_mut()
            .insert(input_path.to_path_buf(), result);
    }

    /// Paths probed so far, in call order.
    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn get_video_properties(&self, input_path: &Path) -> CoreResult<VideoProperties> {
        log::info!("MockFfprobeExecutor::get_video_properties called for: {}", input_path.display());
        self.calls.borrow_mut().push(input_path.to_path_buf());
        match self.video_properties_results.borrow().get(input_path) {
            Some(Ok(props)) => Ok(props.clone()),
            Some(Err(err)) => Err(CoreError::VideoInfoError(format!(
                "Mock ffprobe error for {}: {}",
                input_path.display(),
                err
            ))),
            None => Err(CoreError::VideoInfoError(format!(
                "MockFfprobeExecutor: No expectation set for path {}",
                input_path.display()
            ))),
        }
    }

    fn get_audio_properties(&self, input_path: &Path) -> CoreResult<Option<AudioProperties>> {
        log::info!("MockFfprobeExecutor::get_audio_properties called for: {}", input_path.display());
        self.calls.borrow_mut().push(input_path.to_path_buf());
        match self.audio_properties_results.borrow().get(input_path) {
            Some(result) => Ok(result.clone()),
            None => Err(CoreError::FfprobeParse(format!(
                "MockFfprobeExecutor: No expectation set for path {}",
                input_path.display()
            ))),
        }
    }
}
