use std::process::{Child, Command};
use std::time::Duration;

use crate::manifest::ManifestEntry;
use crate::prelude::*;
use crate::record::{
    ExitSnapshot, ProcessState, RecordError, SUCCESS_EXIT_CODE, TERMINATED_EXIT_CODE,
    UNKNOWN_EXIT_CODE,
};
use crate::sys;

/// Owns one requested launch end to end: the command to run, the live child
/// handle while the process runs, and the exit snapshot once it has been
/// reaped. The child handle is taken out exactly once at reap time, so a
/// double release is impossible.
#[derive(Debug)]
pub struct ProcessRunner {
    group: u64,
    command: String,
    args: String,
    started: bool,
    state: ProcessState,
    child: Option<Child>,
    snapshot: Option<ExitSnapshot>,
}

impl ProcessRunner {
    pub fn new(group: u64, command: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            group,
            command: command.into(),
            args: args.into(),
            started: false,
            state: ProcessState::Pending,
            child: None,
            snapshot: None,
        }
    }

    /// Validate a raw manifest entry into a runnable process.
    ///
    /// The group field must parse as a non-negative integer and the command
    /// must be non-empty. Leading whitespace on the command is trimmed; no
    /// other normalization is applied.
    pub fn from_entry(entry: &ManifestEntry) -> Result<Self, RecordError> {
        let command = entry.command.trim_start();
        if command.is_empty() {
            return Err(RecordError::MissingCommand { line: entry.line });
        }

        let group_field = entry.group.trim();
        if group_field.is_empty() {
            return Err(RecordError::MissingGroup { line: entry.line });
        }
        let group = group_field
            .parse::<u64>()
            .map_err(|_| RecordError::MalformedGroup {
                line: entry.line,
                field: group_field.to_owned(),
            })?;

        Ok(Self::new(group, command, entry.args.clone()))
    }

    /// Spawn the process. A failed spawn is a reportable condition, not an
    /// error: the runner stays `Pending` with `started == false`.
    fn spawn(&mut self) {
        let argv = match shell_words::split(&self.args) {
            Ok(argv) => argv,
            Err(err) => {
                warn!("cannot split arguments for {:?}: {err}", self.command);
                return;
            }
        };

        match Command::new(&self.command).args(argv).spawn() {
            Ok(child) => {
                debug!("started {:?} (pid {})", self.command, child.id());
                self.started = true;
                self.state = ProcessState::Running;
                self.child = Some(child);
            }
            Err(err) => {
                warn!("failed to launch {:?}: {err}", self.command);
            }
        }
    }

    /// Spawn and block until the process has terminated.
    pub fn start_sync(&mut self) {
        self.spawn();
        if self.started {
            self.join();
        }
    }

    /// Spawn without waiting. Completion is observed later via [`Self::join`].
    pub fn start_async(&mut self) {
        self.spawn();
    }

    /// Block until the process exits and cache its exit snapshot. Idempotent:
    /// once the child has been reaped there is nothing left to wait on.
    ///
    /// A failed wait still marks the runner `Exited`, with
    /// [`UNKNOWN_EXIT_CODE`] and zero CPU times, so downstream bookkeeping
    /// always sees a terminal state.
    pub fn join(&mut self) {
        let Some(child) = self.child.take() else {
            return;
        };

        match sys::reap(&child) {
            Ok((code, times)) => {
                self.snapshot = Some(ExitSnapshot {
                    code,
                    kernel: times.kernel,
                    user: times.user,
                });
            }
            Err(err) => {
                error!("failure waiting for {:?} to terminate: {err}", self.command);
                self.snapshot = Some(ExitSnapshot {
                    code: UNKNOWN_EXIT_CODE,
                    kernel: Duration::ZERO,
                    user: Duration::ZERO,
                });
            }
        }
        self.state = ProcessState::Exited;
    }

    /// Forcibly end a running process and record [`TERMINATED_EXIT_CODE`].
    /// Nothing in the normal flow calls this; it exists for external
    /// cancellation.
    pub fn terminate(&mut self) {
        if self.state != ProcessState::Running {
            return;
        }
        if let Some(child) = self.child.as_mut() {
            if let Err(err) = child.kill() {
                warn!("failed to terminate {:?}: {err}", self.command);
            }
        }
        self.join();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.code = TERMINATED_EXIT_CODE;
        }
    }

    pub fn group(&self) -> u64 {
        self.group
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Pid of the live child, while one is held.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(|child| child.id())
    }

    /// Whether the spawn succeeded, regardless of completion.
    pub fn has_run(&self) -> bool {
        self.started
    }

    /// True iff the process started and exited with the success code.
    pub fn succeeded(&self) -> bool {
        self.started && self.exit_code() == Some(SUCCESS_EXIT_CODE)
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.snapshot.map(|s| s.code)
    }

    pub fn kernel_time(&self) -> Option<Duration> {
        self.snapshot.map(|s| s.kernel)
    }

    pub fn user_time(&self) -> Option<Duration> {
        self.snapshot.map(|s| s.user)
    }
}
