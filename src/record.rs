use std::time::Duration;

use thiserror::Error;

/// Canonical success exit code of a launched application.
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Sentinel recorded when the OS-level wait itself failed: the process is
/// still bookkept as exited, but its real exit code is unknown.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Exit code recorded for a process that was forcibly terminated.
pub const TERMINATED_EXIT_CODE: i32 = 128 + libc::SIGKILL;

/// Lifecycle of one launch attempt. A failed spawn stays `Pending` forever;
/// `Exited` is the only other terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Pending,
    Running,
    Exited,
}

/// Snapshot taken once when the process is reaped, then read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSnapshot {
    pub code: i32,
    pub kernel: Duration,
    pub user: Duration,
}

/// A manifest record that cannot be turned into a runnable process.
/// These are dropped with a diagnostic; parsing continues with the next line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: no application found")]
    MissingCommand { line: usize },
    #[error("line {line}: no launch group found")]
    MissingGroup { line: usize },
    #[error("line {line}: launch group {field:?} is not a number")]
    MalformedGroup { line: usize, field: String },
}

/// One report row per process that actually started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub group: u64,
    pub kernel: Duration,
    pub user: Duration,
    pub exit_code: i32,
    pub command: String,
    pub args: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchErrorKind {
    /// The spawn itself failed; the application never ran.
    NotStarted,
    /// The application ran but exited with a non-success code.
    NonZeroExit(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchError {
    pub group: u64,
    pub command: String,
    pub args: String,
    pub kind: LaunchErrorKind,
}

/// Aggregated outcome of a full run, in ascending group order.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub rows: Vec<ReportRow>,
    pub errors: Vec<LaunchError>,
}
