use crate::prelude::*;
use crate::process::ProcessRunner;
use crate::record::{LaunchError, LaunchErrorKind, ReportRow};

/// An unordered set of processes sharing one launch group number. The group
/// is the synchronization boundary: members race each other freely, and the
/// group only returns once every started member has terminated.
pub struct LaunchGroup {
    group: u64,
    members: Vec<ProcessRunner>,
}

impl LaunchGroup {
    pub fn new(group: u64) -> Self {
        Self {
            group,
            members: Vec::new(),
        }
    }

    pub fn group(&self) -> u64 {
        self.group
    }

    pub fn add(&mut self, runner: ProcessRunner) {
        debug_assert_eq!(runner.group(), self.group);
        self.members.push(runner);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Start every member without waiting, then block until all members that
    /// actually started have exited. There is no timeout: a process that
    /// never exits stalls the run.
    ///
    /// Members whose spawn failed are excluded from the join set and surface
    /// as "not run" errors at report time; they are never retried.
    pub fn run_all_concurrently(&mut self) {
        for runner in &mut self.members {
            runner.start_async();
        }

        // The join set is fixed before the first wait begins.
        for runner in &mut self.members {
            if runner.has_run() {
                runner.join();
            }
        }
        debug!("launch group {} complete", self.group);
    }

    /// Start members one at a time, each blocking to completion.
    pub fn run_all_sync(&mut self) {
        for runner in &mut self.members {
            runner.start_sync();
        }
        debug!("launch group {} complete", self.group);
    }

    /// Append one report row per member that started.
    pub fn collect_rows(&self, rows: &mut Vec<ReportRow>) {
        for runner in &self.members {
            if !runner.has_run() {
                continue;
            }
            rows.push(ReportRow {
                group: self.group,
                kernel: runner.kernel_time().unwrap_or_default(),
                user: runner.user_time().unwrap_or_default(),
                exit_code: runner.exit_code().unwrap_or_default(),
                command: runner.command().to_owned(),
                args: runner.args().to_owned(),
            });
        }
    }

    /// Append one error per member that never started or exited non-zero.
    pub fn collect_errors(&self, errors: &mut Vec<LaunchError>) {
        for runner in &self.members {
            let kind = if !runner.has_run() {
                LaunchErrorKind::NotStarted
            } else if !runner.succeeded() {
                LaunchErrorKind::NonZeroExit(runner.exit_code().unwrap_or_default())
            } else {
                continue;
            };
            errors.push(LaunchError {
                group: self.group,
                command: runner.command().to_owned(),
                args: runner.args().to_owned(),
                kind,
            });
        }
    }
}
