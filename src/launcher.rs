use std::collections::BTreeMap;

use crate::group::LaunchGroup;
use crate::manifest::ManifestEntry;
use crate::prelude::*;
use crate::process::ProcessRunner;
use crate::record::{RecordError, RunReport};

/// Owns every launch group, keyed by group number. The `BTreeMap` gives the
/// one ordering contract the launcher provides: groups execute in strictly
/// ascending key order, and group N is fully terminal before group N+1
/// spawns anything.
#[derive(Default)]
pub struct Launcher {
    groups: BTreeMap<u64, LaunchGroup>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a manifest entry into its launch group, creating the group on
    /// first use. Malformed entries are returned as errors for the caller to
    /// diagnose and drop; they never abort the batch.
    pub fn add(&mut self, entry: &ManifestEntry) -> Result<(), RecordError> {
        let runner = ProcessRunner::from_entry(entry)?;
        self.groups
            .entry(runner.group())
            .or_insert_with(|| LaunchGroup::new(runner.group()))
            .add(runner);
        Ok(())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn process_count(&self) -> usize {
        self.groups.values().map(LaunchGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Execute every group in ascending group-number order, blocking on each
    /// before moving to the next. A group made entirely of failures still
    /// lets the following groups run.
    pub fn run_all(&mut self, sequential: bool) {
        for (number, group) in &mut self.groups {
            info!("launch group {number}: starting {} process(es)", group.len());
            if sequential {
                group.run_all_sync();
            } else {
                group.run_all_concurrently();
            }
        }
    }

    /// Aggregate per-process outcomes, groups in ascending order: one row
    /// per started member, one error per member that never started or
    /// exited non-zero.
    pub fn report(&self) -> RunReport {
        let mut report = RunReport::default();
        for group in self.groups.values() {
            group.collect_rows(&mut report.rows);
        }
        for group in self.groups.values() {
            group.collect_errors(&mut report.errors);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LaunchErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn entry(line: usize, group: &str, command: &str, args: &str) -> ManifestEntry {
        ManifestEntry {
            line,
            group: group.to_owned(),
            command: command.to_owned(),
            args: args.to_owned(),
        }
    }

    fn nanos_in(path: &std::path::Path) -> Vec<u128> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.trim().parse().unwrap())
            .collect()
    }

    #[test]
    fn test_equal_group_numbers_share_a_group() {
        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "2", "true", "")).unwrap();
        launcher.add(&entry(2, "1", "true", "")).unwrap();
        launcher.add(&entry(3, "2", "false", "")).unwrap();

        assert_eq!(launcher.group_count(), 2);
        assert_eq!(launcher.process_count(), 3);
    }

    #[test]
    fn test_malformed_entry_is_rejected_without_creating_a_group() {
        let mut launcher = Launcher::new();
        let err = launcher.add(&entry(5, "x", "foo", "")).unwrap_err();
        assert_eq!(
            err,
            RecordError::MalformedGroup {
                line: 5,
                field: "x".into()
            }
        );
        assert!(launcher.is_empty());
    }

    #[test]
    fn test_single_record_run_reports_one_success_row() {
        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "1", "true", "")).unwrap();
        launcher.run_all(false);

        let report = launcher.report();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].group, 1);
        assert_eq!(report.rows[0].exit_code, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_failed_spawn_is_reported_as_not_run() {
        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "2", "nosuchapp", "")).unwrap();
        launcher.run_all(false);

        let report = launcher.report();
        assert!(report.rows.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].group, 2);
        assert_eq!(report.errors[0].command, "nosuchapp");
        assert_eq!(report.errors[0].kind, LaunchErrorKind::NotStarted);
    }

    #[test]
    fn test_groups_execute_in_ascending_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");

        let mut launcher = Launcher::new();
        // Group 1 members record their finish time after sleeping; the group
        // 2 member records its start time immediately. Added out of order on
        // purpose: execution order must come from the group number alone.
        launcher
            .add(&entry(1, "2", "sh", &format!("-c 'date +%s%N > {}'", c.display())))
            .unwrap();
        launcher
            .add(&entry(2, "1", "sh", &format!("-c 'sleep 0.3; date +%s%N > {}'", a.display())))
            .unwrap();
        launcher
            .add(&entry(3, "1", "sh", &format!("-c 'sleep 0.3; date +%s%N > {}'", b.display())))
            .unwrap();
        launcher.run_all(false);

        let finish_a = nanos_in(&a)[0];
        let finish_b = nanos_in(&b)[0];
        let start_c = nanos_in(&c)[0];
        assert!(start_c > finish_a, "group 2 started before group 1 finished");
        assert!(start_c > finish_b, "group 2 started before group 1 finished");
    }

    #[test]
    fn test_failing_group_does_not_abort_later_groups() {
        let dir = TempDir::new().unwrap();
        let witness = dir.path().join("ran");

        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "1", "nosuchapp", "")).unwrap();
        launcher
            .add(&entry(2, "2", "sh", &format!("-c 'echo ok > {}'", witness.display())))
            .unwrap();
        launcher.run_all(false);

        assert!(witness.exists(), "group 2 did not run after group 1 failed");
        let report = launcher.report();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_every_accepted_record_is_accounted_for() {
        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "1", "true", "")).unwrap();
        launcher.add(&entry(2, "1", "false", "")).unwrap();
        launcher.add(&entry(3, "2", "nosuchapp", "")).unwrap();
        launcher.add(&entry(4, "3", "true", "")).unwrap();
        launcher.run_all(false);

        let report = launcher.report();
        let not_started = report
            .errors
            .iter()
            .filter(|e| e.kind == LaunchErrorKind::NotStarted)
            .count();
        // Started members each have a row; never-started members each have a
        // NotStarted error. Together they cover all accepted records.
        assert_eq!(report.rows.len() + not_started, 4);
    }

    #[test]
    fn test_report_rows_are_ordered_by_group() {
        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "3", "true", "")).unwrap();
        launcher.add(&entry(2, "1", "true", "")).unwrap();
        launcher.add(&entry(3, "2", "true", "")).unwrap();
        launcher.run_all(false);

        let groups: Vec<u64> = launcher.report().rows.iter().map(|r| r.group).collect();
        assert_eq!(groups, vec![1, 2, 3]);
    }

    #[test]
    fn test_sequential_mode_runs_the_whole_batch() {
        let mut launcher = Launcher::new();
        launcher.add(&entry(1, "1", "true", "")).unwrap();
        launcher.add(&entry(2, "1", "sh", "-c 'exit 4'")).unwrap();
        launcher.run_all(true);

        let report = launcher.report();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, LaunchErrorKind::NonZeroExit(4));
    }
}
