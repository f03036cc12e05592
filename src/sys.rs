//! OS boundary: reaping a child and reading its CPU usage in one call.

use std::io;
use std::process::Child;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub kernel: Duration,
    pub user: Duration,
}

fn duration_from_timeval(tv: libc::timeval) -> Duration {
    let secs = tv.tv_sec.max(0) as u64;
    let micros = tv.tv_usec.clamp(0, 999_999) as u32;
    Duration::new(secs, micros * 1_000)
}

/// Block until `child` terminates and return its exit code together with the
/// kernel/user CPU times it consumed.
///
/// `wait4(2)` reaps the process and fills in the `rusage` atomically, so the
/// exit snapshot needs no second query. Death by signal is mapped to the
/// conventional `128 + signo` code.
pub fn reap(child: &Child) -> io::Result<(i32, CpuTimes)> {
    let pid = child.id() as libc::pid_t;
    let mut status: libc::c_int = 0;
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };

    // SAFETY: the out-pointers are owned locals, and the pid belongs to a
    // child exclusively owned by the caller.
    let ret = unsafe { libc::wait4(pid, &mut status, 0, &mut usage) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }

    let code = if libc::WIFEXITED(status) {
        libc::WEXITSTATUS(status)
    } else if libc::WIFSIGNALED(status) {
        128 + libc::WTERMSIG(status)
    } else {
        crate::record::UNKNOWN_EXIT_CODE
    };

    let times = CpuTimes {
        kernel: duration_from_timeval(usage.ru_stime),
        user: duration_from_timeval(usage.ru_utime),
    };
    Ok((code, times))
}
