//! Process spawning and foreground waiting.
//!
//! Every external command, built-in-in-a-pipeline stage, and pipeline stage
//! goes through the same raw `fork`/`dup2`/`execvp` sequence: no process
//! groups, no terminal control transfer, matching the shell's decision not
//! to manage `setpgid`/`tcsetpgrp` at all (see the design notes on why).

use std::ffi::CString;
use std::os::unix::io::RawFd;

use log::debug;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, ForkResult, Pid};

use crate::command::Segment;
use crate::job_table;

/// The outcome of waiting on a foreground pid.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WaitOutcome {
    Exited(i32),
    Signaled(i32),
    Stopped,
}

/// File descriptors a freshly forked child should wire up before `execvp`.
/// `None` means "leave it alone" (inherit the parent's).
#[derive(Debug, Copy, Clone, Default)]
pub struct Redirs {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    pub stderr: Option<RawFd>,
}

fn to_cstrings(segment: &Segment) -> Vec<CString> {
    segment
        .argv()
        .iter()
        .map(|word| CString::new(word.as_str()).expect("shell words never contain NUL"))
        .collect()
}

/// Wires up the fds a freshly forked child should use before it runs,
/// whether it goes on to `execvp` or to run a built-in directly. `None`
/// means "leave it alone" (inherit the parent's).
pub fn apply_redirs(redirs: Redirs) {
    if let Some(fd) = redirs.stdin {
        let _ = dup2(fd, 0);
        if fd != 0 {
            let _ = close(fd);
        }
    }
    if let Some(fd) = redirs.stdout {
        let _ = dup2(fd, 1);
        if fd != 1 {
            let _ = close(fd);
        }
    }
    if let Some(fd) = redirs.stderr {
        let _ = dup2(fd, 2);
        if fd != 2 {
            let _ = close(fd);
        }
    }
}

/// Execs `segment` in place, replacing the calling process. Never returns:
/// on failure it prints `command not found: <program>` and exits 127.
pub fn exec_external(segment: &Segment) -> ! {
    let args = to_cstrings(segment);
    let program = args[0].clone();
    match execvp(&program, &args) {
        Ok(_) => unreachable!("execvp does not return on success"),
        Err(_) => {
            eprintln!("command not found: {}", program.to_string_lossy());
            std::process::exit(127)
        }
    }
}

/// Forks and execs `segment` with the given fd wiring, returning the child's
/// pid to the caller immediately (non-blocking). The child never returns.
pub fn spawn(segment: &Segment, redirs: Redirs) -> nix::Result<Pid> {
    match unsafe { fork() }? {
        ForkResult::Parent { child } => {
            debug!("executor event=spawn pid={child} program={}", segment);
            Ok(child)
        }
        ForkResult::Child => {
            apply_redirs(redirs);
            exec_external(segment)
        }
    }
}

/// Waits for `pid` with `WUNTRACED`, so a terminal stop is reported directly
/// instead of being inferred from some other signal.
pub fn wait_foreground(pid: i32) -> std::io::Result<WaitOutcome> {
    loop {
        match waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(WaitOutcome::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(WaitOutcome::Signaled(signal as i32))
            }
            Ok(WaitStatus::Stopped(_, _)) => return Ok(WaitOutcome::Stopped),
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(err) => return Err(std::io::Error::from(err)),
        }
    }
}

/// Runs a single external command in the foreground: spawns it, marks it the
/// current foreground pid for the stop-signal handler, waits, then clears
/// the foreground pid again. Returns `(exit_status, stopped_job)` where
/// `stopped_job` is `Some(pid)` if the process was suspended rather than
/// exiting.
pub fn run_foreground(segment: &Segment, redirs: Redirs) -> std::io::Result<(i32, Option<i32>)> {
    let pid = spawn(segment, redirs).map_err(std::io::Error::from)?;
    job_table::set_current_pid(pid.as_raw());
    let outcome = wait_foreground(pid.as_raw());
    job_table::clear_current_pid();
    match outcome? {
        WaitOutcome::Exited(code) => Ok((code, None)),
        WaitOutcome::Signaled(signal) => Ok((128 + signal, None)),
        WaitOutcome::Stopped => Ok((0, Some(pid.as_raw()))),
    }
}
