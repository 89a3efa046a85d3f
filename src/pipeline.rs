//! Pipeline execution: a single leader process wires up the pipe chain and
//! spawns every stage, then waits only for the last stage and exits with its
//! status. The shell itself only ever waits on the leader.
//!
//! Earlier stages are not waited on by the leader and so remain zombies
//! until the leader itself exits, at which point they are reparented and
//! reaped normally. Only the last stage's status is ever reported; nothing
//! collects the exit status of earlier stages.

use std::os::fd::IntoRawFd;
use std::sync::Arc;

use nix::fcntl::OFlag;
use nix::unistd::{close, fork, pipe2, ForkResult, Pid};

use crate::builtins;
use crate::command::{CommandTree, Segment, Stage};
use crate::executor::{self, Redirs, WaitOutcome};
use crate::job_table::Notifier;

/// Forks a leader process that runs every stage of `stages` connected by
/// pipes, returning the leader's pid immediately to the caller.
pub fn spawn_pipeline(stages: &[Stage]) -> nix::Result<Pid> {
    match unsafe { fork() }? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => run_leader(stages),
    }
}

/// Forks a single stage, wiring up `redirs` in the child before it runs.
/// An `External` stage execs in place; a `BuiltIn` stage runs its built-in
/// logic directly in the forked child and then exits with its status, since
/// there is no real executable on `$PATH` for `cd`/`jobs`/`fg`/etc. Either
/// way the side effects (job table, working directory, history) are local
/// to this forked child and never reach the shell itself.
fn spawn_stage(stage: &Stage, redirs: Redirs) -> nix::Result<Pid> {
    match unsafe { fork() }? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            executor::apply_redirs(redirs);
            match stage {
                Stage::External(segment) => executor::exec_external(segment),
                Stage::BuiltIn(segment) => std::process::exit(run_builtin_in_pipeline(segment)),
            }
        }
    }
}

/// Runs one built-in stage of a pipeline in its own forked process. History
/// replay still needs full re-execution, so this wires up a real `Notifier`
/// and recurses through the same `repl::execute` the top-level loop uses.
fn run_builtin_in_pipeline(segment: &Segment) -> i32 {
    let notify: Notifier = Arc::new(|msg: &str| println!("{msg}"));
    let mut exec_tree = |cmd: &CommandTree| crate::repl::execute(cmd, &notify);
    let (status, _) = builtins::dispatch(segment, &notify, &mut exec_tree);
    status
}

fn run_leader(stages: &[Stage]) -> ! {
    let n = stages.len();
    let mut prev_read = None;
    let mut pids = Vec::with_capacity(n);

    for (i, stage) in stages.iter().enumerate() {
        let mut redirs = Redirs::default();
        redirs.stdin = prev_read;

        let next_pipe = if i + 1 < n {
            match pipe2(OFlag::O_CLOEXEC) {
                Ok((read_fd, write_fd)) => {
                    let read_fd = read_fd.into_raw_fd();
                    let write_fd = write_fd.into_raw_fd();
                    redirs.stdout = Some(write_fd);
                    Some((read_fd, write_fd))
                }
                Err(_) => None,
            }
        } else {
            None
        };

        match spawn_stage(stage, redirs) {
            Ok(pid) => pids.push(pid),
            Err(_) => std::process::exit(1),
        }

        if let Some(fd) = prev_read {
            let _ = close(fd);
        }
        if let Some((_, write_fd)) = next_pipe {
            let _ = close(write_fd);
        }
        prev_read = next_pipe.map(|(read_fd, _)| read_fd);
    }

    let last = *pids.last().expect("a pipeline has at least one stage");
    let code = match executor::wait_foreground(last.as_raw()) {
        Ok(WaitOutcome::Exited(code)) => code,
        Ok(WaitOutcome::Signaled(signal)) => 128 + signal,
        Ok(WaitOutcome::Stopped) | Err(_) => 0,
    };
    std::process::exit(code);
}
