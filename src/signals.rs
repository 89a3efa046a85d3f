//! Signal installation for `SIGINT` and `SIGTSTP`.
//!
//! Both handlers are plain `extern "C" fn`s doing only async-signal-safe
//! work. `SIGINT`'s handler is a deliberate no-op: its only job is to stop
//! the default disposition (process termination) from killing the shell
//! itself, since the shell never separates its own process group from a
//! foreground child's (no `setpgid`). `SIGTSTP`'s handler calls a single
//! `kill` syscall through `job_table::stop_foreground`. Anything heavier
//! (job-table bookkeeping, prompt redraw) happens later in the read-eval
//! loop, which observes the stop directly via `waitpid`'s `WUNTRACED` result
//! rather than through any flag set here.

use std::io;

use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::job_table;

extern "C" fn handle_sigint(_: libc::c_int) {}

extern "C" fn handle_sigtstp(_: libc::c_int) {
    let _ = job_table::stop_foreground();
}

/// Installs the shell's top-level handlers. Call once, before the
/// read-eval loop starts.
pub fn install_signal_handlers() -> io::Result<()> {
    let sigint_action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    install_action(Signal::SIGINT, &sigint_action)?;

    let sigtstp_action = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    install_action(Signal::SIGTSTP, &sigtstp_action)?;

    debug!("signal event=install sigint=ignore sigtstp=forward");
    Ok(())
}

fn install_action(signal: Signal, action: &SigAction) -> io::Result<()> {
    unsafe { sigaction(signal, action) }
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}
