//! Built-in command dispatcher.
//!
//! Each built-in runs in the shell process itself (no fork) and reports its
//! exit status plus whether the read-eval loop should record it in history;
//! `history`/`h` are the only built-ins that answer "no" (recording a replay
//! command would otherwise double up on the history listing it just showed).

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::command::{CommandTree, Segment};
use crate::error::ShellError;
use crate::executor::{wait_foreground, WaitOutcome};
use crate::history;
use crate::job_table::{self, Notifier};

/// Runs a single built-in segment. `exec_tree` is how `history`/`h` re-runs
/// a stored command — it closes over the read-eval loop's own dispatch so
/// replay can hit externals, pipelines, or other built-ins alike.
pub fn dispatch(
    segment: &Segment,
    notify: &Notifier,
    exec_tree: &mut dyn FnMut(&CommandTree) -> i32,
) -> (i32, bool) {
    let args = segment.argv();
    match segment.program() {
        "exit" => {
            job_table::global()
                .lock()
                .expect("job table poisoned")
                .kill_all();
            std::process::exit(0)
        }
        "cd" => (cd(args), true),
        "pwd" => (pwd(), true),
        "jobs" => (jobs(), true),
        "fg" => (fg(args), true),
        "bg" => (bg(args, notify), true),
        "kill" => (kill_job(args), true),
        "history" | "h" => (history_cmd(args, exec_tree), false),
        other => unreachable!("dispatch called on a non-builtin program: {other}"),
    }
}

fn expand_tilde(path: &str) -> String {
    if path == "~" {
        std::env::var("HOME").unwrap_or_default()
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{rest}", std::env::var("HOME").unwrap_or_default())
    } else {
        path.to_string()
    }
}

fn cd(args: &[String]) -> i32 {
    let raw = args.get(1).map(String::as_str).unwrap_or("~");
    let target = expand_tilde(raw);
    match std::env::set_current_dir(&target) {
        Ok(()) => 0,
        Err(_) => {
            eprintln!("no such file or directory: {raw}");
            1
        }
    }
}

fn pwd() -> i32 {
    match std::env::current_dir() {
        Ok(cwd) => {
            println!("{}", cwd.display());
            0
        }
        Err(err) => {
            eprintln!("pwd: {err}");
            1
        }
    }
}

fn jobs() -> i32 {
    let table = job_table::global().lock().expect("job table poisoned");
    if !table.is_empty() {
        println!("{}", table.list());
    }
    0
}

fn fg(args: &[String]) -> i32 {
    let target = args.get(1).and_then(|s| s.parse::<usize>().ok());
    let job = job_table::global()
        .lock()
        .expect("job table poisoned")
        .take_stopped(target);
    let Some(job) = job else {
        eprintln!("no stopped processes");
        return 1;
    };
    println!("{}", job.command);
    if let Err(err) = kill(Pid::from_raw(job.pid), Signal::SIGCONT) {
        eprintln!("fg: {err}");
        return 1;
    }
    job_table::set_current_pid(job.pid);
    let outcome = wait_foreground(job.pid);
    job_table::clear_current_pid();
    match outcome {
        Ok(WaitOutcome::Exited(code)) => code,
        Ok(WaitOutcome::Signaled(signal)) => 128 + signal,
        Ok(WaitOutcome::Stopped) => {
            job_table::global()
                .lock()
                .expect("job table poisoned")
                .restore_stopped(job);
            0
        }
        Err(err) => {
            eprintln!("fg: {err}");
            1
        }
    }
}

fn bg(args: &[String], notify: &Notifier) -> i32 {
    let target = args.get(1).and_then(|s| s.parse::<usize>().ok());
    let job = job_table::global()
        .lock()
        .expect("job table poisoned")
        .take_stopped(target);
    let Some(job) = job else {
        eprintln!("no stopped processes");
        return 1;
    };
    if let Err(err) = kill(Pid::from_raw(job.pid), Signal::SIGCONT) {
        eprintln!("bg: {err}");
        return 1;
    }
    let display = job.command.to_string();
    let (number, pid) = job_table::global()
        .lock()
        .expect("job table poisoned")
        .restore_running(job);
    println!("[{number}]\t{display}");
    job_table::spawn_reaper(number, pid, display, notify.clone());
    0
}

fn kill_job(args: &[String]) -> i32 {
    let number = match args.get(1).and_then(|s| s.parse::<usize>().ok()) {
        Some(n) => n,
        None => {
            eprintln!("kill takes exactly 1 argument");
            return 1;
        }
    };
    match job_table::global()
        .lock()
        .expect("job table poisoned")
        .kill(number)
    {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Replays `history n` by releasing the history lock before re-executing the
/// stored command: `exec_tree` runs arbitrary commands, including other
/// built-ins that themselves lock `history::global()` to append, so the lock
/// must not be held across the call or the shell deadlocks on itself.
fn history_cmd(args: &[String], exec_tree: &mut dyn FnMut(&CommandTree) -> i32) -> i32 {
    match args.get(1).and_then(|s| s.parse::<usize>().ok()) {
        Some(n) => {
            let command = history::global()
                .lock()
                .expect("history poisoned")
                .get(n)
                .cloned();
            let Some(command) = command else {
                eprintln!("{}", ShellError::no_record_for(n));
                return 1;
            };
            let status = exec_tree(&command);
            history::global().lock().expect("history poisoned").append(command);
            status
        }
        None => {
            let store = history::global().lock().expect("history poisoned");
            if !store.is_empty() {
                println!("{}", store.render());
            }
            0
        }
    }
}
