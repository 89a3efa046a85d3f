//! The read-eval loop: reads a line, tokenizes it, builds a command tree,
//! dispatches to the built-in table or the process/pipeline executor, and
//! keeps the job table and history store current.

use std::io;
use std::sync::{Arc, Mutex};

use log::debug;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Editor, ExternalPrinter};

use crate::builtins;
use crate::command::CommandTree;
use crate::config::Config;
use crate::executor::{self, Redirs, WaitOutcome};
use crate::history;
use crate::job_table::{self, Notifier};
use crate::pipeline;
use crate::prompt;
use crate::tokenizer;

pub struct Shell {
    editor: Editor<(), DefaultHistory>,
    config: Config,
    notify: Notifier,
    interactive: bool,
    pub last_status: i32,
}

impl Shell {
    pub fn new(config: Config) -> io::Result<Self> {
        let mut editor: Editor<(), DefaultHistory> =
            Editor::new().map_err(io::Error::other)?;
        if let Some(path) = &config.histfile {
            let _ = editor.load_history(path);
        }
        let notify = make_notifier(&mut editor);
        let interactive = atty_stdin();
        Ok(Shell {
            editor,
            config,
            notify,
            interactive,
            last_status: 0,
        })
    }

    /// Runs one iteration: prompt, read, tokenize, dispatch. Returns `false`
    /// when the loop should stop (end-of-input).
    pub fn run_once(&mut self) -> io::Result<bool> {
        let prompt = prompt::render(&self.config);
        let line = match self.read_line(&prompt)? {
            Some(line) => line,
            None => {
                if let Some(path) = &self.config.histfile {
                    let _ = self.editor.save_history(path);
                }
                job_table::global()
                    .lock()
                    .expect("job table poisoned")
                    .kill_all();
                return Ok(false);
            }
        };

        if !self.interactive {
            println!("{line}");
        }

        let (segments, background) = match tokenizer::tokenize(&line) {
            Ok(v) => v,
            Err(err) => {
                eprintln!("{err}");
                self.last_status = 2;
                return Ok(true);
            }
        };

        let Some(tree) = CommandTree::build(segments, background) else {
            return Ok(true);
        };

        // `exit` is handled here rather than falling through to
        // `builtins::dispatch` because saving `CRSH_HISTFILE` needs this
        // struct's own `editor`/`config`, which built-ins never have access
        // to; this keeps `exit`'s graceful-shutdown behavior identical to
        // the end-of-input path above. `builtins::dispatch` still has its
        // own (history-file-less) `exit` arm for the case where `exit` runs
        // as a pipeline stage in a forked child, which cannot reach here.
        if let CommandTree::BuiltIn(segment, _) = &tree {
            if segment.program() == "exit" {
                if let Some(path) = &self.config.histfile {
                    let _ = self.editor.save_history(path);
                }
                job_table::global()
                    .lock()
                    .expect("job table poisoned")
                    .kill_all();
                std::process::exit(0);
            }
        }

        self.last_status = execute(&tree, &self.notify);
        Ok(true)
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.interactive {
            match self.editor.readline(prompt) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => Ok(None),
                Err(err) => Err(io::Error::other(err)),
            }
        } else {
            let mut line = String::new();
            if io::stdin().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
        }
    }
}

fn atty_stdin() -> bool {
    use std::os::fd::AsFd;
    nix::unistd::isatty(std::io::stdin().as_fd()).unwrap_or(false)
}

fn make_notifier(editor: &mut Editor<(), DefaultHistory>) -> Notifier {
    match editor.create_external_printer() {
        Ok(printer) => {
            let printer = Arc::new(Mutex::new(printer));
            Arc::new(move |msg: &str| {
                let mut printer = printer.lock().expect("external printer poisoned");
                let _ = printer.print(format!("{msg}\n"));
            })
        }
        Err(_) => Arc::new(|msg: &str| println!("{msg}")),
    }
}

/// Runs one command tree to completion, registering jobs and history as it
/// goes. Shared by the main loop and by `history`/`h` replay.
pub fn execute(tree: &CommandTree, notify: &Notifier) -> i32 {
    match tree {
        CommandTree::BuiltIn(segment, _) => {
            let mut exec_tree = |cmd: &CommandTree| execute(cmd, notify);
            let (status, record) = builtins::dispatch(segment, notify, &mut exec_tree);
            if record {
                history::global()
                    .lock()
                    .expect("history poisoned")
                    .append(tree.clone());
            }
            status
        }
        CommandTree::External(segment, background) => {
            let status = if *background {
                run_background(tree, notify, || executor::spawn(segment, Redirs::default()))
            } else {
                run_foreground_external(tree, segment)
            };
            history::global()
                .lock()
                .expect("history poisoned")
                .append(tree.clone());
            status
        }
        CommandTree::Pipeline(stages, background) => {
            let status = if *background {
                run_background(tree, notify, || pipeline::spawn_pipeline(stages))
            } else {
                run_foreground_pipeline(tree, stages)
            };
            history::global()
                .lock()
                .expect("history poisoned")
                .append(tree.clone());
            status
        }
    }
}

fn run_background(
    tree: &CommandTree,
    notify: &Notifier,
    spawn: impl FnOnce() -> nix::Result<nix::unistd::Pid>,
) -> i32 {
    match spawn() {
        Ok(pid) => {
            let number = job_table::global()
                .lock()
                .expect("job table poisoned")
                .register_background(tree.clone(), pid.as_raw());
            println!("[{number}]\t{tree}");
            job_table::spawn_reaper(number, pid.as_raw(), tree.to_string(), notify.clone());
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_foreground_external(tree: &CommandTree, segment: &crate::command::Segment) -> i32 {
    debug!("executor event=foreground command={tree}");
    match executor::run_foreground(segment, Redirs::default()) {
        Ok((status, Some(pid))) => {
            let number = job_table::global()
                .lock()
                .expect("job table poisoned")
                .register_stopped(tree.clone(), pid);
            println!("[{number}]\t{tree}");
            status
        }
        Ok((status, None)) => status,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_foreground_pipeline(tree: &CommandTree, stages: &[crate::command::Stage]) -> i32 {
    debug!("executor event=foreground-pipeline command={tree}");
    let leader = match pipeline::spawn_pipeline(stages) {
        Ok(pid) => pid,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    job_table::set_current_pid(leader.as_raw());
    let outcome = executor::wait_foreground(leader.as_raw());
    job_table::clear_current_pid();
    match outcome {
        Ok(WaitOutcome::Exited(code)) => code,
        Ok(WaitOutcome::Signaled(signal)) => 128 + signal,
        Ok(WaitOutcome::Stopped) => {
            let number = job_table::global()
                .lock()
                .expect("job table poisoned")
                .register_stopped(tree.clone(), leader.as_raw());
            println!("[{number}]\t{tree}");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}
