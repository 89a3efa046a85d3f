//! History store: an append-only, 1-indexed record of executed commands,
//! with numeric replay.
//!
//! Modeled as a process-wide singleton (a `Mutex` behind a `OnceLock`)
//! exactly as the job table is, but the type itself is a plain struct so
//! tests can construct an isolated instance without touching the singleton.

use std::sync::{Mutex, OnceLock};

use crate::command::CommandTree;
use crate::error::ShellError;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub index: usize,
    pub command: CommandTree,
}

#[derive(Default)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        HistoryStore::default()
    }

    /// Appends `command` and returns its 1-based index.
    pub fn append(&mut self, command: CommandTree) -> usize {
        let index = self.entries.len() + 1;
        self.entries.push(HistoryEntry { index, command });
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, n: usize) -> Option<&CommandTree> {
        if n == 0 {
            return None;
        }
        self.entries.get(n - 1).map(|entry| &entry.command)
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("[{}]\t{}", entry.index, entry.command))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Replays entry `n`: runs it via `exec`, then appends the same command as a
/// new entry regardless of the command's own exit status. Out-of-range `n`
/// leaves history untouched and returns `no_record_for`.
pub fn replay<F>(store: &mut HistoryStore, n: usize, mut exec: F) -> Result<i32, ShellError>
where
    F: FnMut(&CommandTree) -> i32,
{
    let command = store.get(n).cloned().ok_or_else(|| ShellError::no_record_for(n))?;
    let status = exec(&command);
    store.append(command);
    Ok(status)
}

static HISTORY: OnceLock<Mutex<HistoryStore>> = OnceLock::new();

pub fn global() -> &'static Mutex<HistoryStore> {
    HISTORY.get_or_init(|| Mutex::new(HistoryStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Segment;

    fn tree(program: &str) -> CommandTree {
        CommandTree::build(vec![Segment::new(vec![program.to_string()])], false).unwrap()
    }

    #[test]
    fn append_assigns_one_based_indices() {
        let mut store = HistoryStore::new();
        assert_eq!(store.append(tree("pwd")), 1);
        assert_eq!(store.append(tree("ls")), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn render_matches_bracketed_tab_format() {
        let mut store = HistoryStore::new();
        store.append(tree("pwd"));
        assert_eq!(store.render(), "[1]\tpwd");
    }

    #[test]
    fn replay_reexecutes_and_appends_again() {
        let mut store = HistoryStore::new();
        store.append(tree("pwd"));
        let mut executed = Vec::new();
        let status = replay(&mut store, 1, |cmd| {
            executed.push(cmd.to_string());
            0
        })
        .unwrap();
        assert_eq!(status, 0);
        assert_eq!(executed, vec!["pwd".to_string()]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.render(), "[1]\tpwd\n[2]\tpwd");
    }

    #[test]
    fn replay_out_of_range_leaves_history_untouched() {
        let mut store = HistoryStore::new();
        store.append(tree("pwd"));
        let err = replay(&mut store, 5, |_| 0).unwrap_err();
        assert_eq!(err.to_string(), "no record for: 5");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replay_zero_is_out_of_range() {
        let mut store = HistoryStore::new();
        store.append(tree("pwd"));
        assert!(replay(&mut store, 0, |_| 0).is_err());
    }
}
