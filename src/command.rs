//! The command model: segments, pipeline stages, and the command tree built
//! from a tokenized line.

use std::fmt;

pub const BUILTIN_NAMES: &[&str] = &[
    "cd", "pwd", "exit", "jobs", "fg", "bg", "kill", "history", "h",
];

pub fn is_builtin(program: &str) -> bool {
    BUILTIN_NAMES.contains(&program)
}

/// An ordered, non-empty list of words; `words[0]` is the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub words: Vec<String>,
}

impl Segment {
    pub fn new(words: Vec<String>) -> Self {
        debug_assert!(!words.is_empty(), "a segment must have at least one word");
        Segment { words }
    }

    pub fn program(&self) -> &str {
        &self.words[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.words
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

/// One stage of a pipeline. The background flag on a stage is never
/// meaningful on its own; only the enclosing `Pipeline`'s flag is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    External(Segment),
    BuiltIn(Segment),
}

impl Stage {
    pub fn from_segment(segment: Segment) -> Self {
        if is_builtin(segment.program()) {
            Stage::BuiltIn(segment)
        } else {
            Stage::External(segment)
        }
    }

    pub fn segment(&self) -> &Segment {
        match self {
            Stage::External(s) | Stage::BuiltIn(s) => s,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.segment())
    }
}

/// The parsed shape of one input line: a single external command, a single
/// built-in, or a pipeline of two or more stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTree {
    External(Segment, bool),
    BuiltIn(Segment, bool),
    Pipeline(Vec<Stage>, bool),
}

impl CommandTree {
    /// Builds a `CommandTree` from tokenizer output. Returns `None` for an
    /// empty segment list (the caller treats that as an empty input line).
    pub fn build(mut segments: Vec<Segment>, background: bool) -> Option<CommandTree> {
        if segments.is_empty() {
            return None;
        }
        if segments.len() == 1 {
            let segment = segments.pop().unwrap();
            return Some(if is_builtin(segment.program()) {
                CommandTree::BuiltIn(segment, background)
            } else {
                CommandTree::External(segment, background)
            });
        }
        let stages = segments.into_iter().map(Stage::from_segment).collect();
        Some(CommandTree::Pipeline(stages, background))
    }

    pub fn background(&self) -> bool {
        match self {
            CommandTree::External(_, bg) | CommandTree::BuiltIn(_, bg) => *bg,
            CommandTree::Pipeline(_, bg) => *bg,
        }
    }
}

impl fmt::Display for CommandTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandTree::External(segment, background) | CommandTree::BuiltIn(segment, background) => {
                write!(f, "{segment}")?;
                if *background {
                    write!(f, " &")?;
                }
                Ok(())
            }
            CommandTree::Pipeline(stages, background) => {
                let rendered = stages
                    .iter()
                    .map(Stage::to_string)
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "{rendered}")?;
                if *background {
                    write!(f, " &")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(words: &[&str]) -> Segment {
        Segment::new(words.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn single_external_renders_plainly() {
        let tree = CommandTree::build(vec![seg(&["pwd"])], false).unwrap();
        assert_eq!(tree.to_string(), "pwd");
    }

    #[test]
    fn background_single_command_renders_with_ampersand() {
        let tree = CommandTree::build(vec![seg(&["sleep", "10"])], true).unwrap();
        assert_eq!(tree.to_string(), "sleep 10 &");
    }

    #[test]
    fn builtin_is_recognized_by_program_name() {
        let tree = CommandTree::build(vec![seg(&["cd", "/tmp"])], false).unwrap();
        assert!(matches!(tree, CommandTree::BuiltIn(_, false)));
    }

    #[test]
    fn pipeline_requires_at_least_two_segments() {
        let tree = CommandTree::build(vec![seg(&["echo", "hi"]), seg(&["tr", "a-z", "A-Z"])], false)
            .unwrap();
        match &tree {
            CommandTree::Pipeline(stages, false) => assert_eq!(stages.len(), 2),
            other => panic!("expected pipeline, got {other:?}"),
        }
        assert_eq!(tree.to_string(), "echo hi | tr a-z A-Z");
    }

    #[test]
    fn empty_segments_yield_no_tree() {
        assert!(CommandTree::build(Vec::new(), false).is_none());
    }

    #[test]
    fn inner_stage_background_flag_is_ignored_in_rendering() {
        let tree = CommandTree::build(vec![seg(&["yes"]), seg(&["head"])], true).unwrap();
        assert_eq!(tree.to_string(), "yes | head &");
    }
}
