//! Overwrite policy for existing datasets

use std::fs::File;
use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::DatasetStore;
use crate::error::{BindError, Result};

/// What to do when a dataset write would replace an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    Always,
    Never,
    #[default]
    Prompt,
}

/// Answer to an overwrite prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Yes, and stop asking for the rest of the run
    All,
}

impl Answer {
    /// Parse a typed answer; any prefix of `yes`, `no` or `all` counts
    ///
    /// Empty input and anything unrecognized mean `No`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim().to_lowercase();
        if input.is_empty() || "no".starts_with(&input) {
            Answer::No
        } else if "all".starts_with(&input) {
            Answer::All
        } else if "yes".starts_with(&input) {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}

/// Interactive confirmation capability
pub trait Confirm {
    fn ask(&mut self, prompt: &str) -> Result<Answer>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> Result<Answer>,
{
    fn ask(&mut self, prompt: &str) -> Result<Answer> {
        self(prompt)
    }
}

/// Prompts on stderr and reads one line from the controlling terminal
///
/// Falls back to standard input where no terminal device can be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

const TTY_PATH: &str = "/dev/tty";

/// The controlling terminal, or standard input without one
fn terminal_reader() -> Box<dyn BufRead> {
    match File::open(TTY_PATH) {
        Ok(tty) => Box::new(io::BufReader::new(tty)),
        Err(e) => {
            debug!(error = %e, "no controlling terminal, prompting on stdin");
            Box::new(io::BufReader::new(io::stdin()))
        }
    }
}

/// One typed answer from `reader`; end of input means `No`
fn read_answer(mut reader: impl BufRead) -> Result<Answer> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(Answer::parse(&line))
}

impl Confirm for TerminalConfirm {
    fn ask(&mut self, prompt: &str) -> Result<Answer> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;
        read_answer(terminal_reader())
    }
}

/// Write a dataset honoring the overwrite policy
///
/// Returns `false` when the write was declined at the prompt. An `all`
/// answer switches `policy` to `Always`.
pub fn save_dataset(
    store: &dyn DatasetStore,
    container: &str,
    path: &str,
    value: serde_json::Value,
    policy: &mut OverwritePolicy,
    confirm: &mut dyn Confirm,
    prog: &str,
) -> Result<bool> {
    let found = store.exists(container, path)?;
    if found {
        match *policy {
            OverwritePolicy::Always => {}
            OverwritePolicy::Never => {
                return Err(BindError::DatasetExists {
                    container: container.to_string(),
                    path: path.to_string(),
                })
            }
            OverwritePolicy::Prompt => {
                let prompt = format!("{}: overwrite \"{}/{}\" [yes|No|all]? ", prog, container, path);
                match confirm.ask(&prompt)? {
                    Answer::No => {
                        warn!(container, path, "kept existing dataset");
                        return Ok(false);
                    }
                    Answer::Yes => {}
                    Answer::All => *policy = OverwritePolicy::Always,
                }
            }
        }
        store.delete(container, path)?;
        info!(container, path, "overwriting dataset");
    }
    store.set(container, path, value)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn answer_prefixes() {
        assert_eq!(Answer::parse(""), Answer::No);
        assert_eq!(Answer::parse("n"), Answer::No);
        assert_eq!(Answer::parse("Y\n"), Answer::Yes);
        assert_eq!(Answer::parse("a"), Answer::All);
        assert_eq!(Answer::parse("maybe"), Answer::No);
    }

    #[test]
    fn new_dataset_never_prompts() {
        let store = MemoryStore::new();
        let mut policy = OverwritePolicy::Prompt;
        let mut confirm = |_: &str| -> Result<Answer> { panic!("should not prompt") };
        assert!(save_dataset(&store, "f", "d", json!(1), &mut policy, &mut confirm, "t").unwrap());
        assert_eq!(store.get("f", "d").unwrap(), json!(1));
    }

    #[test]
    fn never_policy_refuses() {
        let store = MemoryStore::new().with("f", "d", json!(1));
        let mut policy = OverwritePolicy::Never;
        let mut confirm = |_: &str| -> Result<Answer> { Ok(Answer::Yes) };
        let err = save_dataset(&store, "f", "d", json!(2), &mut policy, &mut confirm, "t")
            .unwrap_err();
        assert!(matches!(err, BindError::DatasetExists { .. }));
    }

    #[test]
    fn prompt_no_keeps_value() {
        let store = MemoryStore::new().with("f", "d", json!(1));
        let mut policy = OverwritePolicy::Prompt;
        let mut asked = Vec::new();
        let mut confirm = |p: &str| -> Result<Answer> {
            asked.push(p.to_string());
            Ok(Answer::No)
        };
        assert!(!save_dataset(&store, "f", "d", json!(2), &mut policy, &mut confirm, "t").unwrap());
        assert_eq!(store.get("f", "d").unwrap(), json!(1));
        assert_eq!(asked, vec!["t: overwrite \"f/d\" [yes|No|all]? "]);
    }

    #[test]
    fn prompt_all_switches_policy() {
        let store = MemoryStore::new().with("f", "d", json!(1));
        let mut policy = OverwritePolicy::Prompt;
        let mut confirm = |_: &str| -> Result<Answer> { Ok(Answer::All) };
        assert!(save_dataset(&store, "f", "d", json!(2), &mut policy, &mut confirm, "t").unwrap());
        assert_eq!(policy, OverwritePolicy::Always);
        assert_eq!(store.get("f", "d").unwrap(), json!(2));
    }

    #[test]
    fn typed_answer_read_from_terminal_line() {
        use std::io::Cursor;
        assert_eq!(read_answer(Cursor::new("all\nyes\n")).unwrap(), Answer::All);
        assert_eq!(read_answer(Cursor::new("")).unwrap(), Answer::No);
    }
}
