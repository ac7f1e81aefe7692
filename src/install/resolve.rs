//! Conflict resolution for foreign hooks that already occupy a hook path.

use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::domain::HookEvent;

/// What to do with a hand-written hook in the way of ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Replace the existing hook.
    Overwrite,
    /// Keep the existing hook and run it before the tests.
    Merge,
    /// Leave everything untouched.
    Abort,
}

/// Decides conflicts during installation.
pub trait ConflictResolver {
    fn resolve(&self, event: HookEvent, path: &Path, existing: &str) -> Resolution;
}

/// Answers every conflict the same way. `FixedPolicy(Resolution::Abort)` is
/// the non-interactive default.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Resolution);

impl Default for FixedPolicy {
    fn default() -> Self {
        Self(Resolution::Abort)
    }
}

impl ConflictResolver for FixedPolicy {
    fn resolve(&self, _event: HookEvent, _path: &Path, _existing: &str) -> Resolution {
        self.0
    }
}

/// Asks on the terminal. Anything unrecognised, or a closed input, aborts.
pub struct Prompt<R, W> {
    input: std::cell::RefCell<R>,
    output: std::cell::RefCell<W>,
}

impl Prompt<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn terminal() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: std::cell::RefCell::new(input),
            output: std::cell::RefCell::new(output),
        }
    }
}

impl<R: BufRead, W: Write> ConflictResolver for Prompt<R, W> {
    fn resolve(&self, event: HookEvent, path: &Path, _existing: &str) -> Resolution {
        let mut out = self.output.borrow_mut();
        let _ = write!(
            out,
            "{} already exists and was not installed by git-test-gate.\n\
             (o)verwrite, (m)erge (run it before the tests), or (a)bort? [a] ",
            path.display()
        );
        let _ = out.flush();

        let mut answer = String::new();
        if self.input.borrow_mut().read_line(&mut answer).is_err() {
            return Resolution::Abort;
        }
        let resolution = match answer.trim().to_ascii_lowercase().as_str() {
            "o" | "overwrite" => Resolution::Overwrite,
            "m" | "merge" => Resolution::Merge,
            _ => Resolution::Abort,
        };
        tracing::debug!(%event, ?resolution, "conflict resolved by prompt");
        resolution
    }
}

/// `--on-conflict` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    Prompt,
    #[default]
    Abort,
    Overwrite,
    Merge,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown conflict policy '{0}' (expected prompt, abort, overwrite or merge)")]
pub struct UnknownConflictPolicy(String);

impl FromStr for ConflictPolicy {
    type Err = UnknownConflictPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompt" => Ok(Self::Prompt),
            "abort" => Ok(Self::Abort),
            "overwrite" => Ok(Self::Overwrite),
            "merge" => Ok(Self::Merge),
            other => Err(UnknownConflictPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str) -> (Resolution, String) {
        let prompt = Prompt::new(answer.as_bytes(), Vec::new());
        let resolution = prompt.resolve(
            HookEvent::PreCommit,
            Path::new(".git/hooks/pre-commit"),
            "#!/bin/sh\n",
        );
        let shown = String::from_utf8(prompt.output.into_inner()).unwrap();
        (resolution, shown)
    }

    #[test]
    fn prompt_answers() {
        assert_eq!(ask("o\n").0, Resolution::Overwrite);
        assert_eq!(ask("merge\n").0, Resolution::Merge);
        assert_eq!(ask("a\n").0, Resolution::Abort);
    }

    #[test]
    fn prompt_defaults_to_abort() {
        assert_eq!(ask("\n").0, Resolution::Abort);
        assert_eq!(ask("").0, Resolution::Abort);
        assert_eq!(ask("yes please\n").0, Resolution::Abort);
    }

    #[test]
    fn prompt_names_the_file() {
        let (_, shown) = ask("a\n");
        assert!(shown.contains(".git/hooks/pre-commit already exists"));
    }

    #[test]
    fn fixed_policy_default_is_abort() {
        let r = FixedPolicy::default().resolve(HookEvent::PrePush, Path::new("x"), "");
        assert_eq!(r, Resolution::Abort);
    }

    #[test]
    fn policy_parses() {
        assert_eq!("merge".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Merge);
        assert!("replace".parse::<ConflictPolicy>().is_err());
    }
}
