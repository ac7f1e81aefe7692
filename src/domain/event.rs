use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The git lifecycle point that triggered an evaluation.
///
/// The display form doubles as the hook's file name inside the hooks
/// directory (`pre-commit`, `pre-push`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    PreCommit,
    PrePush,
}

impl HookEvent {
    pub const ALL: [HookEvent; 2] = [HookEvent::PreCommit, HookEvent::PrePush];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreCommit => "pre-commit",
            HookEvent::PrePush => "pre-push",
        }
    }

    /// File name git looks up in the hooks directory.
    pub fn file_name(&self) -> &'static str {
        self.as_str()
    }

    /// What git is about to do when this hook rejects, for messages.
    pub fn operation(&self) -> &'static str {
        match self {
            HookEvent::PreCommit => "commit",
            HookEvent::PrePush => "push",
        }
    }
}

/// Error returned when a string does not name a supported hook.
#[derive(Debug, thiserror::Error)]
#[error("unsupported hook '{0}' (expected pre-commit or pre-push)")]
pub struct UnknownHook(pub String);

impl FromStr for HookEvent {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" => Ok(HookEvent::PreCommit),
            "pre-push" => Ok(HookEvent::PrePush),
            other => Err(UnknownHook(other.to_string())),
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
