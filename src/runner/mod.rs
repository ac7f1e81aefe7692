//! Command Runner: launches the test command and reports how it ended.
//!
//! [`CommandRunner`] is the seam the decision engine depends on; the real
//! implementation is [`ShellRunner`], tests substitute their own.

mod shell;
mod signal;
mod stream;

use std::path::Path;
use std::time::Duration;

pub use shell::ShellRunner;

/// Exit code reported when the command (or its interpreter) was not found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code reported when the command exists but could not be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit code reported when the command was killed after its timeout.
pub const EXIT_TIMED_OUT: i32 = 124;
/// Exit code reported when the run was interrupted by the operator.
pub const EXIT_INTERRUPTED: i32 = 130;

/// How a run ended, beyond its numeric exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Ran to completion; `exit_code` is the command's own status.
    Exited,
    NotFound,
    NotExecutable,
    TimedOut,
    Interrupted,
    /// Killed by a signal other than an interrupt.
    Signaled(i32),
}

/// Result of one command run. Never mutated after the runner returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub termination: Termination,
}

impl ExecutionResult {
    /// A run that completed normally with the given exit code.
    pub fn exited(exit_code: i32, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration_ms: duration_ms(duration),
            termination: Termination::Exited,
        }
    }

    /// A run that never got going because the program is missing.
    pub fn not_found(message: String, duration: Duration) -> Self {
        Self {
            exit_code: EXIT_NOT_FOUND,
            stdout: String::new(),
            stderr: message,
            duration_ms: duration_ms(duration),
            termination: Termination::NotFound,
        }
    }

    pub fn success(&self) -> bool {
        self.termination == Termination::Exited && self.exit_code == 0
    }

    /// Stdout followed by stderr, for pattern matching and summaries.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Runs an external command to completion.
///
/// Implementations must not panic on command failure: every way a run can
/// end is expressed in the returned [`ExecutionResult`].
pub trait CommandRunner {
    fn run(&self, command: &str, working_dir: &Path, timeout: Option<Duration>) -> ExecutionResult;
}
