//! Checks that the test command's program exists before launching it, so a
//! missing dependency is reported as such instead of as a test failure.

use std::path::Path;

use crate::command;

/// Words the shell resolves itself; never looked up on `PATH`.
const SHELL_BUILTINS: &[&str] = &[
    ":", ".", "[", "alias", "cd", "echo", "eval", "exit", "export", "false", "printf", "pwd",
    "read", "set", "shift", "source", "test", "trap", "true", "type", "ulimit", "umask",
    "unset", "wait",
];

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Availability {
    Found,
    Missing(String),
    /// Could not tell statically; the shell will decide at run time.
    Unchecked,
}

/// Resolve the first program of `test_command` from `working_dir`.
pub(crate) fn check_program(test_command: &str, working_dir: &Path) -> Availability {
    let program = match command::first_program(test_command) {
        Ok(Some(program)) => program,
        Ok(None) => return Availability::Unchecked,
        Err(e) => {
            tracing::debug!(error = %e, "could not parse test command, skipping preflight");
            return Availability::Unchecked;
        }
    };

    if program.contains(['$', '`', '*', '?', '~']) {
        return Availability::Unchecked;
    }
    if SHELL_BUILTINS.contains(&program.as_str()) {
        return Availability::Found;
    }

    let found = if program.contains('/') {
        working_dir.join(&program).exists()
    } else {
        which::which(&program).is_ok()
    };

    if found {
        Availability::Found
    } else {
        tracing::debug!(program, "test program not found");
        Availability::Missing(program)
    }
}
