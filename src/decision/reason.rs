use std::time::Duration;

use crate::domain::HookEvent;
use crate::runner::ExecutionResult;

/// Lines of output quoted in a failure reason.
const SUMMARY_LINES: usize = 3;
/// Longest quoted line before it is cut.
const SUMMARY_LINE_WIDTH: usize = 160;

pub(crate) const ALL_PASSED: &str = "all tests passed";
pub(crate) const INTERRUPTED: &str = "interrupted";

/// Summarise a failing run: the exit code, then the last lines that look
/// like failures (or simply the last lines when none do).
pub(crate) fn tests_failed(result: &ExecutionResult) -> String {
    let combined = result.combined_output();
    let lines: Vec<&str> = combined
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let flagged: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| looks_like_failure(line))
        .collect();
    let source = if flagged.is_empty() { &lines } else { &flagged };
    let tail = &source[source.len().saturating_sub(SUMMARY_LINES)..];

    let head = format!("tests failed (exit code {})", result.exit_code);
    if tail.is_empty() {
        return head;
    }
    let quoted: Vec<String> = tail.iter().map(|line| shorten(line)).collect();
    format!("{head}; last output: {}", quoted.join(" | "))
}

fn looks_like_failure(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("fail") || lower.contains("error") || lower.contains("panic")
}

fn shorten(line: &str) -> String {
    if line.chars().count() <= SUMMARY_LINE_WIDTH {
        return line.to_string();
    }
    let cut: String = line.chars().take(SUMMARY_LINE_WIDTH).collect();
    format!("{cut}...")
}

pub(crate) fn missing_program(program: &str) -> String {
    format!(
        "test command not found: '{program}'; install the project's dependencies or fix test-command"
    )
}

/// Reason for a run the shell could not start, with the shell's own words.
pub(crate) fn missing_at_runtime(result: &ExecutionResult, not_executable: bool) -> String {
    let detail = result
        .stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(|line| format!(" ({})", shorten(line)))
        .unwrap_or_default();
    if not_executable {
        format!(
            "test command not executable{detail}; check its permissions (chmod +x) or install the project's dependencies"
        )
    } else {
        format!("test command not found{detail}; install the project's dependencies or fix test-command")
    }
}

pub(crate) fn not_configured(event: HookEvent) -> String {
    format!("no test command configured for {event}; set test-command in .git-test-gate.kdl")
}

pub(crate) fn timed_out(limit: Option<Duration>) -> String {
    match limit {
        Some(limit) => format!("test command timed out after {}s", limit.as_secs()),
        None => "test command timed out".to_string(),
    }
}

pub(crate) fn signaled(signal: i32) -> String {
    format!("tests failed (killed by signal {signal})")
}

pub(crate) fn zero_tests(line: &str) -> String {
    format!("no tests were executed (\"{}\")", shorten(line))
}

pub(crate) fn nothing_to_test() -> String {
    "push only deletes refs; nothing to test".to_string()
}
