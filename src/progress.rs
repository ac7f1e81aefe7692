//! Progress Reporter: tells the developer which hook is running and how it
//! ended. The test command's own output is streamed by the runner and never
//! passes through here.

use std::io::Write;

use crate::decision::APP_NAME;
use crate::protocol::{Outcome, Verdict};
use crate::runner::ExecutionResult;

pub struct ProgressReporter<W: Write> {
    out: W,
}

impl ProgressReporter<std::io::Stderr> {
    /// Reporter writing to stderr, which git shows for both hooks.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the start line for `label`, then run `action` untouched.
    pub fn wrap<F>(&mut self, label: &str, command: &str, action: F) -> ExecutionResult
    where
        F: FnOnce() -> ExecutionResult,
    {
        self.line(&format!("Running {label} tests: {command}"));
        action()
    }

    /// Print the outcome line for a finished evaluation.
    pub fn report(&mut self, label: &str, verdict: &Verdict, duration_ms: Option<u64>) {
        let elapsed = duration_ms
            .map(|ms| format!(" ({:.2}s)", ms as f64 / 1000.0))
            .unwrap_or_default();
        match verdict.outcome {
            Outcome::NoTestsWarned => {
                self.line(&format!("warning: {label}: {}{elapsed}", verdict.reason));
            }
            _ if verdict.allowed => {
                self.line(&format!("{label}: {}{elapsed}", verdict.reason));
            }
            _ => {
                self.line(&format!("{label} rejected: {}{elapsed}", verdict.reason));
            }
        }
    }

    fn line(&mut self, message: &str) {
        // A closed stderr must not change the verdict.
        let _ = writeln!(self.out, "[{APP_NAME}] {message}");
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output(reporter: ProgressReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn wrap_prints_start_line_before_action() {
        let mut reporter = ProgressReporter::new(Vec::new());
        let result = reporter.wrap("pre-commit", "./run-tests.sh", || {
            ExecutionResult::exited(0, String::new(), String::new(), Duration::ZERO)
        });
        assert!(result.success());
        assert_eq!(
            output(reporter),
            "[git-test-gate] Running pre-commit tests: ./run-tests.sh\n"
        );
    }

    #[test]
    fn wrap_returns_action_result_unchanged() {
        let mut reporter = ProgressReporter::new(Vec::new());
        let expected =
            ExecutionResult::exited(3, "Test 2: FAIL\n".into(), String::new(), Duration::ZERO);
        let result = reporter.wrap("pre-push", "make test", || expected.clone());
        assert_eq!(result, expected);
    }

    #[test]
    fn report_rejection_names_the_hook() {
        let mut reporter = ProgressReporter::new(Vec::new());
        let verdict = Verdict::reject(Outcome::TestsFailed, "tests failed (exit code 1)", true);
        reporter.report("pre-commit", &verdict, Some(1500));
        assert_eq!(
            output(reporter),
            "[git-test-gate] pre-commit rejected: tests failed (exit code 1) (1.50s)\n"
        );
    }

    #[test]
    fn report_zero_tests_is_a_warning() {
        let mut reporter = ProgressReporter::new(Vec::new());
        let verdict = Verdict::allow(Outcome::NoTestsWarned, "no tests were executed", true);
        reporter.report("pre-push", &verdict, None);
        assert!(output(reporter).contains("warning: pre-push: no tests were executed"));
    }
}
