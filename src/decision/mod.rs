//! Hook Decision Engine: runs the test command for one git event and turns
//! the result into a [`Verdict`].
//!
//! Each call is independent; the engine keeps no state between invocations.

mod preflight;
mod reason;

use std::io::Write;
use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::domain::{HookEvent, ZeroTestsPolicy};
use crate::progress::ProgressReporter;
use crate::protocol::{Outcome, PushInput, Verdict};
use crate::runner::{CommandRunner, ExecutionResult, Termination};

use preflight::Availability;
use zero_tests::ZeroTestsDetector;

pub(crate) const APP_NAME: &str = "git-test-gate";

#[derive(Debug)]
pub struct HookEngine {
    config: Config,
    working_dir: PathBuf,
    detector: ZeroTestsDetector,
}

impl HookEngine {
    /// Build an engine that runs tests from `working_dir` (the repository root).
    pub fn new(config: Config, working_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let detector = ZeroTestsDetector::new(&config.zero_test_patterns)
            .map_err(|e| ConfigError::ValidationError(format!("zero-tests-pattern: {e}")))?;
        Ok(Self {
            config,
            working_dir: working_dir.into(),
            detector,
        })
    }

    /// Evaluate `event`: run the configured test command once and decide.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use std::time::Duration;
    /// use git_test_gate::config::Config;
    /// use git_test_gate::decision::HookEngine;
    /// use git_test_gate::domain::HookEvent;
    /// use git_test_gate::progress::ProgressReporter;
    /// use git_test_gate::runner::{CommandRunner, ExecutionResult};
    ///
    /// struct Failing;
    /// impl CommandRunner for Failing {
    ///     fn run(&self, _: &str, _: &Path, _: Option<Duration>) -> ExecutionResult {
    ///         ExecutionResult::exited(1, "Test 2: FAIL\n".into(), String::new(), Duration::ZERO)
    ///     }
    /// }
    ///
    /// let config = Config::parse(r#"test-command "true""#).unwrap();
    /// let engine = HookEngine::new(config, ".").unwrap();
    /// let mut reporter = ProgressReporter::new(Vec::new());
    /// let verdict = engine.evaluate(HookEvent::PreCommit, &Failing, &mut reporter);
    /// assert!(!verdict.allowed);
    /// assert!(verdict.tests_ran);
    /// ```
    pub fn evaluate<W: Write>(
        &self,
        event: HookEvent,
        runner: &dyn CommandRunner,
        reporter: &mut ProgressReporter<W>,
    ) -> Verdict {
        let label = event.as_str();

        let settings = match self.config.settings(event) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(%event, error = %e, "hook has no test command");
                let verdict =
                    Verdict::reject(Outcome::NotConfigured, reason::not_configured(event), false);
                reporter.report(label, &verdict, None);
                return verdict;
            }
        };

        if let Availability::Missing(program) =
            preflight::check_program(&settings.test_command, &self.working_dir)
        {
            let verdict = Verdict::reject(
                Outcome::MissingDependency,
                reason::missing_program(&program),
                false,
            );
            reporter.report(label, &verdict, None);
            return verdict;
        }

        let result = reporter.wrap(label, &settings.test_command, || {
            runner.run(&settings.test_command, &self.working_dir, settings.timeout)
        });

        let verdict = self.interpret(&result, settings.zero_tests, settings.timeout);
        tracing::debug!(
            %event,
            exit_code = result.exit_code,
            termination = ?result.termination,
            duration_ms = result.duration_ms,
            outcome = ?verdict.outcome,
            allowed = verdict.allowed,
            "hook evaluated"
        );
        reporter.report(label, &verdict, Some(result.duration_ms));
        verdict
    }

    /// Evaluate a push. The test suite runs once against the working tree,
    /// however many refs and commits the push carries.
    pub fn evaluate_push<W: Write>(
        &self,
        push: &PushInput,
        runner: &dyn CommandRunner,
        reporter: &mut ProgressReporter<W>,
    ) -> Verdict {
        if push.is_deletion_only() {
            tracing::debug!(refs = push.updates.len(), "deletion-only push");
            let verdict = Verdict::allow(Outcome::NothingToTest, reason::nothing_to_test(), false);
            reporter.report(HookEvent::PrePush.as_str(), &verdict, None);
            return verdict;
        }
        self.evaluate(HookEvent::PrePush, runner, reporter)
    }

    fn interpret(
        &self,
        result: &ExecutionResult,
        policy: ZeroTestsPolicy,
        timeout: Option<std::time::Duration>,
    ) -> Verdict {
        match result.termination {
            Termination::Exited if result.exit_code == 0 => {
                let combined = result.combined_output();
                match (self.detector.find(&combined), policy) {
                    (None, _) => Verdict::allow(Outcome::Passed, reason::ALL_PASSED, true),
                    (Some(line), ZeroTestsPolicy::Warn) => {
                        tracing::warn!(line, "test command reported zero tests");
                        Verdict::allow(Outcome::NoTestsWarned, reason::zero_tests(line), true)
                    }
                    (Some(line), ZeroTestsPolicy::Reject) => {
                        Verdict::reject(Outcome::NoTestsRejected, reason::zero_tests(line), true)
                    }
                }
            }
            Termination::Exited => {
                Verdict::reject(Outcome::TestsFailed, reason::tests_failed(result), true)
            }
            Termination::Signaled(signal) => {
                Verdict::reject(Outcome::TestsFailed, reason::signaled(signal), true)
            }
            Termination::NotFound => Verdict::reject(
                Outcome::MissingDependency,
                reason::missing_at_runtime(result, false),
                false,
            ),
            Termination::NotExecutable => Verdict::reject(
                Outcome::MissingDependency,
                reason::missing_at_runtime(result, true),
                false,
            ),
            Termination::TimedOut => {
                Verdict::reject(Outcome::TimedOut, reason::timed_out(timeout), true)
            }
            Termination::Interrupted => {
                Verdict::reject(Outcome::Interrupted, reason::INTERRUPTED, true)
            }
        }
    }
}

#[cfg(test)]
mod tests;
