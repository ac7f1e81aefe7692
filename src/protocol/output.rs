/// Why a verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Test command exited 0.
    Passed,
    /// Test command exited 0 but reported no tests; allowed with a warning.
    NoTestsWarned,
    /// Nothing to evaluate (deletion-only push).
    NothingToTest,
    /// Test command exited non-zero.
    TestsFailed,
    /// Test command exited 0 but reported no tests; rejected by policy.
    NoTestsRejected,
    /// The test command or its runtime could not be found or executed.
    MissingDependency,
    /// No test command is configured for the hook.
    NotConfigured,
    TimedOut,
    Interrupted,
}

/// The decision returned to the hook's exit path.
///
/// Built only through the constructors below, which keep the invariants:
/// a rejection always carries a non-empty reason, and `tests_ran` is false
/// only when the test command was never launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: String,
    pub tests_ran: bool,
    pub outcome: Outcome,
}

impl Verdict {
    pub fn allow(outcome: Outcome, reason: impl Into<String>, tests_ran: bool) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            tests_ran,
            outcome,
        }
    }

    pub fn reject(outcome: Outcome, reason: impl Into<String>, tests_ran: bool) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            "operation rejected".to_string()
        } else {
            reason
        };
        Self {
            allowed: false,
            reason,
            tests_ran,
            outcome,
        }
    }

    /// Process exit code for the hook: 0 lets git proceed, 1 aborts.
    pub fn exit_code(&self) -> u8 {
        if self.allowed {
            0
        } else {
            1
        }
    }
}
