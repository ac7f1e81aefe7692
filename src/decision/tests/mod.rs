
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use crate::config::Config;
use crate::decision::HookEngine;
use crate::domain::HookEvent;
use crate::progress::ProgressReporter;
use crate::protocol::Verdict;
use crate::runner::{CommandRunner, ExecutionResult, Termination};

/// Runner that records every call and returns a canned result.
struct FakeRunner {
    result: ExecutionResult,
    calls: RefCell<Vec<(String, PathBuf, Option<Duration>)>>,
}

impl FakeRunner {
    fn returning(result: ExecutionResult) -> Self {
        Self {
            result,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn exit(code: i32, stdout: &str) -> Self {
        Self::returning(ExecutionResult::exited(
            code,
            stdout.to_string(),
            String::new(),
            Duration::from_millis(25),
        ))
    }

    fn ended(termination: Termination, exit_code: i32, stderr: &str) -> Self {
        Self::returning(ExecutionResult {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            duration_ms: 25,
            termination,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str, working_dir: &Path, timeout: Option<Duration>) -> ExecutionResult {
        self.calls
            .borrow_mut()
            .push((command.to_string(), working_dir.to_path_buf(), timeout));
        self.result.clone()
    }
}

/// A repository root holding an existing `run-tests.sh`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("run-tests.sh"), "#!/bin/sh\nexit 0\n")
            .expect("write script");
        Self { dir }
    }

    fn engine(&self, config: &str) -> HookEngine {
        let config = Config::parse(config).expect("test config should parse");
        HookEngine::new(config, self.dir.path()).expect("engine")
    }

    fn default_engine(&self) -> HookEngine {
        self.engine(r#"test-command "./run-tests.sh""#)
    }
}

fn evaluate(engine: &HookEngine, event: HookEvent, runner: &FakeRunner) -> (Verdict, String) {
    let mut reporter = ProgressReporter::new(Vec::new());
    let verdict = engine.evaluate(event, runner, &mut reporter);
    let output = String::from_utf8(reporter.into_inner()).expect("utf8 report");
    (verdict, output)
}
