use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;

use super::TestArgs;
use crate::config::CliOverrides;
use crate::decision::HookEngine;
use crate::domain::HookEvent;
use crate::git;
use crate::progress::ProgressReporter;
use crate::protocol::{parse_ref_updates, PushInput};
use crate::runner::ShellRunner;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Hook event: pre-commit or pre-push
    pub event: HookEvent,
    /// Remote name (pre-push)
    pub remote: Option<String>,
    /// Remote URL (pre-push)
    pub url: Option<String>,
    #[command(flatten)]
    pub test: TestArgs,
    /// Extra regex marking output as "no tests ran" (repeatable)
    #[arg(long = "zero-tests-pattern", value_name = "RE")]
    pub zero_tests_patterns: Vec<String>,
}

/// Evaluate the event and map the verdict to the hook's exit status.
pub fn run(args: &RunArgs) -> miette::Result<ExitCode> {
    // git runs hooks from the top of the work tree.
    let root = match git::toplevel(&PathBuf::from(".")) {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!(error = %e, "using current directory as repository root");
            PathBuf::from(".")
        }
    };

    let config = args.test.load(
        &root,
        CliOverrides {
            zero_test_patterns: args.zero_tests_patterns.clone(),
            ..Default::default()
        },
    )?;
    let engine = HookEngine::new(config, root)?;
    let runner = ShellRunner::new();
    let mut reporter = ProgressReporter::stderr();

    let verdict = match args.event {
        HookEvent::PreCommit => engine.evaluate(args.event, &runner, &mut reporter),
        HookEvent::PrePush => {
            let push = PushInput {
                remote_name: args.remote.clone(),
                remote_url: args.url.clone(),
                updates: read_ref_updates(),
            };
            engine.evaluate_push(&push, &runner, &mut reporter)
        }
    };

    Ok(ExitCode::from(verdict.exit_code()))
}

/// Ref lines git writes to a pre-push hook's stdin. Unreadable or malformed
/// input still runs the tests.
fn read_ref_updates() -> Vec<crate::protocol::RefUpdate> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Vec::new();
    }
    let mut input = String::new();
    if let Err(e) = stdin.read_to_string(&mut input) {
        tracing::warn!(error = %e, "could not read pre-push stdin");
        return Vec::new();
    }
    parse_ref_updates(&input).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring malformed pre-push input");
        Vec::new()
    })
}
