//! Hook script rendering. A pure function of its inputs, so reinstalling
//! with the same settings produces byte-identical files.

use std::path::Path;

use crate::decision::APP_NAME;
use crate::domain::{HookEvent, ZeroTestsPolicy};

/// Line that identifies a hook file as ours.
pub(crate) const MARKER: &str = "# managed-by: git-test-gate";

/// Everything a rendered hook depends on.
#[derive(Debug)]
pub(crate) struct HookTemplate<'a> {
    pub(crate) event: HookEvent,
    pub(crate) program: &'a Path,
    pub(crate) test_command: &'a str,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) zero_tests: ZeroTestsPolicy,
    /// Preserved original hook to run first, relative to the hooks directory.
    pub(crate) chained: Option<&'a str>,
}

impl HookTemplate<'_> {
    pub(crate) fn render(&self) -> String {
        let event = self.event.as_str();
        let program = shell_quote(&self.program.to_string_lossy());

        let mut script = String::new();
        script.push_str("#!/bin/sh\n");
        script.push_str(MARKER);
        script.push('\n');
        script.push_str(&format!(
            "# Runs the test suite before every {}. Reinstall with `{APP_NAME} install`.\n",
            self.event.operation()
        ));
        script.push('\n');
        script.push_str(&format!("gate={program}\n"));
        script.push_str(&format!(
            "if [ ! -x \"$gate\" ]; then\n    echo \"{APP_NAME}: $gate not found; reinstall the hook\" >&2\n    exit 1\nfi\n"
        ));

        if let Some(original) = self.chained {
            let original = shell_quote(original);
            script.push('\n');
            script.push_str("hooks_dir=$(dirname \"$0\")\n");
            script.push_str(&format!("original=\"$hooks_dir\"/{original}\n"));
            let run_original = match self.event {
                HookEvent::PrePush => {
                    script.push_str("input=$(cat)\n");
                    "printf '%s\\n' \"$input\" | \"$original\" \"$@\" || exit $?"
                }
                HookEvent::PreCommit => "\"$original\" \"$@\" || exit $?",
            };
            script.push_str(&format!(
                "if [ -x \"$original\" ]; then\n    {run_original}\nfi\n"
            ));
        }

        script.push('\n');
        script.push_str(&format!("echo \"Running {event} tests...\" >&2\n"));

        let mut args = vec![
            "\"$gate\"".to_string(),
            "run".to_string(),
            event.to_string(),
            "--test-command".to_string(),
            shell_quote(self.test_command),
        ];
        if let Some(secs) = self.timeout_secs {
            args.push("--timeout-secs".to_string());
            args.push(secs.to_string());
        }
        args.push("--zero-tests".to_string());
        args.push(self.zero_tests.as_str().to_string());
        args.push("\"$@\"".to_string());

        match (self.chained, self.event) {
            (Some(_), HookEvent::PrePush) => {
                script.push_str(&format!("printf '%s\\n' \"$input\" | exec {}\n", args.join(" ")));
            }
            _ => script.push_str(&format!("exec {}\n", args.join(" "))),
        }
        script
    }
}

/// Whether `content` was written by this tool.
pub(crate) fn is_managed(content: &str) -> bool {
    content.lines().take(5).any(|line| line.trim() == MARKER)
}

/// Whether a managed hook runs a preserved original first.
pub(crate) fn chains_original(content: &str) -> bool {
    content.lines().any(|line| line.starts_with("original="))
}

/// Single-quote `value` for POSIX sh.
pub(crate) fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
