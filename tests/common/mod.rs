// Shared test helpers for integration tests.
// Used by cli_contract.rs and git_flows.rs.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub fn binary_path() -> PathBuf {
    let path = PathBuf::from(env!("CARGO_BIN_EXE_git-test-gate"));
    assert!(path.exists(), "binary not found at {}", path.display());
    path
}

/// Result of one process run: (stdout, stderr, exit_code).
pub type RunOutput = (String, String, i32);

fn split(output: Output) -> RunOutput {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let exit_code = output.status.code().unwrap_or(-1);
    (stdout, stderr, exit_code)
}

/// Runs the binary in `dir` with the given args and stdin.
pub fn run_gate(dir: &Path, args: &[&str], stdin_input: &str) -> RunOutput {
    let mut child = Command::new(binary_path())
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env_remove("GIT_TEST_GATE_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to execute binary");
    {
        use std::io::{ErrorKind, Write};
        let mut stdin = child.stdin.take().unwrap();
        if let Err(e) = stdin.write_all(stdin_input.as_bytes()) {
            assert_eq!(e.kind(), ErrorKind::BrokenPipe, "writing stdin: {e}");
        }
    }
    split(child.wait_with_output().expect("failed to wait for binary"))
}

/// Writes an executable shell script.
pub fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
    }
}

pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Runs git in `dir` isolated from the user's and system's git config.
pub fn git(dir: &Path, args: &[&str]) -> RunOutput {
    git_with_stdin(dir, args, None)
}

pub fn git_with_stdin(dir: &Path, args: &[&str], stdin: Option<&str>) -> RunOutput {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env_remove("GIT_TEST_GATE_LOG")
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("failed to run git");
    if let Some(input) = stdin {
        use std::io::Write;
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .expect("write git stdin");
    }
    split(child.wait_with_output().expect("failed to wait for git"))
}

/// Runs git and fails the test if it does not succeed.
pub fn git_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = git(dir, args);
    assert_eq!(code, 0, "git {args:?} failed:\n{stderr}");
    stdout
}
