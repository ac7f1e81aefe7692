//! Repository discovery through the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use miette::Diagnostic;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum GitError {
    #[error("git not found: {0}")]
    #[diagnostic(
        code(git_test_gate::git::not_found),
        help("install git and make sure it is on PATH")
    )]
    NotFound(#[source] std::io::Error),
    #[error("not a git repository: {}", path.display())]
    #[diagnostic(
        code(git_test_gate::git::not_a_repository),
        help("run inside a repository, or pass --repo / --hooks-dir")
    )]
    NotARepository { path: PathBuf, stderr: String },
}

/// Top-level directory of the repository containing `dir`.
pub fn toplevel(dir: &Path) -> Result<PathBuf, GitError> {
    git_path(dir, &["rev-parse", "--show-toplevel"])
}

/// Hooks directory git will actually use for the repository at `dir`.
/// Honours `core.hooksPath` and linked worktrees.
pub fn hooks_dir(dir: &Path) -> Result<PathBuf, GitError> {
    git_path(dir, &["rev-parse", "--git-path", "hooks"])
}

/// Run git in `dir` and return its output as a path anchored at `dir`.
fn git_path(dir: &Path, args: &[&str]) -> Result<PathBuf, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(GitError::NotFound)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!(dir = %dir.display(), ?args, stderr, "git rev-parse failed");
        return Err(GitError::NotARepository {
            path: dir.to_path_buf(),
            stderr,
        });
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    // `--git-path` may answer relative to `dir`.
    Ok(dir.join(text))
}
