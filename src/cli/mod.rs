pub mod install;
pub mod run;
pub mod status;
pub mod uninstall;

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::config::{CliOverrides, Config, ConfigError, DEFAULT_CONFIG_FILE};
use crate::domain::ZeroTestsPolicy;
use crate::git::{self, GitError};

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install pre-commit and pre-push hooks that run the test suite
    Install(install::InstallArgs),
    /// Evaluate one hook event (invoked by the installed hook scripts)
    Run(run::RunArgs),
    /// Show which hooks are installed
    Status(status::StatusArgs),
    /// Remove installed hooks, restoring any preserved originals
    Uninstall(uninstall::UninstallArgs),
}

/// Where the repository and its hooks live.
#[derive(Debug, Args)]
pub struct RepoArgs {
    /// Repository to operate on (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,
    /// Hooks directory (defaults to what git reports for the repository)
    #[arg(long, value_name = "DIR")]
    pub hooks_dir: Option<PathBuf>,
}

impl RepoArgs {
    fn start_dir(&self) -> PathBuf {
        self.repo.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub(crate) fn root(&self) -> Result<PathBuf, GitError> {
        git::toplevel(&self.start_dir())
    }

    pub(crate) fn hooks_dir(&self) -> Result<PathBuf, GitError> {
        match &self.hooks_dir {
            Some(dir) => Ok(dir.clone()),
            None => git::hooks_dir(&self.start_dir()),
        }
    }
}

/// Test settings shared by `install` and `run`.
#[derive(Debug, Args)]
pub struct TestArgs {
    /// Config file (defaults to .git-test-gate.kdl at the repository root)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Shell command that runs the test suite
    #[arg(long, value_name = "CMD")]
    pub test_command: Option<String>,
    /// Kill the test command after this many seconds (0 disables)
    #[arg(long, value_name = "N")]
    pub timeout_secs: Option<u64>,
    /// What to do when the test command reports zero tests: warn or reject
    #[arg(long, value_name = "POLICY")]
    pub zero_tests: Option<ZeroTestsPolicy>,
}

impl TestArgs {
    /// Load the config file (explicit path must exist; the default may not)
    /// and layer the command-line values over it.
    pub(crate) fn load(&self, root: &Path, overrides: CliOverrides) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(&root.join(DEFAULT_CONFIG_FILE))?,
        };
        config.apply(&CliOverrides {
            test_command: self.test_command.clone(),
            timeout_secs: self.timeout_secs,
            zero_tests: self.zero_tests,
            ..overrides
        })?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}
