use std::process::ExitCode;

use clap::Args;

use super::RepoArgs;
use crate::config::Config;
use crate::install::Installer;

#[derive(Debug, Args)]
pub struct UninstallArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
}

pub fn run(args: &UninstallArgs) -> miette::Result<ExitCode> {
    let hooks_dir = args.repo.hooks_dir()?;
    let report = Installer::new(&hooks_dir, Config::default()).uninstall()?;

    for path in &report.removed {
        println!("removed {}", path.display());
    }
    for path in &report.restored {
        println!("restored original hook {}", path.display());
    }
    for path in &report.skipped {
        println!("left {} alone (not installed by git-test-gate)", path.display());
    }
    if report.removed.is_empty() && report.restored.is_empty() {
        println!("no managed hooks found in {}", hooks_dir.display());
    }
    Ok(ExitCode::SUCCESS)
}
