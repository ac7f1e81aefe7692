use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Args;

use super::{RepoArgs, TestArgs};
use crate::config::CliOverrides;
use crate::domain::HookEvent;
use crate::install::{
    ConflictPolicy, ConflictResolver, FixedPolicy, InstallOutcome, Installer, Prompt, Resolution,
};

#[derive(Debug, Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
    #[command(flatten)]
    pub test: TestArgs,
    /// Install only this hook (repeatable)
    #[arg(long = "hook", value_name = "HOOK")]
    pub hooks: Vec<HookEvent>,
    /// How to handle existing hooks not installed by this tool:
    /// prompt, abort, overwrite or merge
    #[arg(long, value_name = "POLICY", default_value = "abort")]
    pub on_conflict: ConflictPolicy,
}

pub fn run(args: &InstallArgs) -> miette::Result<ExitCode> {
    let hooks_dir = args.repo.hooks_dir()?;
    let root = match args.repo.root() {
        Ok(root) => root,
        // An explicit hooks directory works without a repository.
        Err(_) if args.repo.hooks_dir.is_some() => std::env::current_dir().map_err(|e| {
            miette::miette!("cannot determine the current directory: {e}")
        })?,
        Err(e) => return Err(e.into()),
    };

    let config = args.test.load(
        &root,
        CliOverrides {
            hooks: args.hooks.clone(),
            ..Default::default()
        },
    )?;

    let resolver = resolver(args.on_conflict);
    let report = Installer::new(&hooks_dir, config).install(resolver.as_ref())?;

    for (event, path, outcome) in &report.hooks {
        let what = match outcome {
            InstallOutcome::Created => "installed",
            InstallOutcome::Replaced => "updated",
            InstallOutcome::Unchanged => "already up to date",
            InstallOutcome::Merged => "installed (existing hook kept and chained)",
        };
        println!("{event}: {what} ({})", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn resolver(policy: ConflictPolicy) -> Box<dyn ConflictResolver> {
    match policy {
        ConflictPolicy::Prompt if std::io::stdin().is_terminal() => Box::new(Prompt::terminal()),
        ConflictPolicy::Prompt => {
            tracing::warn!("stdin is not a terminal; existing hooks will not be touched");
            Box::new(FixedPolicy(Resolution::Abort))
        }
        ConflictPolicy::Abort => Box::new(FixedPolicy(Resolution::Abort)),
        ConflictPolicy::Overwrite => Box::new(FixedPolicy(Resolution::Overwrite)),
        ConflictPolicy::Merge => Box::new(FixedPolicy(Resolution::Merge)),
    }
}
