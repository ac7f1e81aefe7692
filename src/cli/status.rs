use std::process::ExitCode;

use clap::Args;
use miette::IntoDiagnostic;

use super::RepoArgs;
use crate::config::Config;
use crate::install::{HookFileState, Installer};

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &StatusArgs) -> miette::Result<ExitCode> {
    let hooks_dir = args.repo.hooks_dir()?;
    let installer = Installer::new(&hooks_dir, Config::default());
    let state = installer.state()?;

    if args.json {
        let json = serde_json::json!({
            "hooks_dir": hooks_dir,
            "hooks": state,
        });
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("hooks directory: {}", hooks_dir.display());
    for (event, hook) in &state {
        println!("{event}: {}", describe(hook));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(hook: &HookFileState) -> String {
    if !hook.exists {
        return "not installed".to_string();
    }
    let mut text = if hook.managed {
        "installed".to_string()
    } else {
        "foreign hook (not managed by git-test-gate)".to_string()
    };
    if hook.chained {
        text.push_str(", runs the original hook first");
    }
    if !hook.executable {
        text.push_str(", NOT executable");
    }
    if let Some(hash) = &hook.content_hash {
        text.push_str(&format!(", sha256 {}", &hash[..12.min(hash.len())]));
    }
    text
}
