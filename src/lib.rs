pub mod config;
pub mod decision;
pub mod domain;
pub mod git;
pub mod install;
pub mod progress;
pub mod protocol;
pub mod runner;

pub(crate) mod cli;
pub(crate) mod command;

pub use cli::Commands;

/// Run one subcommand and return the process exit status.
///
/// This bridges the binary crate (`main.rs`) to the library without exposing
/// `cli` internals. Callers embedding the gate should use
/// [`decision::HookEngine`] and [`install::Installer`] directly.
pub fn run_command(command: &Commands) -> miette::Result<std::process::ExitCode> {
    match command {
        Commands::Install(args) => cli::install::run(args),
        Commands::Run(args) => cli::run::run(args),
        Commands::Status(args) => cli::status::run(args),
        Commands::Uninstall(args) => cli::uninstall::run(args),
    }
}
