use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use git_test_gate::Commands;

/// Git hooks that refuse commits and pushes when the test suite fails.
#[derive(Debug, Parser)]
#[command(name = "git-test-gate", version, about)]
struct Cli {
    /// Log decisions to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Environment variable holding a tracing filter, e.g. `git_test_gate=debug`.
const LOG_ENV: &str = "GIT_TEST_GATE_LOG";

fn setup_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    git_test_gate::run_command(&cli.command)
}
