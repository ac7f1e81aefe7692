use std::io::ErrorKind;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::signal::{self, ActiveGroup};
use super::stream::{self, Echo};
use super::{
    CommandRunner, ExecutionResult, Termination, EXIT_INTERRUPTED, EXIT_NOT_EXECUTABLE,
    EXIT_NOT_FOUND, EXIT_TIMED_OUT,
};

/// How long to wait for the reader threads once the child is gone.
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs commands through the platform shell (`sh -c` / `cmd /C`).
///
/// Output is echoed to this process's stdout/stderr as it arrives and also
/// captured for the decision engine.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    echo: bool,
    forward_interrupts: bool,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    /// Runner for hook use: live output and interrupt forwarding.
    pub fn new() -> Self {
        Self {
            echo: true,
            forward_interrupts: true,
        }
    }

    /// Runner that only captures output and leaves signal handling alone.
    pub fn captured() -> Self {
        Self {
            echo: false,
            forward_interrupts: false,
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path, timeout: Option<Duration>) -> ExecutionResult {
        let start = Instant::now();

        if !working_dir.is_dir() {
            return ExecutionResult::not_found(
                format!("working directory not found: {}", working_dir.display()),
                start.elapsed(),
            );
        }

        let mut child = match spawn_shell_command(command, working_dir) {
            Ok(child) => child,
            Err(e) => return spawn_failure(command, &e, start.elapsed()),
        };
        tracing::debug!(pid = child.id(), command, "spawned test command");

        let (stdout_echo, stderr_echo) = if self.echo {
            (Echo::Stdout, Echo::Stderr)
        } else {
            (Echo::Off, Echo::Off)
        };
        let stdout_rx = child.stdout.take().map(|s| stream::tee(s, stdout_echo));
        let stderr_rx = child.stderr.take().map(|s| stream::tee(s, stderr_echo));

        let group = if self.forward_interrupts {
            signal::install_forwarder();
            Some(ActiveGroup::register(&child))
        } else {
            None
        };

        let waited = wait(&mut child, timeout);
        // Background jobs outlive the shell and hold the output pipes open.
        if let Waited::Exited(_) = waited {
            signal::sweep_group(child.id());
        }
        let interrupted = group.as_ref().is_some_and(ActiveGroup::interrupted);
        drop(group);

        let duration = start.elapsed();
        let stdout = collect(stdout_rx);
        let mut stderr = collect(stderr_rx);

        let (exit_code, termination) = match waited {
            Waited::Exited(_) if interrupted => (EXIT_INTERRUPTED, Termination::Interrupted),
            Waited::Exited(status) => classify(status),
            Waited::TimedOut(limit) => {
                push_line(
                    &mut stderr,
                    &format!("[process group killed after {}s timeout]", limit.as_secs()),
                );
                (EXIT_TIMED_OUT, Termination::TimedOut)
            }
            Waited::Lost(e) => {
                push_line(&mut stderr, &format!("failed to wait for test command: {e}"));
                (EXIT_INTERRUPTED, Termination::Interrupted)
            }
        };

        if termination == Termination::NotFound && !stderr.contains("not found") {
            push_line(&mut stderr, &format!("command not found: {command}"));
        }

        ExecutionResult {
            exit_code,
            stdout,
            stderr,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            termination,
        }
    }
}

enum Waited {
    Exited(ExitStatus),
    TimedOut(Duration),
    Lost(std::io::Error),
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> Waited {
    let Some(limit) = timeout else {
        return match child.wait() {
            Ok(status) => Waited::Exited(status),
            Err(e) => Waited::Lost(e),
        };
    };
    match child.wait_timeout(limit) {
        Ok(Some(status)) => Waited::Exited(status),
        Ok(None) => {
            tracing::warn!(timeout_secs = limit.as_secs(), "test command timed out");
            signal::terminate_group(child);
            Waited::TimedOut(limit)
        }
        Err(e) => {
            signal::terminate_group(child);
            Waited::Lost(e)
        }
    }
}

/// Spawn a shell command in its own process group.
///
/// The command string is passed to the shell as a single argument.
fn spawn_shell_command(command: &str, working_dir: &Path) -> std::io::Result<Child> {
    let mut cmd = if cfg!(target_family = "unix") {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    } else {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    };

    cmd.current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    cmd.spawn()
}

fn spawn_failure(command: &str, error: &std::io::Error, elapsed: Duration) -> ExecutionResult {
    tracing::debug!(command, error = %error, "failed to spawn shell");
    match error.kind() {
        ErrorKind::NotFound => ExecutionResult::not_found(
            format!("command not found: shell unavailable to run '{command}' ({error})"),
            elapsed,
        ),
        _ => ExecutionResult {
            exit_code: EXIT_NOT_EXECUTABLE,
            stdout: String::new(),
            stderr: format!("could not execute '{command}': {error}"),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            termination: Termination::NotExecutable,
        },
    }
}

/// Map a shell exit status to an exit code and termination kind.
///
/// POSIX shells report 127 for an unknown command and 126 for a file that
/// exists but cannot be executed.
fn classify(status: ExitStatus) -> (i32, Termination) {
    match status.code() {
        Some(EXIT_NOT_FOUND) => (EXIT_NOT_FOUND, Termination::NotFound),
        Some(EXIT_NOT_EXECUTABLE) => (EXIT_NOT_EXECUTABLE, Termination::NotExecutable),
        Some(code) => (code, Termination::Exited),
        None => classify_signal(status),
    }
}

#[cfg(unix)]
fn classify_signal(status: ExitStatus) -> (i32, Termination) {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(sig) if sig == nix::sys::signal::Signal::SIGINT as i32 => {
            (EXIT_INTERRUPTED, Termination::Interrupted)
        }
        Some(sig) => (128 + sig, Termination::Signaled(sig)),
        None => (1, Termination::Exited),
    }
}

#[cfg(not(unix))]
fn classify_signal(_status: ExitStatus) -> (i32, Termination) {
    (1, Termination::Exited)
}

fn collect(rx: Option<Receiver<String>>) -> String {
    match rx {
        Some(rx) => rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_else(|_| "[output collection timed out]".to_string()),
        None => String::new(),
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() && !buf.ends_with('\n') {
        buf.push('\n');
    }
    buf.push_str(line);
    buf.push('\n');
}
