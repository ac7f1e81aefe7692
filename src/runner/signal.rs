//! Interrupt forwarding and process-group termination.
//!
//! The test command runs in its own process group so that a timeout or an
//! operator interrupt reaches every process it started, not just the shell.
//! Because the group is detached from the terminal's foreground group, the
//! terminal's Ctrl+C only reaches this process; the handler installed here
//! relays it to the active group.

use std::process::Child;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
#[cfg(unix)]
use std::time::Instant;

use super::EXIT_INTERRUPTED;

/// Grace period between SIGTERM and SIGKILL when stopping a group.
#[cfg(unix)]
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

#[cfg(unix)]
const SWEEP_POLL: Duration = Duration::from_millis(20);

static ACTIVE_GROUP: AtomicI32 = AtomicI32::new(0);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static HANDLER: OnceLock<()> = OnceLock::new();

/// Install the process-wide interrupt handler (first call only).
///
/// While a group is registered the interrupt is relayed to it; with no
/// command running the process exits with the conventional 130.
pub(super) fn install_forwarder() {
    HANDLER.get_or_init(|| {
        let result = ctrlc::set_handler(|| {
            INTERRUPTED.store(true, Ordering::SeqCst);
            let pgid = ACTIVE_GROUP.load(Ordering::SeqCst);
            if pgid > 0 {
                interrupt_group(pgid);
            } else {
                std::process::exit(EXIT_INTERRUPTED);
            }
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not install interrupt handler");
        }
    });
}

/// Registers a child's process group as the interrupt target until dropped.
pub(super) struct ActiveGroup;

impl ActiveGroup {
    pub(super) fn register(child: &Child) -> Self {
        INTERRUPTED.store(false, Ordering::SeqCst);
        let pgid = i32::try_from(child.id()).unwrap_or(0);
        ACTIVE_GROUP.store(pgid, Ordering::SeqCst);
        ActiveGroup
    }

    /// Whether an interrupt arrived since registration.
    pub(super) fn interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::SeqCst)
    }
}

impl Drop for ActiveGroup {
    fn drop(&mut self) {
        ACTIVE_GROUP.store(0, Ordering::SeqCst);
    }
}

/// Stop the child's whole process group: SIGTERM, then SIGKILL after a grace
/// period, then reap the child.
pub(super) fn terminate_group(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;
        use wait_timeout::ChildExt;

        let pgid = i32::try_from(child.id()).unwrap_or(0);
        if pgid > 0 {
            signal_group(pgid, Signal::SIGTERM);
            if let Ok(Some(_)) = child.wait_timeout(TERMINATE_GRACE) {
                // Stragglers that ignored SIGTERM still hold the pipes open.
                signal_group(pgid, Signal::SIGKILL);
                return;
            }
            signal_group(pgid, Signal::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Stop whatever is left of a process group whose leader already exited.
pub(super) fn sweep_group(leader: u32) {
    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;

        let pgid = i32::try_from(leader).unwrap_or(0);
        if pgid <= 0 || !group_exists(pgid) {
            return;
        }
        tracing::debug!(pgid, "stopping processes left behind by the test command");
        signal_group(pgid, Signal::SIGTERM);
        let deadline = Instant::now() + TERMINATE_GRACE;
        while group_exists(pgid) && Instant::now() < deadline {
            std::thread::sleep(SWEEP_POLL);
        }
        signal_group(pgid, Signal::SIGKILL);
    }
    #[cfg(not(unix))]
    let _ = leader;
}

#[cfg(unix)]
fn group_exists(pgid: i32) -> bool {
    nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pgid), None).is_ok()
}

#[cfg(unix)]
fn interrupt_group(pgid: i32) {
    signal_group(pgid, nix::sys::signal::Signal::SIGINT);
}

#[cfg(not(unix))]
fn interrupt_group(_pgid: i32) {}

#[cfg(unix)]
fn signal_group(pgid: i32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid, ?signal, error = %e, "failed to signal process group"),
    }
}

/// Whether `pid` is still running; zombies count as gone.
#[cfg(all(test, unix))]
pub(super) fn process_alive(pid: i32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let alive = match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => !stat
                .rsplit_once(')')
                .is_some_and(|(_, rest)| rest.trim_start().starts_with('Z')),
            Err(_) if std::path::Path::new("/proc/self").exists() => false,
            Err(_) => nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok(),
        };
        if !alive || Instant::now() >= deadline {
            return alive;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};

    #[test]
    fn terminate_group_stops_sleeping_child() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("sleep 30")
            .stdout(Stdio::null())
            .process_group(0)
            .spawn()
            .unwrap();
        terminate_group(&mut child);
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn sweep_kills_members_that_ignore_sigterm() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("trap '' TERM; sleep 30 >/dev/null & echo $!")
            .stdout(Stdio::piped())
            .process_group(0)
            .spawn()
            .unwrap();
        let mut out = String::new();
        std::io::Read::read_to_string(&mut child.stdout.take().unwrap(), &mut out).ok();
        child.wait().unwrap();
        let pid: i32 = out.trim().parse().unwrap();
        assert!(nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok());

        sweep_group(child.id());
        assert!(!process_alive(pid));
    }

    #[test]
    fn sweep_of_finished_group_returns_at_once() {
        let mut child = Command::new("true").process_group(0).spawn().unwrap();
        child.wait().unwrap();
        let started = Instant::now();
        sweep_group(child.id());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn active_group_clears_on_drop() {
        let mut child = Command::new("true").spawn().unwrap();
        {
            let _guard = ActiveGroup::register(&child);
            assert_ne!(ACTIVE_GROUP.load(Ordering::SeqCst), 0);
        }
        assert_eq!(ACTIVE_GROUP.load(Ordering::SeqCst), 0);
        child.wait().unwrap();
    }
}
