//! Installer: writes, reports on and removes the managed hook scripts.

mod atomic;
mod resolve;
mod state;
mod template;

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;

use crate::config::{Config, ConfigError, HookSettings};
use crate::decision::APP_NAME;
use crate::domain::HookEvent;

pub use resolve::{ConflictPolicy, ConflictResolver, FixedPolicy, Prompt, Resolution};
pub use state::{HookFileState, HookInstallationState};

use template::HookTemplate;

/// Errors raised while installing or removing hooks.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum InstallError {
    #[error("Permission denied: cannot write hooks to {}", path.display())]
    #[diagnostic(
        code(git_test_gate::install::permission),
        help("make the directory writable by your user (e.g. `chown -R $USER` on it) or rerun with sufficient rights")
    )]
    PermissionDenied { path: PathBuf },

    #[error("existing hooks were not installed by git-test-gate: {}", display_paths(paths))]
    #[diagnostic(
        code(git_test_gate::install::conflict),
        help("rerun with --on-conflict merge to keep them, --on-conflict overwrite to replace them, or --on-conflict prompt")
    )]
    Conflict { paths: Vec<PathBuf> },

    #[error("a preserved hook already exists at {}", path.display())]
    #[diagnostic(
        code(git_test_gate::install::preserved),
        help("move or delete the preserved file, then install again")
    )]
    PreservedExists { path: PathBuf },

    #[error("failed to access {}: {source}", path.display())]
    #[diagnostic(code(git_test_gate::install::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot locate the git-test-gate executable: {0}")]
    #[diagnostic(code(git_test_gate::install::current_exe))]
    CurrentExe(#[source] io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl InstallError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// What installation did to one hook file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Created,
    /// An older managed hook, or a foreign one the resolver chose to overwrite.
    Replaced,
    /// Already up to date; the file was not touched.
    Unchanged,
    /// A foreign hook was preserved and chained before the tests.
    Merged,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    pub hooks: Vec<(HookEvent, PathBuf, InstallOutcome)>,
}

#[derive(Debug, Default)]
pub struct UninstallReport {
    pub removed: Vec<PathBuf>,
    /// Paths where a preserved original hook was put back.
    pub restored: Vec<PathBuf>,
    /// Foreign hooks left alone.
    pub skipped: Vec<PathBuf>,
}

/// Classification of one target before anything is written.
enum Plan {
    Create,
    Unchanged,
    /// Rewrite a managed hook, keeping whether it chains an original.
    Replace { chained: bool },
    Conflict { existing: String },
}

struct Step {
    event: HookEvent,
    path: PathBuf,
    settings: HookSettings,
    plan: Plan,
    resolution: Option<Resolution>,
}

/// Installs hook scripts for the events a [`Config`] names into one hooks
/// directory.
pub struct Installer {
    hooks_dir: PathBuf,
    config: Config,
    program: Option<PathBuf>,
    writable_check: fn(&Path) -> io::Result<()>,
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("hooks_dir", &self.hooks_dir)
            .field("config", &self.config)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl Installer {
    pub fn new(hooks_dir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
            config,
            program: None,
            writable_check: atomic::probe_writable,
        }
    }

    /// Embed `program` in the hooks instead of the running executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Replace the hooks directory writability check.
    #[cfg(test)]
    fn with_writable_check(mut self, check: fn(&Path) -> io::Result<()>) -> Self {
        self.writable_check = check;
        self
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    pub fn hook_path(&self, event: HookEvent) -> PathBuf {
        self.hooks_dir.join(event.file_name())
    }

    /// Where a merged-away foreign hook is kept.
    pub fn preserved_path(&self, event: HookEvent) -> PathBuf {
        self.hooks_dir.join(preserved_relative(event))
    }

    /// Install every configured hook.
    ///
    /// Nothing is written unless every conflict resolves to something other
    /// than [`Resolution::Abort`].
    pub fn install(&self, resolver: &dyn ConflictResolver) -> Result<InstallReport, InstallError> {
        let mut resolved = Vec::new();
        for event in self.config.events() {
            resolved.push((event, self.config.settings(event)?));
        }
        let program = match &self.program {
            Some(program) => program.clone(),
            None => std::env::current_exe().map_err(InstallError::CurrentExe)?,
        };

        self.preflight()?;

        let mut steps = Vec::with_capacity(resolved.len());
        for (event, settings) in resolved {
            let path = self.hook_path(event);
            let plan = self.classify(event, &path, &program, &settings)?;
            steps.push(Step {
                event,
                path,
                settings,
                plan,
                resolution: None,
            });
        }

        let mut aborted = Vec::new();
        for step in &mut steps {
            if let Plan::Conflict { existing } = &step.plan {
                let resolution = resolver.resolve(step.event, &step.path, existing);
                tracing::debug!(event = %step.event, ?resolution, "conflict");
                if resolution == Resolution::Abort {
                    aborted.push(step.path.clone());
                }
                step.resolution = Some(resolution);
            }
        }
        if !aborted.is_empty() {
            return Err(InstallError::Conflict { paths: aborted });
        }

        let mut report = InstallReport::default();
        for step in steps {
            let outcome = self.apply(&step, &program)?;
            tracing::debug!(event = %step.event, ?outcome, path = %step.path.display(), "installed");
            report.hooks.push((step.event, step.path, outcome));
        }
        Ok(report)
    }

    /// Remove managed hooks, putting back any preserved original.
    pub fn uninstall(&self) -> Result<UninstallReport, InstallError> {
        let mut report = UninstallReport::default();
        for event in HookEvent::ALL {
            let path = self.hook_path(event);
            let preserved = self.preserved_path(event);
            let state =
                HookFileState::read(&path, &preserved).map_err(|e| InstallError::io(&path, e))?;
            if !state.exists {
                continue;
            }
            if !state.managed {
                report.skipped.push(path);
                continue;
            }
            if state.chained {
                std::fs::rename(&preserved, &path).map_err(|e| InstallError::io(&path, e))?;
                report.restored.push(path);
            } else {
                std::fs::remove_file(&path).map_err(|e| InstallError::io(&path, e))?;
                report.removed.push(path);
            }
        }
        // Only succeeds once the directory is empty.
        let _ = std::fs::remove_dir(self.hooks_dir.join(APP_NAME));
        Ok(report)
    }

    /// Current state of every hook kind.
    pub fn state(&self) -> Result<HookInstallationState, InstallError> {
        HookEvent::ALL
            .into_iter()
            .map(|event| {
                let path = self.hook_path(event);
                HookFileState::read(&path, &self.preserved_path(event))
                    .map(|state| (event, state))
                    .map_err(|e| InstallError::io(&path, e))
            })
            .collect()
    }

    fn preflight(&self) -> Result<(), InstallError> {
        std::fs::create_dir_all(&self.hooks_dir)
            .and_then(|()| (self.writable_check)(&self.hooks_dir))
            .map_err(|e| {
                tracing::warn!(dir = %self.hooks_dir.display(), error = %e, "hooks directory not writable");
                InstallError::io(&self.hooks_dir, e)
            })
    }

    fn classify(
        &self,
        event: HookEvent,
        path: &Path,
        program: &Path,
        settings: &HookSettings,
    ) -> Result<Plan, InstallError> {
        let state = HookFileState::read(path, &self.preserved_path(event))
            .map_err(|e| InstallError::io(path, e))?;
        let Some(existing) = state.content else {
            return Ok(Plan::Create);
        };
        if !state.managed {
            return Ok(Plan::Conflict { existing });
        }
        let wanted = self.render(event, program, settings, state.chained);
        if existing == wanted && state.executable {
            Ok(Plan::Unchanged)
        } else {
            Ok(Plan::Replace {
                chained: state.chained,
            })
        }
    }

    fn apply(&self, step: &Step, program: &Path) -> Result<InstallOutcome, InstallError> {
        let write = |chained: bool| {
            let content = self.render(step.event, program, &step.settings, chained);
            atomic::write_executable(&step.path, &content)
                .map_err(|e| InstallError::io(&step.path, e))
        };
        match (&step.plan, step.resolution) {
            (Plan::Unchanged, _) => Ok(InstallOutcome::Unchanged),
            (Plan::Create, _) => write(false).map(|()| InstallOutcome::Created),
            (Plan::Replace { chained }, _) => {
                write(*chained).map(|()| InstallOutcome::Replaced)
            }
            (Plan::Conflict { .. }, Some(Resolution::Merge)) => {
                self.preserve(step)?;
                if let Err(e) = write(true) {
                    let _ = std::fs::remove_file(self.preserved_path(step.event));
                    return Err(e);
                }
                Ok(InstallOutcome::Merged)
            }
            (Plan::Conflict { .. }, _) => {
                write(false)?;
                self.discard_preserved(step.event)?;
                Ok(InstallOutcome::Replaced)
            }
        }
    }

    /// Drop a copy left by an earlier merge; the hook it belonged to is gone.
    fn discard_preserved(&self, event: HookEvent) -> Result<(), InstallError> {
        let preserved = self.preserved_path(event);
        match std::fs::remove_file(&preserved) {
            Ok(()) => {
                tracing::debug!(path = %preserved.display(), "discarded stale preserved hook");
                let _ = std::fs::remove_dir(self.hooks_dir.join(APP_NAME));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InstallError::io(&preserved, e)),
        }
    }

    /// Copy the foreign hook aside; the original stays in place until the
    /// managed hook atomically replaces it.
    fn preserve(&self, step: &Step) -> Result<(), InstallError> {
        let preserved = self.preserved_path(step.event);
        if preserved.exists() {
            return Err(InstallError::PreservedExists { path: preserved });
        }
        let dir = self.hooks_dir.join(APP_NAME);
        std::fs::create_dir_all(&dir).map_err(|e| InstallError::io(&dir, e))?;
        std::fs::copy(&step.path, &preserved).map_err(|e| InstallError::io(&preserved, e))?;
        tracing::debug!(from = %step.path.display(), to = %preserved.display(), "preserved existing hook");
        Ok(())
    }

    fn render(
        &self,
        event: HookEvent,
        program: &Path,
        settings: &HookSettings,
        chained: bool,
    ) -> String {
        let relative = preserved_relative(event);
        HookTemplate {
            event,
            program,
            test_command: &settings.test_command,
            timeout_secs: settings.timeout.map(|t| t.as_secs()),
            zero_tests: settings.zero_tests,
            chained: chained.then_some(relative.as_str()),
        }
        .render()
    }
}

fn preserved_relative(event: HookEvent) -> String {
    format!("{APP_NAME}/{}.local", event.file_name())
}
