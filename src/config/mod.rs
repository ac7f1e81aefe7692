mod document;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;

use crate::domain::{HookEvent, ZeroTestsPolicy};

use document::{ConfigDocument, ConfigSection, ParseNode};

/// Config file looked up at the repository root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".git-test-gate.kdl";

/// Top-level configuration loaded from a KDL file and/or command-line flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Command run by every hook unless the hook's own section overrides it.
    pub test_command: Option<String>,
    pub timeout: Option<Duration>,
    pub zero_tests: ZeroTestsPolicy,
    /// Extra regexes that mark output as "no tests ran".
    pub zero_test_patterns: Vec<String>,
    /// Hooks to install. Empty means all supported hooks.
    pub hooks: Vec<HookEvent>,
    pub overrides: BTreeMap<HookEvent, HookOverride>,
}

/// Per-hook section, e.g. `pre-push { test-command "cargo test --all" }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOverride {
    pub test_command: Option<String>,
    pub timeout: Option<Duration>,
    pub zero_tests: Option<ZeroTestsPolicy>,
}

/// Settings for one hook after overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct HookSettings {
    pub test_command: String,
    pub timeout: Option<Duration>,
    pub zero_tests: ZeroTestsPolicy,
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub test_command: Option<String>,
    pub timeout_secs: Option<u64>,
    pub zero_tests: Option<ZeroTestsPolicy>,
    pub zero_test_patterns: Vec<String>,
    pub hooks: Vec<HookEvent>,
}

/// Errors that can occur when loading or parsing a config file.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    #[diagnostic(code(git_test_gate::config::not_found))]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    #[diagnostic(code(git_test_gate::config::read))]
    ReadError(#[from] std::io::Error),
    #[error("invalid KDL syntax: {0}")]
    #[diagnostic(code(git_test_gate::config::syntax))]
    ParseError(String),
    #[error("invalid config: {0}")]
    #[diagnostic(code(git_test_gate::config::invalid))]
    ValidationError(String),
    #[error("no test command configured for {0}")]
    #[diagnostic(
        code(git_test_gate::config::missing_test_command),
        help("add `test-command \"<command>\"` to .git-test-gate.kdl or pass --test-command")
    )]
    MissingTestCommand(HookEvent),
}

impl Config {
    /// Load a config from a KDL file at the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::ReadError(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Load the config at `path` if the file exists, else the default config.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse a KDL string into a Config.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let doc = ConfigDocument::parse(content)?;
        Self::from_section(&doc.root())
    }

    fn from_section(root: &ConfigSection) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        for node in root.nodes() {
            match node.name() {
                "test-command" => config.test_command = Some(parse_command(&node)?),
                "timeout-secs" => config.timeout = Some(parse_timeout(&node)?),
                "zero-tests" => config.zero_tests = parse_policy(&node)?,
                "zero-tests-pattern" => {
                    for pattern in node.string_values() {
                        validate_pattern(pattern).map_err(|e| node.invalid(e))?;
                        config.zero_test_patterns.push(pattern.to_string());
                    }
                }
                "hooks" => {
                    for name in node.string_values() {
                        let event = name
                            .parse::<HookEvent>()
                            .map_err(|e| node.invalid(e.to_string()))?;
                        if !config.hooks.contains(&event) {
                            config.hooks.push(event);
                        }
                    }
                }
                name => match name.parse::<HookEvent>() {
                    Ok(event) => {
                        let section = parse_override(&node)?;
                        config.overrides.insert(event, section);
                    }
                    Err(_) => return Err(node.invalid(format!("unknown setting '{name}'"))),
                },
            }
        }
        Ok(config)
    }

    /// Layer command-line values over this config.
    pub fn apply(&mut self, cli: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(cmd) = &cli.test_command {
            self.test_command = Some(cmd.clone());
            // An explicit command on the command line applies to every hook.
            for section in self.overrides.values_mut() {
                section.test_command = None;
            }
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout = timeout_from_secs(secs);
            for section in self.overrides.values_mut() {
                section.timeout = None;
            }
        }
        if let Some(policy) = cli.zero_tests {
            self.zero_tests = policy;
            for section in self.overrides.values_mut() {
                section.zero_tests = None;
            }
        }
        for pattern in &cli.zero_test_patterns {
            validate_pattern(pattern).map_err(ConfigError::ValidationError)?;
            self.zero_test_patterns.push(pattern.clone());
        }
        if !cli.hooks.is_empty() {
            self.hooks = cli.hooks.clone();
        }
        Ok(())
    }

    /// Hooks this config installs, in a stable order.
    pub fn events(&self) -> Vec<HookEvent> {
        if self.hooks.is_empty() {
            HookEvent::ALL.to_vec()
        } else {
            let mut events = self.hooks.clone();
            events.sort();
            events
        }
    }

    /// Resolve the effective settings for one hook.
    pub fn settings(&self, event: HookEvent) -> Result<HookSettings, ConfigError> {
        let section = self.overrides.get(&event);
        let test_command = section
            .and_then(|s| s.test_command.clone())
            .or_else(|| self.test_command.clone())
            .filter(|cmd| !cmd.trim().is_empty())
            .ok_or(ConfigError::MissingTestCommand(event))?;
        Ok(HookSettings {
            test_command,
            timeout: section.and_then(|s| s.timeout).or(self.timeout),
            zero_tests: section.and_then(|s| s.zero_tests).unwrap_or(self.zero_tests),
        })
    }
}

fn parse_override(node: &ParseNode) -> Result<HookOverride, ConfigError> {
    let Some(children) = node.children() else {
        return Err(node.invalid(format!("'{}' needs a {{ ... }} block", node.name())));
    };
    if node.entry_count() > 0 {
        return Err(node.invalid(format!("'{}' takes no arguments", node.name())));
    }
    let mut section = HookOverride::default();
    for child in children.nodes() {
        match child.name() {
            "test-command" => section.test_command = Some(parse_command(&child)?),
            "timeout-secs" => section.timeout = Some(parse_timeout(&child)?),
            "zero-tests" => section.zero_tests = Some(parse_policy(&child)?),
            name => {
                return Err(child.invalid(format!(
                    "unknown setting '{name}' in '{}' block",
                    node.name()
                )))
            }
        }
    }
    Ok(section)
}

fn parse_command(node: &ParseNode) -> Result<String, ConfigError> {
    let command = node.single_string()?;
    if command.trim().is_empty() {
        return Err(node.invalid("test-command must not be empty".to_string()));
    }
    Ok(command.to_string())
}

fn parse_timeout(node: &ParseNode) -> Result<Duration, ConfigError> {
    let secs = node.single_u64()?;
    timeout_from_secs(secs).ok_or_else(|| node.invalid("timeout-secs must be positive".to_string()))
}

fn parse_policy(node: &ParseNode) -> Result<ZeroTestsPolicy, ConfigError> {
    node.single_string()?
        .parse()
        .map_err(|e: crate::domain::UnknownPolicy| node.invalid(e.to_string()))
}

/// Zero means "no timeout".
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn validate_pattern(pattern: &str) -> Result<(), String> {
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| format!("invalid zero-tests-pattern '{pattern}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // --- KDL Parsing Tests ---

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
            test-command "npm test"
            timeout-secs 300
            zero-tests "reject"
            zero-tests-pattern "nothing to do"
            hooks "pre-push"
            pre-push {
                test-command "npm run test:all"
                timeout-secs 900
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.test_command.as_deref(), Some("npm test"));
        assert_eq!(config.timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.zero_tests, ZeroTestsPolicy::Reject);
        assert_eq!(config.zero_test_patterns, vec!["nothing to do"]);
        assert_eq!(config.hooks, vec![HookEvent::PrePush]);
        let push = &config.overrides[&HookEvent::PrePush];
        assert_eq!(push.test_command.as_deref(), Some("npm run test:all"));
        assert_eq!(push.timeout, Some(Duration::from_secs(900)));
    }

    #[test]
    fn parse_empty_kdl_file() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn invalid_kdl_returns_parse_error() {
        let result = Config::parse("this is { not valid { kdl");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_setting_reports_line() {
        let err = Config::parse("test-command \"make test\"\nretries 3\n").unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => {
                assert!(msg.contains("line 2"), "got: {msg}");
                assert!(msg.contains("retries"), "got: {msg}");
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_command_needs_one_string() {
        assert!(matches!(
            Config::parse("test-command \"a\" \"b\"").unwrap_err(),
            ConfigError::ValidationError(_)
        ));
        assert!(matches!(
            Config::parse("test-command 3").unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn empty_test_command_is_rejected() {
        assert!(Config::parse("test-command \"  \"").is_err());
    }

    #[test]
    fn negative_timeout_is_rejected() {
        assert!(Config::parse("timeout-secs -5").is_err());
    }

    #[test]
    fn zero_timeout_is_rejected_in_file() {
        assert!(Config::parse("timeout-secs 0").is_err());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Config::parse("zero-tests \"sometimes\"").is_err());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = Config::parse("zero-tests-pattern \"(unclosed\"").unwrap_err();
        assert!(err.to_string().contains("zero-tests-pattern"));
    }

    #[test]
    fn unknown_hook_name_is_rejected() {
        assert!(Config::parse("hooks \"post-merge\"").is_err());
    }

    #[test]
    fn hook_section_requires_block() {
        assert!(Config::parse("pre-commit \"x\"").is_err());
    }

    #[test]
    fn unknown_setting_inside_hook_section() {
        let err = Config::parse("pre-commit {\n  shell \"bash\"\n}").unwrap_err();
        assert!(err.to_string().contains("pre-commit"));
    }

    // --- Resolution Tests ---

    #[test]
    fn settings_fall_back_to_top_level() {
        let config = Config::parse("test-command \"cargo test\"\ntimeout-secs 60").unwrap();
        let settings = config.settings(HookEvent::PreCommit).unwrap();
        assert_eq!(settings.test_command, "cargo test");
        assert_eq!(settings.timeout, Some(Duration::from_secs(60)));
        assert_eq!(settings.zero_tests, ZeroTestsPolicy::Warn);
    }

    #[test]
    fn hook_section_overrides_top_level() {
        let config = Config::parse(
            "test-command \"cargo test\"\npre-push {\n  test-command \"cargo test --all\"\n  zero-tests \"reject\"\n}",
        )
        .unwrap();
        let push = config.settings(HookEvent::PrePush).unwrap();
        assert_eq!(push.test_command, "cargo test --all");
        assert_eq!(push.zero_tests, ZeroTestsPolicy::Reject);
        let commit = config.settings(HookEvent::PreCommit).unwrap();
        assert_eq!(commit.test_command, "cargo test");
        assert_eq!(commit.zero_tests, ZeroTestsPolicy::Warn);
    }

    #[test]
    fn missing_test_command_is_an_error() {
        let err = Config::default().settings(HookEvent::PreCommit).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTestCommand(HookEvent::PreCommit)));
    }

    #[test]
    fn events_default_to_all_hooks() {
        assert_eq!(Config::default().events(), HookEvent::ALL.to_vec());
    }

    #[test]
    fn events_are_sorted_and_deduplicated() {
        let config = Config::parse("hooks \"pre-push\" \"pre-commit\" \"pre-push\"").unwrap();
        assert_eq!(config.events(), vec![HookEvent::PreCommit, HookEvent::PrePush]);
    }

    // --- CLI layering ---

    #[test]
    fn cli_command_wins_over_every_section() {
        let mut config = Config::parse(
            "test-command \"cargo test\"\npre-push {\n  test-command \"cargo test --all\"\n}",
        )
        .unwrap();
        config
            .apply(&CliOverrides {
                test_command: Some("./run-tests.sh".into()),
                ..Default::default()
            })
            .unwrap();
        for event in HookEvent::ALL {
            assert_eq!(config.settings(event).unwrap().test_command, "./run-tests.sh");
        }
    }

    #[test]
    fn cli_zero_timeout_disables_timeout() {
        let mut config = Config::parse("timeout-secs 60").unwrap();
        config
            .apply(&CliOverrides {
                timeout_secs: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn cli_policy_wins_over_sections() {
        let mut config =
            Config::parse("test-command \"make test\"\npre-push {\n  zero-tests \"reject\"\n}")
                .unwrap();
        config
            .apply(&CliOverrides {
                zero_tests: Some(ZeroTestsPolicy::Warn),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            config.settings(HookEvent::PrePush).unwrap().zero_tests,
            ZeroTestsPolicy::Warn
        );
    }

    #[test]
    fn cli_invalid_pattern_is_rejected() {
        let mut config = Config::default();
        let result = config.apply(&CliOverrides {
            zero_test_patterns: vec!["[".into()],
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    // --- File Loading Tests ---

    #[test]
    fn load_nonexistent_file_returns_not_found() {
        let result = Config::load(Path::new("/tmp/does-not-exist-git-test-gate.kdl"));
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound(_)));
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let config =
            Config::load_or_default(Path::new("/tmp/does-not-exist-git-test-gate.kdl")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_valid_file_from_disk() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        writeln!(tmpfile, "test-command \"./run-tests.sh\"").unwrap();

        let config = Config::load(tmpfile.path()).unwrap();
        assert_eq!(config.test_command.as_deref(), Some("./run-tests.sh"));
    }

    #[test]
    fn load_file_with_invalid_kdl_returns_parse_error() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        writeln!(tmpfile, "invalid {{ kdl {{ syntax").unwrap();

        let result = Config::load(tmpfile.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }
}
