use std::fmt;
use std::str::FromStr;

/// What to do when the test command succeeds but reports that no tests ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroTestsPolicy {
    /// Allow the operation but print a warning.
    #[default]
    Warn,
    /// Reject the operation.
    Reject,
}

impl ZeroTestsPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroTestsPolicy::Warn => "warn",
            ZeroTestsPolicy::Reject => "reject",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid zero-tests policy '{0}' (expected warn or reject)")]
pub struct UnknownPolicy(pub String);

impl FromStr for ZeroTestsPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(ZeroTestsPolicy::Warn),
            "reject" => Ok(ZeroTestsPolicy::Reject),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ZeroTestsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
