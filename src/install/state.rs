use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::atomic;
use super::template;
use crate::domain::HookEvent;

/// What is on disk at one hook path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookFileState {
    pub exists: bool,
    pub executable: bool,
    /// Carries this tool's marker line.
    pub managed: bool,
    /// The hook runs a preserved foreign hook before the tests.
    pub chained: bool,
    /// Lowercase hex SHA-256 of the file bytes.
    pub content_hash: Option<String>,
    #[serde(skip)]
    pub content: Option<String>,
}

impl HookFileState {
    pub(crate) fn missing() -> Self {
        Self {
            exists: false,
            executable: false,
            managed: false,
            chained: false,
            content_hash: None,
            content: None,
        }
    }

    pub(crate) fn read(path: &Path, preserved: &Path) -> io::Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::missing()),
            Err(e) => return Err(e),
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let managed = template::is_managed(&content);
        Ok(Self {
            exists: true,
            executable: atomic::is_executable(path),
            managed,
            chained: managed && template::chains_original(&content) && preserved.exists(),
            content_hash: Some(content_hash(&bytes)),
            content: Some(content),
        })
    }
}

/// Snapshot of every hook kind, read from disk on demand.
pub type HookInstallationState = BTreeMap<HookEvent, HookFileState>;

pub(crate) fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
