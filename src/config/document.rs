//! Config document abstraction layer.
//!
//! `ConfigDocument`, `ConfigSection`, and `ParseNode` wrap the `kdl` crate
//! types so the rest of the config module never touches KDL directly.

use super::ConfigError;

/// Parsed KDL document paired with its source text.
pub(super) struct ConfigDocument {
    doc: kdl::KdlDocument,
    source: String,
}

/// Borrowed view over a list of nodes: the document root or a children block.
pub(super) struct ConfigSection<'a> {
    doc: &'a kdl::KdlDocument,
    source: &'a str,
}

/// Single KDL node with source context for line-number reporting.
pub(super) struct ParseNode<'a> {
    node: &'a kdl::KdlNode,
    source: &'a str,
}

impl ConfigDocument {
    /// Parse a KDL source string into a document.
    pub(super) fn parse(source: &str) -> Result<Self, ConfigError> {
        let doc: kdl::KdlDocument = source
            .parse()
            .map_err(|e: kdl::KdlError| ConfigError::ParseError(e.to_string()))?;
        Ok(Self {
            doc,
            source: source.to_string(),
        })
    }

    /// The top-level nodes.
    pub(super) fn root(&self) -> ConfigSection<'_> {
        ConfigSection {
            doc: &self.doc,
            source: &self.source,
        }
    }
}

impl<'a> ConfigSection<'a> {
    pub(super) fn nodes(&self) -> Vec<ParseNode<'a>> {
        self.doc
            .nodes()
            .iter()
            .map(|node| ParseNode {
                node,
                source: self.source,
            })
            .collect()
    }
}

impl<'a> ParseNode<'a> {
    /// The node's identifier (e.g. `"test-command"`, `"pre-push"`).
    pub(super) fn name(&self) -> &'a str {
        self.node.name().value()
    }

    /// All string-valued entries of this node.
    pub(super) fn string_values(&self) -> Vec<&'a str> {
        self.node
            .entries()
            .iter()
            .filter_map(|e| e.value().as_string())
            .collect()
    }

    /// Total number of entries (all types, not just strings).
    pub(super) fn entry_count(&self) -> usize {
        self.node.entries().len()
    }

    /// The node's single string argument, e.g. `test-command "cargo test"`.
    pub(super) fn single_string(&self) -> Result<&'a str, ConfigError> {
        match self.string_values().as_slice() {
            [value] if self.entry_count() == 1 => Ok(*value),
            _ => Err(self.invalid(format!("'{}' takes exactly one string", self.name()))),
        }
    }

    /// The node's single non-negative integer argument, e.g. `timeout-secs 600`.
    pub(super) fn single_u64(&self) -> Result<u64, ConfigError> {
        let entries = self.node.entries();
        let value = match entries {
            [entry] => entry.value().as_integer(),
            _ => None,
        };
        value
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| {
                self.invalid(format!(
                    "'{}' takes exactly one non-negative integer",
                    self.name()
                ))
            })
    }

    /// Get the children block as a borrowed `ConfigSection` (preserving source).
    pub(super) fn children(&self) -> Option<ConfigSection<'a>> {
        self.node.children().map(|doc| ConfigSection {
            doc,
            source: self.source,
        })
    }

    /// 1-based line number of this node in the original source.
    pub(super) fn line(&self) -> usize {
        let offset = self.node.span().offset();
        self.source[..offset.min(self.source.len())]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1
    }

    /// A validation error pointing at this node's line.
    pub(super) fn invalid(&self, message: String) -> ConfigError {
        ConfigError::ValidationError(format!("line {}: {message}", self.line()))
    }
}
