use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Node id of the null revision, the ancestor of every root.
pub const NULL_NODE: &str = "0000000000000000000000000000000000000000";
pub const NULL_REV: i64 = -1;
pub const DEFAULT_BRANCH: &str = "default";

const SHORT_NODE_LEN: usize = 12;

/// A changeset as seen by the review tooling.
///
/// Only the first entry of `parents` takes part in ancestry walks; merge
/// parents are kept so callers can tell merges apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub rev: i64,
    pub node: String,
    pub branch: String,
    pub description: String,
    pub parents: Vec<String>,
}

impl Revision {
    pub fn null() -> Self {
        Self {
            rev: NULL_REV,
            node: NULL_NODE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            description: String::new(),
            parents: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.node == NULL_NODE
    }

    pub fn short_node(&self) -> &str {
        &self.node[..SHORT_NODE_LEN.min(self.node.len())]
    }

    pub fn first_parent_node(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// First line of the description.
    pub fn summary(&self) -> &str {
        self.description.lines().next().unwrap_or_default()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rev, self.short_node())
    }
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("repo not found")]
    RepoNotFound,
    #[error("unknown revision: {spec}")]
    UnknownRevision { spec: String },
    #[error("cannot reach repository {remote}: {reason}")]
    RemoteUnavailable { remote: String, reason: String },
    #[error("diff failed: {reason}")]
    DiffFailed { reason: String },
    #[error("backend error: {reason}")]
    BackendError { reason: String },
}

/// Read-only view of a repository's history.
pub trait VcsBackend {
    /// Resolve a revision specifier (number, hash prefix, or symbolic name).
    fn lookup(&self, spec: &str) -> Result<Revision, VcsError>;

    fn first_parent(&self, revision: &Revision) -> Result<Option<Revision>, VcsError> {
        match revision.first_parent_node() {
            Some(node) => self.lookup(node).map(Some),
            None => Ok(None),
        }
    }

    fn null_revision(&self) -> Revision {
        Revision::null()
    }

    /// Unified diff between two revisions, byte for byte as the backend
    /// produced it. File contents need not be UTF-8.
    fn diff(&self, from: &Revision, to: &Revision) -> Result<Vec<u8>, VcsError>;

    /// Revisions present locally but missing from `remote`, in the order the
    /// backend discovers them.
    fn outgoing(&self, remote: &str) -> Result<Vec<Revision>, VcsError>;

    /// Revisions that are descendants of `ancestor` and ancestors of
    /// `descendant` (both inclusive), newest first. Empty when the two are
    /// unrelated. A null `ancestor` selects every ancestor of `descendant`.
    fn ancestry_range(
        &self,
        ancestor: &Revision,
        descendant: &Revision,
    ) -> Result<Vec<Revision>, VcsError>;

    /// Value of a `[paths]` alias, if configured.
    fn path(&self, name: &str) -> Result<Option<String>, VcsError>;

    /// Every `key = value` pair of a configuration section.
    fn config_section(&self, section: &str) -> Result<BTreeMap<String, String>, VcsError>;
}
