/// Flags choosing the diff base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentOptions {
    pub parent: Option<String>,
    pub outgoing_changes: bool,
    pub branch: bool,
}

/// Flags choosing the remote ancestor used for the parent diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOptions {
    pub outgoing: bool,
    pub outgoing_repo: Option<String>,
    pub master: Option<String>,
}

impl RemoteOptions {
    /// Precedence: master > outgoing repo > outgoing.
    pub fn strategy(&self) -> RemoteStrategy {
        if let Some(master) = &self.master {
            RemoteStrategy::Master(master.clone())
        } else if let Some(repo) = &self.outgoing_repo {
            RemoteStrategy::OutgoingRepo(repo.clone())
        } else if self.outgoing {
            RemoteStrategy::Outgoing
        } else {
            RemoteStrategy::None
        }
    }

    pub fn targets_remote(&self) -> bool {
        self.outgoing || self.outgoing_repo.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub existing: Option<u64>,
    pub update: bool,
    pub publish: bool,
    pub interactive: bool,
    pub bulkpost: bool,
    pub summary: Option<String>,
    pub target_people: Option<String>,
    pub target_groups: Option<String>,
    pub bugs_closed: Option<String>,
}

impl RequestOptions {
    /// Summary, description and branch are only sent for new requests or
    /// when an update was asked for.
    pub fn rewrites_description(&self) -> bool {
        self.update || self.existing.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub repo_id: Option<u64>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReviewOptions {
    pub revision: String,
    pub parent: ParentOptions,
    pub remote: RemoteOptions,
    pub request: RequestOptions,
    pub server: ServerOptions,
}

impl Default for PostReviewOptions {
    fn default() -> Self {
        Self {
            revision: ".".to_string(),
            parent: ParentOptions::default(),
            remote: RemoteOptions::default(),
            request: RequestOptions::default(),
            server: ServerOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentStrategy {
    Explicit(String),
    OutgoingChanges,
    Branch,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStrategy {
    Master(String),
    OutgoingRepo(String),
    Outgoing,
    None,
}
