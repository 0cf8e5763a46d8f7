use crate::error::ResolutionError;
use crate::options::{ParentStrategy, RemoteStrategy};
use rb_vcs::{Revision, VcsBackend, VcsError};
use tracing::debug;

/// `[paths]` aliases consulted, in order, when no upstream is given.
pub const UPSTREAM_ALIASES: [&str; 3] = ["reviewboard", "default-push", "default"];

/// Expand an explicit upstream through `[paths]`, or fall back to the
/// configured aliases. `None` when nothing is configured.
pub fn configured_upstream(
    backend: &dyn VcsBackend,
    explicit: Option<&str>,
) -> Result<Option<String>, VcsError> {
    if let Some(explicit) = explicit {
        return Ok(Some(backend.path(explicit)?.unwrap_or_else(|| explicit.to_string())));
    }
    for alias in UPSTREAM_ALIASES {
        if let Some(path) = backend.path(alias)? {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

pub fn upstream_path(
    backend: &dyn VcsBackend,
    explicit: Option<&str>,
) -> Result<String, ResolutionError> {
    configured_upstream(backend, explicit)?.ok_or(ResolutionError::NoUpstreamPath)
}

/// First parent of the first outgoing revision that is an ancestor of (or
/// equal to) `target`.
///
/// Outgoing revisions are tried in the order the backend reports them.
pub fn remote_ancestor(
    backend: &dyn VcsBackend,
    target: &Revision,
    remote: &str,
) -> Result<Option<Revision>, ResolutionError> {
    for candidate in backend.outgoing(remote)? {
        if backend.ancestry_range(&candidate, target)?.is_empty() {
            continue;
        }
        let parent = backend
            .first_parent(&candidate)?
            .unwrap_or_else(|| backend.null_revision());
        return Ok(Some(parent));
    }
    Ok(None)
}

pub fn find_remote_parent(
    backend: &dyn VcsBackend,
    target: &Revision,
    strategy: &RemoteStrategy,
) -> Result<Option<Revision>, ResolutionError> {
    let remote_parent = match strategy {
        RemoteStrategy::Master(spec) => Some(backend.lookup(spec)?),
        RemoteStrategy::OutgoingRepo(repo) => {
            let remote = upstream_path(backend, Some(repo))?;
            remote_ancestor(backend, target, &remote)?
        }
        RemoteStrategy::Outgoing => {
            let remote = upstream_path(backend, None)?;
            remote_ancestor(backend, target, &remote)?
        }
        RemoteStrategy::None => None,
    };
    debug!(
        remote_parent = %remote_parent.as_ref().map_or_else(|| "none".to_string(), ToString::to_string),
        "remote parent"
    );
    Ok(remote_parent)
}

/// Pick the diff base for `target`. `None` only happens in outgoing-changes
/// mode when no remote ancestor was found.
pub fn find_parent(
    backend: &dyn VcsBackend,
    target: &Revision,
    strategy: &ParentStrategy,
    remote_parent: Option<&Revision>,
) -> Result<Option<Revision>, ResolutionError> {
    let parent = match strategy {
        ParentStrategy::OutgoingChanges => remote_parent.cloned(),
        ParentStrategy::Explicit(spec) => Some(backend.lookup(spec)?),
        ParentStrategy::Branch => Some(find_branch_root(backend, target)?),
        ParentStrategy::Default => Some(
            backend
                .first_parent(target)?
                .unwrap_or_else(|| backend.null_revision()),
        ),
    };
    debug!(
        parent = %parent.as_ref().map_or_else(|| "none".to_string(), ToString::to_string),
        "parent"
    );
    Ok(parent)
}

/// Walk first parents while the branch label matches the target's.
///
/// Returns the first revision on another branch, or the null revision when
/// the whole first-parent chain carries the label.
pub fn find_branch_root(backend: &dyn VcsBackend, target: &Revision) -> Result<Revision, VcsError> {
    let mut current = target.clone();
    while current.branch == target.branch {
        match backend.first_parent(&current)? {
            Some(parent) => current = parent,
            None => return Ok(backend.null_revision()),
        }
    }
    Ok(current)
}
