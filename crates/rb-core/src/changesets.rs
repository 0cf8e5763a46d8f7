use rb_vcs::{Revision, VcsBackend, VcsError};
use std::fmt::Write as _;

const SEPARATOR: &str = "------------------------------";

/// Revisions after `parent` up to and including `target`, oldest first.
///
/// With `same_branch` set, revisions on another branch than the target's are
/// dropped even when they are reachable.
pub fn collect_changesets(
    backend: &dyn VcsBackend,
    parent: &Revision,
    target: &Revision,
    same_branch: bool,
) -> Result<Vec<Revision>, VcsError> {
    let mut changesets: Vec<Revision> = backend
        .ancestry_range(parent, target)?
        .into_iter()
        .filter(|revision| revision.node != parent.node)
        .filter(|revision| !same_branch || revision.branch == target.branch)
        .collect();
    changesets.reverse();
    Ok(changesets)
}

/// Text listing the changesets, used as status output and default description.
pub fn render_changesets(changesets: &[Revision], branch: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(branch) = branch {
        let _ = write!(out, "review of branch: {branch}\n\n");
    }
    out.push_str("changesets:\n");
    for revision in changesets {
        let _ = writeln!(
            out,
            "{}:{} \"{}\"\n{SEPARATOR}",
            revision.rev,
            revision.short_node(),
            revision.description
        );
    }
    out
}
