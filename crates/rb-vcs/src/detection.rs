use crate::backend::VcsError;
use std::path::{Path, PathBuf};

/// Find the enclosing Mercurial working copy, searching upward from `start`.
pub fn find_repo_root(start: &Path) -> Result<PathBuf, VcsError> {
    start
        .ancestors()
        .find(|dir| dir.join(".hg").is_dir())
        .map(Path::to_path_buf)
        .ok_or(VcsError::RepoNotFound)
}
