use crate::console::Console;
use crate::error::{PostReviewError, UsageError};
use crate::settings::Settings;
use rb_client::{RepositoryInfo, ReviewServer};
use tracing::debug;

const MERCURIAL_TOOL: &str = "Mercurial";

/// Repository id from `--repo-id`, then `reviewboard.repoid`, then the
/// server's repository listing.
pub fn find_repository_id(
    server: &dyn ReviewServer,
    server_url: &str,
    flag: Option<u64>,
    settings: &Settings,
    remote_path: Option<&str>,
    console: &dyn Console,
) -> Result<u64, PostReviewError> {
    if let Some(id) = flag {
        return Ok(id);
    }
    if let Some(value) = settings.get("repoid") {
        return value.parse().map_err(|_| {
            UsageError::InvalidRepositoryId {
                value: value.to_string(),
            }
            .into()
        });
    }

    let repositories = server.repositories()?;
    if repositories.is_empty() {
        return Err(PostReviewError::NoRepositories {
            server: server_url.to_string(),
        });
    }
    select_repository(repositories, remote_path.unwrap_or_default(), console)
}

/// Pick the Mercurial repository whose path matches `remote_path`, asking
/// the user when there is no single match.
pub fn select_repository(
    mut repositories: Vec<RepositoryInfo>,
    remote_path: &str,
    console: &dyn Console,
) -> Result<u64, PostReviewError> {
    repositories.sort_by_key(|repository| repository.name.to_lowercase());
    let candidates: Vec<&RepositoryInfo> = repositories
        .iter()
        .filter(|repository| repository.tool == MERCURIAL_TOOL)
        .collect();

    let wanted = remote_path.to_lowercase();
    let matches: Vec<&&RepositoryInfo> = candidates
        .iter()
        .filter(|repository| !wanted.is_empty() && repository.path.to_lowercase() == wanted)
        .collect();
    if let [only] = matches.as_slice() {
        console.status(&format!("Using repository: {}", only.name));
        return Ok(only.id);
    }
    debug!(matches = matches.len(), remote_path, "no single repository match");

    console.status("Repositories:");
    for repository in &candidates {
        console.status(&format!("[{}] {}", repository.id, repository.name));
    }
    let answer = console.prompt("repository id", None)?;
    let answer = answer.trim();
    answer
        .parse::<u64>()
        .ok()
        .filter(|id| candidates.iter().any(|repository| repository.id == *id))
        .ok_or_else(|| {
            UsageError::InvalidRepositoryId {
                value: answer.to_string(),
            }
            .into()
        })
}
