use crate::error::UsageError;
use crate::options::{ParentOptions, ParentStrategy, RemoteOptions, RequestOptions};

/// Check the parent-selection flags and pick the strategy they describe.
///
/// Pure: runs before the repository is touched.
pub fn validate_parent_options(
    parent: &ParentOptions,
    remote: &RemoteOptions,
) -> Result<ParentStrategy, UsageError> {
    let selected = [
        parent.parent.is_some(),
        parent.outgoing_changes,
        parent.branch,
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if selected > 1 {
        return Err(UsageError::ConflictingParentOptions);
    }

    if parent.outgoing_changes {
        if !remote.targets_remote() {
            return Err(UsageError::OutgoingChangesWithoutRemote);
        }
        return Ok(ParentStrategy::OutgoingChanges);
    }
    if let Some(spec) = &parent.parent {
        return Ok(ParentStrategy::Explicit(spec.clone()));
    }
    if parent.branch {
        return Ok(ParentStrategy::Branch);
    }
    Ok(ParentStrategy::Default)
}

pub fn validate_request_options(request: &RequestOptions) -> Result<(), UsageError> {
    if request.bulkpost && request.existing.is_some() {
        return Err(UsageError::BulkpostWithExisting);
    }
    Ok(())
}
