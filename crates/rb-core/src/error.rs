use rb_client::ReviewBoardError;
use rb_vcs::VcsError;
use thiserror::Error;

const OUTGOING_HINT: &str = " If using -g/--outgoingchanges, make sure you have some \
(type 'hg out'). Did you forget to commit ('hg st')?";

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("you cannot combine the --parent, --outgoingchanges and --branch options")]
    ConflictingParentOptions,
    #[error(
        "when using the -g/--outgoingchanges flag, you must also use either the -o or the -O <repo> flag"
    )]
    OutgoingChangesWithoutRemote,
    #[error("--bulkpost cannot be combined with --existing")]
    BulkpostWithExisting,
    #[error("no Review Board server specified: use --server or set reviewboard.server")]
    MissingServer,
    #[error("invalid repository ID: {value}")]
    InvalidRepositoryId { value: String },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("no answer for prompt: {prompt}")]
    MissingInput { prompt: String },
    #[error("prompt failed: {reason}")]
    PromptFailed { reason: String },
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no upstream repository: set [paths] reviewboard, default-push or default")]
    NoUpstreamPath,
    #[error("Unable to determine parent revision for diff.{}", hint(*outgoing_changes))]
    NoParent { outgoing_changes: bool },
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

fn hint(outgoing_changes: bool) -> &'static str {
    if outgoing_changes { OUTGOING_HINT } else { "" }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("reviewboard.{key} is not a boolean: {value}")]
    NotABoolean { key: String, value: String },
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

#[derive(Debug, Error)]
pub enum PostReviewError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error(transparent)]
    Server(#[from] ReviewBoardError),
    #[error("no repositories configured at {server}")]
    NoRepositories { server: String },
}

impl PostReviewError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PostReviewError>;
