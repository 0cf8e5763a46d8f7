mod console;

use clap::{ArgAction, Parser};
use crate::console::TerminalConsole;
use owo_colors::{OwoColorize, Stream};
use rb_core::options::{ParentOptions, RemoteOptions, RequestOptions, ServerOptions};
use rb_core::settings::{load_user_file, user_config_path};
use rb_core::validation::{validate_parent_options, validate_request_options};
use rb_core::{HttpConnector, PostReview, PostReviewError, PostReviewOptions, ResolutionContext};
use rb_vcs::{HgBackend, VcsError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Post a changeset, or a range of changesets, to a Review Board server.
///
/// The parent revision defaults to the first parent of the reviewed
/// revision. Remote paths are looked up in `[paths]` as `reviewboard`,
/// `default-push` and `default`, in that order.
#[derive(Parser)]
#[command(name = "hg-postreview", version)]
struct Cli {
    /// Revision to review
    #[arg(default_value = ".")]
    revision: String,

    /// Repository root (defaults to the current directory)
    #[arg(short = 'R', long, value_name = "PATH")]
    repository: Option<PathBuf>,

    /// Parent revision for the diff
    #[arg(long, value_name = "REV")]
    parent: Option<String>,

    /// Create a diff with all outgoing changes
    #[arg(short = 'g', long = "outgoingchanges")]
    outgoing_changes: bool,

    /// Review all changesets on the target's branch
    #[arg(short, long)]
    branch: bool,

    /// Use the upstream repository to compute a parent diff
    #[arg(short, long)]
    outgoing: bool,

    /// Use this repository to compute a parent diff
    #[arg(
        short = 'O',
        long = "outgoing-repo",
        visible_alias = "outgoingrepo",
        value_name = "PATH"
    )]
    outgoing_repo: Option<String>,

    /// Revision known to the server, used for the parent diff
    #[arg(short, long, value_name = "REV")]
    master: Option<String>,

    /// Existing review request id to update
    #[arg(short, long, value_name = "ID")]
    existing: Option<u64>,

    /// Rewrite summary and description of an existing request
    #[arg(short, long)]
    update: bool,

    /// Publish the request immediately
    #[arg(short, long)]
    publish: bool,

    /// Review Board repository id
    #[arg(short = 'i', long = "repo-id", visible_alias = "repoid", value_name = "ID")]
    repo_id: Option<u64>,

    #[arg(long, value_name = "URL")]
    server: Option<String>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// Summary for the request (defaults to the first line of the description)
    #[arg(short, long)]
    summary: Option<String>,

    /// Prompt for summary and description
    #[arg(short = 'I', long)]
    interactive: bool,

    #[arg(short = 'U', long = "target-people", value_name = "USERS")]
    target_people: Option<String>,

    #[arg(short = 'G', long = "target-groups", value_name = "GROUPS")]
    target_groups: Option<String>,

    #[arg(short = 'B', long = "bugs-closed", value_name = "BUGS")]
    bugs_closed: Option<String>,

    /// Post one request per changeset
    #[arg(long)]
    bulkpost: bool,

    /// Review Board API version (1.0 or 2.0)
    #[arg(long, value_name = "VERSION")]
    apiver: Option<String>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> PostReviewOptions {
        PostReviewOptions {
            revision: self.revision.clone(),
            parent: ParentOptions {
                parent: given(self.parent.as_deref()),
                outgoing_changes: self.outgoing_changes,
                branch: self.branch,
            },
            remote: RemoteOptions {
                outgoing: self.outgoing,
                outgoing_repo: given(self.outgoing_repo.as_deref()),
                master: given(self.master.as_deref()),
            },
            request: RequestOptions {
                existing: self.existing,
                update: self.update,
                publish: self.publish,
                interactive: self.interactive,
                bulkpost: self.bulkpost,
                summary: given(self.summary.as_deref()),
                target_people: given(self.target_people.as_deref()),
                target_groups: given(self.target_groups.as_deref()),
                bugs_closed: given(self.bugs_closed.as_deref()),
            },
            server: ServerOptions {
                server: given(self.server.as_deref()),
                username: given(self.username.as_deref()),
                password: given(self.password.as_deref()),
                repo_id: self.repo_id,
                api_version: given(self.apiver.as_deref()),
            },
        }
    }
}

/// An empty flag value (`--summary ""`) counts as not given.
fn given(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{} {err}",
                "abort:".if_supports_color(Stream::Stderr, |text| text.red())
            );
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

fn run(cli: &Cli) -> Result<(), PostReviewError> {
    let options = cli.options();
    validate_request_options(&options.request)?;
    validate_parent_options(&options.parent, &options.remote)?;

    let start = match &cli.repository {
        Some(path) => path.clone(),
        None => std::env::current_dir().map_err(|err| VcsError::BackendError {
            reason: format!("cannot read current directory: {err}"),
        })?,
    };
    let backend = HgBackend::open(&start)?;
    let user_config = match user_config_path() {
        Some(path) => load_user_file(&path)?,
        None => BTreeMap::new(),
    };

    let console = TerminalConsole;
    let posted = PostReview::new(&backend, &console, &HttpConnector)
        .with_user_config(user_config)
        .run(&options, &mut ResolutionContext::new())?;
    debug!(count = posted.len(), "done");
    Ok(())
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::parse_from([
            "hg-postreview",
            "-g",
            "--outgoingrepo",
            "central",
            "--repoid",
            "7",
            "-U",
            "alice,bob",
            "--apiver",
            "1.0",
            "-vv",
            "tip",
        ]);
        let options = cli.options();

        assert_eq!(options.revision, "tip");
        assert!(options.parent.outgoing_changes);
        assert_eq!(options.remote.outgoing_repo.as_deref(), Some("central"));
        assert_eq!(options.server.repo_id, Some(7));
        assert_eq!(options.request.target_people.as_deref(), Some("alice,bob"));
        assert_eq!(options.server.api_version.as_deref(), Some("1.0"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_default_revision_is_working_parent() {
        let cli = Cli::parse_from(["hg-postreview"]);
        assert_eq!(cli.options().revision, ".");
        assert_eq!(cli.options().parent, ParentOptions::default());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let cli = Cli::parse_from([
            "hg-postreview",
            "--parent",
            "",
            "-b",
            "--summary",
            "",
            "--server",
            "",
            "-U",
            "",
        ]);
        let options = cli.options();

        assert_eq!(options.parent.parent, None);
        assert!(options.parent.branch);
        assert_eq!(options.request.summary, None);
        assert_eq!(options.server.server, None);
        assert_eq!(options.request.target_people, None);
        assert!(validate_parent_options(&options.parent, &options.remote).is_ok());
    }

    #[test]
    fn test_conflicting_flags_are_usage_errors() {
        let cli = Cli::parse_from(["hg-postreview", "--parent", "1", "-b"]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
