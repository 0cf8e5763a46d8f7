use crate::changesets::{collect_changesets, render_changesets};
use crate::console::Console;
use crate::context::ResolutionContext;
use crate::error::{PostReviewError, ResolutionError, Result, UsageError};
use crate::fields::build_fields;
use crate::options::{ParentStrategy, PostReviewOptions, ServerOptions};
use crate::repo_id::find_repository_id;
use crate::resolve::{configured_upstream, find_parent, find_remote_parent};
use crate::settings::Settings;
use crate::validation::{validate_parent_options, validate_request_options};
use rb_client::{
    ApiVersion, ClientOptions, ProxySetting, ReviewBoardError, ReviewFields, ReviewServer,
    make_client, with_scheme,
};
use rb_vcs::{Revision, VcsBackend};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// Opens sessions against a Review Board server.
pub trait ServerConnector {
    fn connect(
        &self,
        server: &str,
        settings: &Settings,
        version: ApiVersion,
    ) -> rb_client::Result<Box<dyn ReviewServer>>;
}

/// Connector speaking HTTP, honouring `reviewboard.http_proxy`.
pub struct HttpConnector;

impl ServerConnector for HttpConnector {
    fn connect(
        &self,
        server: &str,
        settings: &Settings,
        version: ApiVersion,
    ) -> rb_client::Result<Box<dyn ReviewServer>> {
        let options = ClientOptions {
            server: server.to_string(),
            proxy: ProxySetting::from_config(settings.get("http_proxy")),
        };
        make_client(&options, version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedReview {
    pub request_id: u64,
    pub url: String,
    pub published: bool,
    pub revision: Revision,
}

/// Everything computed locally for one review request.
struct Draft {
    revision: Revision,
    diff: Vec<u8>,
    parent_diff: Vec<u8>,
    fields: ReviewFields,
}

pub struct PostReview<'a> {
    backend: &'a dyn VcsBackend,
    console: &'a dyn Console,
    connector: &'a dyn ServerConnector,
    user_config: BTreeMap<String, String>,
}

impl<'a> PostReview<'a> {
    pub fn new(
        backend: &'a dyn VcsBackend,
        console: &'a dyn Console,
        connector: &'a dyn ServerConnector,
    ) -> Self {
        Self {
            backend,
            console,
            connector,
            user_config: BTreeMap::new(),
        }
    }

    /// Lowest-priority `[reviewboard]` values, typically the user TOML file.
    pub fn with_user_config(mut self, values: BTreeMap<String, String>) -> Self {
        self.user_config = values;
        self
    }

    /// Resolve, diff and post. Returns one entry per request touched.
    pub fn run(
        &self,
        options: &PostReviewOptions,
        context: &mut ResolutionContext,
    ) -> Result<Vec<PostedReview>> {
        validate_request_options(&options.request)?;
        let strategy = validate_parent_options(&options.parent, &options.remote)?;

        let settings = Settings::load(self.backend, self.user_config.clone())?;
        let server_url = find_server(&options.server, &settings)?;
        let version = api_version(&options.server, &settings)?;

        let target = self.backend.lookup(&options.revision)?;
        let remote_parent =
            find_remote_parent(self.backend, &target, &options.remote.strategy())?;
        let parent = find_parent(self.backend, &target, &strategy, remote_parent.as_ref())?
            .ok_or(ResolutionError::NoParent {
                outgoing_changes: strategy == ParentStrategy::OutgoingChanges,
            })?;

        let branch_mode = strategy == ParentStrategy::Branch;
        let pairs = if options.request.bulkpost {
            let mut pairs = Vec::new();
            for changeset in collect_changesets(self.backend, &parent, &target, branch_mode)? {
                let own_parent = self
                    .backend
                    .first_parent(&changeset)?
                    .unwrap_or_else(|| self.backend.null_revision());
                pairs.push((own_parent, changeset));
            }
            pairs
        } else {
            vec![(parent, target)]
        };

        let mut drafts = Vec::with_capacity(pairs.len());
        for (parent, revision) in pairs {
            drafts.push(self.prepare(
                options,
                &settings,
                &parent,
                revision,
                remote_parent.as_ref(),
                branch_mode,
            )?);
        }
        let remote_path =
            configured_upstream(self.backend, options.remote.outgoing_repo.as_deref())?;

        self.console.status(&format!("reviewboard: {server_url}"));
        let credentials = context.credentials(&options.server, &settings, self.console)?;
        let mut session = self.connector.connect(&server_url, &settings, version)?;
        session.login(&credentials.username, &credentials.password)?;

        let launch_browser = settings.get_bool("launch_webbrowser")?;
        let mut posted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let request_id = match options.request.existing {
                Some(request_id) => {
                    session.update_request(
                        request_id,
                        &draft.fields,
                        &draft.diff,
                        &draft.parent_diff,
                    )?;
                    request_id
                }
                None => {
                    let repository_id = match context.repository_id() {
                        Some(id) => id,
                        None => {
                            let id = find_repository_id(
                                session.as_ref(),
                                &server_url,
                                options.server.repo_id,
                                &settings,
                                remote_path.as_deref(),
                                self.console,
                            )?;
                            context.remember_repository(id);
                            id
                        }
                    };
                    session.create_request(
                        repository_id,
                        &draft.fields,
                        &draft.diff,
                        &draft.parent_diff,
                    )?
                }
            };
            if options.request.publish {
                session.publish(request_id)?;
            }

            let url = request_url(&server_url, request_id);
            let verb = if options.request.publish {
                "published"
            } else {
                "draft saved"
            };
            self.console
                .success(&format!("review request {verb}: {url}"));
            info!(request_id, revision = %draft.revision, "posted review");

            if launch_browser {
                self.console.status("browser launched");
                if let Err(err) = self.console.launch_browser(&url) {
                    warn!(%url, error = %err, "failed to launch browser");
                }
            }
            posted.push(PostedReview {
                request_id,
                url,
                published: options.request.publish,
                revision: draft.revision,
            });
        }
        Ok(posted)
    }

    fn prepare(
        &self,
        options: &PostReviewOptions,
        settings: &Settings,
        parent: &Revision,
        revision: Revision,
        remote_parent: Option<&Revision>,
        branch_mode: bool,
    ) -> Result<Draft> {
        let diff = self.backend.diff(parent, &revision)?;
        trace!(
            %parent,
            %revision,
            diff = %String::from_utf8_lossy(&diff),
            "diff from parent to revision"
        );

        let parent_diff = match remote_parent {
            Some(remote) if remote.node != parent.node => {
                let parent_diff = self.backend.diff(remote, parent)?;
                trace!(
                    %remote,
                    %parent,
                    diff = %String::from_utf8_lossy(&parent_diff),
                    "diff from remote parent to parent"
                );
                parent_diff
            }
            _ => Vec::new(),
        };

        let changesets = collect_changesets(self.backend, parent, &revision, branch_mode)?;
        let text = render_changesets(&changesets, branch_mode.then_some(revision.branch.as_str()));
        self.console.status(&text);

        let fields = build_fields(&revision, &text, &options.request, settings, self.console)?;
        debug!(revision = %revision, fields = fields.iter().count(), "prepared draft");
        Ok(Draft {
            revision,
            diff,
            parent_diff,
            fields,
        })
    }
}

/// Server URL from `--server`, else `reviewboard.server`.
pub fn find_server(options: &ServerOptions, settings: &Settings) -> Result<String> {
    options
        .server
        .as_deref()
        .filter(|server| !server.is_empty())
        .or_else(|| settings.get("server"))
        .map(str::to_string)
        .ok_or_else(|| UsageError::MissingServer.into())
}

fn api_version(options: &ServerOptions, settings: &Settings) -> Result<ApiVersion> {
    let Some(value) = options
        .api_version
        .as_deref()
        .or_else(|| settings.get("apiver"))
    else {
        return Ok(ApiVersion::default());
    };
    value.parse().map_err(|err: ReviewBoardError| {
        debug!(error = %err, "rejected api version");
        PostReviewError::from(UsageError::InvalidValue {
            key: "apiver".to_string(),
            value: value.to_string(),
        })
    })
}

/// `<server>/r/<id>/`, with `http://` added when the server has no scheme.
pub fn request_url(server: &str, request_id: u64) -> String {
    format!("{}/r/{request_id}/", with_scheme(server).trim_end_matches('/'))
}
