use crate::backend::{NULL_NODE, Revision, VcsBackend, VcsError};
use crate::detection::find_repo_root;
use bstr::ByteSlice;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

const FIELD_SEP: char = '\x1f';
const RECORD_SEP: &str = "\x1e";
// hg unescapes `\x1f`/`\x1e` inside templates itself.
const REVISION_TEMPLATE: &str =
    "{rev}\\x1f{node}\\x1f{branch}\\x1f{p1node}\\x1f{p2node}\\x1f{desc}\\x1e";

/// Backend driving the `hg` command line client.
///
/// Mercurial has no stable library API outside Python, so every query is a
/// subprocess with `HGPLAIN` set to keep the output locale and alias free.
pub struct HgBackend {
    root: PathBuf,
    program: String,
}

impl HgBackend {
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let root = find_repo_root(path)?;
        Ok(Self {
            root,
            program: std::env::var("HG").unwrap_or_else(|_| "hg".to_string()),
        })
    }

    fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
        debug!(?args, root = %self.root.display(), "running hg");
        Command::new(&self.program)
            .arg("--repository")
            .arg(&self.root)
            .args(args)
            .current_dir(&self.root)
            .env("HGPLAIN", "1")
            .output()
            .map_err(|e| VcsError::BackendError {
                reason: format!("failed to run hg {}: {e}", args.first().unwrap_or(&"")),
            })
    }

    fn log(&self, revset: &str) -> Result<Vec<Revision>, VcsError> {
        let output = self.run(&["log", "-r", revset, "--template", REVISION_TEMPLATE])?;
        if !output.status.success() {
            return Err(VcsError::BackendError {
                reason: format!("hg log -r {revset} failed: {}", stderr(&output)),
            });
        }
        Ok(parse_revisions(&output.stdout))
    }
}

impl VcsBackend for HgBackend {
    fn lookup(&self, spec: &str) -> Result<Revision, VcsError> {
        let output = self.run(&["log", "-r", spec, "-l", "1", "--template", REVISION_TEMPLATE])?;
        if !output.status.success() {
            debug!(spec, stderr = %stderr(&output), "revision lookup failed");
            return Err(VcsError::UnknownRevision {
                spec: spec.to_string(),
            });
        }
        parse_revisions(&output.stdout)
            .into_iter()
            .next()
            .ok_or_else(|| VcsError::UnknownRevision {
                spec: spec.to_string(),
            })
    }

    fn diff(&self, from: &Revision, to: &Revision) -> Result<Vec<u8>, VcsError> {
        let output = self.run(&["diff", "-r", &from.node, "-r", &to.node])?;
        if !output.status.success() {
            return Err(VcsError::DiffFailed {
                reason: stderr(&output),
            });
        }
        Ok(output.stdout)
    }

    fn outgoing(&self, remote: &str) -> Result<Vec<Revision>, VcsError> {
        let output = self.run(&[
            "outgoing",
            "--quiet",
            "--template",
            REVISION_TEMPLATE,
            "--",
            remote,
        ])?;
        // Exit status 1 means "no outgoing changes".
        match output.status.code() {
            Some(0) => Ok(parse_revisions(&output.stdout)),
            Some(1) => Ok(Vec::new()),
            _ => Err(VcsError::RemoteUnavailable {
                remote: remote.to_string(),
                reason: stderr(&output),
            }),
        }
    }

    fn ancestry_range(
        &self,
        ancestor: &Revision,
        descendant: &Revision,
    ) -> Result<Vec<Revision>, VcsError> {
        let revset = if ancestor.is_null() {
            format!("reverse(::{})", descendant.node)
        } else {
            format!("reverse({}::{})", ancestor.node, descendant.node)
        };
        self.log(&revset)
    }

    fn path(&self, name: &str) -> Result<Option<String>, VcsError> {
        let output = self.run(&["paths", name])?;
        match output.status.code() {
            Some(0) => {
                let value = output.stdout.to_str_lossy().trim().to_string();
                Ok((!value.is_empty()).then_some(value))
            }
            Some(1) => Ok(None),
            _ => Err(VcsError::BackendError {
                reason: format!("hg paths {name} failed: {}", stderr(&output)),
            }),
        }
    }

    fn config_section(&self, section: &str) -> Result<BTreeMap<String, String>, VcsError> {
        let output = self.run(&["config", section])?;
        match output.status.code() {
            Some(0) => Ok(parse_config_section(section, &output.stdout)),
            Some(1) => Ok(BTreeMap::new()),
            _ => Err(VcsError::BackendError {
                reason: format!("hg config {section} failed: {}", stderr(&output)),
            }),
        }
    }
}

fn stderr(output: &Output) -> String {
    output.stderr.to_str_lossy().trim().to_string()
}

fn parse_revisions(stdout: &[u8]) -> Vec<Revision> {
    stdout
        .split_str(RECORD_SEP)
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| parse_revision(&record.to_str_lossy()))
        .collect()
}

fn parse_revision(record: &str) -> Option<Revision> {
    let mut fields = record.splitn(6, FIELD_SEP);
    let rev = fields.next()?.trim().parse().ok()?;
    let node = fields.next()?.to_string();
    let branch = fields.next()?.to_string();
    let parents = [fields.next()?, fields.next()?]
        .into_iter()
        .filter(|node| !node.is_empty() && *node != NULL_NODE)
        .map(str::to_string)
        .collect();
    let description = fields.next().unwrap_or_default().to_string();
    Some(Revision {
        rev,
        node,
        branch,
        description,
        parents,
    })
}

fn parse_config_section(section: &str, stdout: &[u8]) -> BTreeMap<String, String> {
    let prefix = format!("{section}.");
    stdout
        .to_str_lossy()
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter_map(|(key, value)| {
            key.strip_prefix(&prefix)
                .map(|key| (key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
