use crate::backend::{Revision, VcsBackend, VcsError};
use sha2::{Digest, Sha256};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};

/// History graph held entirely in memory.
///
/// Used to exercise the resolution logic without a Mercurial install. Every
/// trait call bumps an access counter so callers can assert that no history
/// was touched.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    revisions: Vec<Revision>,
    remotes: HashMap<String, HashSet<String>>,
    paths: BTreeMap<String, String>,
    config: BTreeMap<String, BTreeMap<String, String>>,
    accesses: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit on top of the latest revision (or as a root when empty).
    pub fn commit(&mut self, branch: &str, description: &str) -> Revision {
        let parents: Vec<Revision> = self.revisions.last().cloned().into_iter().collect();
        let parents: Vec<&Revision> = parents.iter().collect();
        self.commit_with_parents(&parents, branch, description)
    }

    pub fn commit_with_parents(
        &mut self,
        parents: &[&Revision],
        branch: &str,
        description: &str,
    ) -> Revision {
        let rev = i64::try_from(self.revisions.len()).unwrap_or(i64::MAX);
        let digest = Sha256::digest(format!("{rev}\0{branch}\0{description}"));
        let revision = Revision {
            rev,
            node: hex::encode(digest)[..40].to_string(),
            branch: branch.to_string(),
            description: description.to_string(),
            parents: parents.iter().map(|p| p.node.clone()).collect(),
        };
        self.revisions.push(revision.clone());
        revision
    }

    /// Register a remote repository that already holds `known`.
    pub fn add_remote(&mut self, address: &str, known: &[&Revision]) {
        self.remotes.insert(
            address.to_string(),
            known.iter().map(|r| r.node.clone()).collect(),
        );
    }

    pub fn set_path(&mut self, name: &str, value: &str) {
        self.paths.insert(name.to_string(), value.to_string());
    }

    pub fn set_config(&mut self, section: &str, key: &str, value: &str) {
        self.config
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn accesses(&self) -> usize {
        self.accesses.get()
    }

    fn touch(&self) {
        self.accesses.set(self.accesses.get() + 1);
    }

    fn find(&self, node: &str) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.node == node)
    }

    /// Inclusive ancestor set, following every parent.
    fn ancestors(&self, revision: &Revision) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![revision.node.clone()];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.clone()) {
                continue;
            }
            if let Some(current) = self.find(&node) {
                stack.extend(current.parents.iter().cloned());
            }
        }
        seen
    }
}

impl VcsBackend for MemoryBackend {
    fn lookup(&self, spec: &str) -> Result<Revision, VcsError> {
        self.touch();
        if spec == "null" || (spec.len() >= 6 && spec.chars().all(|c| c == '0')) {
            return Ok(Revision::null());
        }
        let found = match spec {
            "tip" | "." => self.revisions.last(),
            _ => spec
                .parse::<i64>()
                .ok()
                .and_then(|rev| self.revisions.iter().find(|r| r.rev == rev))
                .or_else(|| self.revisions.iter().find(|r| r.node.starts_with(spec))),
        };
        found.cloned().ok_or_else(|| VcsError::UnknownRevision {
            spec: spec.to_string(),
        })
    }

    fn diff(&self, from: &Revision, to: &Revision) -> Result<Vec<u8>, VcsError> {
        self.touch();
        Ok(format!("diff -r {} -r {}\n", from.short_node(), to.short_node()).into_bytes())
    }

    fn outgoing(&self, remote: &str) -> Result<Vec<Revision>, VcsError> {
        self.touch();
        let known = self
            .remotes
            .get(remote)
            .ok_or_else(|| VcsError::RemoteUnavailable {
                remote: remote.to_string(),
                reason: "repository not found".to_string(),
            })?;
        Ok(self
            .revisions
            .iter()
            .filter(|r| !known.contains(&r.node))
            .cloned()
            .collect())
    }

    fn ancestry_range(
        &self,
        ancestor: &Revision,
        descendant: &Revision,
    ) -> Result<Vec<Revision>, VcsError> {
        self.touch();
        let upstream = self.ancestors(descendant);
        let mut range: Vec<Revision> = self
            .revisions
            .iter()
            .filter(|r| upstream.contains(&r.node))
            .filter(|r| ancestor.is_null() || self.ancestors(r).contains(&ancestor.node))
            .cloned()
            .collect();
        range.sort_by(|a, b| b.rev.cmp(&a.rev));
        Ok(range)
    }

    fn path(&self, name: &str) -> Result<Option<String>, VcsError> {
        self.touch();
        Ok(self.paths.get(name).cloned())
    }

    fn config_section(&self, section: &str) -> Result<BTreeMap<String, String>, VcsError> {
        self.touch();
        Ok(self.config.get(section).cloned().unwrap_or_default())
    }
}
