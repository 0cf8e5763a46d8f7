use crate::error::SettingsError;
use rb_vcs::VcsBackend;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mercurial config section and user-file table holding our keys.
pub const SECTION: &str = "reviewboard";
pub const CONFIG_ENV: &str = "HG_POSTREVIEW_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    Mercurial,
    UserFile,
}

/// `[reviewboard]` values from every config layer, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    layers: Vec<(SettingsSource, BTreeMap<String, String>)>,
}

impl Settings {
    pub fn from_layers(
        mercurial: BTreeMap<String, String>,
        user_file: BTreeMap<String, String>,
    ) -> Self {
        Self {
            layers: vec![
                (SettingsSource::Mercurial, mercurial),
                (SettingsSource::UserFile, user_file),
            ],
        }
    }

    pub fn load(
        backend: &dyn VcsBackend,
        user_file: BTreeMap<String, String>,
    ) -> Result<Self, SettingsError> {
        let mercurial = backend.config_section(SECTION)?;
        Ok(Self::from_layers(mercurial, user_file))
    }

    /// First non-empty value for `key` and the layer it came from.
    pub fn lookup(&self, key: &str) -> Option<(SettingsSource, &str)> {
        self.layers.iter().find_map(|(source, values)| {
            values
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(|value| (*source, value))
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|(_, value)| value)
    }

    /// Mercurial-style boolean; unset reads as `false`.
    pub fn get_bool(&self, key: &str) -> Result<bool, SettingsError> {
        let Some(value) = self.get(key) else {
            return Ok(false);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" | "always" => Ok(true),
            "0" | "no" | "false" | "off" | "never" => Ok(false),
            _ => Err(SettingsError::NotABoolean {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UserFile {
    #[serde(default)]
    reviewboard: BTreeMap<String, toml::Value>,
}

/// `$HG_POSTREVIEW_CONFIG`, else `<config dir>/hg-postreview/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("hg-postreview").join("config.toml"))
}

/// Read the `[reviewboard]` table of a user file. A missing file is empty.
pub fn load_user_file(path: &Path) -> Result<BTreeMap<String, String>, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };
    let parsed: UserFile = toml::from_str(&content).map_err(|err| SettingsError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    debug!(path = %path.display(), keys = parsed.reviewboard.len(), "loaded user config");
    Ok(parsed
        .reviewboard
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(text) => text,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// One step of a resolution chain: produces a value or passes.
pub type Provider<'a, E> = Box<dyn FnOnce() -> Result<Option<String>, E> + 'a>;

/// Run `providers` in order and keep the first value produced.
///
/// Later providers (prompts) only run when every earlier one came up empty.
pub fn resolve_chain<'a, E>(
    providers: impl IntoIterator<Item = Provider<'a, E>>,
) -> Result<Option<String>, E> {
    for provider in providers {
        if let Some(value) = provider()? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}
