use crate::error::{ReviewBoardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// One repository as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub path: String,
}

/// Review request fields the client knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewField {
    Summary,
    Description,
    Branch,
    TargetPeople,
    TargetGroups,
    BugsClosed,
}

impl ReviewField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Description => "description",
            Self::Branch => "branch",
            Self::TargetPeople => "target_people",
            Self::TargetGroups => "target_groups",
            Self::BugsClosed => "bugs_closed",
        }
    }
}

impl fmt::Display for ReviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFields(BTreeMap<ReviewField, String>);

impl ReviewFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: ReviewField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn get(&self, field: ReviewField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: ReviewField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReviewField, &str)> {
        self.0.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub(crate) fn form_pairs(&self) -> Vec<(&'static str, String)> {
        self.iter()
            .map(|(field, value)| (field.as_str(), value.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiVersion {
    /// Legacy `/api/json/` endpoints (Review Board 1.x).
    V1,
    #[default]
    V2,
}

impl FromStr for ApiVersion {
    type Err = ReviewBoardError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "1" | "1.0" | "1.x" => Ok(Self::V1),
            "2" | "2.0" | "2.x" => Ok(Self::V2),
            other => Err(ReviewBoardError::UnsupportedApiVersion {
                version: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProxySetting {
    /// Honour the usual proxy environment variables.
    #[default]
    Auto,
    Disabled,
    Http(String),
}

impl ProxySetting {
    /// Interpret the `http_proxy` config value, where `none` turns proxies off.
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Auto,
            Some("none") => Self::Disabled,
            Some(proxy) => Self::Http(proxy.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub server: String,
    pub proxy: ProxySetting,
}

impl ClientOptions {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            proxy: ProxySetting::Auto,
        }
    }

    /// Server root with a scheme and a trailing slash, ready for joining.
    pub fn base_url(&self) -> Result<Url> {
        let mut server = with_scheme(&self.server);
        if !server.ends_with('/') {
            server.push('/');
        }
        Url::parse(&server).map_err(|err| ReviewBoardError::InvalidUrl {
            url: self.server.clone(),
            reason: err.to_string(),
        })
    }
}

/// Prefix `http://` when the configured server has no scheme.
pub fn with_scheme(server: &str) -> String {
    if server.starts_with("http") {
        server.to_string()
    } else {
        format!("http://{server}")
    }
}
