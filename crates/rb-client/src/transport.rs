use crate::error::{ReviewBoardError, Result};
use crate::types::{ClientOptions, ProxySetting, RepositoryInfo};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = concat!("hg-postreview/", env!("CARGO_PKG_VERSION"));
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// Review Board error codes that mean the credentials were rejected.
const NOT_LOGGED_IN: i64 = 103;
const LOGIN_FAILED: i64 = 104;

/// Cookie-keeping HTTP session against one server.
pub(crate) struct Transport {
    client: Client,
    base: Url,
    credentials: Option<(String, String)>,
}

impl Transport {
    pub(crate) fn new(options: &ClientOptions) -> Result<Self> {
        let base = options.base_url()?;
        let builder = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .cookie_store(true);
        let builder = match &options.proxy {
            ProxySetting::Auto => builder,
            ProxySetting::Disabled => builder.no_proxy(),
            ProxySetting::Http(proxy) => builder.proxy(reqwest::Proxy::http(proxy)?),
        };
        Ok(Self {
            client: builder.build()?,
            base,
            credentials: None,
        })
    }

    pub(crate) fn set_credentials(&mut self, username: &str, password: &str) {
        self.credentials = Some((username.to_string(), password.to_string()));
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| ReviewBoardError::InvalidUrl {
                url: format!("{}{path}", self.base),
                reason: err.to_string(),
            })
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    pub(crate) fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path)?;
        self.send(self.request(Method::GET, url))
    }

    pub(crate) fn form(&self, method: Method, path: &str, pairs: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path)?;
        self.send(self.request(method, url).form(pairs))
    }

    pub(crate) fn multipart(&self, path: &str, form: Form) -> Result<Value> {
        let url = self.url(path)?;
        self.send(self.request(Method::POST, url).multipart(form))
    }

    pub(crate) fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send()?;
        debug!(url = %response.url(), status = %response.status(), "review board response");
        parse_response(response)
    }
}

/// Multipart form carrying the diff and, when present, the parent diff.
pub(crate) fn diff_form(diff: &[u8], parent_diff: &[u8]) -> Result<Form> {
    let mut form = Form::new().part("path", diff_part(diff)?);
    if !parent_diff.is_empty() {
        form = form.part("parent_diff_path", diff_part(parent_diff)?);
    }
    Ok(form)
}

fn diff_part(diff: &[u8]) -> Result<Part> {
    Ok(Part::bytes(diff.to_vec())
        .file_name("diff")
        .mime_str("text/x-patch")?)
}

fn parse_response(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text()?;
    let Ok(value) = serde_json::from_str::<Value>(&body) else {
        if status.is_success() {
            return Err(ReviewBoardError::InvalidResponse {
                reason: format!("expected JSON, got {} bytes", body.len()),
            });
        }
        return Err(ReviewBoardError::Http {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("error").to_string(),
        });
    };

    let failed = value.get("stat").and_then(Value::as_str) == Some("fail");
    if !failed && status.is_success() {
        return Ok(value);
    }

    let err = value.get("err");
    let code = err
        .and_then(|err| err.get("code"))
        .and_then(Value::as_i64)
        .unwrap_or_default();
    let message = err
        .and_then(|err| err.get("msg"))
        .and_then(Value::as_str)
        .map_or_else(
            || status.canonical_reason().unwrap_or("error").to_string(),
            str::to_string,
        );
    if status == StatusCode::UNAUTHORIZED || code == NOT_LOGGED_IN || code == LOGIN_FAILED {
        return Err(ReviewBoardError::Authentication { message });
    }
    Err(ReviewBoardError::Api { code, message })
}

pub(crate) fn review_request_id(value: &Value) -> Result<u64> {
    value
        .get("review_request")
        .and_then(|request| request.get("id"))
        .and_then(Value::as_u64)
        .ok_or_else(|| ReviewBoardError::InvalidResponse {
            reason: "missing review_request.id".to_string(),
        })
}

pub(crate) fn repositories(value: &Value) -> Result<Vec<RepositoryInfo>> {
    let list = value
        .get("repositories")
        .cloned()
        .ok_or_else(|| ReviewBoardError::InvalidResponse {
            reason: "missing repositories".to_string(),
        })?;
    serde_json::from_value(list).map_err(|err| ReviewBoardError::InvalidResponse {
        reason: format!("malformed repositories: {err}"),
    })
}
