use crate::client::ReviewServer;
use crate::error::{ReviewBoardError, Result};
use crate::transport::{self, Transport};
use crate::types::{ClientOptions, RepositoryInfo, ReviewFields};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const PAGE_SIZE: u32 = 200;

/// Client for the resource-based web API (Review Board 2.x and later).
pub struct WebApiClient {
    transport: Transport,
}

impl WebApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(options)?,
        })
    }

    fn draft_path(request_id: u64) -> String {
        format!("api/review-requests/{request_id}/draft/")
    }

    fn upload_diff(&self, request_id: u64, diff: &[u8], parent_diff: &[u8]) -> Result<()> {
        let form = transport::diff_form(diff, parent_diff)?;
        self.transport
            .multipart(&format!("api/review-requests/{request_id}/diffs/"), form)?;
        debug!(request_id, parent = !parent_diff.is_empty(), "diff uploaded");
        Ok(())
    }

    fn set_fields(&self, request_id: u64, fields: &ReviewFields) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.transport
            .form(Method::PUT, &Self::draft_path(request_id), &fields.form_pairs())?;
        Ok(())
    }
}

impl ReviewServer for WebApiClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.transport.set_credentials(username, password);
        let session = self.transport.get("api/session/")?;
        let authenticated = session
            .get("session")
            .and_then(|s| s.get("authenticated"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !authenticated {
            return Err(ReviewBoardError::Authentication {
                message: format!("server did not accept credentials for {username}"),
            });
        }
        info!(username, "logged in");
        Ok(())
    }

    fn repositories(&self) -> Result<Vec<RepositoryInfo>> {
        let mut url = self
            .transport
            .url(&format!("api/repositories/?max-results={PAGE_SIZE}"))?;
        let mut all = Vec::new();
        loop {
            let page = self
                .transport
                .send(self.transport.request(Method::GET, url.clone()))?;
            all.extend(transport::repositories(&page)?);
            let next = page
                .get("links")
                .and_then(|links| links.get("next"))
                .and_then(|next| next.get("href"))
                .and_then(Value::as_str);
            match next {
                Some(href) => {
                    url = Url::parse(href).map_err(|err| ReviewBoardError::InvalidUrl {
                        url: href.to_string(),
                        reason: err.to_string(),
                    })?;
                }
                None => break,
            }
        }
        debug!(count = all.len(), "listed repositories");
        Ok(all)
    }

    fn create_request(
        &self,
        repository_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> Result<u64> {
        let created = self.transport.form(
            Method::POST,
            "api/review-requests/",
            &[("repository", repository_id.to_string())],
        )?;
        let request_id = transport::review_request_id(&created)?;
        info!(request_id, repository_id, "review request created");
        self.set_fields(request_id, fields)?;
        self.upload_diff(request_id, diff, parent_diff)?;
        Ok(request_id)
    }

    fn update_request(
        &self,
        request_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> Result<()> {
        self.set_fields(request_id, fields)?;
        self.upload_diff(request_id, diff, parent_diff)?;
        info!(request_id, "review request updated");
        Ok(())
    }

    fn publish(&self, request_id: u64) -> Result<()> {
        self.transport.form(
            Method::PUT,
            &Self::draft_path(request_id),
            &[("public", "1".to_string())],
        )?;
        info!(request_id, "review request published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewField;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok(body: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_login_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session/"))
            .and(header("authorization", "Basic Zm9vOmJhcg=="))
            .respond_with(ok(json!({"stat": "ok", "session": {"authenticated": true}})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            let mut client = WebApiClient::new(&ClientOptions::new(uri))?;
            client.login("foo", "bar")
        })
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "stat": "fail",
                "err": {"code": 104, "msg": "The username or password was not correct"}
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            let mut client = WebApiClient::new(&ClientOptions::new(uri))?;
            client.login("foo", "wrong")
        })
        .await
        .unwrap();

        match result {
            Err(ReviewBoardError::Authentication { message }) => {
                assert!(message.contains("not correct"));
            }
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_repositories_follow_pagination() {
        let server = MockServer::start().await;
        let next = format!("{}/api/repositories/?start=1", server.uri());
        Mock::given(method("GET"))
            .and(path("/api/repositories/"))
            .and(query_param("max-results", "200"))
            .respond_with(ok(json!({
                "stat": "ok",
                "repositories": [
                    {"id": 1, "name": "core", "tool": "Mercurial", "path": "http://hg/core"}
                ],
                "links": {"next": {"href": next, "method": "GET"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/repositories/"))
            .and(query_param("start", "1"))
            .respond_with(ok(json!({
                "stat": "ok",
                "repositories": [
                    {"id": 2, "name": "docs", "tool": "Git", "path": "git://docs"}
                ],
                "links": {}
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let repositories = tokio::task::spawn_blocking(move || {
            WebApiClient::new(&ClientOptions::new(uri))?.repositories()
        })
        .await
        .unwrap()
        .unwrap();

        let ids: Vec<u64> = repositories.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(repositories[1].tool, "Git");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_request_sets_fields_and_uploads_diffs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/review-requests/"))
            .and(body_string_contains("repository=7"))
            .respond_with(ok(json!({"stat": "ok", "review_request": {"id": 42}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/review-requests/42/draft/"))
            .and(body_string_contains("summary=fix+parser"))
            .respond_with(ok(json!({"stat": "ok", "draft": {"id": 1}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/review-requests/42/diffs/"))
            .and(body_string_contains("name=\"parent_diff_path\""))
            .and(body_string_contains("diff -r parent"))
            .respond_with(ok(json!({"stat": "ok", "diff": {"id": 1}})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let request_id = tokio::task::spawn_blocking(move || {
            let client = WebApiClient::new(&ClientOptions::new(uri))?;
            let mut fields = ReviewFields::new();
            fields.set(ReviewField::Summary, "fix parser");
            client.create_request(7, &fields, b"diff -r target\n", b"diff -r parent\n")
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(request_id, 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_diff_upload_keeps_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/review-requests/5/diffs/"))
            .respond_with(ok(json!({"stat": "ok", "diff": {"id": 2}})))
            .expect(1)
            .mount(&server)
            .await;

        let patch: &[u8] = b"diff -r 1 -r 2 menu.txt\n+caf\xe9\n";
        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            WebApiClient::new(&ClientOptions::new(uri))?.update_request(
                5,
                &ReviewFields::new(),
                patch,
                b"",
            )
        })
        .await
        .unwrap()
        .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = &requests[0].body;
        assert!(body.windows(patch.len()).any(|window| window == patch));
        let parent_field: &[u8] = b"parent_diff_path";
        assert!(!body.windows(parent_field.len()).any(|window| window == parent_field));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_publish_marks_draft_public() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/review-requests/9/draft/"))
            .and(body_string_contains("public=1"))
            .respond_with(ok(json!({"stat": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || WebApiClient::new(&ClientOptions::new(uri))?.publish(9))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_api_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/review-requests/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "stat": "fail",
                "err": {"code": 206, "msg": "The repository path specified is not in the list of known repositories."}
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            WebApiClient::new(&ClientOptions::new(uri))?.create_request(
                3,
                &ReviewFields::new(),
                b"",
                b"",
            )
        })
        .await
        .unwrap();

        match result {
            Err(ReviewBoardError::Api { code, message }) => {
                assert_eq!(code, 206);
                assert!(message.starts_with("The repository path"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
