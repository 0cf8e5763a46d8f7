use crate::client::ReviewServer;
use crate::error::Result;
use crate::transport::{self, Transport};
use crate::types::{ClientOptions, RepositoryInfo, ReviewFields};
use reqwest::Method;
use tracing::{debug, info};

/// Client for the legacy `/api/json/` endpoints (Review Board 1.x).
pub struct LegacyJsonClient {
    transport: Transport,
}

impl LegacyJsonClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(options)?,
        })
    }

    fn post(&self, path: &str, pairs: &[(&str, String)]) -> Result<serde_json::Value> {
        self.transport.form(Method::POST, path, pairs)
    }

    fn upload_diff(&self, request_id: u64, diff: &[u8], parent_diff: &[u8]) -> Result<()> {
        let form = transport::diff_form(diff, parent_diff)?;
        self.transport
            .multipart(&format!("api/json/reviewrequests/{request_id}/diff/new/"), form)?;
        debug!(request_id, parent = !parent_diff.is_empty(), "diff uploaded");
        Ok(())
    }

    fn set_fields(&self, request_id: u64, fields: &ReviewFields) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.post(
            &format!("api/json/reviewrequests/{request_id}/draft/set/"),
            &fields.form_pairs(),
        )?;
        Ok(())
    }
}

impl ReviewServer for LegacyJsonClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.post(
            "api/json/accounts/login/",
            &[
                ("username", username.to_string()),
                ("password", password.to_string()),
            ],
        )?;
        info!(username, "logged in");
        Ok(())
    }

    fn repositories(&self) -> Result<Vec<RepositoryInfo>> {
        let listing = self.transport.get("api/json/repositories/")?;
        transport::repositories(&listing)
    }

    fn create_request(
        &self,
        repository_id: u64,
        fields: &ReviewFields,
        diff: &[u8],
        parent_diff: &[u8],
    ) -> Result<u64> {
        let created = self.post(
            "api/json/reviewrequests/new/",
            &[("repository_id", repository_id.to_string())],
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
        self.post(&format!("api/json/reviewrequests/{request_id}/publish/"), &[])?;
        info!(request_id, "review request published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReviewBoardError;
    use crate::types::ReviewField;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/json/accounts/login/"))
            .and(body_string_contains("username=alice"))
            .and(body_string_contains("password=secret"))
            .respond_with(ok(json!({"stat": "ok", "user": {"username": "alice"}})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            let mut client = LegacyJsonClient::new(&ClientOptions::new(uri))?;
            client.login("alice", "secret")
        })
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stat_fail_with_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/json/accounts/login/"))
            .respond_with(ok(json!({
                "stat": "fail",
                "err": {"code": 104, "msg": "Login failed"}
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            let mut client = LegacyJsonClient::new(&ClientOptions::new(uri))?;
            client.login("alice", "nope")
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(ReviewBoardError::Authentication { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_request_lifecycle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/json/repositories/"))
            .respond_with(ok(json!({
                "stat": "ok",
                "repositories": [{"id": 4, "name": "core", "tool": "Mercurial", "path": "/srv/core"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/json/reviewrequests/new/"))
            .and(body_string_contains("repository_id=4"))
            .respond_with(ok(json!({"stat": "ok", "review_request": {"id": 17}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/json/reviewrequests/17/draft/set/"))
            .and(body_string_contains("branch=stable"))
            .respond_with(ok(json!({"stat": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/json/reviewrequests/17/diff/new/"))
            .respond_with(ok(json!({"stat": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/json/reviewrequests/17/publish/"))
            .respond_with(ok(json!({"stat": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let (repositories, request_id) = tokio::task::spawn_blocking(move || {
            let client = LegacyJsonClient::new(&ClientOptions::new(uri))?;
            let repositories = client.repositories()?;
            let mut fields = ReviewFields::new();
            fields.set(ReviewField::Branch, "stable");
            let request_id = client.create_request(4, &fields, b"diff\n", b"")?;
            client.publish(request_id)?;
            Ok::<_, ReviewBoardError>((repositories, request_id))
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(repositories.len(), 1);
        assert_eq!(repositories[0].path, "/srv/core");
        assert_eq!(request_id, 17);
    }
}
