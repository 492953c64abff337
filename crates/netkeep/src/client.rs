//! Thin HTTP client for the netkeep API.
//!
//! Every request carries the active-site header; error bodies of the
//! form `{"error": "..."}` become `CliError::Api`.

use serde_json::Value;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Header carrying the caller's active site slug. Mirrors the server.
const SITE_HEADER: &str = "x-netkeep-site";

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    site: String,
}

impl ApiClient {
    pub fn new(global: &GlobalOpts) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: global.server.trim_end_matches('/').to_owned(),
            site: global.site.clone(),
        }
    }

    #[cfg(test)]
    fn for_test(base: &str, site: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_owned(),
            site: site.to_owned(),
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value, CliError> {
        let url = format!("{}{path}", self.base);
        let response = self
            .http
            .get(&url)
            .header(SITE_HEADER, &self.site)
            .send()
            .await
            .map_err(|source| self.connection_error(source))?;
        Self::into_json(response).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, CliError> {
        let url = format!("{}{path}", self.base);
        let response = self
            .http
            .post(&url)
            .header(SITE_HEADER, &self.site)
            .json(body)
            .send()
            .await
            .map_err(|source| self.connection_error(source))?;
        Self::into_json(response).await
    }

    pub async fn export_snapshot(&self) -> Result<Value, CliError> {
        self.get("/api/backup/export").await
    }

    pub async fn import_snapshot(&self, document: &Value) -> Result<Value, CliError> {
        self.post("/api/backup/import", document).await
    }

    fn connection_error(&self, source: reqwest::Error) -> CliError {
        CliError::ConnectionFailed {
            url: self.base.clone(),
            source,
        }
    }

    async fn into_json(response: reqwest::Response) -> Result<Value, CliError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| CliError::BadResponse(err.to_string()))?;
        if status.is_success() {
            return Ok(body);
        }
        let message = body["error"]
            .as_str()
            .unwrap_or("unknown server error")
            .to_owned();
        Err(CliError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_sends_site_header_and_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .and(header(SITE_HEADER, "home"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "nas"}])))
            .mount(&server)
            .await;

        let client = ApiClient::for_test(&server.uri(), "home");
        let body = client.get("/api/devices").await.unwrap();
        assert_eq!(body[0]["name"], "nas");
    }

    #[tokio::test]
    async fn error_bodies_become_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/backup/export"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "No active site"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::for_test(&server.uri(), "home");
        let err = client.export_snapshot().await.unwrap_err();
        match err {
            CliError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "No active site");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // Port 9 (discard) is about as unreachable as it gets locally.
        let client = ApiClient::for_test("http://127.0.0.1:9", "home");
        let err = client.get("/api/devices").await.unwrap_err();
        assert!(matches!(err, CliError::ConnectionFailed { .. }));
    }
}
