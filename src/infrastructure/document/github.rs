//! GitHub repository contents backend
//!
//! Stores the document as a file in a GitHub repository. Every write is a
//! commit; the blob `sha` is the version token, so GitHub itself rejects
//! writes based on a stale read.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{ACCEPT, AUTHORIZATION, ETAG, IF_NONE_MATCH, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{DocumentBackend, DomainError, FetchOutcome, FetchedDocument, VersionToken};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("keyrelay-gateway/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the contents API
#[derive(Debug, Clone)]
pub struct GitHubBackendConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub token: String,
    pub timeout: Duration,
}

impl GitHubBackendConfig {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: owner.into(),
            repo: repo.into(),
            branch: None,
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: CommittedContent,
}

#[derive(Debug, Deserialize)]
struct CommittedContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    #[serde(default)]
    message: String,
}

/// Document backend over `GET`/`PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone)]
pub struct GitHubDocumentBackend {
    client: Client,
    config: GitHubBackendConfig,
}

impl GitHubDocumentBackend {
    pub fn new(config: GitHubBackendConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("token {}", self.config.token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let detail = serde_json::from_str::<GitHubErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        format!("GitHub API error: {} {}", status, detail)
    }
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

fn transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::backend_unavailable("GitHub request timed out")
    } else {
        DomainError::backend_unavailable(format!("GitHub request failed: {}", e))
    }
}

#[async_trait]
impl DocumentBackend for GitHubDocumentBackend {
    async fn fetch(
        &self,
        path: &str,
        revalidation_tag: Option<&str>,
    ) -> Result<FetchOutcome, DomainError> {
        let mut request = self.authorized(self.client.get(self.contents_url(path)));

        if let Some(branch) = &self.config.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }

        if let Some(tag) = revalidation_tag {
            request = request.header(IF_NONE_MATCH, tag);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(path = %path, "Document does not exist yet");
            return Ok(FetchOutcome::Missing);
        }

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }

        if !status.is_success() {
            return Err(DomainError::backend_unavailable(
                Self::error_message(response).await,
            ));
        }

        let revalidation_tag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body: ContentsResponse = response.json().await.map_err(|e| {
            DomainError::backend_unavailable(format!("Failed to parse GitHub response: {}", e))
        })?;

        let content = decode_content(&body.content).unwrap_or_else(|e| {
            warn!(path = %path, error = %e, "Document content is not valid base64");
            Vec::new()
        });

        Ok(FetchOutcome::Found(FetchedDocument {
            content,
            version: VersionToken::new(body.sha),
            revalidation_tag,
        }))
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, DomainError> {
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            sha: expected.map(VersionToken::as_str),
            branch: self.config.branch.as_deref(),
        };

        let response = self
            .authorized(self.client.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        // 409: sha does not match the file; 422 without a sha: the file
        // appeared since we saw it missing.
        if status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY && expected.is_none())
        {
            return Err(DomainError::write_conflict(Self::error_message(response).await));
        }

        if !status.is_success() {
            return Err(DomainError::backend_unavailable(
                Self::error_message(response).await,
            ));
        }

        let committed: PutContentsResponse = response.json().await.map_err(|e| {
            DomainError::backend_unavailable(format!("Failed to parse GitHub response: {}", e))
        })?;

        Ok(VersionToken::new(committed.content.sha))
    }

    fn backend_name(&self) -> &'static str {
        "github"
    }
}
