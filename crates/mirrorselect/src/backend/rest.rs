//! JSON/REST implementation of [`BackendClient`].
//!
//! All requests go through the [`HttpTransport`] boundary so tests can run
//! against the in-memory mock transport.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::{BackendError, Result};
use super::types::{AffiliatedRepo, BackendClient, CodeHost, HostKind, MirrorInfo, SyncedRepo};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// REST client for the platform backend.
pub struct RestBackend {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    token: Option<String>,
}

impl RestBackend {
    /// Create a client against `base_url` (e.g. `https://platform.example.com`).
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
            token: None,
        }
    }

    /// Attach a bearer token sent with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            .map_err(|e| BackendError::internal(format!("invalid endpoint {path}: {e}")))
    }

    fn authorize(&self, mut request: HttpRequest) -> HttpRequest {
        if let Some(token) = &self.token {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        request
    }

    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let request = self.authorize(HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(path)?,
            headers: Vec::new(),
            body: Vec::new(),
        });
        let response = self.transport.send(request).await?;
        check_status(response)
    }

    async fn put<T: Serialize>(&self, path: &str, payload: &T) -> Result<HttpResponse> {
        let request =
            self.authorize(HttpRequest::json(HttpMethod::Put, self.endpoint(path)?, payload)?);
        let response = self.transport.send(request).await?;
        check_status(response)
    }
}

/// Map non-success statuses onto the backend error taxonomy.
fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    match response.status {
        200..=299 => Ok(response),
        401 | 403 => Err(BackendError::AuthRequired),
        404 => Err(BackendError::not_found(body_message(&response))),
        status => Err(BackendError::api(format!(
            "{status}: {}",
            body_message(&response)
        ))),
    }
}

/// Best-effort extraction of an error message from a response body.
fn body_message(response: &HttpResponse) -> String {
    if let Ok(value) = response.json::<serde_json::Value>()
        && let Some(message) = value.get("message").and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    String::from_utf8_lossy(&response.body).into_owned()
}

// ---------- Wire types ----------

#[derive(Debug, Deserialize)]
struct WireHost {
    id: String,
    kind: HostKind,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(default)]
    config: serde_json::Value,
    #[serde(rename = "lastSyncError")]
    last_sync_error: Option<String>,
    warning: Option<String>,
    #[serde(rename = "lastSyncAt")]
    last_sync_at: Option<DateTime<Utc>>,
    #[serde(rename = "repoCount", default)]
    repo_count: u64,
}

impl From<WireHost> for CodeHost {
    fn from(w: WireHost) -> Self {
        CodeHost {
            id: w.id,
            kind: w.kind,
            display_name: w.display_name,
            config: w.config,
            last_sync_error: w.last_sync_error,
            warning: w.warning,
            last_sync_at: w.last_sync_at,
            repo_count: w.repo_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAffiliatedRepo {
    name: String,
    #[serde(rename = "codeHost")]
    host_id: Option<String>,
    #[serde(default)]
    private: bool,
}

#[derive(Debug, Deserialize)]
struct WireSyncedRepo {
    name: String,
    #[serde(rename = "mirrorInfo", default)]
    mirror: MirrorInfo,
}

#[derive(Debug, Deserialize)]
struct WirePublicRepo {
    name: String,
}

#[derive(Debug, Serialize)]
struct SetPublicReposBody<'a> {
    repos: &'a [String],
}

#[derive(Debug, Serialize)]
struct SetHostReposBody<'a> {
    #[serde(rename = "allRepos")]
    all_repos: bool,
    repos: Option<&'a [String]>,
}

#[async_trait]
impl BackendClient for RestBackend {
    async fn list_code_hosts(&self, principal: &str) -> Result<Vec<CodeHost>> {
        let response = self
            .get(&format!("api/principals/{principal}/code-hosts"))
            .await?;
        let hosts: Vec<WireHost> = response.json()?;
        Ok(hosts.into_iter().map(CodeHost::from).collect())
    }

    async fn list_affiliated_repos(&self, principal: &str) -> Result<Vec<AffiliatedRepo>> {
        let response = self
            .get(&format!("api/principals/{principal}/affiliated-repos"))
            .await?;
        let repos: Vec<WireAffiliatedRepo> = response.json()?;
        Ok(repos
            .into_iter()
            .map(|r| AffiliatedRepo {
                name: r.name,
                host_id: r.host_id,
                private: r.private,
            })
            .collect())
    }

    async fn list_synced_repos(&self, principal: &str) -> Result<Vec<SyncedRepo>> {
        let response = self
            .get(&format!("api/principals/{principal}/synced-repos"))
            .await?;
        let repos: Vec<WireSyncedRepo> = response.json()?;
        Ok(repos
            .into_iter()
            .map(|r| SyncedRepo {
                name: r.name,
                mirror: r.mirror,
            })
            .collect())
    }

    async fn get_public_repos(&self, principal: &str) -> Result<Vec<String>> {
        let response = self
            .get(&format!("api/principals/{principal}/public-repos"))
            .await?;
        let repos: Vec<WirePublicRepo> = response.json()?;
        Ok(repos.into_iter().map(|r| r.name).collect())
    }

    async fn set_public_repos(&self, principal: &str, repos: &[String]) -> Result<()> {
        self.put(
            &format!("api/principals/{principal}/public-repos"),
            &SetPublicReposBody { repos },
        )
        .await?;
        Ok(())
    }

    async fn set_host_repos(
        &self,
        host_id: &str,
        all_repos: bool,
        repos: Option<&[String]>,
    ) -> Result<()> {
        tracing::debug!(host_id, all_repos, "rewriting host repo configuration");
        self.put(
            &format!("api/code-hosts/{host_id}/repos"),
            &SetHostReposBody { all_repos, repos },
        )
        .await?;
        Ok(())
    }
}
