use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::Result;

/// The kind of code host a connection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostKind {
    Github,
    Gitlab,
    BitbucketCloud,
    Gitea,
    /// Any host kind this client does not model explicitly.
    #[serde(other)]
    Other,
}

impl HostKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HostKind::Github => "GitHub",
            HostKind::Gitlab => "GitLab",
            HostKind::BitbucketCloud => "Bitbucket Cloud",
            HostKind::Gitea => "Gitea",
            HostKind::Other => "Other",
        }
    }
}

/// A code-host connection configured for the acting principal.
///
/// Created and destroyed entirely by the external connection management;
/// this engine only reads hosts and, on submit, rewrites their repo-list
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeHost {
    /// Opaque handle minted by the backend.
    pub id: String,
    pub kind: HostKind,
    pub display_name: String,
    /// Host-specific configuration blob.
    pub config: serde_json::Value,
    /// Error from the most recent sync attempt, if any.
    pub last_sync_error: Option<String>,
    /// Non-fatal warning attached to the connection, if any.
    pub warning: Option<String>,
    /// When the host last completed a sync.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Number of repositories the host reports as synced.
    pub repo_count: u64,
}

impl CodeHost {
    /// The warning or sync error attached to this host, if any.
    ///
    /// Warnings take precedence for display; either one makes the host
    /// ineligible for selection until resolved.
    #[must_use]
    pub fn problem(&self) -> Option<&str> {
        self.warning
            .as_deref()
            .or(self.last_sync_error.as_deref())
    }

    /// Whether this host may participate in selection.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.problem().is_none()
    }

    /// Whether the host's configuration requests affiliated-scope auto-sync.
    ///
    /// The repo-list configuration carries a `repositoryQuery` array; the
    /// `"affiliated"` entry means "everything the principal can see".
    #[must_use]
    pub fn affiliated_auto_sync(&self) -> bool {
        self.config
            .get("repositoryQuery")
            .and_then(|q| q.as_array())
            .is_some_and(|queries| queries.iter().any(|q| q.as_str() == Some("affiliated")))
    }
}

/// A repository visible to the principal on a code host, whether or not it
/// is currently synced.
///
/// Names are in `owner/repo` form, unqualified by host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliatedRepo {
    pub name: String,
    /// Weak reference to the owning [`CodeHost`] by id. Absent when the
    /// backend could not attribute the repo to a configured host.
    pub host_id: Option<String>,
    pub private: bool,
}

/// Mirror status of a synced repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MirrorInfo {
    #[serde(default)]
    pub cloned: bool,
    #[serde(default)]
    pub clone_in_progress: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A repository the principal currently has synced.
///
/// Names are host-qualified, e.g. `github.com/acme/widget`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedRepo {
    pub name: String,
    pub mirror: MirrorInfo,
}

/// Client for the platform backend's repository-selection API.
///
/// All reads are idempotent and side-effect-free, so overlapping retries are
/// safe. The two writes (`set_public_repos`, `set_host_repos`) are the only
/// mutating operations and are never retried automatically.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// List the code-host connections configured for the principal.
    ///
    /// An empty list is a valid terminal state ("no code hosts"), not an
    /// error.
    async fn list_code_hosts(&self, principal: &str) -> Result<Vec<CodeHost>>;

    /// List the repositories visible to the principal across all hosts.
    ///
    /// Only meaningful once `list_code_hosts` returned a non-empty list;
    /// callers short-circuit reconciliation on an empty host list.
    async fn list_affiliated_repos(&self, principal: &str) -> Result<Vec<AffiliatedRepo>>;

    /// List the repositories the principal currently has synced, with
    /// per-repository mirror status.
    async fn list_synced_repos(&self, principal: &str) -> Result<Vec<SyncedRepo>>;

    /// Read the principal's opted-in public repository URIs.
    async fn get_public_repos(&self, principal: &str) -> Result<Vec<String>>;

    /// Replace the principal's public repository URI list.
    async fn set_public_repos(&self, principal: &str, repos: &[String]) -> Result<()>;

    /// Rewrite one host's repo-list configuration.
    ///
    /// `all_repos` requests affiliated-scope auto-sync; `repos` carries the
    /// explicit selection when `all_repos` is false, or `None` to leave the
    /// explicit list untouched.
    async fn set_host_repos(
        &self,
        host_id: &str,
        all_repos: bool,
        repos: Option<&[String]>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host(config: serde_json::Value) -> CodeHost {
        CodeHost {
            id: "h1".to_string(),
            kind: HostKind::Github,
            display_name: "GitHub".to_string(),
            config,
            last_sync_error: None,
            warning: None,
            last_sync_at: None,
            repo_count: 0,
        }
    }

    #[test]
    fn affiliated_auto_sync_requires_the_affiliated_query() {
        assert!(host(json!({ "repositoryQuery": ["affiliated"] })).affiliated_auto_sync());
        assert!(
            host(json!({ "repositoryQuery": ["none", "affiliated"] })).affiliated_auto_sync()
        );
        assert!(!host(json!({ "repositoryQuery": ["none"] })).affiliated_auto_sync());
        assert!(!host(json!({ "repositoryQuery": [] })).affiliated_auto_sync());
        assert!(!host(json!({})).affiliated_auto_sync());
        assert!(!host(json!({ "repositoryQuery": "affiliated" })).affiliated_auto_sync());
    }

    #[test]
    fn problem_prefers_warning_over_sync_error() {
        let mut h = host(json!({}));
        assert_eq!(h.problem(), None);
        assert!(h.is_eligible());

        h.last_sync_error = Some("sync failed".to_string());
        assert_eq!(h.problem(), Some("sync failed"));
        assert!(!h.is_eligible());

        h.warning = Some("token expires soon".to_string());
        assert_eq!(h.problem(), Some("token expires soon"));
        assert!(!h.is_eligible());
    }

    #[test]
    fn host_kind_display_names() {
        assert_eq!(HostKind::Github.as_str(), "GitHub");
        assert_eq!(HostKind::BitbucketCloud.as_str(), "Bitbucket Cloud");
    }

    #[test]
    fn host_kind_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&HostKind::BitbucketCloud).expect("serialize");
        assert_eq!(json, "\"BITBUCKET_CLOUD\"");
        let kind: HostKind = serde_json::from_str("\"GITHUB\"").expect("deserialize");
        assert_eq!(kind, HostKind::Github);
    }

    #[test]
    fn mirror_info_defaults_are_empty() {
        let info: MirrorInfo = serde_json::from_str("{}").expect("deserialize");
        assert!(!info.cloned);
        assert!(!info.clone_in_progress);
        assert!(info.updated_at.is_none());
    }
}
