//! Shared in-memory backend for the integration tests.
//!
//! Behaves like a small stateful platform backend: reads serve the stored
//! catalogs, writes are recorded in arrival order, and a scheduled sync
//! completion advances every host's `last_sync_at` after a configurable
//! number of host-registry polls.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;

use mirrorselect::backend::{
    AffiliatedRepo, BackendClient, BackendError, CodeHost, HostKind, MirrorInfo,
    Result as BackendResult, SyncedRepo,
};

pub fn host(id: &str, last_sync_at: Option<DateTime<Utc>>, repo_count: u64) -> CodeHost {
    CodeHost {
        id: id.to_string(),
        kind: HostKind::Github,
        display_name: format!("GitHub ({id})"),
        config: json!({ "repositoryQuery": ["affiliated"] }),
        last_sync_error: None,
        warning: None,
        last_sync_at,
        repo_count,
    }
}

pub fn affiliated(name: &str, host_id: &str) -> AffiliatedRepo {
    AffiliatedRepo {
        name: name.to_string(),
        host_id: Some(host_id.to_string()),
        private: false,
    }
}

pub fn synced(name: &str) -> SyncedRepo {
    SyncedRepo {
        name: name.to_string(),
        mirror: MirrorInfo {
            cloned: true,
            clone_in_progress: false,
            updated_at: None,
        },
    }
}

#[derive(Default)]
struct BackendState {
    hosts: Vec<CodeHost>,
    affiliated: Vec<AffiliatedRepo>,
    synced: Vec<SyncedRepo>,
    public: Vec<String>,
    /// Host-registry polls remaining until `last_sync_at` advances.
    advance_after_polls: Option<usize>,
    /// Every write in arrival order: `public` or `host:<id>`.
    writes: Vec<String>,
    fail_hosts: BTreeSet<String>,
    fail_public: bool,
}

/// Stateful fake backend shared across the integration tests.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    host_list_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new(
        hosts: Vec<CodeHost>,
        affiliated: Vec<AffiliatedRepo>,
        synced: Vec<SyncedRepo>,
        public: Vec<String>,
    ) -> Self {
        Self {
            state: Mutex::new(BackendState {
                hosts,
                affiliated,
                synced,
                public,
                ..BackendState::default()
            }),
            host_list_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Advance every host's `last_sync_at` after `polls` further
    /// host-registry reads, simulating the asynchronous sync finishing.
    pub fn complete_sync_after_polls(&self, polls: usize) {
        self.lock().advance_after_polls = Some(polls);
    }

    pub fn fail_host_write(&self, host_id: &str) {
        self.lock().fail_hosts.insert(host_id.to_string());
    }

    pub fn fail_public_write(&self) {
        self.lock().fail_public = true;
    }

    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub fn host_list_calls(&self) -> usize {
        self.host_list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendClient for InMemoryBackend {
    async fn list_code_hosts(&self, _principal: &str) -> BackendResult<Vec<CodeHost>> {
        self.host_list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(remaining) = state.advance_after_polls {
            if remaining <= 1 {
                state.advance_after_polls = None;
                for host in &mut state.hosts {
                    let advanced = host
                        .last_sync_at
                        .map_or_else(Utc::now, |at| at + ChronoDuration::seconds(1));
                    host.last_sync_at = Some(advanced);
                }
            } else {
                state.advance_after_polls = Some(remaining - 1);
            }
        }
        Ok(state.hosts.clone())
    }

    async fn list_affiliated_repos(&self, _principal: &str) -> BackendResult<Vec<AffiliatedRepo>> {
        Ok(self.lock().affiliated.clone())
    }

    async fn list_synced_repos(&self, _principal: &str) -> BackendResult<Vec<SyncedRepo>> {
        Ok(self.lock().synced.clone())
    }

    async fn get_public_repos(&self, _principal: &str) -> BackendResult<Vec<String>> {
        Ok(self.lock().public.clone())
    }

    async fn set_public_repos(&self, _principal: &str, repos: &[String]) -> BackendResult<()> {
        let mut state = self.lock();
        if state.fail_public {
            return Err(BackendError::api("public write rejected"));
        }
        state.writes.push("public".to_string());
        state.public = repos.to_vec();
        Ok(())
    }

    async fn set_host_repos(
        &self,
        host_id: &str,
        _all_repos: bool,
        _repos: Option<&[String]>,
    ) -> BackendResult<()> {
        let mut state = self.lock();
        if state.fail_hosts.contains(host_id) {
            return Err(BackendError::api(format!("{host_id} write rejected")));
        }
        state.writes.push(format!("host:{host_id}"));
        Ok(())
    }
}
