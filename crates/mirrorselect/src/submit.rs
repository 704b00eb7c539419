//! Submission: make the remote system match the reconciled selection.
//!
//! The public repo list is written first because its failure must abort the
//! rest of the transaction. Per-host configuration writes are fanned out in
//! parallel and joined; host configurations are independent resources, so
//! this is the only place true concurrent requests are required.
//!
//! The write is not transactional across hosts: a partial failure leaves
//! some hosts updated and others not. Failures are collected per host and
//! reported together, never rolled back.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendClient, BackendError};
use crate::public_repos::PublicRepoState;
use crate::selection::{SelectionState, SyncMode};

/// A failed configuration write for one host.
#[derive(Debug)]
pub struct HostWriteError {
    pub host_id: String,
    pub error: BackendError,
}

/// Errors from a submission attempt.
///
/// The two variants are separate channels on purpose: a public-list error is
/// resolved by the public-repo control, host errors by the host list.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The public repo list write failed; no host configuration was touched.
    #[error("saving public repositories failed: {0}")]
    PublicList(#[source] BackendError),

    /// One or more per-host writes failed. Hosts not listed were updated.
    #[error("updating {} code host(s) failed", .0.len())]
    Hosts(Vec<HostWriteError>),
}

/// What a successful submission wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Host ids whose configuration was rewritten, in sorted order.
    pub hosts_written: Vec<String>,
    /// Number of public repo URIs written (zero when the gate is disabled).
    pub public_repos_written: usize,
}

/// Translate the reconciled selection into one write per code host plus one
/// write for the public list.
pub async fn submit(
    client: Arc<dyn BackendClient>,
    principal: &str,
    selection: &SelectionState,
    public: &PublicRepoState,
) -> Result<SubmitOutcome, SubmitError> {
    let effective = public.effective();
    client
        .set_public_repos(principal, effective)
        .await
        .map_err(SubmitError::PublicList)?;

    // "The user wants nothing synced": an empty per-host write would be
    // indistinguishable from "unchanged", so no host configuration changes.
    if selection.mode() == SyncMode::None {
        return Ok(SubmitOutcome {
            hosts_written: Vec::new(),
            public_repos_written: effective.len(),
        });
    }

    let by_host = partition_by_host(selection);
    let all_repos = selection.mode() == SyncMode::All;

    let mut handles = Vec::with_capacity(by_host.len());
    for (host_id, names) in by_host {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            let repos = if all_repos { None } else { Some(names.as_slice()) };
            let result = client.set_host_repos(&host_id, all_repos, repos).await;
            (host_id, result)
        }));
    }

    let mut written = Vec::with_capacity(handles.len());
    let mut failures = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((host_id, Ok(()))) => written.push(host_id),
            Ok((host_id, Err(error))) => failures.push(HostWriteError { host_id, error }),
            Err(join_error) => failures.push(HostWriteError {
                host_id: String::new(),
                error: BackendError::internal(format!("host write task failed: {join_error}")),
            }),
        }
    }

    if !failures.is_empty() {
        tracing::warn!(
            failed = failures.len(),
            written = written.len(),
            "partial host configuration update"
        );
        return Err(SubmitError::Hosts(failures));
    }

    written.sort();
    Ok(SubmitOutcome {
        hosts_written: written,
        public_repos_written: effective.len(),
    })
}

/// Group the selected repo names by owning host id.
///
/// Selected names with no host attribution in the catalog cannot be written
/// anywhere and are skipped.
fn partition_by_host(selection: &SelectionState) -> BTreeMap<String, Vec<String>> {
    let mut by_host: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in selection.catalog() {
        if !selection.is_selected(entry.name()) {
            continue;
        }
        match &entry.repo.host_id {
            Some(host_id) => by_host
                .entry(host_id.clone())
                .or_default()
                .push(entry.name().to_string()),
            None => {
                tracing::debug!(repo = entry.name(), "selected repo has no host attribution");
            }
        }
    }
    by_host
}
