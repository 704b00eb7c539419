//! Merge of the three read-only catalogs into one [`SelectionState`].
//!
//! The merge is pure and idempotent: running it twice on the same inputs
//! yields the same membership, ordering, and mode.

use std::collections::BTreeSet;

use crate::backend::{AffiliatedRepo, CodeHost, SyncedRepo};

use super::types::{CatalogRepo, HostProblem, SelectionState, SyncMode};

/// Whether a host-qualified repo name refers to the given unqualified
/// `owner/repo` name.
///
/// The synced form carries the host (`github.com/acme/widget`) while the
/// affiliated form does not (`acme/widget`), so matching is by suffix with a
/// path-segment boundary: `github.com/other-acme/widget` must not match
/// `acme/widget`.
#[must_use]
pub fn suffix_matches(qualified: &str, unqualified: &str) -> bool {
    if qualified == unqualified {
        return true;
    }
    qualified
        .strip_suffix(unqualified)
        .is_some_and(|prefix| prefix.ends_with('/'))
}

/// Accumulate warnings and sync errors across all hosts.
///
/// Never short-circuits on the first problem: each affected host contributes
/// one entry so the caller can render all of them.
#[must_use]
pub fn host_problems(hosts: &[CodeHost]) -> Vec<HostProblem> {
    hosts
        .iter()
        .filter_map(|host| {
            host.problem().map(|message| HostProblem {
                host: host.display_name.clone(),
                message: message.to_string(),
            })
        })
        .collect()
}

/// Merge the affiliated catalog, synced snapshot, and public repo list into
/// one selection model.
///
/// - Every affiliated repo that suffix-matches a synced repo is annotated
///   with the synced repo's mirror info and joins the initial selection.
/// - The catalog is stably reordered selected-first (cosmetic ordering).
/// - The mode derives from the initial selection and, for `All`, from the
///   `allow_sync_all` flag plus every eligible host's auto-sync config.
/// - The baseline (selection names plus public repos) is captured for change
///   detection.
#[must_use]
pub fn reconcile(
    hosts: &[CodeHost],
    affiliated: Vec<AffiliatedRepo>,
    synced: &[SyncedRepo],
    public_repos: &[String],
    allow_sync_all: bool,
) -> SelectionState {
    let mut catalog: Vec<CatalogRepo> = Vec::with_capacity(affiliated.len());
    let mut selected: BTreeSet<String> = BTreeSet::new();

    for repo in affiliated {
        // First match in synced-list order wins when several qualify.
        let mirror = synced
            .iter()
            .find(|s| suffix_matches(&s.name, &repo.name))
            .map(|s| s.mirror.clone());
        if mirror.is_some() {
            selected.insert(repo.name.clone());
        }
        catalog.push(CatalogRepo { repo, mirror });
    }

    // Stable partition: selected repos sort before unselected ones,
    // relative order otherwise preserved.
    catalog.sort_by_key(|r| !selected.contains(r.name()));

    let mode = derive_mode(hosts, &selected, allow_sync_all);
    tracing::debug!(
        catalog = catalog.len(),
        selected = selected.len(),
        mode = mode.as_str(),
        "reconciled selection"
    );

    let baseline: BTreeSet<String> = selected
        .iter()
        .cloned()
        .chain(public_repos.iter().cloned())
        .collect();

    SelectionState::new(catalog, selected, mode, baseline)
}

/// Derive the initial sync mode.
///
/// `All` is only reachable when the feature flag permits it, something is
/// already synced, and every eligible host's configuration requests
/// affiliated-scope auto-sync.
fn derive_mode(hosts: &[CodeHost], selected: &BTreeSet<String>, allow_sync_all: bool) -> SyncMode {
    if selected.is_empty() {
        return SyncMode::None;
    }

    let mut eligible = hosts.iter().filter(|h| h.is_eligible()).peekable();
    let any_eligible = eligible.peek().is_some();
    if allow_sync_all && any_eligible && eligible.all(CodeHost::affiliated_auto_sync) {
        SyncMode::All
    } else {
        SyncMode::Selected
    }
}
