//! Selection model shared by the reconciler, submitter, and workflow.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::{AffiliatedRepo, MirrorInfo};

/// The selection strategy for code-host-affiliated sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    /// Sync every affiliated repository.
    All,
    /// Sync an explicit subset.
    Selected,
    /// Sync nothing.
    None,
}

impl SyncMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::All => "ALL",
            SyncMode::Selected => "SELECTED",
            SyncMode::None => "NONE",
        }
    }
}

/// An affiliated repository annotated with mirror status when it is also
/// present in the synced snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRepo {
    pub repo: AffiliatedRepo,
    pub mirror: Option<MirrorInfo>,
}

impl CatalogRepo {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.repo.name
    }
}

/// A non-fatal problem attached to one code-host connection.
///
/// Accumulated into a list rather than short-circuiting on the first one;
/// an affected host is excluded from selection eligibility but the rest of
/// the page still renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProblem {
    /// Display name of the affected host.
    pub host: String,
    pub message: String,
}

impl fmt::Display for HostProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.host, self.message)
    }
}

/// Problems collected during the reconciliation pass.
///
/// Host problems and the public-repo-list error live in separate channels
/// because they are resolved by different controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadProblems {
    pub hosts: Vec<HostProblem>,
    pub public_error: Option<String>,
}

impl LoadProblems {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.public_error.is_none()
    }
}

/// One coherent selection model merged from the host registry, the
/// affiliated catalog, the synced snapshot, and the public repo list.
///
/// Every mutation produces a new value; the single UI actor replaces its
/// state wholesale so change detection always observes a consistent
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    /// Catalog in display order (selected-first after reconciliation).
    catalog: Vec<CatalogRepo>,
    /// Names currently chosen, one entry per repo name.
    selected: BTreeSet<String>,
    mode: SyncMode,
    /// Selection names plus public repos captured at load time, for change
    /// detection.
    baseline: BTreeSet<String>,
}

impl SelectionState {
    /// Assemble a state from parts. [`reconcile`](crate::selection::reconcile)
    /// is the usual constructor; this one exists for tests and callers that
    /// restore a previously captured state.
    #[must_use]
    pub fn new(
        catalog: Vec<CatalogRepo>,
        selected: BTreeSet<String>,
        mode: SyncMode,
        baseline: BTreeSet<String>,
    ) -> Self {
        Self {
            catalog,
            selected,
            mode,
            baseline,
        }
    }

    /// An empty selection, used when the principal has no code hosts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            catalog: Vec::new(),
            selected: BTreeSet::new(),
            mode: SyncMode::None,
            baseline: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &[CatalogRepo] {
        &self.catalog
    }

    #[must_use]
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    #[must_use]
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// Names currently chosen, in sorted order.
    #[must_use]
    pub fn selected_names(&self) -> Vec<&str> {
        self.selected.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Add or remove one repository from the selection set. No-op on mode.
    #[must_use]
    pub fn toggle(&self, name: &str) -> Self {
        let mut next = self.clone();
        if !next.selected.remove(name) {
            next.selected.insert(name.to_string());
        }
        next
    }

    /// Toggle the currently visible subset as a whole.
    ///
    /// If every visible repo is already selected, the visible subset is
    /// cleared from the selection; otherwise the entire visible subset is
    /// added. Scoped to whatever filter or page is active, never the whole
    /// catalog.
    #[must_use]
    pub fn toggle_all(&self, visible: &[&str]) -> Self {
        let mut next = self.clone();
        let fully_selected =
            !visible.is_empty() && visible.iter().all(|name| next.selected.contains(*name));
        if fully_selected {
            for name in visible {
                next.selected.remove(*name);
            }
        } else {
            for name in visible {
                next.selected.insert((*name).to_string());
            }
        }
        next
    }

    #[must_use]
    pub fn set_mode(&self, mode: SyncMode) -> Self {
        let mut next = self.clone();
        next.mode = mode;
        next
    }

    /// Whether the current selection diverges from the baseline captured at
    /// load time.
    ///
    /// Recomputed on every call: both the selection set and the public repo
    /// list can change independently, so the symmetric-difference test must
    /// never be cached.
    #[must_use]
    pub fn has_unsaved_changes(&self, current_public_repos: &[String]) -> bool {
        let current: BTreeSet<&str> = self
            .selected
            .iter()
            .map(String::as_str)
            .chain(current_public_repos.iter().map(String::as_str))
            .collect();
        let baseline: BTreeSet<&str> = self.baseline.iter().map(String::as_str).collect();
        current != baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> CatalogRepo {
        CatalogRepo {
            repo: AffiliatedRepo {
                name: name.to_string(),
                host_id: Some("h1".to_string()),
                private: false,
            },
            mirror: None,
        }
    }

    fn state(selected: &[&str], baseline: &[&str]) -> SelectionState {
        SelectionState::new(
            vec![repo("a/one"), repo("a/two"), repo("a/three")],
            selected.iter().map(|s| s.to_string()).collect(),
            SyncMode::Selected,
            baseline.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn toggle_adds_then_removes() {
        let s0 = state(&[], &[]);
        let s1 = s0.toggle("a/one");
        assert!(s1.is_selected("a/one"));
        let s2 = s1.toggle("a/one");
        assert!(!s2.is_selected("a/one"));
        // The original value is untouched.
        assert!(!s0.is_selected("a/one"));
    }

    #[test]
    fn toggle_does_not_touch_mode() {
        let s = state(&[], &[]).set_mode(SyncMode::None);
        assert_eq!(s.toggle("a/one").mode(), SyncMode::None);
    }

    #[test]
    fn toggle_all_selects_only_the_visible_subset() {
        let s = state(&[], &[]);
        // Filter narrowed the catalog to two of three repos.
        let next = s.toggle_all(&["a/one", "a/two"]);
        assert!(next.is_selected("a/one"));
        assert!(next.is_selected("a/two"));
        assert!(!next.is_selected("a/three"));
    }

    #[test]
    fn toggle_all_clears_a_fully_selected_view() {
        let s = state(&["a/one", "a/two", "a/three"], &[]);
        let next = s.toggle_all(&["a/one", "a/two"]);
        assert!(!next.is_selected("a/one"));
        assert!(!next.is_selected("a/two"));
        // Repos outside the view keep their selection.
        assert!(next.is_selected("a/three"));
    }

    #[test]
    fn toggle_all_on_partially_selected_view_selects_the_rest() {
        let s = state(&["a/one"], &[]);
        let next = s.toggle_all(&["a/one", "a/two"]);
        assert!(next.is_selected("a/one"));
        assert!(next.is_selected("a/two"));
    }

    #[test]
    fn toggle_all_with_empty_view_is_a_no_op() {
        let s = state(&["a/one"], &[]);
        let next = s.toggle_all(&[]);
        assert_eq!(next.selected_count(), 1);
    }

    #[test]
    fn change_detection_is_symmetric() {
        let s0 = state(&["a/one"], &["a/one"]);
        assert!(!s0.has_unsaved_changes(&[]));

        let s1 = s0.toggle("a/two");
        assert!(s1.has_unsaved_changes(&[]));

        let s2 = s1.toggle("a/two");
        assert!(!s2.has_unsaved_changes(&[]));
    }

    #[test]
    fn change_detection_covers_the_public_repo_list() {
        let s = state(&["a/one"], &["a/one", "github.com/rust-lang/rust"]);
        assert!(s.has_unsaved_changes(&[]));
        assert!(!s.has_unsaved_changes(&["github.com/rust-lang/rust".to_string()]));
        assert!(s.has_unsaved_changes(&[
            "github.com/rust-lang/rust".to_string(),
            "github.com/extra/repo".to_string(),
        ]));
    }

    #[test]
    fn removing_a_baseline_repo_is_a_change() {
        let s = state(&["a/one", "a/two"], &["a/one", "a/two"]);
        assert!(s.toggle("a/two").has_unsaved_changes(&[]));
    }

    #[test]
    fn load_problems_is_empty_only_without_either_channel() {
        assert!(LoadProblems::default().is_empty());
        let p = LoadProblems {
            hosts: vec![HostProblem {
                host: "GitHub".to_string(),
                message: "token expired".to_string(),
            }],
            public_error: None,
        };
        assert!(!p.is_empty());
        let p = LoadProblems {
            hosts: Vec::new(),
            public_error: Some("save failed".to_string()),
        };
        assert!(!p.is_empty());
    }

    #[test]
    fn sync_mode_round_trips_through_serde() {
        let json = serde_json::to_string(&SyncMode::Selected).expect("serialize");
        assert_eq!(json, "\"SELECTED\"");
        let mode: SyncMode = serde_json::from_str("\"ALL\"").expect("deserialize");
        assert_eq!(mode, SyncMode::All);
    }
}
