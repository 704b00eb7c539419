//! Page workflow: one tagged state machine for the whole
//! load → edit → submit → poll lifecycle.
//!
//! The original implementation spread this state across many independent
//! mutable flags; here a single [`PageState`] with a reducer-style
//! [`PageState::apply`] makes invalid combinations unrepresentable — a
//! submission cannot start while a poller is active because the reducer
//! only accepts [`PageEvent::SubmitStarted`] in the `Ready` state.

use crate::backend::{BackendClient, BackendError, CodeHost};
use crate::public_repos::PublicRepoState;
use crate::selection::{
    HostProblem, LoadProblems, SelectionState, host_problems, reconcile,
};
use crate::submit::SubmitError;

/// Everything the page renders and edits once loading finished.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub hosts: Vec<CodeHost>,
    pub selection: SelectionState,
    pub public: PublicRepoState,
    pub problems: LoadProblems,
}

impl PageData {
    /// Whether the selection diverges from the baseline captured at load.
    ///
    /// The public contribution is the effective list, so disabling the
    /// public gate with a non-empty list counts as a change.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.selection.has_unsaved_changes(self.public.effective())
    }

    fn display_name_for(&self, host_id: &str) -> String {
        self.hosts
            .iter()
            .find(|h| h.id == host_id)
            .map_or_else(|| host_id.to_string(), |h| h.display_name.clone())
    }
}

/// Tagged page state.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Idle,
    Loading,
    Ready(PageData),
    Submitting(PageData),
    Polling(PageData),
    Errored { message: String },
}

impl PageState {
    /// Submission is only available from `Ready`; this is what disables the
    /// save action while loading, submitting, or polling.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(self, PageState::Ready(_))
    }

    #[must_use]
    pub fn data(&self) -> Option<&PageData> {
        match self {
            PageState::Ready(data) | PageState::Submitting(data) | PageState::Polling(data) => {
                Some(data)
            }
            _ => None,
        }
    }

    /// The single transition function.
    ///
    /// Events that are invalid in the current state leave it unchanged.
    #[must_use]
    pub fn apply(self, event: PageEvent) -> PageState {
        match (self, event) {
            (PageState::Idle | PageState::Errored { .. }, PageEvent::LoadStarted) => {
                PageState::Loading
            }
            (PageState::Loading, PageEvent::Loaded(data)) => PageState::Ready(*data),
            (PageState::Loading, PageEvent::LoadFailed { message }) => {
                PageState::Errored { message }
            }
            (PageState::Ready(mut data), PageEvent::Edited(selection)) => {
                data.selection = selection;
                PageState::Ready(data)
            }
            (PageState::Ready(mut data), PageEvent::PublicEdited(public)) => {
                data.public = public;
                PageState::Ready(data)
            }
            (PageState::Ready(data), PageEvent::SubmitStarted) => PageState::Submitting(data),
            (PageState::Submitting(mut data), PageEvent::SubmitFailed(failure)) => {
                // The in-memory selection is preserved so the user can retry
                // without re-entering choices.
                match failure {
                    SubmitFailure::PublicList(message) => {
                        data.problems.public_error = Some(message);
                    }
                    SubmitFailure::Hosts(mut problems) => {
                        data.problems.hosts.append(&mut problems);
                    }
                }
                PageState::Ready(data)
            }
            (PageState::Submitting(data), PageEvent::SubmitAccepted) => PageState::Polling(data),
            (PageState::Polling(_), PageEvent::PollFailed { message }) => {
                PageState::Errored { message }
            }
            // Successful convergence resets the page; the caller reloads.
            (PageState::Polling(_), PageEvent::Converged) => PageState::Idle,
            (state, event) => {
                tracing::warn!(?event, "event not valid in current page state");
                state
            }
        }
    }
}

/// A rejected submission, routed into the matching problem channel by the
/// reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    PublicList(String),
    Hosts(Vec<HostProblem>),
}

impl SubmitFailure {
    /// Convert a [`SubmitError`], resolving host ids to display names.
    #[must_use]
    pub fn from_error(error: &SubmitError, data: &PageData) -> Self {
        match error {
            SubmitError::PublicList(e) => SubmitFailure::PublicList(e.to_string()),
            SubmitError::Hosts(failures) => SubmitFailure::Hosts(
                failures
                    .iter()
                    .map(|f| HostProblem {
                        host: data.display_name_for(&f.host_id),
                        message: f.error.to_string(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Events driving the page state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    LoadStarted,
    Loaded(Box<PageData>),
    LoadFailed { message: String },
    Edited(SelectionState),
    PublicEdited(PublicRepoState),
    SubmitStarted,
    SubmitFailed(SubmitFailure),
    SubmitAccepted,
    PollFailed { message: String },
    Converged,
}

/// Run the full reconciliation pass.
///
/// The host list is loaded first because it scopes everything else: an
/// empty host list short-circuits with no catalog fetch (a valid "no code
/// hosts" terminal state). The three remaining loads are issued
/// concurrently. A failing host, affiliated, or synced load is fatal to the
/// selection UI; a failing public-repo load lands in its own non-fatal
/// problem channel.
pub async fn load_page(
    client: &dyn BackendClient,
    principal: &str,
    allow_sync_all: bool,
) -> Result<PageData, BackendError> {
    let hosts = client.list_code_hosts(principal).await?;
    if hosts.is_empty() {
        tracing::debug!(principal, "no code hosts configured");
        return Ok(PageData {
            hosts,
            selection: SelectionState::empty(),
            public: PublicRepoState::default(),
            problems: LoadProblems::default(),
        });
    }

    let (affiliated, synced, public) = tokio::join!(
        client.list_affiliated_repos(principal),
        client.list_synced_repos(principal),
        client.get_public_repos(principal),
    );
    let affiliated = affiliated?;
    let synced = synced?;

    let mut problems = LoadProblems {
        hosts: host_problems(&hosts),
        public_error: None,
    };
    let public_repos = match public {
        Ok(repos) => repos,
        Err(e) => {
            tracing::warn!("public repo list load failed: {e}");
            problems.public_error = Some(e.to_string());
            Vec::new()
        }
    };

    let selection = reconcile(&hosts, affiliated, &synced, &public_repos, allow_sync_all);
    let enabled = !public_repos.is_empty();
    Ok(PageData {
        hosts,
        selection,
        public: PublicRepoState::new(public_repos, enabled),
        problems,
    })
}

/// Blocks navigation away from the page while unsaved changes exist.
///
/// Accepting the discard prompt bypasses the block exactly once; the
/// poller's own success path uses the same bypass because its completion
/// performs the navigation on purpose.
#[derive(Debug, Default)]
pub struct NavigationGuard {
    bypass_once: bool,
}

impl NavigationGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the one-shot bypass.
    pub fn confirm_discard(&mut self) {
        self.bypass_once = true;
    }

    /// Evaluate a navigation attempt. Cheap, synchronous, deterministic.
    #[must_use]
    pub fn should_block(&mut self, state: &PageState) -> bool {
        if self.bypass_once {
            self.bypass_once = false;
            return false;
        }
        state.data().is_some_and(PageData::has_unsaved_changes)
    }
}
