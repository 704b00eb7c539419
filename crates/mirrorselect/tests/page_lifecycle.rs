//! End-to-end lifecycle tests: load, edit, submit, poll to convergence.
//!
//! These drive the page state machine against the stateful in-memory
//! backend, asserting the cross-module contracts the unit tests cannot see:
//! write ordering, snapshot capture before submission, and the navigation
//! guard's interaction with the poller's success path.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mirrorselect::convergence::{ConvergenceSnapshot, PollEvent, Poller};
use mirrorselect::selection::SyncMode;
use mirrorselect::submit::submit;
use mirrorselect::workflow::{
    NavigationGuard, PageEvent, PageState, SubmitFailure, load_page,
};

use common::{InMemoryBackend, affiliated, host, synced};

/// Upper bound on any awaited step; exceeding it means a hang.
const TEST_TIMEOUT: Duration = Duration::from_secs(60);

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

fn seeded_backend() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::new(
        vec![host("h1", Some(ts(100)), 5)],
        vec![affiliated("acme/widget", "h1"), affiliated("acme/gadget", "h1")],
        vec![synced("github.com/acme/widget")],
        vec!["github.com/rust-lang/rust".to_string()],
    ))
}

#[tokio::test(start_paused = true)]
async fn full_lifecycle_from_load_to_convergence() {
    let backend = seeded_backend();
    let mut guard = NavigationGuard::new();

    // Load and reconcile.
    let state = PageState::Idle.apply(PageEvent::LoadStarted);
    let data = load_page(backend.as_ref(), "alice", false)
        .await
        .expect("load");
    assert!(data.selection.is_selected("acme/widget"));
    assert!(!data.selection.is_selected("acme/gadget"));
    assert_eq!(data.selection.mode(), SyncMode::Selected);
    assert!(!data.has_unsaved_changes());

    let state = state.apply(PageEvent::Loaded(Box::new(data)));
    assert!(!guard.should_block(&state));

    // Edit: select the second repo.
    let data = state.data().expect("ready").clone();
    let edited = data.selection.toggle("acme/gadget");
    let state = state.apply(PageEvent::Edited(edited));
    assert!(guard.should_block(&state));

    // Snapshot before submitting, then submit.
    let data = state.data().expect("ready").clone();
    let snapshot = ConvergenceSnapshot::capture(&data.hosts);
    let state = state.apply(PageEvent::SubmitStarted);
    assert!(!state.can_submit());

    let outcome = submit(backend.clone(), "alice", &data.selection, &data.public)
        .await
        .expect("submit");
    assert_eq!(outcome.hosts_written, vec!["h1".to_string()]);
    assert_eq!(outcome.public_repos_written, 1);
    // The public list is always written before any host configuration.
    assert_eq!(backend.writes(), vec!["public".to_string(), "host:h1".to_string()]);

    let state = state.apply(PageEvent::SubmitAccepted);
    assert!(matches!(state, PageState::Polling(_)));

    // The backend finishes its sync after two registry polls.
    backend.complete_sync_after_polls(2);
    let (poller, mut rx) = Poller::spawn(backend.clone(), "alice", snapshot);

    let mut converged_count = None;
    let drained = tokio::time::timeout(TEST_TIMEOUT, async {
        while let Some(event) = rx.recv().await {
            if let PollEvent::Converged { synced_repo_count } = event {
                converged_count = Some(synced_repo_count);
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "poller should converge, not hang");
    assert_eq!(converged_count, Some(5));
    poller.join().await;

    // Convergence resets the page and bypasses the guard once.
    let state = state.apply(PageEvent::Converged);
    assert_eq!(state, PageState::Idle);
    guard.confirm_discard();
    assert!(!guard.should_block(&state));
}

#[tokio::test]
async fn host_write_failure_returns_to_ready_with_the_problem_attached() {
    let backend = seeded_backend();
    backend.fail_host_write("h1");

    let data = load_page(backend.as_ref(), "alice", false)
        .await
        .expect("load");
    let state = PageState::Ready(data.clone()).apply(PageEvent::SubmitStarted);

    let err = submit(backend.clone(), "alice", &data.selection, &data.public)
        .await
        .expect_err("host write fails");
    let state = state.apply(PageEvent::SubmitFailed(SubmitFailure::from_error(
        &err, &data,
    )));

    match state {
        PageState::Ready(after) => {
            // The selection survives for a retry and the failure names the
            // host by display name.
            assert!(after.selection.is_selected("acme/widget"));
            assert_eq!(after.problems.hosts.len(), 1);
            assert_eq!(after.problems.hosts[0].host, "GitHub (h1)");
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn public_write_failure_aborts_before_host_writes() {
    let backend = seeded_backend();
    backend.fail_public_write();

    let data = load_page(backend.as_ref(), "alice", false)
        .await
        .expect("load");
    let err = submit(backend.clone(), "alice", &data.selection, &data.public)
        .await
        .expect_err("public write fails");

    assert!(matches!(err, mirrorselect::submit::SubmitError::PublicList(_)));
    assert!(backend.writes().is_empty());

    let state = PageState::Submitting(data)
        .apply(PageEvent::SubmitFailed(SubmitFailure::PublicList(
            err.to_string(),
        )));
    match state {
        PageState::Ready(after) => assert!(after.problems.public_error.is_some()),
        other => panic!("unexpected state: {other:?}"),
    }
}
