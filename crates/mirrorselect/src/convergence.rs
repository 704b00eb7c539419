//! Convergence detection after a submitted selection.
//!
//! The backend applies a new host configuration asynchronously; the only
//! observable completion signal is each host's `last_sync_at` advancing past
//! the value it had at submit time. The poller re-queries the host registry
//! at a fixed interval until every snapshotted host has moved, escalating a
//! purely presentational status label at fixed elapsed-time thresholds.
//!
//! There is no maximum-duration give-up: polling continues until convergence
//! or cancellation. The cancel flag and the event channel are checked before
//! every poll and before every event emission, so a cancelled poller or a
//! dropped receiver makes zero further network calls.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::BackendClient;
use crate::backend::CodeHost;

/// Fixed delay between host registry re-queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Elapsed time after which the label escalates to "Still saving…".
pub const STILL_SAVING_AFTER: Duration = Duration::from_secs(6);

/// Elapsed time after which the label escalates to "Any time now…".
pub const ANY_TIME_NOW_AFTER: Duration = Duration::from_secs(14);

/// Buffer for poller events; the poller emits at most a handful.
const EVENT_CHANNEL_BUFFER_SIZE: usize = 16;

/// Per-host `last_sync_at` values captured immediately before submission.
///
/// Created at submit time, consumed by the poller, discarded on convergence
/// or cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergenceSnapshot {
    taken: BTreeMap<String, Option<DateTime<Utc>>>,
}

impl ConvergenceSnapshot {
    /// Snapshot every host's `last_sync_at`.
    #[must_use]
    pub fn capture(hosts: &[CodeHost]) -> Self {
        Self {
            taken: hosts
                .iter()
                .map(|h| (h.id.clone(), h.last_sync_at))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    /// Whether every snapshotted host reports a sync timestamp different
    /// from its snapshot value.
    ///
    /// Strict inequality: an unchanged timestamp means "not yet synced". A
    /// host absent from the fresh list counts as not yet converged.
    #[must_use]
    pub fn is_converged(&self, fresh: &[CodeHost]) -> bool {
        self.taken.iter().all(|(id, taken_at)| {
            fresh
                .iter()
                .find(|h| &h.id == id)
                .is_some_and(|h| h.last_sync_at != *taken_at)
        })
    }
}

/// User-facing status label while waiting for convergence.
///
/// Purely presentational, not a correctness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saving,
    StillSaving,
    AnyTimeNow,
}

impl SaveStatus {
    /// The label for a given time elapsed since submission.
    #[must_use]
    pub fn at(elapsed: Duration) -> Self {
        if elapsed >= ANY_TIME_NOW_AFTER {
            SaveStatus::AnyTimeNow
        } else if elapsed >= STILL_SAVING_AFTER {
            SaveStatus::StillSaving
        } else {
            SaveStatus::Saving
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Saving => "Saving…",
            SaveStatus::StillSaving => "Still saving…",
            SaveStatus::AnyTimeNow => "Any time now…",
        }
    }
}

/// Events emitted by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The status label changed.
    Status(SaveStatus),
    /// Every host advanced its sync timestamp; the aggregate is the sum of
    /// each host's reported repository count.
    Converged { synced_repo_count: u64 },
    /// A poll failed; polling stops and the user re-initiates.
    Failed { message: String },
}

/// Handle to a running convergence poller.
///
/// Exactly one poll is in flight at a time; a new submission must not start
/// while a poller is active (the workflow reducer enforces this).
pub struct Poller {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn the polling task.
    ///
    /// The first poll happens one interval after spawn; an initial
    /// [`PollEvent::Status`] is emitted immediately.
    pub fn spawn(
        client: Arc<dyn BackendClient>,
        principal: impl Into<String>,
        snapshot: ConvergenceSnapshot,
    ) -> (Self, mpsc::Receiver<PollEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let principal = principal.into();

        let handle = tokio::spawn(async move {
            poll_until_converged(client, principal, snapshot, flag, tx).await;
        });

        (Self { cancelled, handle }, rx)
    }

    /// Request cancellation. No further network calls or events occur after
    /// the flag is observed.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the polling task to exit.
    pub async fn join(self) {
        // Cancellation is cooperative; a panic inside the task is a bug.
        if let Err(e) = self.handle.await
            && !e.is_cancelled()
        {
            tracing::warn!("convergence poller task failed: {e}");
        }
    }
}

async fn poll_until_converged(
    client: Arc<dyn BackendClient>,
    principal: String,
    snapshot: ConvergenceSnapshot,
    cancelled: Arc<AtomicBool>,
    tx: mpsc::Sender<PollEvent>,
) {
    let started = tokio::time::Instant::now();
    let mut interval = tokio::time::interval_at(started + POLL_INTERVAL, POLL_INTERVAL);
    let mut last_status: Option<SaveStatus> = None;

    loop {
        // A dropped receiver is page teardown; treat it like cancellation.
        let status = SaveStatus::at(started.elapsed());
        if last_status != Some(status) {
            last_status = Some(status);
            if cancelled.load(Ordering::Acquire)
                || tx.send(PollEvent::Status(status)).await.is_err()
            {
                return;
            }
        }

        interval.tick().await;
        // A closed channel means the receiver is gone even when the label
        // has latched and no send would surface it.
        if cancelled.load(Ordering::Acquire) || tx.is_closed() {
            return;
        }

        match client.list_code_hosts(&principal).await {
            Ok(hosts) => {
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                if snapshot.is_converged(&hosts) {
                    let synced_repo_count = hosts.iter().map(|h| h.repo_count).sum();
                    tracing::debug!(synced_repo_count, "all hosts converged");
                    let _ = tx.send(PollEvent::Converged { synced_repo_count }).await;
                    return;
                }
            }
            Err(e) => {
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                tracing::warn!("convergence poll failed: {e}");
                let _ = tx
                    .send(PollEvent::Failed {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        }
    }
}
