//! The `sync` command: change the selection, submit it, and wait until the
//! backend has applied it.

use std::path::PathBuf;
use std::time::Duration;

use mirrorselect::backend::short_error_message;
use mirrorselect::convergence::{ConvergenceSnapshot, PollEvent, Poller};
use mirrorselect::public_repos::PublicRepoState;
use mirrorselect::selection::{SelectionState, SyncMode};
use mirrorselect::submit::{SubmitError, submit};
use mirrorselect::workflow::load_page;

use crate::commands::shared::build_client;
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown::is_shutdown_requested;

/// How often the convergence wait re-checks the shutdown flag.
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, clap::Args)]
pub(crate) struct SyncArgs {
    /// Sync every affiliated repository (requires deployment support)
    #[arg(long, conflicts_with_all = ["none", "repo"])]
    all: bool,

    /// Stop syncing affiliated repositories
    #[arg(long, conflicts_with = "repo")]
    none: bool,

    /// Toggle the named repository (owner/repo form); may be repeated
    #[arg(short, long = "repo", value_name = "NAME")]
    repo: Vec<String>,

    /// Replace the public repository list from a file, one URI per line
    #[arg(long, value_name = "PATH")]
    public_file: Option<PathBuf>,

    /// Disable the public repository list without clearing its content
    #[arg(long)]
    no_public: bool,

    /// Submit without waiting for the backend to finish applying
    #[arg(long)]
    no_wait: bool,

    /// Show what would be submitted without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,
}

pub(crate) async fn handle_sync(
    config: &Config,
    args: SyncArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.all && !config.sync.allow_sync_all {
        return Err("Sync-all is not enabled for this deployment. \
                    Set [sync] allow_sync_all in the config file if the backend supports it."
            .into());
    }

    let client = build_client(config)?;
    let principal = config.principal()?;

    let data = load_page(client.as_ref(), principal, config.sync.allow_sync_all).await?;
    if data.hosts.is_empty() {
        println!("No code hosts configured for {principal}; nothing to sync.");
        return Ok(());
    }
    for problem in &data.problems.hosts {
        eprintln!("⚠ {problem}");
    }

    let selection = apply_selection_args(&data.selection, &args);
    let public = apply_public_args(&data.public, &args)?;

    if !has_changes(&data.selection, &selection, &public) {
        println!("Selection already matches; nothing to submit.");
        return Ok(());
    }

    if args.dry_run {
        print_plan(&selection, &public);
        return Ok(());
    }

    // Snapshot before the write so convergence is measured against the
    // pre-submit sync timestamps.
    let snapshot = ConvergenceSnapshot::capture(&data.hosts);

    let outcome = match submit(client.clone(), principal, &selection, &public).await {
        Ok(outcome) => outcome,
        Err(SubmitError::PublicList(e)) => {
            return Err(format!(
                "Saving the public repository list failed: {}. No host configuration was changed.",
                short_error_message(&e)
            )
            .into());
        }
        Err(SubmitError::Hosts(failures)) => {
            for failure in &failures {
                eprintln!(
                    "✗ {}: {}",
                    failure.host_id,
                    short_error_message(&failure.error)
                );
            }
            return Err(format!("{} code host update(s) failed", failures.len()).into());
        }
    };
    tracing::info!(
        hosts = outcome.hosts_written.len(),
        public_repos = outcome.public_repos_written,
        "selection submitted"
    );

    if args.no_wait {
        println!("Selection submitted; the backend is applying it.");
        return Ok(());
    }

    wait_for_convergence(client, principal, snapshot).await
}

/// Fold the selection flags into a new selection value.
fn apply_selection_args(selection: &SelectionState, args: &SyncArgs) -> SelectionState {
    let mut next = selection.clone();
    for name in &args.repo {
        next = next.toggle(name);
    }
    if args.all {
        next = next.set_mode(SyncMode::All);
    } else if args.none {
        next = next.set_mode(SyncMode::None);
    } else if !args.repo.is_empty() {
        next = next.set_mode(SyncMode::Selected);
    }
    next
}

/// Whether the folded flags produce anything the backend does not already
/// have.
///
/// A mode change alone must count: `--all` and `--none` leave the name set
/// untouched, so the baseline comparison cannot see them.
fn has_changes(
    before: &SelectionState,
    after: &SelectionState,
    public: &PublicRepoState,
) -> bool {
    after.mode() != before.mode() || after.has_unsaved_changes(public.effective())
}

/// Fold the public-list flags into a new public-repo state.
fn apply_public_args(
    current: &PublicRepoState,
    args: &SyncArgs,
) -> Result<PublicRepoState, Box<dyn std::error::Error>> {
    let state = match &args.public_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
            PublicRepoState::from_text(&text, !args.no_public)
        }
        None if args.no_public => PublicRepoState::new(current.repos().to_vec(), false),
        None => current.clone(),
    };
    Ok(state)
}

fn print_plan(selection: &SelectionState, public: &PublicRepoState) {
    println!("Would submit mode {}:", selection.mode().as_str());
    for name in selection.selected_names() {
        println!("  {name}");
    }
    if public.effective().is_empty() {
        println!("Public repository list: empty");
    } else {
        println!("Public repository list:");
        for repo in public.effective() {
            println!("  {repo}");
        }
    }
}

/// Drive the poller to completion, honoring Ctrl+C.
async fn wait_for_convergence(
    client: std::sync::Arc<mirrorselect::backend::RestBackend>,
    principal: &str,
    snapshot: ConvergenceSnapshot,
) -> Result<(), Box<dyn std::error::Error>> {
    let reporter = ProgressReporter::new();
    let (poller, mut rx) = Poller::spawn(client, principal, snapshot);
    let mut shutdown_check = tokio::time::interval(SHUTDOWN_CHECK_INTERVAL);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    reporter.handle(&event);
                    match event {
                        PollEvent::Converged { .. } => {
                            poller.join().await;
                            return Ok(());
                        }
                        PollEvent::Failed { message } => {
                            poller.join().await;
                            return Err(message.into());
                        }
                        PollEvent::Status(_) => {}
                    }
                }
                None => {
                    poller.join().await;
                    return Ok(());
                }
            },
            _ = shutdown_check.tick() => {
                if is_shutdown_requested() {
                    poller.cancel();
                    poller.join().await;
                    reporter.finish();
                    println!("Stopped waiting; the backend keeps applying the selection.");
                    return Ok(());
                }
            }
        }
    }
}
