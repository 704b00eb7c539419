//! Mirrorselect - selection reconciliation and sync convergence.
//!
//! This library merges the four catalogs a code-search backend exposes for a
//! principal (code hosts, affiliated repositories, synced snapshot, public
//! repo list) into one coherent selection model, translates edits back into
//! per-host configuration writes, and polls the backend until a submitted
//! sync converges.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use mirrorselect::backend::RestBackend;
//! use mirrorselect::convergence::{ConvergenceSnapshot, Poller};
//! use mirrorselect::http::ReqwestTransport;
//! use mirrorselect::workflow::load_page;
//!
//! let transport = Arc::new(ReqwestTransport::with_timeout(std::time::Duration::from_secs(30))?);
//! let client = Arc::new(RestBackend::new(transport, "https://search.example.com".parse()?));
//! let page = load_page(client.as_ref(), "alice", false).await?;
//!
//! let edited = page.selection.toggle("acme/widget");
//! let snapshot = ConvergenceSnapshot::capture(&page.hosts);
//! mirrorselect::submit::submit(client.clone(), "alice", &edited, &page.public).await?;
//! let (poller, events) = Poller::spawn(client, "alice".to_string(), snapshot);
//! ```

pub mod backend;
pub mod convergence;
pub mod http;
pub mod public_repos;
pub mod selection;
pub mod submit;
pub mod workflow;

pub use backend::{
    AffiliatedRepo, BackendClient, BackendError, CodeHost, HostKind, MirrorInfo, RestBackend,
    SyncedRepo, short_error_message,
};
pub use convergence::{ConvergenceSnapshot, PollEvent, Poller, SaveStatus};
pub use public_repos::PublicRepoState;
pub use selection::{
    CatalogRepo, HostProblem, LoadProblems, SelectionState, SyncMode, reconcile,
};
pub use submit::{HostWriteError, SubmitError, SubmitOutcome, submit};
pub use workflow::{NavigationGuard, PageData, PageEvent, PageState, SubmitFailure, load_page};
