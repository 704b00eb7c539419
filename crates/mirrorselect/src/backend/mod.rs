//! Boundary to the platform backend.
//!
//! [`BackendClient`] is the trait every engine component is written against;
//! [`RestBackend`] is the production JSON/REST implementation. All reads are
//! idempotent; the two writes are never retried automatically — failures
//! surface to the caller, who re-initiates.

mod errors;
mod rest;
mod types;

pub use errors::{BackendError, Result, short_error_message};
pub use rest::RestBackend;
pub use types::{AffiliatedRepo, BackendClient, CodeHost, HostKind, MirrorInfo, SyncedRepo};
