//! Selection reconciliation: one coherent model from the host registry,
//! affiliated catalog, synced snapshot, and public repo list, plus the pure
//! mutation operations user intent maps onto.

mod reconciler;
mod types;

pub use reconciler::{host_problems, reconcile, suffix_matches};
pub use types::{CatalogRepo, HostProblem, LoadProblems, SelectionState, SyncMode};
