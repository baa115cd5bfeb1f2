//! Offline batch sync.
//!
//! Clients queue mutations while offline and replay them as a single
//! batch. The reconciler applies the batch in one transaction, orders
//! actions by their client timestamps, and reports a per-action verdict
//! so the client knows what stuck, what conflicted, and what failed.

mod reconciler;
mod types;

pub use reconciler::Reconciler;
pub use types::{ConflictInfo, SyncAction, SyncOp, SyncRequest, SyncResponse, SyncResult};
