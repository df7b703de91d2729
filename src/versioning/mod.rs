//! Record Versioning
//!
//! This module provides:
//! - `FieldClassifier` / `ExclusionSpec` - which fields are captured
//! - `VersionSnapshot` - immutable captured state
//! - `VersionSeq` - per-entity version counter
//! - `SnapshotEngine` - builds snapshots, resolving the author
//! - `VersionStore` - append-only snapshot log (`MemoryVersionStore`;
//!   the durable implementation lives in `journal`)
//! - `Versioner` - per-entity serialized create / mutate / revert / delete
//!
//! Data flow: mutation → classifier → engine (resolver) → store append.

mod chain;
mod classifier;
mod engine;
mod errors;
mod locks;
mod policy;
mod sequence;
mod snapshot;
mod store;
mod versioner;

pub use chain::SnapshotChain;
pub use classifier::{ExclusionSpec, FieldClassifier};
pub use engine::{Clock, SnapshotEngine, SystemClock};
pub use errors::{CaptureError, StoreError, StoreResult, VersioningError, VersioningResult};
pub use locks::EntityLocks;
pub use policy::VersioningPolicy;
pub use sequence::VersionSeq;
pub use snapshot::VersionSnapshot;
pub use store::{MemoryVersionStore, VersionStore};
pub use versioner::{Versioner, DEFAULT_MAX_CONFLICT_RETRIES};
