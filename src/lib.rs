//! versionfu - per-entity record versioning
//!
//! Every committed mutation of a tracked entity appends one immutable
//! snapshot of its versioned fields, stamped with a gap-free sequence number
//! and the resolved author.

pub mod cli;
pub mod config;
pub mod entity;
pub mod identity;
pub mod journal;
pub mod observability;
pub mod versioning;
