//! VersionSeq - per-entity version counter
//!
//! - Starts at 0 for the snapshot captured at creation
//! - Increments by exactly one per committed mutation
//! - Ordered per entity only; sequences of different entities are unrelated

use std::fmt;

use serde::{Deserialize, Serialize};

/// A per-entity, strictly increasing version number.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSeq(u64);

impl VersionSeq {
    /// Sequence of the snapshot captured at creation.
    pub const INITIAL: VersionSeq = VersionSeq(0);

    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The sequence immediately after this one.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// The sequence to assign given the prior one, if any.
    #[inline]
    pub fn after(prior: Option<VersionSeq>) -> Self {
        prior.map(|p| p.next()).unwrap_or(Self::INITIAL)
    }
}

impl fmt::Display for VersionSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
