//! Field classification
//!
//! Decides which fields of an entity are captured in a snapshot:
//! every field except those in the exclusion set. Pure, no side effects.
//! An empty result is valid and means there is nothing to version.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::FieldMap;

/// Field names never captured in snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSpec(BTreeSet<String>);

impl ExclusionSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stateless field classifier.
pub struct FieldClassifier;

impl FieldClassifier {
    /// `all_fields - exclusions`.
    pub fn classify<'a, I>(all_fields: I, exclusions: &ExclusionSpec) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        all_fields
            .into_iter()
            .filter(|name| !exclusions.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Restricts a field map to its classified fields.
    pub fn project(fields: &FieldMap, exclusions: &ExclusionSpec) -> FieldMap {
        fields
            .iter()
            .filter(|(name, _)| !exclusions.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
