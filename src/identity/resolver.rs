//! Reference resolver seam and in-memory identity store

use std::collections::HashMap;
use std::sync::RwLock;

use super::errors::{ResolveError, ResolveResult};
use super::reference::{Identity, IdentityRef};

/// Resolves tagged references to identities.
///
/// The same implementation serves creator and author references; callers
/// never dispatch on reference kind.
pub trait ReferenceResolver: Send + Sync {
    /// Resolve a reference, failing with `Unresolved` if nothing matches.
    fn resolve(&self, reference: &IdentityRef) -> ResolveResult<Identity>;
}

/// In-memory identity store keyed by `(type_tag, id)`
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<IdentityRef, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an identity.
    pub fn register(&self, identity: Identity) -> ResolveResult<()> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| ResolveError::Backend("Lock poisoned".to_string()))?;
        identities.insert(identity.reference(), identity);
        Ok(())
    }

    /// Remove an identity, leaving any references to it dangling.
    pub fn remove(&self, reference: &IdentityRef) -> ResolveResult<Option<Identity>> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| ResolveError::Backend("Lock poisoned".to_string()))?;
        Ok(identities.remove(reference))
    }
}

impl ReferenceResolver for InMemoryIdentityStore {
    fn resolve(&self, reference: &IdentityRef) -> ResolveResult<Identity> {
        let identities = self
            .identities
            .read()
            .map_err(|_| ResolveError::Backend("Lock poisoned".to_string()))?;
        identities
            .get(reference)
            .cloned()
            .ok_or_else(|| ResolveError::Unresolved {
                type_tag: reference.type_tag.clone(),
                id: reference.id.clone(),
            })
    }
}
