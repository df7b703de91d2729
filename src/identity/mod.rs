//! Identity references and their resolution
//!
//! Entities point at identities (authors, creators) through tagged
//! references `{type_tag, id}`. A single `ReferenceResolver` serves every
//! reference kind; the kind only decides which entity fields are read.
//!
//! This module provides:
//! - `IdentityRef` / `Identity` - reference and resolved record
//! - `ReferenceSlot` - where a reference lives on an entity
//! - `ReferenceResolver` - polymorphic resolution seam
//! - `InMemoryIdentityStore` - bundled backing store

mod errors;
mod reference;
mod resolver;

pub use errors::{ResolveError, ResolveResult};
pub use reference::{Identity, IdentityRef, ReferenceKind, ReferenceSlot, TypeSource};
pub use resolver::{InMemoryIdentityStore, ReferenceResolver};
