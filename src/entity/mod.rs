//! Tracked entities and the record store they live in
//!
//! The record store is an external collaborator: it owns entity CRUD and the
//! commit boundary. This module defines the entity model, the `RecordStore`
//! seam and an in-memory implementation used for tests and embedding.

mod model;
mod errors;
mod store;

pub use model::{Entity, EntityId, FieldMap};
pub use errors::{RecordError, RecordResult};
pub use store::{InMemoryRecordStore, RecordStore};
