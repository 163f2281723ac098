//! dpf-store
//!
//! JSON-document work store. Stands in for the host's persistence layer:
//! implements every reconciler port over a single document that is loaded
//! into memory and written back with [`JsonWorkStore::save`].
//!
//! Port calls mutate the in-memory document only; nothing reaches disk until
//! `save`. Callers that want failed batches to keep their completed creates
//! (as a database would) must save after an error too.

mod document;
mod store;

pub use document::{StoredFormat, StoredWork, WorksDocument};
pub use store::JsonWorkStore;
