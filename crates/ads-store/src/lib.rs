//! Collaborator contracts consumed by the analyst data sync core.
//!
//! The sync engine never owns storage. It talks to three narrow contracts:
//!
//! - [`RecordStore`] -- find-by-uuid and create-or-update of records,
//!   reporting field-level validation errors on failure
//! - [`Directory`] -- organizations and sharing groups
//! - [`Blocklist`] -- record and organization deny-lists
//!
//! Each contract ships with an in-memory backend for tests and embedding:
//! [`InMemoryRecordStore`], [`InMemoryDirectory`], [`InMemoryBlocklist`].
//!
//! # Design Rules
//!
//! 1. `upsert` is the only write; it either fully succeeds or changes nothing.
//! 2. Field validation happens inside the store and reports every failing field.
//! 3. Row ids are local; `uuid` is the identity that crosses instances.
//! 4. Nothing here is ever hard-deleted by the sync core.

pub mod blocklist;
pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;
pub mod validation;

pub use blocklist::{Blocklist, InMemoryBlocklist};
pub use directory::{Directory, InMemoryDirectory};
pub use error::{FieldError, StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
pub use validation::validate_record;
