//! # Wordsense Store
//!
//! Write-once storage for one build: the canonical sense table and the resolved relation
//! table.
//!
//! ```text
//! normalizer ──insert──> SenseTable { senses[id], word -> [id] }
//!                             │ (frozen, shared)
//! resolver workers ──read─────┘
//!        │
//!        └─ drafts ──> RelationWriter ──stage/flush──> RelationTable { relations[id] }
//! ```
//!
//! Both tables are append-only. `(word, definition)` uniqueness is re-checked on insert, and
//! every relation is checked against the sense table before it can be committed.

mod error;
mod relations;
mod senses;
mod snapshot;
mod store;

pub use error::{Result, StoreError};
pub use relations::{RelationDraft, RelationTable, RelationWriter};
pub use senses::SenseTable;
pub use snapshot::{StoreSnapshot, STORE_SNAPSHOT_SCHEMA_VERSION};
pub use store::SenseStore;
