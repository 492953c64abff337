// ── Relational data-access layer ──
//
// The reference backend is an in-memory store with the semantics the
// engine requires of any real database: foreign keys are enforced on
// every insert and delete, unique keys are checked, and multi-step
// mutations run inside a transaction that rolls back on error.
//
// Insert methods assign a fresh `EntityId`, overwriting whatever the
// caller passed in, and return the stored row -- callers never pick ids.

mod memory;
mod tables;

use thiserror::Error;

pub use memory::MemoryStore;
pub use tables::StoreState;

/// Data-layer failure. Translated into `CoreError` at the crate boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    Missing { entity: &'static str, id: String },

    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("foreign key violation on {entity}: {reference} {id}")]
    ForeignKey {
        entity: &'static str,
        reference: &'static str,
        id: String,
    },

    #[error("integrity violation: {message}")]
    Integrity { message: String },

    /// Statement/transaction timeout from a real backend. The in-memory
    /// reference store never emits this.
    #[error("timed out: {operation}")]
    Timeout { operation: &'static str },
}

impl StoreError {
    pub(crate) fn missing(entity: &'static str, id: impl ToString) -> Self {
        Self::Missing {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn foreign_key(
        entity: &'static str,
        reference: &'static str,
        id: impl ToString,
    ) -> Self {
        Self::ForeignKey {
            entity,
            reference,
            id: id.to_string(),
        }
    }
}
