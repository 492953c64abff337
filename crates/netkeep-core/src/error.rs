// ── Core error types ──
//
// User-facing errors from netkeep-core. Consumers never see raw storage
// failures directly -- the `From<StoreError>` impl translates data-layer
// errors into domain-appropriate variants.

use thiserror::Error;

use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Address errors ───────────────────────────────────────────────
    #[error("Invalid IPv4 address: {address}")]
    InvalidAddress { address: String },

    // ── Snapshot errors ──────────────────────────────────────────────
    #[error("Invalid backup file format: {reason}")]
    InvalidSnapshot { reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Storage errors (wrapped, not exposed raw) ────────────────────
    #[error("Storage failure: {message}")]
    Storage { message: String },

    #[error("Storage operation timed out: {message}")]
    StorageTimeout { message: String },
}

impl CoreError {
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    pub fn invalid_snapshot(reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            identifier: identifier.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

// ── Conversion from data-layer errors ────────────────────────────────

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { entity, id } => CoreError::NotFound {
                entity,
                identifier: id,
            },
            StoreError::Duplicate { entity, key } => CoreError::Conflict {
                message: format!("duplicate {entity}: {key}"),
            },
            StoreError::ForeignKey {
                entity,
                reference,
                id,
            } => CoreError::Storage {
                message: format!("foreign key violation on {entity}: {reference} {id}"),
            },
            StoreError::Integrity { message } => CoreError::Storage { message },
            StoreError::Timeout { operation } => CoreError::StorageTimeout {
                message: format!("{operation} exceeded the statement timeout"),
            },
        }
    }
}
