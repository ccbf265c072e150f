//! Error taxonomy for the reconciliation engine.
//!
//! The split mirrors how failures are handled, not where they occur:
//! document problems reject the whole input before the device is touched,
//! validation problems reject one resource, read problems abort the pass,
//! and per-operation device failures are recorded in the pass summary
//! (see `engine::deploy::OperationRecord`) instead of being raised.

use thiserror::Error;

use crate::model::ResourceKind;

pub use bigsync_api::Error as ApiError;

// ── Document (schema) errors ────────────────────────────────────────

/// The service document is malformed. Nothing was sent to the device.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Not valid JSON, a missing required field, an unknown field, or a
    /// value outside its type's range. serde's message carries the detail.
    #[error("service document is not valid: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// Structurally valid JSON that violates a document rule.
    #[error("service document is not valid at {path}: {reason}")]
    Invalid { path: String, reason: String },
}

// ── Per-resource validation ─────────────────────────────────────────

/// One resource's properties are unacceptable. Other resources in the
/// same document are unaffected by the failure.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The device API refuses a probe interval at or above the timeout.
    #[error(
        "monitor {monitor}: interval {interval} must be below timeout {timeout}"
    )]
    MonitorTiming {
        monitor: String,
        interval: u32,
        timeout: u32,
    },
}

// ── Cross-kind comparison ───────────────────────────────────────────

/// Two resources of different kinds were compared. Always a bug in the
/// caller, never a property difference.
#[derive(Debug, Clone, Copy, Error)]
#[error("cannot compare a {left} with a {right}")]
pub struct TypeMismatch {
    pub left: ResourceKind,
    pub right: ResourceKind,
}

// ── Engine errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    /// Listing device state failed. A pass never mutates on a partial
    /// picture, so this aborts the pass.
    #[error("reading {kind} state in partition {partition} failed: {source}")]
    Read {
        kind: ResourceKind,
        partition: String,
        #[source]
        source: ApiError,
    },

    /// Device state was listed but could not be normalized into the model.
    #[error("normalizing {kind} state in partition {partition} failed: {reason}")]
    ReadNormalize {
        kind: ResourceKind,
        partition: String,
        reason: String,
    },

    /// Transport errors outside a partition-scoped read (login checks,
    /// one-off mutations surfaced through the proxy).
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CoreError {
    /// Whether this failure aborts a reconciliation pass outright.
    pub fn is_pass_fatal(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::ReadNormalize { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_errors_are_pass_fatal() {
        let err = CoreError::ReadNormalize {
            kind: ResourceKind::Pool,
            partition: "Common".into(),
            reason: "bad state".into(),
        };
        assert!(err.is_pass_fatal());

        let mismatch = CoreError::from(TypeMismatch {
            left: ResourceKind::Pool,
            right: ResourceKind::Node,
        });
        assert!(!mismatch.is_pass_fatal());
    }

    #[test]
    fn type_mismatch_names_both_kinds() {
        let err = TypeMismatch {
            left: ResourceKind::VirtualServer,
            right: ResourceKind::Pool,
        };
        assert_eq!(
            err.to_string(),
            "cannot compare a virtual-server with a pool"
        );
    }
}
