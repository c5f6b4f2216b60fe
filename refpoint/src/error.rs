//! Error types for ref and hardpoint resolution

use thiserror::Error;

/// Result type for refpoint operations
pub type Result<T> = std::result::Result<T, RefError>;

/// Errors reported by a remote source.
///
/// Cloneable so a single failed call can be recorded on every hardpoint
/// slot the call was servicing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Source is not reachable
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Call was issued but failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Requested object does not exist on the source
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors surfaced by refs, hardpoint slots and the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    /// Hardpoint name was never declared on this ref type
    #[error("Ref type \"{ref_type}\" has no hardpoint \"{name}\"")]
    MissingHardpoint { ref_type: String, name: String },

    /// Slot transition that violates write-once semantics
    #[error("Illegal transition on hardpoint \"{name}\": {reason}")]
    IllegalTransition { name: String, reason: String },

    /// The remote call servicing this hardpoint failed
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(#[from] SourceError),

    /// No loader is registered for a declared hardpoint
    #[error("No loader registered for hardpoint \"{0}\"")]
    NoLoader(String),

    /// Caller-side deadline expired before the slot settled
    #[error("Timed out after {timeout_ms}ms waiting for hardpoint \"{name}\"")]
    Timeout { name: String, timeout_ms: u64 },
}

impl RefError {
    pub(crate) fn illegal(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RefError::IllegalTransition {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error can be recovered from by building fresh refs.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RefError::RemoteFetch(_) | RefError::Timeout { .. })
    }
}
