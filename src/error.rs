//! Error taxonomy for fleet operations.
//!
//! Every library entry point returns `Result<_, FleetError>`. The variants
//! split along the retry boundary: `Contended` is the only transient error
//! a caller may usefully retry; validation and precondition failures mean
//! the request itself must change.

use crate::types::AssetId;

/// Error type for all store and engine operations.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// The targeted record does not exist. No write was performed.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// The request payload is malformed (empty name, non-positive hours, ...).
    /// Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Checkout refused: the asset is already assigned to an operator.
    #[error("asset {id} is already checked out to {to}")]
    AlreadyAssigned { id: AssetId, to: String },

    /// Return refused: the asset is not currently assigned.
    #[error("asset {id} is not checked out")]
    NotAssigned { id: AssetId },

    /// Optimistic concurrency retries were exhausted. Transient: the caller
    /// may re-issue the operation.
    #[error("asset {id} still contended after {attempts} attempts")]
    Contended { id: AssetId, attempts: u32 },

    /// The backing store is unreachable or failed mid-operation. Fatal for
    /// the in-flight request, not for the process.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored value could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl FleetError {
    /// Convenience constructor for asset lookups.
    pub fn asset_not_found(id: &AssetId) -> Self {
        FleetError::NotFound {
            what: "asset",
            id: id.to_string(),
        }
    }

    /// Convenience constructor for member lookups.
    pub fn member_not_found(id: &crate::types::MemberId) -> Self {
        FleetError::NotFound {
            what: "member",
            id: id.to_string(),
        }
    }

    /// True for errors a caller may retry without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FleetError::Contended { .. })
    }
}

impl From<sled::Error> for FleetError {
    fn from(err: sled::Error) -> Self {
        FleetError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Corrupt(err.to_string())
    }
}
