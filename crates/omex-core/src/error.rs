//! Error Types
//!
//! The error taxonomy shared by every layer of the exchange service. The
//! kinds mirror the failures a caller can meaningfully react to; none of
//! them is retried automatically by this service.
//!
//! # Example
//!
//! ```
//! use omex_core::{OmexError, OmexResult};
//!
//! fn find_record(key: &str) -> OmexResult<String> {
//!     if key.is_empty() {
//!         return Err(OmexError::invalid_parameter("key", "must not be blank"));
//!     }
//!     Ok(format!("record {key}"))
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

/// Standardized error type for the exchange service.
///
/// # Variants
///
/// - `InvalidParameter` - malformed or missing identifier/argument
/// - `NotAuthorized` - write rejected by the home-ownership rule
/// - `NotFound` - no correlation record or element for the given key
/// - `Conflict` - identifier already bound to a different element
/// - `PropertyServer` - collaborator failure, propagated unchanged
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OmexError {
    /// A supplied parameter was malformed or missing.
    #[error("Invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        /// The parameter that failed validation.
        parameter: String,
        /// Description of the validation failure.
        message: String,
    },

    /// A write was rejected because a different system is home for the
    /// element.
    #[error("Not authorized: {message}")]
    NotAuthorized {
        /// Why the write was rejected.
        message: String,
    },

    /// Requested resource was not found.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The type of resource that was not found (e.g. "Element",
        /// "CorrelationRecord").
        resource: String,
        /// Optional identifier of the resource.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// An external identifier is already bound to a different element.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting binding.
        message: String,
    },

    /// A collaborator (metadata repository, governance engine, backing
    /// store) failed. Not recoverable at this layer.
    #[error("Property server error: {message}")]
    PropertyServer {
        /// The collaborator's failure description.
        message: String,
    },
}

impl OmexError {
    /// Build an `InvalidParameter` error.
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Build a `NotAuthorized` error.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    /// Build a `NotFound` error for a resource kind and identifier.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Build a `Conflict` error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Build a `PropertyServer` error from any collaborator failure.
    pub fn property_server(source: impl std::fmt::Display) -> Self {
        Self::PropertyServer {
            message: source.to_string(),
        }
    }
}

/// Type alias for Results using `OmexError`.
pub type OmexResult<T> = std::result::Result<T, OmexError>;
