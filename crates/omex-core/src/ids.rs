//! Strongly Typed Identifiers
//!
//! Newtype wrappers around the raw identifier types used across the exchange
//! service. Keeping asset-manager identities and metadata element GUIDs as
//! distinct types prevents the two identifier spaces from being mixed up at
//! compile time.
//!
//! # Example
//!
//! ```
//! use omex_core::{AssetManagerId, ElementId};
//!
//! let asset_manager = AssetManagerId::new();
//! let element = ElementId::new();
//!
//! fn requires_element(id: ElementId) -> String {
//!     id.to_string()
//! }
//!
//! let _ = requires_element(element);
//! // requires_element(asset_manager); // does not compile
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for identifier parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of identifier that failed to parse.
    pub id_type: &'static str,
    /// The underlying parse error message.
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed GUID wrapper.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identity of an external asset manager.
    ///
    /// Each third-party catalog or lineage tool that mirrors assets into the
    /// open-metadata repository is registered once and addressed by this GUID
    /// in every exchange call.
    AssetManagerId
);

define_id!(
    /// GUID of a metadata element in the local repository.
    ///
    /// Generated by the repository collaborator on creation; correlation
    /// records bind external identifiers to these.
    ElementId
);

/// An identifier as known to an external asset manager.
///
/// External identifiers are opaque strings scoped to the system that issued
/// them; two asset managers may use the same string for unrelated assets.
/// The only local rule is that the key is non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalIdentifier(String);

impl ExternalIdentifier {
    /// Create an external identifier, rejecting blank keys.
    pub fn new(value: impl Into<String>) -> Result<Self, ParseIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ParseIdError {
                id_type: "ExternalIdentifier",
                message: "identifier must not be blank".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExternalIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalIdentifier {
    type Err = ParseIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}
