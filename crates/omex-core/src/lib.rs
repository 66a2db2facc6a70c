//! omex Core Library
//!
//! Shared types for the omex exchange service.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`AssetManagerId`, `ElementId`,
//!   `ExternalIdentifier`)
//! - [`error`] - Standardized error taxonomy (`OmexError`)
//!
//! # Example
//!
//! ```
//! use omex_core::{AssetManagerId, ElementId, OmexError, OmexResult};
//!
//! let asset_manager = AssetManagerId::new();
//! let element = ElementId::new();
//!
//! fn example() -> OmexResult<()> {
//!     Err(OmexError::not_authorized("element is homed elsewhere"))
//! }
//! ```

pub mod error;
pub mod ids;

// Re-export main types for convenient access
pub use error::{OmexError, OmexResult};
pub use ids::{AssetManagerId, ElementId, ExternalIdentifier, ParseIdError};
