//! Exchange call options.
//!
//! Every exchange operation carries the caller's external-system identity and
//! a set of recognized option flags. The flags travel as one structure
//! instead of loose booleans so call sites stay readable and each flag's
//! effect is documented in exactly one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use omex_core::{AssetManagerId, OmexError, OmexResult};

/// Identity of the external asset manager making an exchange call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManagerIdentity {
    /// GUID of the asset manager's registration.
    pub id: AssetManagerId,

    /// Qualified name of the asset manager, for audit messages.
    pub name: String,
}

impl AssetManagerIdentity {
    /// Create an identity, rejecting blank names.
    pub fn new(id: AssetManagerId, name: impl Into<String>) -> OmexResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(OmexError::invalid_parameter(
                "assetManagerName",
                "must not be blank",
            ));
        }
        Ok(Self { id, name })
    }
}

impl fmt::Display for AssetManagerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Options recognized by query and maintenance operations.
///
/// - `effective_time` restricts results to elements whose effective window
///   contains the given instant; `None` means "any time".
/// - `for_lineage` keeps Memento placeholders in results instead of
///   dropping them.
/// - `for_duplicate_processing` returns flagged duplicates unmerged instead
///   of collapsing them into their designated survivor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOptions {
    /// Point in time the query is asked at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<DateTime<Utc>>,

    /// Include historical/Memento placeholder elements.
    #[serde(default)]
    pub for_lineage: bool,

    /// Return duplicate elements unmerged.
    #[serde(default)]
    pub for_duplicate_processing: bool,
}

impl ExchangeOptions {
    /// Options with no effective-time restriction and both flags off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to elements effective at `when`.
    #[must_use]
    pub fn at(when: DateTime<Utc>) -> Self {
        Self {
            effective_time: Some(when),
            ..Self::default()
        }
    }

    /// Keep Memento placeholders in results.
    #[must_use]
    pub fn with_lineage(mut self) -> Self {
        self.for_lineage = true;
        self
    }

    /// Return duplicates unmerged.
    #[must_use]
    pub fn with_duplicate_processing(mut self) -> Self {
        self.for_duplicate_processing = true;
        self
    }
}

/// How an update payload is applied to an existing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Fields present in the payload overwrite existing ones; absent fields
    /// retain their prior values.
    Merge,

    /// The payload stands alone; fields it does not mention reset.
    Replace,
}

impl UpdateMode {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Merge => "merge",
            UpdateMode::Replace => "replace",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UpdateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(UpdateMode::Merge),
            "replace" => Ok(UpdateMode::Replace),
            _ => Err(format!("Unknown update mode: {s}")),
        }
    }
}
