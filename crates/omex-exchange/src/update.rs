//! Write authorization and payload application.
//!
//! An element with an external home record belongs to that asset manager:
//! nobody else, including the local repository, may update or delete it.
//! Once a write is authorized, the incoming payload is applied to the
//! element's existing properties in merge or replace mode.

use serde_json::Value;

use omex_core::{AssetManagerId, OmexError, OmexResult};

use crate::correlation::{ExternalIdentifierRecord, HomeSystem};
use crate::options::UpdateMode;

/// The system attempting a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    /// A registered external asset manager.
    AssetManager(AssetManagerId),

    /// The local open-metadata repository itself.
    LocalRepository,
}

/// Enforce the single-writer-per-element-origin rule.
///
/// `records` are the correlation records currently bound to the element.
/// The write is rejected when any record claims `HomeSystem::AssetManager`
/// for a system other than the writer.
pub fn authorize_write(records: &[ExternalIdentifierRecord], writer: Writer) -> OmexResult<()> {
    for record in records {
        if record.home != HomeSystem::AssetManager {
            continue;
        }
        let allowed = matches!(writer, Writer::AssetManager(id) if id == record.asset_manager_id);
        if !allowed {
            return Err(OmexError::not_authorized(format!(
                "element {} is homed in asset manager {}",
                record.internal_id, record.asset_manager_name
            )));
        }
    }
    Ok(())
}

/// Apply an update payload to an element's existing properties.
///
/// `Merge` overlays the incoming fields onto the existing ones, recursing
/// into nested objects; fields absent from the payload retain their prior
/// values. `Replace` discards the existing properties entirely.
#[must_use]
pub fn apply_update(existing: &Value, incoming: &Value, mode: UpdateMode) -> Value {
    match mode {
        UpdateMode::Replace => incoming.clone(),
        UpdateMode::Merge => merge_values(existing, incoming),
    }
}

fn merge_values(existing: &Value, incoming: &Value) -> Value {
    match (existing, incoming) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                match merged.get(key) {
                    Some(prior) => {
                        let replacement = merge_values(prior, value);
                        merged.insert(key.clone(), replacement);
                    }
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        // Anything other than object-on-object is a straight overwrite.
        _ => incoming.clone(),
    }
}
