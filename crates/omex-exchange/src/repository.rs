//! Metadata repository collaborator.
//!
//! The open-metadata repository owns the elements themselves: it generates
//! their GUIDs, enforces type-specific schemas, and stores relationships and
//! classifications. This layer only calls through the trait below; any
//! failure on the other side surfaces as a `PropertyServer` error.

use async_trait::async_trait;
use serde_json::Value;

use omex_core::{ElementId, OmexResult};

use crate::envelope::{Page, PageRequest};
use crate::visibility::ElementStub;

/// Operations the exchange layer needs from the metadata repository.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Whether an element with this GUID exists (in any state).
    async fn element_exists(&self, element_id: ElementId) -> OmexResult<bool>;

    /// Fetch one element's header and properties.
    async fn fetch_element(&self, element_id: ElementId) -> OmexResult<Option<ElementStub>>;

    /// Create a new element of the given open-metadata type.
    ///
    /// Returns the GUID the repository generated for it.
    async fn create_element(&self, type_name: &str, properties: &Value) -> OmexResult<ElementId>;

    /// Create a new element by copying a template element, overlaying the
    /// given properties.
    async fn create_element_from_template(
        &self,
        template_id: ElementId,
        properties: &Value,
    ) -> OmexResult<ElementId>;

    /// Store the full replacement properties for an element.
    ///
    /// Merge semantics are applied before this call; the repository always
    /// receives the complete resulting property set.
    async fn update_element(&self, element_id: ElementId, properties: &Value) -> OmexResult<()>;

    /// Delete an element and everything anchored to it.
    async fn delete_element(&self, element_id: ElementId) -> OmexResult<()>;

    /// Search elements of one type by a repository-defined search string.
    async fn search_elements(
        &self,
        type_name: &str,
        search_string: &str,
        page: &PageRequest,
    ) -> OmexResult<Page<ElementStub>>;
}
