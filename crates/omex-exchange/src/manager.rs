//! Correlation Manager
//!
//! The service that ties the exchange semantics together: it resolves
//! external identifiers to elements, enforces the home-ownership rule on
//! writes, applies merge/replace payloads, filters query results, and
//! relays governance-action identifiers. Collaborators are injected at
//! construction; no global state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use omex_core::{ElementId, ExternalIdentifier, OmexError, OmexResult};

use crate::correlation::{CorrelationStore, ExternalIdentifierRecord, HomeSystem};
use crate::envelope::{Page, PageRequest};
use crate::governance::{GovernanceEngine, ProcessStatus};
use crate::options::{AssetManagerIdentity, ExchangeOptions, UpdateMode};
use crate::repository::MetadataRepository;
use crate::update::{apply_update, authorize_write, Writer};
use crate::visibility::{visibility_filter, ElementStub};

/// The correlation and synchronization core of the exchange service.
pub struct CorrelationManager {
    store: Arc<dyn CorrelationStore>,
    repository: Arc<dyn MetadataRepository>,
    governance: Option<Arc<dyn GovernanceEngine>>,
}

impl CorrelationManager {
    /// Create a manager over a correlation store and a metadata repository.
    #[must_use]
    pub fn new(store: Arc<dyn CorrelationStore>, repository: Arc<dyn MetadataRepository>) -> Self {
        Self {
            store,
            repository,
            governance: None,
        }
    }

    /// Attach a governance engine for the process-relay operations.
    #[must_use]
    pub fn with_governance_engine(mut self, engine: Arc<dyn GovernanceEngine>) -> Self {
        self.governance = Some(engine);
        self
    }

    fn governance(&self) -> OmexResult<&Arc<dyn GovernanceEngine>> {
        self.governance
            .as_ref()
            .ok_or_else(|| OmexError::property_server("no governance engine configured"))
    }

    /// Resolve an external identifier to its element, creating the
    /// correlation when it does not exist yet.
    ///
    /// When a record already exists its element is returned and the
    /// synchronization timestamp refreshed; a differing `candidate` is a
    /// `Conflict`. When no record exists, `candidate` names the element to
    /// bind (it must already exist in the repository).
    #[instrument(skip(self, identity), fields(asset_manager = %identity.name))]
    pub async fn resolve_or_create(
        &self,
        identity: &AssetManagerIdentity,
        external_identifier: &ExternalIdentifier,
        candidate: Option<ElementId>,
        home: HomeSystem,
    ) -> OmexResult<ElementId> {
        if let Some(existing) = self.store.find(identity.id, external_identifier).await? {
            if let Some(candidate) = candidate {
                if candidate != existing.internal_id {
                    return Err(OmexError::conflict(format!(
                        "external identifier {external_identifier} is already bound to element {}",
                        existing.internal_id
                    )));
                }
            }
            self.store
                .touch_synchronized(identity.id, external_identifier, Utc::now())
                .await?;
            debug!(
                element_id = %existing.internal_id,
                external_identifier = %external_identifier,
                "Correlation resolved"
            );
            return Ok(existing.internal_id);
        }

        let candidate = candidate.ok_or_else(|| {
            OmexError::invalid_parameter(
                "elementGUID",
                "required when no correlation record exists",
            )
        })?;

        if !self.repository.element_exists(candidate).await? {
            return Err(OmexError::not_found("Element", candidate.to_string()));
        }

        let record = ExternalIdentifierRecord::new(
            identity.id,
            &identity.name,
            external_identifier.clone(),
            candidate,
            home,
        );
        let winner = self.store.insert_if_absent(&record).await?;

        if winner.internal_id != candidate {
            // A concurrent call bound the key to a different element first.
            return Err(OmexError::conflict(format!(
                "external identifier {external_identifier} is already bound to element {}",
                winner.internal_id
            )));
        }

        info!(
            element_id = %candidate,
            external_identifier = %external_identifier,
            home = %home,
            "Correlation created"
        );
        Ok(candidate)
    }

    /// Create a new element on behalf of an external asset manager and bind
    /// its external identifier in one step.
    ///
    /// Idempotent per `(asset manager, external identifier)`: a repeated
    /// call returns the element of the existing correlation and creates
    /// nothing.
    #[instrument(skip(self, identity, properties), fields(asset_manager = %identity.name))]
    pub async fn create_element_from_external(
        &self,
        identity: &AssetManagerIdentity,
        external_identifier: &ExternalIdentifier,
        type_name: &str,
        properties: &Value,
        home: HomeSystem,
    ) -> OmexResult<ElementId> {
        if type_name.trim().is_empty() {
            return Err(OmexError::invalid_parameter(
                "typeName",
                "must not be blank",
            ));
        }
        if let Some(existing) = self.store.find(identity.id, external_identifier).await? {
            self.store
                .touch_synchronized(identity.id, external_identifier, Utc::now())
                .await?;
            return Ok(existing.internal_id);
        }

        let element = self.repository.create_element(type_name, properties).await?;
        self.bind_new_element(identity, external_identifier, element, home)
            .await
    }

    /// Create a new element from a template on behalf of an external asset
    /// manager and bind its external identifier. Same idempotency rule as
    /// [`Self::create_element_from_external`].
    #[instrument(skip(self, identity, properties), fields(asset_manager = %identity.name))]
    pub async fn create_element_from_template(
        &self,
        identity: &AssetManagerIdentity,
        external_identifier: &ExternalIdentifier,
        template_id: ElementId,
        properties: &Value,
        home: HomeSystem,
    ) -> OmexResult<ElementId> {
        if let Some(existing) = self.store.find(identity.id, external_identifier).await? {
            self.store
                .touch_synchronized(identity.id, external_identifier, Utc::now())
                .await?;
            return Ok(existing.internal_id);
        }
        if !self.repository.element_exists(template_id).await? {
            return Err(OmexError::not_found("Template", template_id.to_string()));
        }

        let element = self
            .repository
            .create_element_from_template(template_id, properties)
            .await?;
        self.bind_new_element(identity, external_identifier, element, home)
            .await
    }

    /// Bind a freshly created element, resolving a lost creation race by
    /// discarding the extra element and returning the winner's.
    async fn bind_new_element(
        &self,
        identity: &AssetManagerIdentity,
        external_identifier: &ExternalIdentifier,
        element: ElementId,
        home: HomeSystem,
    ) -> OmexResult<ElementId> {
        let record = ExternalIdentifierRecord::new(
            identity.id,
            &identity.name,
            external_identifier.clone(),
            element,
            home,
        );
        let winner = self.store.insert_if_absent(&record).await?;

        if winner.internal_id != element {
            warn!(
                external_identifier = %external_identifier,
                kept = %winner.internal_id,
                discarded = %element,
                "Concurrent create raced; discarding duplicate element"
            );
            self.repository.delete_element(element).await?;
            return Ok(winner.internal_id);
        }

        info!(
            element_id = %element,
            external_identifier = %external_identifier,
            home = %home,
            "Element created and correlated"
        );
        Ok(element)
    }

    /// Apply an update payload to an element, enforcing the home-ownership
    /// rule first.
    #[instrument(skip(self, payload))]
    pub async fn update_element(
        &self,
        writer: Writer,
        element_id: ElementId,
        payload: &Value,
        mode: UpdateMode,
    ) -> OmexResult<()> {
        let records = self.store.find_by_element(element_id).await?;
        authorize_write(&records, writer)?;

        let existing = self
            .repository
            .fetch_element(element_id)
            .await?
            .ok_or_else(|| OmexError::not_found("Element", element_id.to_string()))?;

        let merged = apply_update(&existing.properties, payload, mode);
        self.repository.update_element(element_id, &merged).await?;

        if let Writer::AssetManager(writer_id) = writer {
            for record in records
                .iter()
                .filter(|r| r.asset_manager_id == writer_id)
            {
                self.store
                    .touch_synchronized(writer_id, &record.external_identifier, Utc::now())
                    .await?;
            }
        }

        debug!(element_id = %element_id, mode = %mode, "Element updated");
        Ok(())
    }

    /// Delete an element, enforcing the home-ownership rule, and drop every
    /// correlation bound to it.
    #[instrument(skip(self))]
    pub async fn delete_element(&self, writer: Writer, element_id: ElementId) -> OmexResult<()> {
        let records = self.store.find_by_element(element_id).await?;
        authorize_write(&records, writer)?;

        self.repository.delete_element(element_id).await?;
        let removed = self.store.remove_by_element(element_id).await?;

        info!(
            element_id = %element_id,
            correlations_removed = removed,
            "Element deleted"
        );
        Ok(())
    }

    /// Remove one correlation record, leaving the element alone unless the
    /// record was the element's home and no other correlation remains, in
    /// which case deletion cascades to the repository.
    #[instrument(skip(self, identity), fields(asset_manager = %identity.name))]
    pub async fn unlink(
        &self,
        identity: &AssetManagerIdentity,
        external_identifier: &ExternalIdentifier,
    ) -> OmexResult<()> {
        let removed = self
            .store
            .remove(identity.id, external_identifier)
            .await?
            .ok_or_else(|| {
                OmexError::not_found("CorrelationRecord", external_identifier.to_string())
            })?;

        if removed.is_home() {
            let remaining = self.store.find_by_element(removed.internal_id).await?;
            if remaining.is_empty() {
                self.repository.delete_element(removed.internal_id).await?;
                info!(
                    element_id = %removed.internal_id,
                    external_identifier = %external_identifier,
                    "Unlinked sole home correlation; element deletion cascaded"
                );
                return Ok(());
            }
        }

        debug!(
            element_id = %removed.internal_id,
            external_identifier = %external_identifier,
            "Correlation unlinked"
        );
        Ok(())
    }

    /// Record that an exchange successfully synchronized this identifier.
    #[instrument(skip(self, identity), fields(asset_manager = %identity.name))]
    pub async fn record_synchronization(
        &self,
        identity: &AssetManagerIdentity,
        external_identifier: &ExternalIdentifier,
    ) -> OmexResult<()> {
        let touched = self
            .store
            .touch_synchronized(identity.id, external_identifier, Utc::now())
            .await?;
        if !touched {
            return Err(OmexError::not_found(
                "CorrelationRecord",
                external_identifier.to_string(),
            ));
        }
        Ok(())
    }

    /// Every external identity an element is known by, oldest first.
    pub async fn correlations_for_element(
        &self,
        element_id: ElementId,
    ) -> OmexResult<Vec<ExternalIdentifierRecord>> {
        self.store.find_by_element(element_id).await
    }

    /// Page through every correlation owned by one asset manager.
    pub async fn correlations_for_asset_manager(
        &self,
        identity: &AssetManagerIdentity,
        page: &PageRequest,
    ) -> OmexResult<Page<ExternalIdentifierRecord>> {
        self.store.find_by_asset_manager(identity.id, page).await
    }

    /// Fetch one element, applying the visibility rules. Returns `None`
    /// both when the element does not exist and when the options hide it.
    #[instrument(skip(self))]
    pub async fn fetch_element(
        &self,
        element_id: ElementId,
        options: &ExchangeOptions,
    ) -> OmexResult<Option<ElementStub>> {
        let Some(element) = self.repository.fetch_element(element_id).await? else {
            return Ok(None);
        };
        Ok(visibility_filter(vec![element], options).into_iter().next())
    }

    /// Search elements by type and search string, applying the visibility
    /// rules to the returned page.
    #[instrument(skip(self))]
    pub async fn search_elements(
        &self,
        type_name: &str,
        search_string: &str,
        options: &ExchangeOptions,
        page: &PageRequest,
    ) -> OmexResult<Page<ElementStub>> {
        page.validate()?;
        let result = self
            .repository
            .search_elements(type_name, search_string, page)
            .await?;

        let start_from = result.start_from;
        let more = result.more;
        let elements = visibility_filter(result.elements, options);
        Ok(Page {
            elements,
            start_from,
            more,
        })
    }

    /// Relay: start a governance-action process by qualified name.
    #[instrument(skip(self))]
    pub async fn initiate_governance_process(
        &self,
        process_qualified_name: &str,
        action_targets: &[ElementId],
        start_time: Option<DateTime<Utc>>,
    ) -> OmexResult<ElementId> {
        if process_qualified_name.trim().is_empty() {
            return Err(OmexError::invalid_parameter(
                "processQualifiedName",
                "must not be blank",
            ));
        }
        self.governance()?
            .initiate_process(process_qualified_name, action_targets, start_time)
            .await
    }

    /// Relay: status of a governance-action process instance.
    pub async fn governance_process_status(
        &self,
        process_instance: ElementId,
    ) -> OmexResult<ProcessStatus> {
        self.governance()?.process_status(process_instance).await
    }

    /// Relay: cancel a governance-action process instance.
    pub async fn cancel_governance_process(&self, process_instance: ElementId) -> OmexResult<()> {
        self.governance()?.cancel_process(process_instance).await
    }
}
