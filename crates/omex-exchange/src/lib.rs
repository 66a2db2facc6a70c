//! # omex Exchange Core
//!
//! Correlation and synchronization core for the open-metadata exchange
//! service. External asset managers mirror their assets into the local
//! metadata repository; this crate owns the bookkeeping between the two
//! identifier spaces and the rules that govern writes and query visibility.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐      ┌─────────────────────┐      ┌────────────────────┐
//! │ Transport      │─────►│ CorrelationManager  │─────►│ MetadataRepository │
//! │ (out of scope) │      │                     │      │ (collaborator)     │
//! └────────────────┘      └──────────┬──────────┘      └────────────────────┘
//!                                    │
//!                         ┌──────────┴──────────┐      ┌────────────────────┐
//!                         │  CorrelationStore   │      │ GovernanceEngine   │
//!                         │  (Postgres)         │      │ (collaborator)     │
//!                         └─────────────────────┘      └────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Correlation records**: `(asset manager, external identifier)` →
//!   element GUID, race-safe creation through `ON CONFLICT` upserts
//! - **Home ownership**: an externally-homed element is writable only by
//!   the asset manager that owns it
//! - **Visibility rules**: effective-time windows, Memento placeholders,
//!   duplicate collapsing
//! - **Merge/replace updates**: payload application with field retention
//! - **Governance relay**: process identifiers in, status out
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use omex_exchange::{CorrelationManager, HomeSystem, PgCorrelationStore};
//! use omex_exchange::options::AssetManagerIdentity;
//! use omex_core::AssetManagerId;
//!
//! let store = Arc::new(PgCorrelationStore::new(pool));
//! let manager = CorrelationManager::new(store, repository);
//!
//! let identity = AssetManagerIdentity::new(AssetManagerId::new(), "catalog-a")?;
//! let element = manager
//!     .resolve_or_create(&identity, &ext_id, Some(candidate), HomeSystem::AssetManager)
//!     .await?;
//! ```

pub mod correlation;
pub mod envelope;
pub mod governance;
pub mod manager;
pub mod migrations;
pub mod options;
pub mod repository;
pub mod update;
pub mod visibility;

// Re-exports for convenience
pub use correlation::{
    CorrelationStore, ExternalIdentifierRecord, HomeSystem, PgCorrelationStore,
};
pub use envelope::{ExchangeRequest, Page, PageRequest};
pub use governance::{GovernanceEngine, ProcessStatus};
pub use manager::CorrelationManager;
pub use migrations::run_migrations;
pub use options::{AssetManagerIdentity, ExchangeOptions, UpdateMode};
pub use repository::MetadataRepository;
pub use update::{apply_update, authorize_write, Writer};
pub use visibility::{visibility_filter, EffectiveWindow, ElementStub, VisibleElement};
