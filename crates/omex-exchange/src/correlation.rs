//! Correlation Records
//!
//! Correlation records bind identifiers issued by external asset managers to
//! the GUIDs of the open-metadata elements that mirror them. They also say
//! which system is authoritative ("home") for the element and when the two
//! sides last exchanged state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::instrument;

use omex_core::{AssetManagerId, ElementId, ExternalIdentifier, OmexError, OmexResult};

use crate::envelope::{Page, PageRequest};

/// Which system is authoritative for a correlated element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeSystem {
    /// The external asset manager owns the element; only it may update or
    /// delete it.
    AssetManager,

    /// The local repository owns the element; the correlation is a mirror.
    LocalRepository,
}

impl HomeSystem {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeSystem::AssetManager => "asset_manager",
            HomeSystem::LocalRepository => "local_repository",
        }
    }
}

impl std::fmt::Display for HomeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HomeSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset_manager" => Ok(HomeSystem::AssetManager),
            "local_repository" => Ok(HomeSystem::LocalRepository),
            _ => Err(format!("Unknown home system: {s}")),
        }
    }
}

/// A correlation record binding one external identifier to one element.
///
/// `(asset_manager_id, external_identifier)` is unique across the store. An
/// element may carry any number of correlations, but at most one per asset
/// manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentifierRecord {
    /// GUID of the asset manager that issued the identifier.
    pub asset_manager_id: AssetManagerId,

    /// Qualified name of that asset manager.
    pub asset_manager_name: String,

    /// The identifier as the asset manager knows it.
    pub external_identifier: ExternalIdentifier,

    /// The open-metadata element this correlates to.
    pub internal_id: ElementId,

    /// Which system is authoritative for the element.
    pub home: HomeSystem,

    /// Last successful exchange touching this record.
    pub last_synchronized: DateTime<Utc>,

    /// When the correlation was first recorded.
    pub created_at: DateTime<Utc>,
}

impl ExternalIdentifierRecord {
    /// Create a record for a freshly correlated element.
    #[must_use]
    pub fn new(
        asset_manager_id: AssetManagerId,
        asset_manager_name: impl Into<String>,
        external_identifier: ExternalIdentifier,
        internal_id: ElementId,
        home: HomeSystem,
    ) -> Self {
        let now = Utc::now();
        Self {
            asset_manager_id,
            asset_manager_name: asset_manager_name.into(),
            external_identifier,
            internal_id,
            home,
            last_synchronized: now,
            created_at: now,
        }
    }

    /// Whether the issuing asset manager is home for the element.
    #[must_use]
    pub fn is_home(&self) -> bool {
        self.home == HomeSystem::AssetManager
    }

    /// Refresh the synchronization timestamp.
    pub fn touch(&mut self) {
        self.last_synchronized = Utc::now();
    }
}

/// Storage seam for correlation records.
///
/// Writes on a given `(asset_manager_id, external_identifier)` key are
/// serialized by the implementation; two concurrent creates for the same key
/// must converge on a single record.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Insert the record unless its key is already bound, returning the
    /// record that ended up in the store (the argument if inserted, the
    /// pre-existing one otherwise).
    async fn insert_if_absent(
        &self,
        record: &ExternalIdentifierRecord,
    ) -> OmexResult<ExternalIdentifierRecord>;

    /// Look up the record for one external identifier.
    async fn find(
        &self,
        asset_manager_id: AssetManagerId,
        external_identifier: &ExternalIdentifier,
    ) -> OmexResult<Option<ExternalIdentifierRecord>>;

    /// Every correlation bound to one element, oldest first.
    async fn find_by_element(
        &self,
        element_id: ElementId,
    ) -> OmexResult<Vec<ExternalIdentifierRecord>>;

    /// Page through every record owned by one asset manager.
    async fn find_by_asset_manager(
        &self,
        asset_manager_id: AssetManagerId,
        page: &PageRequest,
    ) -> OmexResult<Page<ExternalIdentifierRecord>>;

    /// Refresh `last_synchronized`; returns false when no record exists.
    async fn touch_synchronized(
        &self,
        asset_manager_id: AssetManagerId,
        external_identifier: &ExternalIdentifier,
        when: DateTime<Utc>,
    ) -> OmexResult<bool>;

    /// Remove one correlation record, returning it if it existed.
    async fn remove(
        &self,
        asset_manager_id: AssetManagerId,
        external_identifier: &ExternalIdentifier,
    ) -> OmexResult<Option<ExternalIdentifierRecord>>;

    /// Remove every correlation bound to an element (element deletion).
    /// Returns the number of records removed.
    async fn remove_by_element(&self, element_id: ElementId) -> OmexResult<u64>;
}

/// Postgres-backed correlation store.
///
/// Relies on the unique index over `(asset_manager_id, external_identifier)`
/// and `ON CONFLICT` inserts for the per-key serialization the exchange
/// semantics require.
pub struct PgCorrelationStore {
    pool: PgPool,
}

impl PgCorrelationStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> OmexResult<ExternalIdentifierRecord> {
        let external_identifier =
            ExternalIdentifier::new(row.get::<String, _>("external_identifier"))
                .map_err(OmexError::property_server)?;

        Ok(ExternalIdentifierRecord {
            asset_manager_id: AssetManagerId::from_uuid(row.get("asset_manager_id")),
            asset_manager_name: row.get("asset_manager_name"),
            external_identifier,
            internal_id: ElementId::from_uuid(row.get("internal_id")),
            home: row
                .get::<String, _>("home")
                .parse()
                .unwrap_or(HomeSystem::LocalRepository),
            last_synchronized: row.get("last_synchronized"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl CorrelationStore for PgCorrelationStore {
    #[instrument(skip(self, record))]
    async fn insert_if_absent(
        &self,
        record: &ExternalIdentifierRecord,
    ) -> OmexResult<ExternalIdentifierRecord> {
        sqlx::query(
            r"
            INSERT INTO omex_correlations (
                asset_manager_id, asset_manager_name, external_identifier,
                internal_id, home, last_synchronized, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (asset_manager_id, external_identifier) DO NOTHING
            ",
        )
        .bind(record.asset_manager_id.as_uuid())
        .bind(&record.asset_manager_name)
        .bind(record.external_identifier.as_str())
        .bind(record.internal_id.as_uuid())
        .bind(record.home.as_str())
        .bind(record.last_synchronized)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        // Re-read the winning row: ours on insert, the earlier binding when
        // another call got there first.
        self.find(record.asset_manager_id, &record.external_identifier)
            .await?
            .ok_or_else(|| {
                OmexError::property_server("correlation record vanished during insert")
            })
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        asset_manager_id: AssetManagerId,
        external_identifier: &ExternalIdentifier,
    ) -> OmexResult<Option<ExternalIdentifierRecord>> {
        let row = sqlx::query(
            r"
            SELECT asset_manager_id, asset_manager_name, external_identifier,
                   internal_id, home, last_synchronized, created_at
            FROM omex_correlations
            WHERE asset_manager_id = $1 AND external_identifier = $2
            ",
        )
        .bind(asset_manager_id.as_uuid())
        .bind(external_identifier.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_element(
        &self,
        element_id: ElementId,
    ) -> OmexResult<Vec<ExternalIdentifierRecord>> {
        let rows = sqlx::query(
            r"
            SELECT asset_manager_id, asset_manager_name, external_identifier,
                   internal_id, home, last_synchronized, created_at
            FROM omex_correlations
            WHERE internal_id = $1
            ORDER BY created_at
            ",
        )
        .bind(element_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    #[instrument(skip(self))]
    async fn find_by_asset_manager(
        &self,
        asset_manager_id: AssetManagerId,
        page: &PageRequest,
    ) -> OmexResult<Page<ExternalIdentifierRecord>> {
        page.validate()?;

        // One row past the page size signals whether more slices exist.
        let rows = sqlx::query(
            r"
            SELECT asset_manager_id, asset_manager_name, external_identifier,
                   internal_id, home, last_synchronized, created_at
            FROM omex_correlations
            WHERE asset_manager_id = $1
            ORDER BY created_at
            OFFSET $2
            LIMIT $3
            ",
        )
        .bind(asset_manager_id.as_uuid())
        .bind(i64::from(page.start_from))
        .bind(i64::from(page.page_size) + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        let records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<OmexResult<Vec<_>>>()?;
        Ok(Page::from_overfetch(records, page))
    }

    #[instrument(skip(self))]
    async fn touch_synchronized(
        &self,
        asset_manager_id: AssetManagerId,
        external_identifier: &ExternalIdentifier,
        when: DateTime<Utc>,
    ) -> OmexResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE omex_correlations
            SET last_synchronized = $3
            WHERE asset_manager_id = $1 AND external_identifier = $2
            ",
        )
        .bind(asset_manager_id.as_uuid())
        .bind(external_identifier.as_str())
        .bind(when)
        .execute(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn remove(
        &self,
        asset_manager_id: AssetManagerId,
        external_identifier: &ExternalIdentifier,
    ) -> OmexResult<Option<ExternalIdentifierRecord>> {
        let row = sqlx::query(
            r"
            DELETE FROM omex_correlations
            WHERE asset_manager_id = $1 AND external_identifier = $2
            RETURNING asset_manager_id, asset_manager_name, external_identifier,
                      internal_id, home, last_synchronized, created_at
            ",
        )
        .bind(asset_manager_id.as_uuid())
        .bind(external_identifier.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    #[instrument(skip(self))]
    async fn remove_by_element(&self, element_id: ElementId) -> OmexResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM omex_correlations
            WHERE internal_id = $1
            ",
        )
        .bind(element_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(OmexError::property_server)?;

        Ok(result.rows_affected())
    }
}
