pub mod file_store;
pub mod normalize;
pub mod reader;
pub mod records;

pub use file_store::FileStore;
pub use normalize::{derive_entity_id, looks_like_id, match_ratio, name_token, names_match, normalize_name};
pub use reader::JsonReader;
pub use records::{
    Address, EdgeMetadata, EntityRecord, FinancialRecord, Identifier, RelationshipEdge, RiskFactor,
    RiskProfile, RiskScore, RiskSection, SearchMetadata, SupplyChainLink, Tier,
};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity itself is absent. Missing sub-sections never produce this.
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {}: {message}", path.display())]
    Format { path: PathBuf, message: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Read-only backing store of company records.
///
/// Every operation keyed by id signals `NotFound` only when the entity is
/// absent; a missing financial record, an empty relationship list or a
/// missing risk section come back as empty values.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Exact lookup on the normalized label.
    async fn find_entity_by_name(&self, name: &str) -> StoreResult<EntityRecord>;

    async fn find_entity_by_id(&self, id: &str) -> StoreResult<EntityRecord>;

    /// All entity records in scan order.
    async fn scan_entities(&self) -> StoreResult<Vec<EntityRecord>>;

    async fn fetch_financials(&self, id: &str) -> StoreResult<Option<FinancialRecord>>;

    async fn fetch_relationships(&self, id: &str) -> StoreResult<Vec<RelationshipEdge>>;

    async fn fetch_supply_chain(&self, id: &str) -> StoreResult<Vec<SupplyChainLink>>;

    async fn fetch_risk_factors(&self, id: &str) -> StoreResult<RiskProfile>;

    async fn fetch_search_metadata(&self, id: &str) -> StoreResult<SearchMetadata>;
}
