//! Fault injection for exercising partial-failure paths.

use async_trait::async_trait;
use std::path::PathBuf;
use store::{
    DataSource, EntityRecord, FileStore, FinancialRecord, RelationshipEdge, RiskProfile,
    SearchMetadata, StoreError, StoreResult, SupplyChainLink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Financials,
    Relationships,
    SupplyChain,
    RiskFactors,
    SearchMetadata,
}

/// Wraps a [`FileStore`] and fails one chosen sub-fetch with an I/O error.
pub struct FailingSource {
    inner: FileStore,
    failing: Op,
}

impl FailingSource {
    pub fn new(inner: FileStore, failing: Op) -> Self {
        Self { inner, failing }
    }

    fn check(&self, op: Op) -> StoreResult<()> {
        if op == self.failing {
            return Err(StoreError::Io {
                path: PathBuf::from(format!("{:?}", op)),
                source: std::io::Error::other("injected failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for FailingSource {
    async fn find_entity_by_name(&self, name: &str) -> StoreResult<EntityRecord> {
        self.inner.find_entity_by_name(name).await
    }

    async fn find_entity_by_id(&self, id: &str) -> StoreResult<EntityRecord> {
        self.inner.find_entity_by_id(id).await
    }

    async fn scan_entities(&self) -> StoreResult<Vec<EntityRecord>> {
        self.inner.scan_entities().await
    }

    async fn fetch_financials(&self, id: &str) -> StoreResult<Option<FinancialRecord>> {
        self.check(Op::Financials)?;
        self.inner.fetch_financials(id).await
    }

    async fn fetch_relationships(&self, id: &str) -> StoreResult<Vec<RelationshipEdge>> {
        self.check(Op::Relationships)?;
        self.inner.fetch_relationships(id).await
    }

    async fn fetch_supply_chain(&self, id: &str) -> StoreResult<Vec<SupplyChainLink>> {
        self.check(Op::SupplyChain)?;
        self.inner.fetch_supply_chain(id).await
    }

    async fn fetch_risk_factors(&self, id: &str) -> StoreResult<RiskProfile> {
        self.check(Op::RiskFactors)?;
        self.inner.fetch_risk_factors(id).await
    }

    async fn fetch_search_metadata(&self, id: &str) -> StoreResult<SearchMetadata> {
        self.check(Op::SearchMetadata)?;
        self.inner.fetch_search_metadata(id).await
    }
}

/// The sample store shipped with the repository.
pub fn demo_store() -> FileStore {
    FileStore::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demo_data"))
}
