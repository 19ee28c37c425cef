use intent::AnalysisType;
use std::sync::Arc;
use store::{DataSource, EntityRecord, StoreError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::bundle::{Dataset, DatasetBundle};

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("entity lookup failed: {0}")]
    Store(#[source] StoreError),
}

/// The located entity plus the datasets fetched for it.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub entity: EntityRecord,
    pub bundle: DatasetBundle,
}

/// Fetches the datasets an analysis type needs.
///
/// Only a missing entity is an error. Every sub-fetch runs on its own and a
/// failing one is logged and replaced with [`Dataset::Unavailable`].
#[derive(Clone)]
pub struct DatasetRetriever {
    source: Arc<dyn DataSource>,
}

impl DatasetRetriever {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(
        &self,
        entity_id: &str,
        analysis_type: &AnalysisType,
    ) -> Result<Retrieval, RetrieveError> {
        let entity = match self.source.find_entity_by_id(entity_id).await {
            Ok(entity) => entity,
            Err(StoreError::NotFound(_)) => {
                return Err(RetrieveError::EntityNotFound(entity_id.to_string()));
            }
            Err(e) => return Err(RetrieveError::Store(e)),
        };

        let source = &self.source;
        let bundle = match analysis_type {
            AnalysisType::General => {
                let (metadata, financials) = tokio::join!(
                    source.fetch_search_metadata(entity_id),
                    source.fetch_financials(entity_id),
                );
                DatasetBundle::General {
                    search_metadata: isolate("search_metadata", entity_id, metadata),
                    financial_summary: isolate("financials", entity_id, financials),
                }
            }
            AnalysisType::RiskComparison => {
                let profile = isolate(
                    "risk_factors",
                    entity_id,
                    source.fetch_risk_factors(entity_id).await,
                );
                match profile {
                    Dataset::Available(profile) => DatasetBundle::Risk {
                        risk_score: Dataset::Available(profile.risk_score),
                        risk_factors: Dataset::Available(profile.factors),
                    },
                    Dataset::Unavailable { reason } => DatasetBundle::Risk {
                        risk_score: Dataset::unavailable(reason.clone()),
                        risk_factors: Dataset::unavailable(reason),
                    },
                }
            }
            AnalysisType::SupplierAnalysis => {
                let (relationships, supply_chain) = tokio::join!(
                    source.fetch_relationships(entity_id),
                    source.fetch_supply_chain(entity_id),
                );
                DatasetBundle::Supplier {
                    relationships: isolate("relationships", entity_id, relationships),
                    supply_chain: isolate("supply_chain", entity_id, supply_chain),
                }
            }
            AnalysisType::Unrecognized(other) => {
                debug!(analysis_type = %other, "No datasets for unrecognized analysis type");
                DatasetBundle::Minimal
            }
        };

        let (present, expected) = bundle.coverage();
        debug!(entity_id, present, expected, "Datasets fetched");

        Ok(Retrieval { entity, bundle })
    }
}

fn isolate<T>(dataset: &str, entity_id: &str, result: Result<T, StoreError>) -> Dataset<T> {
    match result {
        Ok(value) => Dataset::Available(value),
        Err(e) => {
            warn!(dataset, entity_id, error = %e, "Sub-fetch failed, using placeholder");
            Dataset::unavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSource, Op, demo_store};

    const MB_TOOL: &str = "cz-mbtool-0001";

    #[tokio::test]
    async fn test_general_bundle() {
        let retriever = DatasetRetriever::new(Arc::new(demo_store()));

        let retrieval = retriever.fetch(MB_TOOL, &AnalysisType::General).await.unwrap();
        assert_eq!(retrieval.entity.label, "MB TOOL");
        assert_eq!(retrieval.bundle.coverage(), (2, 2));
    }

    #[tokio::test]
    async fn test_missing_entity_is_the_only_error() {
        let retriever = DatasetRetriever::new(Arc::new(demo_store()));

        let err = retriever
            .fetch("missing_id", &AnalysisType::SupplierAnalysis)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrieveError::EntityNotFound(id) if id == "missing_id"));
    }

    #[tokio::test]
    async fn test_one_failing_sub_fetch_degrades_to_placeholder() {
        let source = FailingSource::new(demo_store(), Op::SupplyChain);
        let retriever = DatasetRetriever::new(Arc::new(source));

        let retrieval = retriever
            .fetch(MB_TOOL, &AnalysisType::SupplierAnalysis)
            .await
            .unwrap();

        match &retrieval.bundle {
            DatasetBundle::Supplier {
                relationships,
                supply_chain,
            } => {
                assert!(relationships.is_present());
                assert!(!supply_chain.is_available());
            }
            other => panic!("unexpected bundle {:?}", other),
        }
        assert_eq!(retrieval.bundle.coverage(), (1, 2));
    }

    #[tokio::test]
    async fn test_risk_failure_marks_both_risk_sets() {
        let source = FailingSource::new(demo_store(), Op::RiskFactors);
        let retriever = DatasetRetriever::new(Arc::new(source));

        let retrieval = retriever
            .fetch(MB_TOOL, &AnalysisType::RiskComparison)
            .await
            .unwrap();
        assert_eq!(retrieval.bundle.unavailable(), vec!["risk_score", "risk_factors"]);
    }

    #[tokio::test]
    async fn test_unrecognized_type_yields_minimal_bundle() {
        let retriever = DatasetRetriever::new(Arc::new(demo_store()));

        let retrieval = retriever
            .fetch(MB_TOOL, &AnalysisType::Unrecognized("forecast".into()))
            .await
            .unwrap();
        assert_eq!(retrieval.bundle, DatasetBundle::Minimal);
    }
}
