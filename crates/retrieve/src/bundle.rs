use serde::{Deserialize, Serialize};
use store::{
    FinancialRecord, RelationshipEdge, RiskFactor, RiskScore, SearchMetadata, SupplyChainLink,
};

/// Outcome of one sub-fetch: the data, or an explicit placeholder naming
/// why it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Dataset<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Dataset<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Dataset::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Dataset::Available(value) => Some(value),
            Dataset::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Dataset::Available(_))
    }
}

impl<T: Content> Dataset<T> {
    /// Fetched successfully and carrying something.
    pub fn is_present(&self) -> bool {
        self.available().map(|v| !v.is_blank()).unwrap_or(false)
    }
}

/// Emptiness of a fetched dataset, for data-quality scoring.
pub trait Content {
    fn is_blank(&self) -> bool;
}

impl<T> Content for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Content for Option<T> {
    fn is_blank(&self) -> bool {
        self.is_none()
    }
}

impl Content for SearchMetadata {
    fn is_blank(&self) -> bool {
        false
    }
}

/// Datasets fetched for one entity, shaped by analysis type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetBundle {
    General {
        search_metadata: Dataset<SearchMetadata>,
        financial_summary: Dataset<Option<FinancialRecord>>,
    },
    Risk {
        risk_score: Dataset<Option<RiskScore>>,
        risk_factors: Dataset<Vec<RiskFactor>>,
    },
    Supplier {
        relationships: Dataset<Vec<RelationshipEdge>>,
        supply_chain: Dataset<Vec<SupplyChainLink>>,
    },
    /// Unrecognized analysis type; identity only.
    Minimal,
}

impl DatasetBundle {
    /// (present, expected) sub-dataset counts.
    pub fn coverage(&self) -> (usize, usize) {
        let flags = match self {
            DatasetBundle::General {
                search_metadata,
                financial_summary,
            } => vec![search_metadata.is_present(), financial_summary.is_present()],
            DatasetBundle::Risk {
                risk_score,
                risk_factors,
            } => vec![risk_factors.is_present(), risk_score.is_present()],
            DatasetBundle::Supplier {
                relationships,
                supply_chain,
            } => vec![relationships.is_present(), supply_chain.is_present()],
            DatasetBundle::Minimal => Vec::new(),
        };

        (flags.iter().filter(|f| **f).count(), flags.len())
    }

    /// Names of the sub-datasets that came back as placeholders.
    pub fn unavailable(&self) -> Vec<&'static str> {
        let entries: Vec<(&'static str, bool)> = match self {
            DatasetBundle::General {
                search_metadata,
                financial_summary,
            } => vec![
                ("search_metadata", search_metadata.is_available()),
                ("financial_summary", financial_summary.is_available()),
            ],
            DatasetBundle::Risk {
                risk_score,
                risk_factors,
            } => vec![
                ("risk_score", risk_score.is_available()),
                ("risk_factors", risk_factors.is_available()),
            ],
            DatasetBundle::Supplier {
                relationships,
                supply_chain,
            } => vec![
                ("relationships", relationships.is_available()),
                ("supply_chain", supply_chain.is_available()),
            ],
            DatasetBundle::Minimal => Vec::new(),
        };

        entries
            .into_iter()
            .filter(|(_, available)| !available)
            .map(|(name, _)| name)
            .collect()
    }
}
