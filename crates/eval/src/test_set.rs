use intent::{AnalysisType, QueryType};
use serde::{Deserialize, Serialize};

/// A query with the classification the engine is expected to settle on.
/// `expected_analysis_type` is `None` for queries that must take the error
/// path before any analysis type is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelledQuery {
    pub query: String,
    pub expected_query_type: Option<QueryType>,
    pub expected_analysis_type: Option<AnalysisType>,
}

impl LabelledQuery {
    fn new(query: &str, query_type: Option<QueryType>, analysis_type: Option<AnalysisType>) -> Self {
        Self {
            query: query.to_string(),
            expected_query_type: query_type,
            expected_analysis_type: analysis_type,
        }
    }

    /// Label used to group accuracy figures.
    pub fn category(&self) -> String {
        match &self.expected_analysis_type {
            Some(analysis_type) => analysis_type.as_str().to_string(),
            None => "none".to_string(),
        }
    }
}

pub fn get_test_set() -> Vec<LabelledQuery> {
    use AnalysisType::{General, RiskComparison, SupplierAnalysis};
    use QueryType::{Company, Custom, Error, Person, Relationship};

    vec![
        // Overviews
        LabelledQuery::new("Tell me about MB TOOL", Some(Company), Some(General)),
        LabelledQuery::new("Give me an overview of BOS AUTOMOTIVE", Some(Company), Some(General)),
        LabelledQuery::new("What do we know about ADIS TACHOV?", Some(Company), Some(General)),

        // Risk
        LabelledQuery::new("What are the risks for MB TOOL?", Some(Company), Some(RiskComparison)),
        LabelledQuery::new("Show compliance issues for Flídr plast", None, Some(RiskComparison)),
        LabelledQuery::new("Jaká jsou rizika pro MB TOOL?", Some(Company), Some(RiskComparison)),
        LabelledQuery::new("Any sanctions against BOS AUTOMOTIVE?", Some(Company), Some(RiskComparison)),
        LabelledQuery::new("MB TOOL risk_comparison", Some(Company), Some(RiskComparison)),

        // Suppliers
        LabelledQuery::new("Who are the suppliers of MB TOOL?", Some(Company), Some(SupplierAnalysis)),
        LabelledQuery::new("Show the supply chain of BOS AUTOMOTIVE", Some(Company), Some(SupplierAnalysis)),
        LabelledQuery::new("Dodavatelé společnosti MB TOOL", Some(Company), Some(SupplierAnalysis)),

        // Lower-case queries without a company token
        LabelledQuery::new("who is the ceo of mb tool", Some(Person), Some(General)),
        LabelledQuery::new("any connection between these two companies", Some(Relationship), Some(General)),
        LabelledQuery::new("latest news please", Some(Custom), Some(General)),

        LabelledQuery::new("", Some(Error), None),
    ]
}
