use async_trait::async_trait;

use crate::keywords::KeywordTable;
use crate::names::has_name_like_token;
use crate::schema::{AnalysisType, Intent, QueryType};

/// Derives query and analysis types from free text.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Intent;

    fn mode(&self) -> &'static str;
}

/// Pure classification over a keyword table.
pub fn classify(table: &KeywordTable, text: &str) -> Intent {
    Intent {
        query_type: classify_query_type(table, text),
        analysis_type: classify_analysis_type(table, text),
    }
}

pub fn classify_query_type(table: &KeywordTable, text: &str) -> QueryType {
    if !text.chars().any(|c| c.is_alphanumeric()) {
        return QueryType::Error;
    }

    let lowered = text.to_lowercase();
    if has_name_like_token(text) {
        QueryType::Company
    } else if table.any_person(&lowered) {
        QueryType::Person
    } else if table.any_relationship(&lowered) {
        QueryType::Relationship
    } else {
        QueryType::Custom
    }
}

pub fn classify_analysis_type(table: &KeywordTable, text: &str) -> AnalysisType {
    let lowered = text.to_lowercase();

    if table.any_risk(&lowered) {
        AnalysisType::RiskComparison
    } else if table.any_supplier(&lowered) {
        AnalysisType::SupplierAnalysis
    } else if lowered.contains(&table.risk_tag) {
        AnalysisType::RiskComparison
    } else if lowered.contains(&table.supplier_tag) {
        AnalysisType::SupplierAnalysis
    } else {
        AnalysisType::General
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    table: KeywordTable,
}

impl KeywordClassifier {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn classify_text(&self, text: &str) -> Intent {
        classify(&self.table, text)
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Intent {
        self.classify_text(text)
    }

    fn mode(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> KeywordTable {
        KeywordTable::default()
    }

    #[test]
    fn test_empty_and_symbol_only_queries_are_errors() {
        assert_eq!(classify_query_type(&table(), ""), QueryType::Error);
        assert_eq!(classify_query_type(&table(), "   ?!  "), QueryType::Error);
    }

    #[test]
    fn test_query_type_order() {
        assert_eq!(classify_query_type(&table(), "Tell me about MB TOOL"), QueryType::Company);
        assert_eq!(classify_query_type(&table(), "who is the ceo here"), QueryType::Person);
        assert_eq!(
            classify_query_type(&table(), "any connection between these two"),
            QueryType::Relationship
        );
        assert_eq!(classify_query_type(&table(), "latest news"), QueryType::Custom);
    }

    #[test]
    fn test_risk_checked_before_supplier() {
        assert_eq!(
            classify_analysis_type(&table(), "What are the risks for MB TOOL?"),
            AnalysisType::RiskComparison
        );
        assert_eq!(
            classify_analysis_type(&table(), "risk in the supplier base of MB TOOL"),
            AnalysisType::RiskComparison
        );
        assert_eq!(
            classify_analysis_type(&table(), "Who are the suppliers of MB TOOL"),
            AnalysisType::SupplierAnalysis
        );
        assert_eq!(
            classify_analysis_type(&table(), "Tell me about MB TOOL"),
            AnalysisType::General
        );
    }

    #[test]
    fn test_explicit_tag_literal() {
        let table = KeywordTable {
            risk: Vec::new(),
            supplier: Vec::new(),
            ..KeywordTable::default()
        };
        assert_eq!(
            classify_analysis_type(&table, "MB TOOL supplier_analysis"),
            AnalysisType::SupplierAnalysis
        );
    }

    #[tokio::test]
    async fn test_classification_is_stable() {
        let classifier = KeywordClassifier::default();
        let first = classifier.classify("Dodavatelé MB TOOL").await;
        let second = classifier.classify("Dodavatelé MB TOOL").await;
        assert_eq!(first, second);
        assert_eq!(first.analysis_type, AnalysisType::SupplierAnalysis);
    }
}
