use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Which dataset and result shape a query asks for.
///
/// Values outside the three known tags are kept verbatim as `Unrecognized`
/// so that downstream stages can degrade instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnalysisType {
    #[default]
    General,
    RiskComparison,
    SupplierAnalysis,
    Unrecognized(String),
}

impl AnalysisType {
    pub fn as_str(&self) -> &str {
        match self {
            AnalysisType::General => "general",
            AnalysisType::RiskComparison => "risk_comparison",
            AnalysisType::SupplierAnalysis => "supplier_analysis",
            AnalysisType::Unrecognized(other) => other,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, AnalysisType::Unrecognized(_))
    }
}

impl From<String> for AnalysisType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "general" => AnalysisType::General,
            "risk_comparison" => AnalysisType::RiskComparison,
            "supplier_analysis" => AnalysisType::SupplierAnalysis,
            _ => AnalysisType::Unrecognized(value),
        }
    }
}

impl From<AnalysisType> for String {
    fn from(value: AnalysisType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for AnalysisType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AnalysisType::from(s.to_string()))
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Company,
    Person,
    Relationship,
    Custom,
    Error,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Company => "company",
            QueryType::Person => "person",
            QueryType::Relationship => "relationship",
            QueryType::Custom => "custom",
            QueryType::Error => "error",
        }
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "company" => Ok(QueryType::Company),
            "person" => Ok(QueryType::Person),
            "relationship" => Ok(QueryType::Relationship),
            "custom" => Ok(QueryType::Custom),
            "error" => Ok(QueryType::Error),
            other => Err(format!("unknown query type: {}", other)),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub query_type: QueryType,
    pub analysis_type: AnalysisType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_type_serializes_as_plain_tag() {
        let json = serde_json::to_string(&AnalysisType::RiskComparison).unwrap();
        assert_eq!(json, "\"risk_comparison\"");

        let parsed: AnalysisType = serde_json::from_str("\"market_outlook\"").unwrap();
        assert_eq!(parsed, AnalysisType::Unrecognized("market_outlook".to_string()));
        assert!(!parsed.is_recognized());
    }

    #[test]
    fn test_query_type_parsing() {
        assert_eq!("Company".parse::<QueryType>().unwrap(), QueryType::Company);
        assert!("banana".parse::<QueryType>().is_err());
    }
}
