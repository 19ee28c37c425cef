use chrono::{DateTime, Utc};
use intent::AnalysisType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use store::{Identifier, RiskFactor, RiskScore, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    High,
    Medium,
    Low,
}

/// Failure categories surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCompanyName,
    EntityNotFound,
    DataAccessError,
    MissingData,
    AnalysisError,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCompanyName => "invalid_company_name",
            ErrorKind::EntityNotFound => "entity_not_found",
            ErrorKind::DataAccessError => "data_access_error",
            ErrorKind::MissingData => "missing_data",
            ErrorKind::AnalysisError => "analysis_error",
            ErrorKind::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub company_name: String,
    pub company_id: String,
    pub analysis_type: AnalysisType,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub data_quality: DataQuality,
    pub details: AnalysisDetails,
}

impl AnalysisResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.details, AnalysisDetails::Failure { .. })
    }
}

/// Branch-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisDetails {
    General {
        basic_info: BasicInfo,
        financial_overview: Option<FinancialOverview>,
    },
    Risk {
        risk_score: Option<RiskScore>,
        all_risk_factors: Vec<RiskFactor>,
    },
    Supplier {
        suppliers: Vec<SupplierEntry>,
    },
    Minimal,
    Failure {
        error_kind: ErrorKind,
        message: String,
        suggestions: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub name: String,
    pub id: String,
    pub countries: Vec<String>,
    pub addresses: Vec<String>,
    pub identifiers: Vec<Identifier>,
    pub meta: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialOverview {
    pub supplier_since: Option<Value>,
    pub quality_rating: Option<Value>,
    pub compliance_status: Option<String>,
    pub activities: Vec<String>,
    pub geographic_presence: Vec<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierEntry {
    pub id: String,
    pub name: Option<String>,
    pub tier: Option<Tier>,
    pub category: Option<String>,
    pub risk_factors: Vec<Value>,
}

impl SupplierEntry {
    pub fn is_flagged(&self) -> bool {
        !self.risk_factors.is_empty()
    }
}
