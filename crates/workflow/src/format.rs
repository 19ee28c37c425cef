use analysis::{
    AnalysisDetails, AnalysisResult, BasicInfo, DataQuality, ErrorKind, FinancialOverview,
};
use chrono::{DateTime, Utc};
use intent::AnalysisType;
use serde::{Deserialize, Serialize};
use store::RiskScore;

use crate::errors::suggestions;

/// External response shape. Lists are reduced to counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseOutput {
    Completed(CompletedOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedOutput {
    pub analysis_type: AnalysisType,
    pub company_name: String,
    pub company_id: String,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub data_quality: DataQuality,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub details: OutputDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputDetails {
    General {
        basic_info: BasicInfo,
        financial_overview: Option<FinancialOverview>,
    },
    Risk {
        risk_score: Option<RiskScore>,
        risk_factors_count: usize,
    },
    Supplier {
        suppliers_count: usize,
        tier_one_count: usize,
        flagged_count: usize,
    },
    Minimal {},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOutput {
    pub error_type: ErrorKind,
    pub message: String,
    pub suggestions: Vec<String>,
    pub company_name: Option<String>,
    pub analysis_type: Option<AnalysisType>,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub data_quality: DataQuality,
}

impl ResponseOutput {
    pub fn is_completed(&self) -> bool {
        matches!(self, ResponseOutput::Completed(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            ResponseOutput::Completed(_) => "completed",
            ResponseOutput::Error(_) => "error",
        }
    }

    pub fn company_name(&self) -> Option<&str> {
        match self {
            ResponseOutput::Completed(out) => Some(&out.company_name),
            ResponseOutput::Error(out) => out.company_name.as_deref(),
        }
    }

    pub fn analysis_type(&self) -> Option<&AnalysisType> {
        match self {
            ResponseOutput::Completed(out) => Some(&out.analysis_type),
            ResponseOutput::Error(out) => out.analysis_type.as_ref(),
        }
    }

    /// Used when a run reaches formatting without any result.
    pub fn unknown_error(message: impl Into<String>) -> Self {
        let message = message.into();
        ResponseOutput::Error(ErrorOutput {
            error_type: ErrorKind::UnknownError,
            summary: format!("Unable to complete the analysis: {}", message),
            key_findings: vec![message.clone()],
            message,
            suggestions: suggestions(ErrorKind::UnknownError),
            company_name: None,
            analysis_type: None,
            data_quality: DataQuality::Low,
        })
    }

    /// Plain-text rendering for the conversation history.
    pub fn render(&self) -> String {
        match self {
            ResponseOutput::Completed(out) => {
                let mut text = out.summary.clone();
                for finding in &out.key_findings {
                    text.push_str("\n- ");
                    text.push_str(finding);
                }
                text
            }
            ResponseOutput::Error(out) => {
                let mut text = out.summary.clone();
                if !out.suggestions.is_empty() {
                    text.push_str("\nSuggestions:");
                    for hint in &out.suggestions {
                        text.push_str("\n- ");
                        text.push_str(hint);
                    }
                }
                text
            }
        }
    }
}

impl From<&AnalysisResult> for ResponseOutput {
    fn from(result: &AnalysisResult) -> Self {
        let details = match &result.details {
            AnalysisDetails::Failure {
                error_kind,
                message,
                suggestions,
            } => {
                return ResponseOutput::Error(ErrorOutput {
                    error_type: *error_kind,
                    message: message.clone(),
                    suggestions: suggestions.clone(),
                    company_name: Some(result.company_name.clone()).filter(|n| !n.is_empty()),
                    analysis_type: Some(result.analysis_type.clone()),
                    summary: result.summary.clone(),
                    key_findings: result.key_findings.clone(),
                    data_quality: result.data_quality,
                });
            }
            AnalysisDetails::General {
                basic_info,
                financial_overview,
            } => OutputDetails::General {
                basic_info: basic_info.clone(),
                financial_overview: financial_overview.clone(),
            },
            AnalysisDetails::Risk {
                risk_score,
                all_risk_factors,
            } => OutputDetails::Risk {
                risk_score: risk_score.clone(),
                risk_factors_count: all_risk_factors.len(),
            },
            AnalysisDetails::Supplier { suppliers } => OutputDetails::Supplier {
                suppliers_count: suppliers.len(),
                tier_one_count: suppliers
                    .iter()
                    .filter(|s| s.tier.as_ref().map(|t| t.is_tier_one()).unwrap_or(false))
                    .count(),
                flagged_count: suppliers.iter().filter(|s| s.is_flagged()).count(),
            },
            AnalysisDetails::Minimal => OutputDetails::Minimal {},
        };

        ResponseOutput::Completed(CompletedOutput {
            analysis_type: result.analysis_type.clone(),
            company_name: result.company_name.clone(),
            company_id: result.company_id.clone(),
            summary: result.summary.clone(),
            key_findings: result.key_findings.clone(),
            data_quality: result.data_quality,
            timestamp: result.timestamp,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn risk_result(score: Option<RiskScore>) -> AnalysisResult {
        AnalysisResult {
            company_name: "MB TOOL".into(),
            company_id: "cz-1".into(),
            analysis_type: AnalysisType::RiskComparison,
            timestamp: Utc::now(),
            summary: "Risk assessment for MB TOOL".into(),
            key_findings: vec!["Risk score: unavailable".into()],
            data_quality: DataQuality::Low,
            details: AnalysisDetails::Risk {
                risk_score: score,
                all_risk_factors: Vec::new(),
            },
        }
    }

    #[test]
    fn test_risk_output_keeps_null_score() {
        let output = ResponseOutput::from(&risk_result(None));
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["status"], "completed");
        assert_eq!(value["analysis_type"], "risk_comparison");
        assert_eq!(value["risk_score"], json!(null));
        assert_eq!(value["risk_factors_count"], 0);
        assert!(value.get("all_risk_factors").is_none());
    }

    #[test]
    fn test_projection_preserves_identity() {
        let result = risk_result(Some(RiskScore::Label("low".into())));
        let output = ResponseOutput::from(&result);

        assert_eq!(output.company_name(), Some("MB TOOL"));
        assert_eq!(output.analysis_type(), Some(&AnalysisType::RiskComparison));

        let json = serde_json::to_string(&output).unwrap();
        let parsed: ResponseOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.company_name(), Some("MB TOOL"));
        assert_eq!(parsed.analysis_type(), Some(&AnalysisType::RiskComparison));
    }

    #[test]
    fn test_failure_becomes_error_payload() {
        let mut result = risk_result(None);
        result.details = AnalysisDetails::Failure {
            error_kind: ErrorKind::EntityNotFound,
            message: "No data found for 'Nonexistent Corp'".into(),
            suggestions: suggestions(ErrorKind::EntityNotFound),
        };
        let output = ResponseOutput::from(&result);
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["error_type"], "entity_not_found");
        assert_eq!(value["summary"], "Risk assessment for MB TOOL");
        assert_eq!(value["data_quality"], "low");
        assert!(output.render().starts_with("Risk assessment for MB TOOL"));
        assert!(output.render().contains("Suggestions:"));
    }
}
