use analysis::{AnalysisDetails, AnalysisResult, DataQuality, ErrorKind};
use chrono::Utc;

use crate::state::{ErrorRecord, WorkflowState};

/// Remediation hints shown with an error. Name and lookup failures share the
/// missing-data hints.
pub fn suggestions(kind: ErrorKind) -> Vec<String> {
    let hints: &[&str] = match kind {
        ErrorKind::MissingData | ErrorKind::EntityNotFound | ErrorKind::InvalidCompanyName => &[
            "Check that the company name is spelled correctly",
            "Try the full registered company name",
            "Verify that the company exists in the data store",
        ],
        ErrorKind::DataAccessError => &[
            "Try again in a few moments",
            "Check that the data directory is readable",
        ],
        ErrorKind::AnalysisError => &[
            "Try a different type of analysis",
            "Ask a simpler question about the company",
        ],
        ErrorKind::UnknownError => &["Try again", "Rephrase the query"],
    };
    hints.iter().map(|h| h.to_string()).collect()
}

/// Failure-shaped analysis result, so formatting treats both outcomes alike.
pub fn failure_result(error: &ErrorRecord, state: &WorkflowState) -> AnalysisResult {
    AnalysisResult {
        company_name: state.company_name.clone().unwrap_or_default(),
        company_id: state
            .entity
            .as_ref()
            .map(|e| e.id.clone())
            .unwrap_or_default(),
        analysis_type: state.analysis_type.clone().unwrap_or_default(),
        timestamp: Utc::now(),
        summary: format!("Unable to complete the analysis: {}", error.message),
        key_findings: vec![error.message.clone()],
        data_quality: DataQuality::Low,
        details: AnalysisDetails::Failure {
            error_kind: error.kind,
            message: error.message.clone(),
            suggestions: suggestions(error.kind),
        },
    }
}
