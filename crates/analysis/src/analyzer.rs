use chrono::Utc;
use intent::AnalysisType;
use retrieve::{Dataset, DatasetBundle};
use serde_json::Value;
use store::{EntityRecord, FinancialRecord, RelationshipEdge, SearchMetadata, SupplyChainLink};
use thiserror::Error;
use tracing::{debug, info};

use crate::quality::score;
use crate::result::{
    AnalysisDetails, AnalysisResult, BasicInfo, DataQuality, FinancialOverview, SupplierEntry,
};

const HIGH_SEVERITY: &[&str] = &["high", "critical", "severe"];
const SUPPLIER_EDGE: &str = "has_supplier";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{analysis_type} analysis cannot use a {found} bundle")]
    BundleMismatch {
        analysis_type: String,
        found: &'static str,
    },

    #[error("malformed {section}: {message}")]
    MalformedSection {
        section: &'static str,
        message: String,
    },
}

/// Turns retrieved datasets into an [`AnalysisResult`].
#[derive(Debug, Clone, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(
        &self,
        entity: &EntityRecord,
        analysis_type: &AnalysisType,
        bundle: &DatasetBundle,
    ) -> Result<AnalysisResult, AnalysisError> {
        let (present, expected) = bundle.coverage();
        let quality = score(present, expected);

        let (summary, key_findings, details) = match (analysis_type, bundle) {
            (
                AnalysisType::General,
                DatasetBundle::General {
                    search_metadata,
                    financial_summary,
                },
            ) => general(entity, search_metadata, financial_summary),
            (
                AnalysisType::RiskComparison,
                DatasetBundle::Risk {
                    risk_score,
                    risk_factors,
                },
            ) => {
                let score = risk_score.available().cloned().flatten();
                let factors = risk_factors.available().cloned().unwrap_or_default();
                risk(entity, score, factors)
            }
            (
                AnalysisType::SupplierAnalysis,
                DatasetBundle::Supplier {
                    relationships,
                    supply_chain,
                },
            ) => supplier(
                entity,
                relationships.available().map(Vec::as_slice).unwrap_or_default(),
                supply_chain.available().map(Vec::as_slice).unwrap_or_default(),
            )?,
            (AnalysisType::Unrecognized(other), _) => {
                debug!(analysis_type = %other, "Degrading to minimal analysis");
                return Ok(minimal(entity, analysis_type));
            }
            (recognized, found) => {
                return Err(AnalysisError::BundleMismatch {
                    analysis_type: recognized.to_string(),
                    found: bundle_kind(found),
                });
            }
        };

        info!(
            entity_id = %entity.id,
            analysis_type = %analysis_type,
            findings = key_findings.len(),
            present,
            expected,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            company_name: entity.label.clone(),
            company_id: entity.id.clone(),
            analysis_type: analysis_type.clone(),
            timestamp: Utc::now(),
            summary,
            key_findings,
            data_quality: quality,
            details,
        })
    }
}

type Branch = (String, Vec<String>, AnalysisDetails);

fn general(
    entity: &EntityRecord,
    search_metadata: &Dataset<SearchMetadata>,
    financial_summary: &Dataset<Option<FinancialRecord>>,
) -> Branch {
    let metadata = search_metadata
        .available()
        .cloned()
        .unwrap_or_else(|| SearchMetadata::from(entity));

    let basic_info = BasicInfo {
        name: metadata.label,
        id: metadata.id,
        countries: metadata.countries,
        addresses: metadata
            .addresses
            .iter()
            .filter_map(|a| a.full.clone())
            .collect(),
        identifiers: metadata.identifiers,
        meta: metadata.meta,
    };

    let financial_overview = financial_summary
        .available()
        .and_then(Option::as_ref)
        .map(|f| FinancialOverview {
            supplier_since: f.supplier_since.clone(),
            quality_rating: f.quality_rating.clone(),
            compliance_status: f.compliance_status.clone(),
            activities: f.identified_activities.clone(),
            geographic_presence: f.geographic_presence.clone(),
            industry: f.industry.clone().or_else(|| entity.industry.clone()),
        });

    let mut findings = Vec::new();
    if !basic_info.countries.is_empty() {
        findings.push(format!("Operates in: {}", basic_info.countries.join(", ")));
    }
    if let Some(overview) = &financial_overview {
        if !overview.activities.is_empty() {
            let top: Vec<_> = overview.activities.iter().take(3).cloned().collect();
            findings.push(format!("Key activities: {}", top.join(", ")));
        }
        if let Some(status) = &overview.compliance_status {
            findings.push(format!("Compliance status: {}", status));
        }
    }
    if findings.is_empty() {
        findings.push(format!("Limited public information available for {}", entity.label));
    }

    let summary = format!("Company overview for {} ({})", entity.label, entity.id);
    (
        summary,
        findings,
        AnalysisDetails::General {
            basic_info,
            financial_overview,
        },
    )
}

fn risk(
    entity: &EntityRecord,
    risk_score: Option<store::RiskScore>,
    factors: Vec<store::RiskFactor>,
) -> Branch {
    let mut findings = vec![
        match &risk_score {
            Some(score) => format!("Risk score: {}", score),
            None => "Risk score: unavailable".to_string(),
        },
        format!("Identified {} risk factors", factors.len()),
    ];

    let severe: Vec<_> = factors
        .iter()
        .filter(|f| HIGH_SEVERITY.contains(&f.level.to_lowercase().as_str()))
        .take(3)
        .map(|f| f.factor.clone())
        .collect();
    if !severe.is_empty() {
        findings.push(format!("High severity: {}", severe.join(", ")));
    }

    let summary = format!("Risk assessment for {}", entity.label);
    (
        summary,
        findings,
        AnalysisDetails::Risk {
            risk_score,
            all_risk_factors: factors,
        },
    )
}

fn supplier(
    entity: &EntityRecord,
    relationships: &[RelationshipEdge],
    supply_chain: &[SupplyChainLink],
) -> Result<Branch, AnalysisError> {
    let mut suppliers: Vec<SupplierEntry> = Vec::new();

    for edge in relationships
        .iter()
        .filter(|e| e.kind == SUPPLIER_EDGE && e.source_id == entity.id)
    {
        if edge.target_id.trim().is_empty() {
            return Err(AnalysisError::MalformedSection {
                section: "relationships",
                message: "supplier edge without target id".to_string(),
            });
        }
        if suppliers.iter().any(|s| s.id == edge.target_id) {
            continue;
        }
        suppliers.push(SupplierEntry {
            id: edge.target_id.clone(),
            name: edge.target_label.clone(),
            tier: edge.metadata.tier.clone(),
            category: edge.metadata.category.clone(),
            risk_factors: Vec::new(),
        });
    }

    for link in supply_chain {
        if link.target_id.trim().is_empty() {
            return Err(AnalysisError::MalformedSection {
                section: "supply_chain",
                message: "supply-chain link without target id".to_string(),
            });
        }
        match suppliers.iter_mut().find(|s| s.id == link.target_id) {
            Some(existing) => {
                if existing.name.is_none() {
                    existing.name = link.target_label.clone();
                }
                if existing.tier.is_none() {
                    existing.tier = link.tier.clone();
                }
                add_risk_factors(&mut existing.risk_factors, &link.risk_factors);
            }
            None => {
                let mut risk_factors = Vec::new();
                add_risk_factors(&mut risk_factors, &link.risk_factors);
                suppliers.push(SupplierEntry {
                    id: link.target_id.clone(),
                    name: link.target_label.clone(),
                    tier: link.tier.clone(),
                    category: None,
                    risk_factors,
                });
            }
        }
    }

    let tier_one = suppliers
        .iter()
        .filter(|s| s.tier.as_ref().map(|t| t.is_tier_one()).unwrap_or(false))
        .count();
    let flagged = suppliers.iter().filter(|s| s.is_flagged()).count();

    let findings = vec![
        format!("Total suppliers: {}", suppliers.len()),
        format!("Tier-1 suppliers: {}", tier_one),
        format!("Suppliers with risk flags: {}", flagged),
    ];

    let summary = format!("Supplier analysis for {}", entity.label);
    Ok((summary, findings, AnalysisDetails::Supplier { suppliers }))
}

/// A supplier listed by several links keeps each distinct factor once.
fn add_risk_factors(existing: &mut Vec<Value>, incoming: &[Value]) {
    for factor in incoming {
        if !existing.contains(factor) {
            existing.push(factor.clone());
        }
    }
}

fn minimal(entity: &EntityRecord, analysis_type: &AnalysisType) -> AnalysisResult {
    AnalysisResult {
        company_name: entity.label.clone(),
        company_id: entity.id.clone(),
        analysis_type: analysis_type.clone(),
        timestamp: Utc::now(),
        summary: format!(
            "Limited analysis for {}: '{}' is not a supported analysis type",
            entity.label, analysis_type
        ),
        key_findings: vec![format!("Analysis type '{}' is not supported", analysis_type)],
        data_quality: DataQuality::Low,
        details: AnalysisDetails::Minimal,
    }
}

fn bundle_kind(bundle: &DatasetBundle) -> &'static str {
    match bundle {
        DatasetBundle::General { .. } => "general",
        DatasetBundle::Risk { .. } => "risk",
        DatasetBundle::Supplier { .. } => "supplier",
        DatasetBundle::Minimal => "minimal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store::{EdgeMetadata, RiskFactor, RiskScore, Tier};

    fn entity() -> EntityRecord {
        serde_json::from_value(json!({
            "id": "cz-1",
            "label": "MB TOOL",
            "countries": ["CZ", "SK"],
            "industry": "Tooling"
        }))
        .unwrap()
    }

    fn edge(source: &str, target: &str, kind: &str, tier: u64) -> RelationshipEdge {
        RelationshipEdge {
            source_id: source.to_string(),
            source_label: None,
            target_id: target.to_string(),
            target_label: Some(target.to_uppercase()),
            kind: kind.to_string(),
            metadata: EdgeMetadata {
                tier: Some(Tier::Number(tier)),
                category: Some("parts".to_string()),
            },
        }
    }

    fn link(target: &str, tier: &str, risks: &[&str]) -> SupplyChainLink {
        SupplyChainLink {
            source_id: "cz-1".to_string(),
            target_id: target.to_string(),
            target_label: None,
            tier: Some(Tier::Label(tier.to_string())),
            risk_factors: risks.iter().map(|r| json!(r)).collect(),
        }
    }

    #[test]
    fn test_general_without_financials_is_medium_quality() {
        let bundle = DatasetBundle::General {
            search_metadata: Dataset::Available(SearchMetadata::from(&entity())),
            financial_summary: Dataset::Available(None),
        };
        let result = Analyzer::new()
            .analyze(&entity(), &AnalysisType::General, &bundle)
            .unwrap();

        assert_eq!(result.analysis_type, AnalysisType::General);
        assert_eq!(result.data_quality, DataQuality::Medium);
        assert_eq!(result.key_findings, vec!["Operates in: CZ, SK"]);
    }

    #[test]
    fn test_general_lists_top_three_activities() {
        let financials: FinancialRecord = serde_json::from_value(json!({
            "identified_activities": ["a", "b", "c", "d"]
        }))
        .unwrap();
        let bundle = DatasetBundle::General {
            search_metadata: Dataset::unavailable("io"),
            financial_summary: Dataset::Available(Some(financials)),
        };
        let result = Analyzer::new()
            .analyze(&entity(), &AnalysisType::General, &bundle)
            .unwrap();

        assert!(result.key_findings.contains(&"Key activities: a, b, c".to_string()));
        match result.details {
            AnalysisDetails::General { basic_info, financial_overview } => {
                assert_eq!(basic_info.name, "MB TOOL");
                assert_eq!(financial_overview.unwrap().industry.as_deref(), Some("Tooling"));
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_risk_findings() {
        let factors = vec![
            RiskFactor {
                factor: "rising debt".into(),
                category: "financial".into(),
                level: "HIGH".into(),
            },
            RiskFactor {
                factor: "late filing".into(),
                category: "compliance".into(),
                level: "medium".into(),
            },
        ];
        let bundle = DatasetBundle::Risk {
            risk_score: Dataset::Available(Some(RiskScore::Numeric(37.0))),
            risk_factors: Dataset::Available(factors),
        };
        let result = Analyzer::new()
            .analyze(&entity(), &AnalysisType::RiskComparison, &bundle)
            .unwrap();

        assert_eq!(
            result.key_findings,
            vec!["Risk score: 37", "Identified 2 risk factors", "High severity: rising debt"]
        );
        assert_eq!(result.data_quality, DataQuality::High);
    }

    #[test]
    fn test_risk_without_data_still_has_findings() {
        let bundle = DatasetBundle::Risk {
            risk_score: Dataset::unavailable("io"),
            risk_factors: Dataset::unavailable("io"),
        };
        let result = Analyzer::new()
            .analyze(&entity(), &AnalysisType::RiskComparison, &bundle)
            .unwrap();

        assert_eq!(result.key_findings[0], "Risk score: unavailable");
        assert_eq!(result.data_quality, DataQuality::Low);
    }

    #[test]
    fn test_suppliers_are_merged_by_target() {
        let bundle = DatasetBundle::Supplier {
            relationships: Dataset::Available(vec![
                edge("cz-1", "s-1", "has_supplier", 1),
                edge("cz-1", "s-2", "has_supplier", 2),
                edge("other", "cz-1", "has_supplier", 1),
                edge("cz-1", "p-1", "partner", 1),
            ]),
            supply_chain: Dataset::Available(vec![
                link("s-1", "Tier 1", &[]),
                link("s-3", "2", &["flood", "single source"]),
            ]),
        };
        let result = Analyzer::new()
            .analyze(&entity(), &AnalysisType::SupplierAnalysis, &bundle)
            .unwrap();

        assert_eq!(
            result.key_findings,
            vec!["Total suppliers: 3", "Tier-1 suppliers: 1", "Suppliers with risk flags: 1"]
        );
    }

    #[test]
    fn test_repeated_links_do_not_duplicate_risk_factors() {
        let bundle = DatasetBundle::Supplier {
            relationships: Dataset::Available(vec![edge("cz-1", "s-1", "has_supplier", 1)]),
            supply_chain: Dataset::Available(vec![
                link("s-1", "Tier 1", &["flood"]),
                link("s-1", "Tier 1", &["flood", "single source"]),
                link("s-2", "2", &["strike"]),
                link("s-2", "2", &["strike"]),
            ]),
        };
        let result = Analyzer::new()
            .analyze(&entity(), &AnalysisType::SupplierAnalysis, &bundle)
            .unwrap();

        let AnalysisDetails::Supplier { suppliers } = result.details else {
            panic!("expected supplier details");
        };
        assert_eq!(suppliers.len(), 2);
        assert_eq!(suppliers[0].risk_factors, vec![json!("flood"), json!("single source")]);
        assert_eq!(suppliers[1].risk_factors, vec![json!("strike")]);
    }

    #[test]
    fn test_unrecognized_type_degrades() {
        let kind = AnalysisType::Unrecognized("forecast".into());
        let result = Analyzer::new()
            .analyze(&entity(), &kind, &DatasetBundle::Minimal)
            .unwrap();

        assert_eq!(result.details, AnalysisDetails::Minimal);
        assert_eq!(result.data_quality, DataQuality::Low);
        assert_eq!(result.analysis_type, kind);
    }

    #[test]
    fn test_mismatched_bundle_is_an_error() {
        let err = Analyzer::new()
            .analyze(&entity(), &AnalysisType::RiskComparison, &DatasetBundle::Minimal)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::BundleMismatch { found: "minimal", .. }));
    }
}
