use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A company (occasionally a person) as stored in `entity_detail_*.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub identifiers: Vec<Identifier>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskSection>,
}

impl EntityRecord {
    /// Minimal stand-in used when a name could not be resolved.
    pub fn placeholder(id: String, label: String) -> Self {
        Self {
            id,
            label,
            countries: Vec::new(),
            identifiers: Vec::new(),
            addresses: Vec::new(),
            industry: None,
            risk: None,
        }
    }

    pub fn identifier(&self, kind: &str) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.kind.eq_ignore_ascii_case(kind))
            .map(|i| i.value.as_str())
    }
}

/// Risk scores show up both as numbers and as labels ("medium").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskScore {
    Numeric(f64),
    Label(String),
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskScore::Numeric(n) => write!(f, "{}", n),
            RiskScore::Label(l) => write!(f, "{}", l),
        }
    }
}

/// The nested `risk` object of an entity detail. Besides `risk_score` it
/// holds boolean flags (`"sanctions": true`) and leveled categories
/// (`"compliance": {"level": "high", "factors": [...]}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<RiskScore>,
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub category: String,
    pub level: String,
}

impl RiskSection {
    /// Flatten flags and leveled categories into one uniform factor list.
    pub fn flatten_factors(&self) -> Vec<RiskFactor> {
        let mut factors = Vec::new();

        for (key, value) in &self.sections {
            match value {
                Value::Bool(true) => factors.push(RiskFactor {
                    factor: key.clone(),
                    category: "general".to_string(),
                    level: "identified".to_string(),
                }),
                Value::Object(section) => {
                    let level = section
                        .get("level")
                        .and_then(|l| l.as_str())
                        .unwrap_or("unknown")
                        .to_string();

                    if let Some(items) = section.get("factors").and_then(|f| f.as_array()) {
                        for item in items {
                            let name = match item {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            factors.push(RiskFactor {
                                factor: name,
                                category: key.clone(),
                                level: level.clone(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        factors
    }
}

/// Risk data for one entity, flattened.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskProfile {
    pub risk_score: Option<RiskScore>,
    pub factors: Vec<RiskFactor>,
}

/// Entry of an `entity_search*.json` results list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub id: String,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub identifiers: Vec<Identifier>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl From<&EntityRecord> for SearchMetadata {
    fn from(entity: &EntityRecord) -> Self {
        Self {
            id: entity.id.clone(),
            label: entity.label.clone(),
            countries: entity.countries.clone(),
            addresses: entity.addresses.clone(),
            identifiers: entity.identifiers.clone(),
            meta: Map::new(),
        }
    }
}

/// Financial / internal record from `internal_*.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_since: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_rating: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_status: Option<String>,
    #[serde(default)]
    pub identified_activities: Vec<String>,
    #[serde(default)]
    pub geographic_presence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Supplier tier: `1`, `1.0`, `"1"`, `"Tier 1"`, `"tier_1"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tier {
    Number(u64),
    Float(f64),
    Label(String),
}

impl Tier {
    pub fn level(&self) -> Option<u64> {
        match self {
            Tier::Number(n) => Some(*n),
            Tier::Float(f) if f.is_finite() && *f >= 0.0 => Some(f.round() as u64),
            Tier::Float(_) => None,
            Tier::Label(label) => {
                let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            }
        }
    }

    pub fn is_tier_one(&self) -> bool {
        self.level() == Some(1)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_label: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: EdgeMetadata,
}

impl RelationshipEdge {
    pub fn involves(&self, entity_id: &str) -> bool {
        self.source_id == entity_id || self.target_id == entity_id
    }
}

/// One hop of the supply-chain graph, with the entity as source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyChainLink {
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub risk_factors: Vec<Value>,
}

// Wire shapes as they appear on disk, converted into the records above.

/// Edge endpoints are either a bare id or a `{id, label}` node.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum EndpointRef {
    Id(String),
    Node {
        id: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl EndpointRef {
    fn into_parts(self) -> (String, Option<String>) {
        match self {
            EndpointRef::Id(id) => (id, None),
            EndpointRef::Node { id, label } => (id, label),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEdge {
    source: EndpointRef,
    target: EndpointRef,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    metadata: EdgeMetadata,
}

impl From<RawEdge> for RelationshipEdge {
    fn from(raw: RawEdge) -> Self {
        let (source_id, source_label) = raw.source.into_parts();
        let (target_id, target_label) = raw.target.into_parts();
        Self {
            source_id,
            source_label,
            target_id,
            target_label,
            kind: raw.kind,
            metadata: raw.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLink {
    source: EndpointRef,
    target: EndpointRef,
    #[serde(default)]
    tier: Option<Tier>,
    #[serde(default)]
    risk_factors: Vec<Value>,
}

impl From<RawLink> for SupplyChainLink {
    fn from(raw: RawLink) -> Self {
        let (source_id, _) = raw.source.into_parts();
        let (target_id, target_label) = raw.target.into_parts();
        Self {
            source_id,
            target_id,
            target_label,
            tier: raw.tier,
            risk_factors: raw.risk_factors,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
