use serde::{Deserialize, Serialize};

/// Ordered keyword categories consulted by the keyword classifier.
///
/// Matching is a case-insensitive substring test against the raw query, so
/// stems such as `rizik` cover inflected Czech forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTable {
    pub risk: Vec<String>,
    pub supplier: Vec<String>,
    pub person: Vec<String>,
    pub relationship: Vec<String>,
    /// Literal tags a caller may spell out to force an analysis type.
    pub risk_tag: String,
    pub supplier_tag: String,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            risk: words(&["risk", "rizik", "compliance", "sanction", "sankc"]),
            supplier: words(&[
                "supplier",
                "dodavatel",
                "supply chain",
                "chain",
                "řetězec",
                "relationship",
                "vztah",
            ]),
            person: words(&["person", "who is", "osoba", "člověk", "zaměstnanec", "kdo je"]),
            relationship: words(&[
                "relationship between",
                "connection between",
                "connected to",
                "vztah mezi",
                "propojení",
            ]),
            risk_tag: "risk_comparison".to_string(),
            supplier_tag: "supplier_analysis".to_string(),
        }
    }
}

impl KeywordTable {
    pub fn any_risk(&self, lowered: &str) -> bool {
        contains_any(lowered, &self.risk)
    }

    pub fn any_supplier(&self, lowered: &str) -> bool {
        contains_any(lowered, &self.supplier)
    }

    pub fn any_person(&self, lowered: &str) -> bool {
        contains_any(lowered, &self.person)
    }

    pub fn any_relationship(&self, lowered: &str) -> bool {
        contains_any(lowered, &self.relationship)
    }
}

fn contains_any(lowered: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| lowered.contains(&k.to_lowercase()))
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}
