use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::normalize::{name_token, normalize_name};
use crate::reader::JsonReader;
use crate::records::{
    EntityRecord, FinancialRecord, RawEdge, RawLink, RelationshipEdge, RiskProfile, SearchMetadata,
    SupplyChainLink,
};
use crate::{DataSource, StoreError, StoreResult};

const ENTITY_DETAIL: &str = "entity_detail_";
const ENTITY_SEARCH: &str = "entity_search_";
const ENTITY_SEARCH_GENERAL: &str = "entity_search.json";
const INTERNAL: &str = "internal_";
const RELATIONSHIPS: &str = "relationships_";
const RELATIONSHIPS_GENERAL: &str = "relationships.json";
const SUPPLY_CHAIN: &str = "supply_chain_";

/// Directory of JSON records following the family naming conventions
/// (`entity_detail_*`, `internal_*`, `relationships_*`, ...).
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn load_entities(&self) -> StoreResult<Vec<EntityRecord>> {
        let paths = JsonReader::list_family(&self.root, ENTITY_DETAIL)?;
        let files = JsonReader::load_all(&paths).await?;

        Ok(files
            .into_iter()
            .filter_map(|(path, value)| parse_logged::<EntityRecord>(&path, value))
            .collect())
    }

    /// Files of a family, preferring the ones whose name embeds the entity's
    /// first name token; the whole family when there are none.
    fn family_candidates(&self, prefix: &str, entity: &EntityRecord) -> StoreResult<Vec<PathBuf>> {
        if let Some(token) = name_token(&entity.label) {
            let hinted = JsonReader::list_family(&self.root, &format!("{}{}", prefix, token))?;
            if !hinted.is_empty() {
                debug!(prefix, token = %token, files = hinted.len(), "Using name-hinted files");
                return Ok(hinted);
            }
        }

        JsonReader::list_family(&self.root, prefix)
    }

    async fn load_general(&self, file_name: &str) -> Option<StoreResult<Value>> {
        let path = self.root.join(file_name);
        if !path.is_file() {
            return None;
        }
        Some(JsonReader::read_file(&path).await)
    }
}

#[async_trait]
impl DataSource for FileStore {
    async fn find_entity_by_name(&self, name: &str) -> StoreResult<EntityRecord> {
        let target = normalize_name(name);
        if target.is_empty() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        self.load_entities()
            .await?
            .into_iter()
            .find(|e| normalize_name(&e.label) == target)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn find_entity_by_id(&self, id: &str) -> StoreResult<EntityRecord> {
        self.load_entities()
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn scan_entities(&self) -> StoreResult<Vec<EntityRecord>> {
        self.load_entities().await
    }

    async fn fetch_financials(&self, id: &str) -> StoreResult<Option<FinancialRecord>> {
        let entity = self.find_entity_by_id(id).await?;
        let paths = self.family_candidates(INTERNAL, &entity)?;
        let files = JsonReader::load_all(&paths).await?;
        let duns = entity.identifier("duns_number");

        for (path, value) in files {
            let Some(record) = value.as_object() else {
                continue;
            };

            let by_id = record.get("company_id").and_then(|v| v.as_str()) == Some(id);
            let by_duns = match (duns, record.get("duns_number").and_then(value_as_string)) {
                (Some(expected), Some(found)) => expected == found,
                _ => false,
            };

            if !(by_id || by_duns) {
                continue;
            }

            let section = record.get("financial_data").cloned().unwrap_or(value.clone());
            let financials = serde_json::from_value(section).map_err(|e| StoreError::Format {
                path: path.clone(),
                message: e.to_string(),
            })?;

            info!(entity_id = id, path = %path.display(), "Found financial record");
            return Ok(Some(financials));
        }

        debug!(entity_id = id, "No financial record for entity");
        Ok(None)
    }

    async fn fetch_relationships(&self, id: &str) -> StoreResult<Vec<RelationshipEdge>> {
        let entity = self.find_entity_by_id(id).await?;
        let paths = self.family_candidates(RELATIONSHIPS, &entity)?;
        let files = JsonReader::load_all(&paths).await?;

        let mut edges: Vec<RelationshipEdge> = files
            .into_iter()
            .flat_map(|(path, value)| parse_items::<RawEdge>(&path, value, &["data", "relationships"]))
            .map(RelationshipEdge::from)
            .filter(|edge| edge.involves(id))
            .collect();

        if edges.is_empty() {
            match self.load_general(RELATIONSHIPS_GENERAL).await {
                Some(Ok(value)) => {
                    let path = self.root.join(RELATIONSHIPS_GENERAL);
                    edges.extend(
                        parse_items::<RawEdge>(&path, value, &["data", "relationships"])
                            .into_iter()
                            .map(RelationshipEdge::from)
                            .filter(|edge| edge.involves(id)),
                    );
                }
                Some(Err(e)) if paths.is_empty() => return Err(e),
                Some(Err(e)) => warn!(error = %e, "Skipping general relationships file"),
                None => {}
            }
        }

        info!(entity_id = id, count = edges.len(), "Collected relationships");
        Ok(edges)
    }

    async fn fetch_supply_chain(&self, id: &str) -> StoreResult<Vec<SupplyChainLink>> {
        let entity = self.find_entity_by_id(id).await?;
        let paths = self.family_candidates(SUPPLY_CHAIN, &entity)?;
        let files = JsonReader::load_all(&paths).await?;

        let links: Vec<SupplyChainLink> = files
            .into_iter()
            .flat_map(|(path, value)| parse_items::<RawLink>(&path, value, &["data"]))
            .map(SupplyChainLink::from)
            .filter(|link| link.source_id == id)
            .collect();

        if links.is_empty() {
            warn!(entity_id = id, "No supply chain entries for entity");
        }
        Ok(links)
    }

    async fn fetch_risk_factors(&self, id: &str) -> StoreResult<RiskProfile> {
        let entity = self.find_entity_by_id(id).await?;

        match &entity.risk {
            Some(section) => {
                let profile = RiskProfile {
                    risk_score: section.risk_score.clone(),
                    factors: section.flatten_factors(),
                };
                info!(entity_id = id, factors = profile.factors.len(), "Flattened risk factors");
                Ok(profile)
            }
            None => {
                warn!(entity_id = id, "Entity has no risk section");
                Ok(RiskProfile::default())
            }
        }
    }

    async fn fetch_search_metadata(&self, id: &str) -> StoreResult<SearchMetadata> {
        let entity = self.find_entity_by_id(id).await?;
        let paths = self.family_candidates(ENTITY_SEARCH, &entity)?;
        let files = JsonReader::load_all(&paths).await?;

        for (path, value) in files {
            if let Some(found) = find_search_result(&path, value, id) {
                return Ok(found);
            }
        }

        if let Some(general) = self.load_general(ENTITY_SEARCH_GENERAL).await {
            match general {
                Ok(value) => {
                    let path = self.root.join(ENTITY_SEARCH_GENERAL);
                    if let Some(found) = find_search_result(&path, value, id) {
                        return Ok(found);
                    }
                }
                Err(e) => warn!(error = %e, "Skipping general search file"),
            }
        }

        warn!(entity_id = id, "No search metadata, projecting entity detail");
        Ok(SearchMetadata::from(&entity))
    }
}

fn find_search_result(path: &Path, value: Value, id: &str) -> Option<SearchMetadata> {
    parse_items::<SearchMetadata>(path, value, &["results"])
        .into_iter()
        .find(|m| m.id == id)
}

/// Items of a list-bearing file: `{"<key>": [...]}` for one of `keys`, or a
/// bare list. Items that don't parse are skipped.
fn parse_items<T: DeserializeOwned>(path: &Path, value: Value, keys: &[&str]) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => keys
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| parse_logged(path, item))
        .collect()
}

fn parse_logged<T: DeserializeOwned>(path: &Path, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping malformed item");
            None
        }
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
