use std::sync::Arc;
use store::{DataSource, EntityRecord, StoreError, looks_like_id, match_ratio, normalize_name};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no company name given")]
    EmptyInput,

    #[error("no entity matches '{0}'")]
    NotFound(String),
}

/// Maps free text onto a stored entity.
///
/// Strategies run in order: exact normalized name, containment scan (best
/// length ratio, ties to scan order), then id lookup when the text already
/// looks like an id. Store failures inside a strategy are logged and the
/// next strategy runs.
#[derive(Clone)]
pub struct EntityResolver {
    source: Arc<dyn DataSource>,
}

impl EntityResolver {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub async fn resolve(&self, text: &str) -> Result<EntityRecord, ResolveError> {
        let query = normalize_name(text);
        if query.is_empty() {
            return Err(ResolveError::EmptyInput);
        }

        match self.source.find_entity_by_name(text).await {
            Ok(entity) => {
                debug!(entity_id = %entity.id, "Resolved by exact name");
                return Ok(entity);
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => warn!(error = %e, "Exact name lookup failed"),
        }

        match self.source.scan_entities().await {
            Ok(entities) => {
                if let Some(entity) = best_containment_match(&query, entities) {
                    debug!(entity_id = %entity.id, "Resolved by containment scan");
                    return Ok(entity);
                }
            }
            Err(e) => warn!(error = %e, "Entity scan failed"),
        }

        let trimmed = text.trim();
        if looks_like_id(trimmed) {
            match self.source.find_entity_by_id(trimmed).await {
                Ok(entity) => {
                    debug!(entity_id = %entity.id, "Resolved by id");
                    return Ok(entity);
                }
                Err(StoreError::NotFound(_)) => {}
                Err(e) => warn!(error = %e, "Id lookup failed"),
            }
        }

        Err(ResolveError::NotFound(text.trim().to_string()))
    }
}

/// Highest containment ratio wins; the earlier entity keeps a tie.
fn best_containment_match(query: &str, entities: Vec<EntityRecord>) -> Option<EntityRecord> {
    let mut best: Option<(f64, EntityRecord)> = None;

    for entity in entities {
        let Some(ratio) = match_ratio(query, &entity.label) else {
            continue;
        };
        let better = match &best {
            Some((top, _)) => ratio > *top,
            None => true,
        };
        if better {
            best = Some((ratio, entity));
        }
    }

    best.map(|(_, entity)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use store::FileStore;

    fn write_entity(dir: &Path, file: &str, id: &str, label: &str) {
        let value = json!({"id": id, "label": label, "countries": ["CZ"]});
        std::fs::write(dir.join(file), value.to_string()).unwrap();
    }

    fn resolver() -> (tempfile::TempDir, EntityResolver) {
        let dir = tempfile::tempdir().unwrap();
        write_entity(dir.path(), "entity_detail_a.json", "cz-001", "MB TOOL");
        write_entity(dir.path(), "entity_detail_b.json", "cz-002", "MB TOOL Servis");
        write_entity(dir.path(), "entity_detail_c.json", "cz-003", "Flídr plast");
        let store = FileStore::new(dir.path());
        (dir, EntityResolver::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_exact_match_wins() {
        let (_dir, resolver) = resolver();
        assert_eq!(resolver.resolve("mb   tool").await.unwrap().id, "cz-001");
    }

    #[tokio::test]
    async fn test_containment_prefers_closest_length() {
        let (_dir, resolver) = resolver();
        assert_eq!(resolver.resolve("Tell me about MB TOOL Servis").await.unwrap().id, "cz-002");
        assert_eq!(resolver.resolve("FLIDR").await.unwrap().id, "cz-003");
    }

    #[tokio::test]
    async fn test_equal_ratios_keep_scan_order() {
        for (first, second, expected) in [("BETA", "ALFA", "cz-010"), ("ALFA", "BETA", "cz-010")] {
            let dir = tempfile::tempdir().unwrap();
            write_entity(dir.path(), "entity_detail_1.json", "cz-010", first);
            write_entity(dir.path(), "entity_detail_2.json", "cz-020", second);
            let resolver = EntityResolver::new(Arc::new(FileStore::new(dir.path())));

            let resolved = resolver.resolve("alfa or beta").await.unwrap();
            assert_eq!(resolved.id, expected, "{} scanned before {}", first, second);
        }
    }

    #[tokio::test]
    async fn test_queries_containing_a_name_resolve_to_it() {
        let (_dir, resolver) = resolver();
        for query in ["What are the risks for Flidr plast?", "flídr plast suppliers"] {
            assert_eq!(resolver.resolve(query).await.unwrap().id, "cz-003");
        }
    }

    #[tokio::test]
    async fn test_id_lookup_and_failures() {
        let (_dir, resolver) = resolver();
        assert_eq!(resolver.resolve("cz-003").await.unwrap().id, "cz-003");
        assert!(matches!(resolver.resolve("   ").await, Err(ResolveError::EmptyInput)));
        assert!(matches!(
            resolver.resolve("Nonexistent Corp").await,
            Err(ResolveError::NotFound(_))
        ));
    }
}
