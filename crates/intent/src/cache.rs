use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::schema::Intent;

/// Bounded map of model classifications keyed by a hash of the query.
#[derive(Clone)]
pub struct IntentCache {
    entries: Arc<DashMap<String, Intent>>,
    max_entries: usize,
}

impl IntentCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, query: &str) -> Option<Intent> {
        let key = hash_text(query);
        self.entries.get(&key).map(|r| r.value().clone())
    }

    pub fn set(&self, query: &str, intent: Intent) {
        if self.entries.len() >= self.max_entries {
            // Clear a quarter when full
            let to_remove: Vec<_> = self
                .entries
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(hash_text(query), intent);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            intents_cached: self.entries.len(),
            capacity: self.max_entries,
        }
    }
}

pub(crate) fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub intents_cached: usize,
    pub capacity: usize,
}
