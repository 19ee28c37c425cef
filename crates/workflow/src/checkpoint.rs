use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::state::Message;

/// In-memory conversation history keyed by thread id. Lives as long as the
/// process; nothing is written to disk.
#[derive(Clone)]
pub struct CheckpointStore {
    threads: Arc<DashMap<String, Vec<Message>>>,
    max_conversations: usize,
}

impl CheckpointStore {
    pub fn new(max_conversations: usize) -> Self {
        Self {
            threads: Arc::new(DashMap::new()),
            max_conversations: max_conversations.max(1),
        }
    }

    pub fn load(&self, thread_id: &str) -> Vec<Message> {
        self.threads
            .get(thread_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn save(&self, thread_id: &str, messages: Vec<Message>) {
        if !self.threads.contains_key(thread_id) && self.threads.len() >= self.max_conversations {
            // Drop a quarter of the conversations when full
            let to_remove: Vec<_> = self
                .threads
                .iter()
                .take((self.max_conversations / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            debug!(evicted = to_remove.len(), "Evicting conversations");
            for key in to_remove {
                self.threads.remove(&key);
            }
        }
        self.threads.insert(thread_id.to_string(), messages);
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Role;

    #[test]
    fn test_history_round_trip() {
        let store = CheckpointStore::new(8);
        assert!(store.load("t1").is_empty());

        store.save("t1", vec![Message::new("1", Role::User, "hi")]);
        assert_eq!(store.load("t1").len(), 1);
    }

    #[test]
    fn test_bounded() {
        let store = CheckpointStore::new(4);
        for i in 0..20 {
            store.save(&format!("thread-{}", i), Vec::new());
        }
        assert!(store.len() <= 4);
    }
}
