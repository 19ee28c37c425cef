use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::IntentCache;
use crate::classifier::{IntentClassifier, KeywordClassifier};
use crate::llm::TextCompleter;
use crate::prompt::build_classification_prompt;
use crate::schema::{AnalysisType, Intent, QueryType};

/// Model-backed classifier that always has the keyword classifier to fall back on.
pub struct AssistedClassifier {
    completer: Arc<dyn TextCompleter>,
    fallback: KeywordClassifier,
    timeout: Duration,
    cache: IntentCache,
}

#[derive(Deserialize)]
struct ModelIntent {
    query_type: String,
    #[serde(default)]
    analysis_type: Option<String>,
}

impl AssistedClassifier {
    pub fn new(
        completer: Arc<dyn TextCompleter>,
        fallback: KeywordClassifier,
        timeout: Duration,
        cache: IntentCache,
    ) -> Self {
        Self {
            completer,
            fallback,
            timeout,
            cache,
        }
    }

    pub fn cache(&self) -> &IntentCache {
        &self.cache
    }
}

#[async_trait]
impl IntentClassifier for AssistedClassifier {
    async fn classify(&self, text: &str) -> Intent {
        let fallback = self.fallback.classify_text(text);

        // Unclassifiable input never reaches the model.
        if fallback.query_type == QueryType::Error {
            return fallback;
        }

        if let Some(cached) = self.cache.get(text) {
            debug!("Intent cache hit");
            return cached;
        }

        let prompt = build_classification_prompt(text);
        match timeout(self.timeout, self.completer.complete(&prompt)).await {
            Ok(Ok(response)) => match parse_model_intent(&response) {
                Some(intent) => {
                    self.cache.set(text, intent.clone());
                    intent
                }
                None => {
                    warn!(response_len = response.len(), "Unparseable classification, using keywords");
                    fallback
                }
            },
            Ok(Err(e)) => {
                warn!(error = %e, "Text-generation call failed, using keywords");
                fallback
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Classification timed out, using keywords");
                fallback
            }
        }
    }

    fn mode(&self) -> &'static str {
        "assisted"
    }
}

/// Parse `{query_type, analysis_type}` out of a model response, tolerating
/// surrounding prose or code fences.
pub fn parse_model_intent(response: &str) -> Option<Intent> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }

    let raw: ModelIntent = serde_json::from_str(&response[start..=end]).ok()?;
    let query_type: QueryType = raw.query_type.parse().ok()?;
    if query_type == QueryType::Error {
        return None;
    }

    let analysis_type = raw
        .analysis_type
        .map(AnalysisType::from)
        .unwrap_or_default();

    Some(Intent {
        query_type,
        analysis_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Result<String, String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(reply: Result<&str, &str>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextCompleter for Scripted {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn classifier(completer: Arc<Scripted>, timeout_ms: u64) -> AssistedClassifier {
        AssistedClassifier::new(
            completer,
            KeywordClassifier::default(),
            Duration::from_millis(timeout_ms),
            IntentCache::new(16),
        )
    }

    #[tokio::test]
    async fn test_model_answer_is_used_and_cached() {
        let completer = Scripted::new(
            Ok(r#"```json {"query_type": "company", "analysis_type": "supplier_analysis"} ```"#),
            Duration::ZERO,
        );
        let classifier = classifier(completer.clone(), 500);

        let first = classifier.classify("Tell me about MB TOOL").await;
        let second = classifier.classify("Tell me about MB TOOL").await;

        assert_eq!(first.analysis_type, AnalysisType::SupplierAnalysis);
        assert_eq!(first, second);
        assert_eq!(completer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_keywords() {
        let completer = Scripted::new(
            Ok(r#"{"query_type": "company", "analysis_type": "supplier_analysis"}"#),
            Duration::from_millis(200),
        );
        let classifier = classifier(completer, 10);

        let intent = classifier.classify("What are the risks for MB TOOL?").await;
        assert_eq!(intent.analysis_type, AnalysisType::RiskComparison);
    }

    #[tokio::test]
    async fn test_collaborator_failure_and_garbage_fall_back() {
        let failing = classifier(Scripted::new(Err("connection refused"), Duration::ZERO), 100);
        assert_eq!(
            failing.classify("Tell me about MB TOOL").await.analysis_type,
            AnalysisType::General
        );

        let garbage = classifier(Scripted::new(Ok("no idea"), Duration::ZERO), 100);
        assert_eq!(
            garbage.classify("Tell me about MB TOOL").await.query_type,
            QueryType::Company
        );
    }

    #[tokio::test]
    async fn test_empty_query_skips_model() {
        let completer = Scripted::new(Ok("{}"), Duration::ZERO);
        let classifier = classifier(completer.clone(), 100);

        assert_eq!(classifier.classify("").await.query_type, QueryType::Error);
        assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_error_type_is_rejected() {
        assert!(parse_model_intent(r#"{"query_type": "error"}"#).is_none());
        let intent = parse_model_intent(r#"{"query_type": "person"}"#).unwrap();
        assert_eq!(intent.analysis_type, AnalysisType::General);
    }
}
