pub mod assisted;
pub mod cache;
pub mod classifier;
pub mod keywords;
pub mod llm;
pub mod names;
pub mod prompt;
pub mod schema;

pub use assisted::AssistedClassifier;
pub use cache::{CacheStats, IntentCache};
pub use classifier::{IntentClassifier, KeywordClassifier, classify};
pub use keywords::KeywordTable;
pub use llm::{OllamaCompleter, TextCompleter};
pub use names::extract_company_name;
pub use schema::{AnalysisType, Intent, QueryType};
