use anyhow::{Context, Result};
use intent::KeywordTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "COMPANY_INTEL_CONFIG";
const ENV_DATA_DIR: &str = "COMPANY_INTEL_DATA_DIR";
const ENV_BIND: &str = "COMPANY_INTEL_BIND";
const ENV_LLM_URL: &str = "COMPANY_INTEL_LLM_URL";
const ENV_LLM_MODEL: &str = "COMPANY_INTEL_LLM_MODEL";
const ENV_LLM_TIMEOUT_MS: &str = "COMPANY_INTEL_LLM_TIMEOUT_MS";
const ENV_CLASSIFIER: &str = "COMPANY_INTEL_CLASSIFIER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind: String,
    pub classifier: ClassifierMode,
    pub llm: LlmConfig,
    pub checkpoints: CheckpointConfig,
    pub keywords: KeywordTable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    Keyword,  // Keyword table only, no text-generation calls
    Assisted, // Model first, keyword table on failure
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub cache_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub enabled: bool,
    pub max_conversations: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_ms: 5000,
            cache_entries: 10000,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_conversations: 1000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::offline()
    }
}

impl AppConfig {
    pub fn offline() -> Self {
        Self {
            data_dir: PathBuf::from("demo_data"),
            bind: "0.0.0.0:3000".to_string(),
            classifier: ClassifierMode::Keyword,
            llm: LlmConfig::default(),
            checkpoints: CheckpointConfig::default(),
            keywords: KeywordTable::default(),
        }
    }

    pub fn assisted() -> Self {
        Self {
            classifier: ClassifierMode::Assisted,
            llm: LlmConfig {
                timeout_ms: 10000,
                ..LlmConfig::default()
            },
            ..Self::offline()
        }
    }

    /// Defaults, then the JSON file (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(url) = lookup(ENV_LLM_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            self.llm.model = model;
        }
        if let Some(timeout) = lookup(ENV_LLM_TIMEOUT_MS) {
            self.llm.timeout_ms = timeout
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds", ENV_LLM_TIMEOUT_MS))?;
        }
        if let Some(mode) = lookup(ENV_CLASSIFIER) {
            self.classifier = match mode.trim().to_lowercase().as_str() {
                "keyword" => ClassifierMode::Keyword,
                "assisted" => ClassifierMode::Assisted,
                other => anyhow::bail!("{} must be 'keyword' or 'assisted', got '{}'", ENV_CLASSIFIER, other),
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"data_dir": "/srv/companies", "llm": {"model": "mistral"}}"#)
            .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/companies"));
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.timeout_ms, 5000);
        assert_eq!(config.classifier, ClassifierMode::Keyword);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CLASSIFIER, "Assisted"),
            (ENV_LLM_TIMEOUT_MS, "250"),
            (ENV_BIND, "127.0.0.1:8080"),
        ]);
        let mut config = AppConfig::offline();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.classifier, ClassifierMode::Assisted);
        assert_eq!(config.llm.timeout_ms, 250);
        assert_eq!(config.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_bad_env_values_are_rejected() {
        let mut config = AppConfig::offline();
        assert!(config.apply_env(|key| (key == ENV_LLM_TIMEOUT_MS).then(|| "soon".to_string())).is_err());
        assert!(config.apply_env(|key| (key == ENV_CLASSIFIER).then(|| "magic".to_string())).is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(AppConfig::assisted().classifier, ClassifierMode::Assisted);
        assert_eq!(AppConfig::offline().classifier, ClassifierMode::Keyword);
    }
}
