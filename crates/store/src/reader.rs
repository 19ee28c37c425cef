use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use walkdir::WalkDir;

use crate::{StoreError, StoreResult};

pub struct JsonReader;

impl JsonReader {
    pub async fn read_file(path: &Path) -> StoreResult<Value> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        if extension != "json" {
            return Err(StoreError::Format {
                path: path.to_path_buf(),
                message: format!("unsupported file format: {}", extension),
            });
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|e| StoreError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// JSON files directly under `dir` whose name starts with `prefix`,
    /// in lexicographic order.
    pub fn list_family(dir: &Path, prefix: &str) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| StoreError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if name.starts_with(prefix) && name.ends_with(".json") {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    /// Load every file, skipping the ones that fail. Fails only when there
    /// were candidates and none of them could be loaded.
    pub async fn load_all(paths: &[PathBuf]) -> StoreResult<Vec<(PathBuf, Value)>> {
        let mut loaded = Vec::new();
        let mut last_error = None;

        for path in paths {
            match Self::read_file(path).await {
                Ok(value) => loaded.push((path.clone(), value)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable store file");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if loaded.is_empty() => Err(e),
            _ => Ok(loaded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_family_listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["internal_b.json", "internal_a.json", "internal_c.txt", "other.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let files = JsonReader::list_family(dir.path(), "internal_").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["internal_a.json", "internal_b.json"]);
    }

    #[tokio::test]
    async fn test_load_all_skips_bad_files_unless_all_fail() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.json");
        let bad = dir.path().join("b.json");
        std::fs::write(&good, r#"{"ok": true}"#).unwrap();
        std::fs::write(&bad, "{not json").unwrap();

        let loaded = JsonReader::load_all(&[good.clone(), bad.clone()]).await.unwrap();
        assert_eq!(loaded.len(), 1);

        let err = JsonReader::load_all(&[bad]).await.unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }
}
