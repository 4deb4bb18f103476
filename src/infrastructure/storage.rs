use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::error::{AppError, Result};

pub fn ensure_data_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(data_dir)?;
    Ok(data_dir.to_path_buf())
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Append-only history kept as one pretty-printed JSON array on disk.
///
/// The whole file is read, extended and rewritten on every append. Entries
/// are carried as raw JSON between load and rewrite, so fields this build
/// does not know about survive.
pub struct JsonHistoryStore<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonHistoryStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry in file order. Missing or unreadable files are empty
    /// histories; entries that do not fit `T` are skipped.
    pub fn load(&self) -> Vec<T> {
        self.load_raw()
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        index,
                        error = %e,
                        "Skipping malformed history entry"
                    );
                    None
                }
            })
            .collect()
    }

    pub fn append(&self, entry: &T) -> Result<()> {
        self.append_all(std::slice::from_ref(entry))
    }

    pub fn append_all(&self, entries: &[T]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Internal("history store lock poisoned".to_string()))?;

        let mut history = self.load_raw();
        for entry in entries {
            let value = serde_json::to_value(entry)
                .map_err(|e| AppError::Internal(format!("Failed to serialize entry: {}", e)))?;
            history.push(value);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(&history)
            .map_err(|e| AppError::Internal(format!("Failed to encode history: {}", e)))?;
        fs::write(&self.path, body)?;

        tracing::debug!(
            path = %self.path.display(),
            appended = entries.len(),
            total = history.len(),
            "History saved"
        );
        Ok(())
    }

    fn load_raw(&self) -> Vec<Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "History file unreadable; starting empty");
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History file is not a JSON array; it will be overwritten on next save"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run_metrics::RunMetrics;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store: JsonHistoryStore<RunMetrics> = JsonHistoryStore::new(dir.path().join("metrics.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_append_then_load() {
        let dir = tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("nested").join("metrics.json"));

        let first = RunMetrics {
            file_name: Some("a.txt".to_string()),
            success: Some(true),
            ..Default::default()
        };
        let second = RunMetrics {
            file_name: Some("b.pdf".to_string()),
            success: Some(false),
            ..Default::default()
        };
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let history: Vec<RunMetrics> = store.load();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].file_name.as_deref(), Some("a.txt"));
        assert_eq!(history[1].success, Some(false));
    }

    #[test]
    fn test_corrupt_file_is_empty_and_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, "{ not json").unwrap();

        let store: JsonHistoryStore<RunMetrics> = JsonHistoryStore::new(&path);
        assert!(store.load().is_empty());

        store.append(&RunMetrics::default()).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, r#"[{"file_name": "old.txt", "operator": "qa-team"}]"#).unwrap();

        let store: JsonHistoryStore<RunMetrics> = JsonHistoryStore::new(&path);
        store.append(&RunMetrics::default()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("qa-team"));
        assert_eq!(store.load().len(), 2);
    }
}
