use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::FilterSpec;
use crate::{Result, SshlessError};

/// Last target filters used by `sshless cmd`, reusable with `--cached-filters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCache {
    pub filters: Vec<FilterSpec>,
    pub saved_at: DateTime<Utc>,
}

impl FilterCache {
    pub fn new(filters: Vec<FilterSpec>) -> Self {
        Self {
            filters,
            saved_at: Utc::now(),
        }
    }

    /// Load the cache from disk, `None` if no filters were ever saved
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&cache_file_path())
    }

    /// Save the cache to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&cache_file_path())
    }

    fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let cache: FilterCache = serde_json::from_str(&content).map_err(|e| {
            SshlessError::StateCorrupted(format!("Failed to parse filter cache: {}", e))
        })?;

        Ok(Some(cache))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Get the path to the filter cache file
fn cache_file_path() -> PathBuf {
    // XDG state directory: ~/.local/state/sshless/filter.json
    let base_dir = ProjectDirs::from("", "", "sshless")
        .and_then(|dirs| dirs.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| {
            // Fallback to home directory
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".local")
                .join("state")
                .join("sshless")
        });

    base_dir.join("filter.json")
}

/// Persist the filters used for the current command (convenience function)
pub fn save_filters(filters: &[FilterSpec]) -> Result<()> {
    FilterCache::new(filters.to_vec()).save()
}

/// Load previously saved filters (convenience function)
pub fn load_filters() -> Result<Option<Vec<FilterSpec>>> {
    Ok(FilterCache::load()?.map(|cache| cache.filters))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");

        let cache = FilterCache::new(vec![FilterSpec::name_tag("web")]);
        cache.save_to(&path).unwrap();

        let loaded = FilterCache::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded.filters, cache.filters);
    }

    #[test]
    fn test_load_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");

        assert!(FilterCache::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupted_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FilterCache::load_from(&path),
            Err(SshlessError::StateCorrupted(_))
        ));
    }
}
