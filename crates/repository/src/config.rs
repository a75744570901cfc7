//! Repository configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings shared by every repository built from one [`crate::ResourceRepositories`] context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
	/// Capacity of each in-memory library repository cache.
	pub library_cache_capacity: usize,
	pub disk_cache: DiskCacheConfig,
	/// Mixed into every disk cache fingerprint; bumping it invalidates all snapshots.
	pub cache_version: String,
	/// Project-relative directory holding user sample data.
	pub sample_data_dir: PathBuf,
	/// Build library repositories on worker threads.
	pub parallel_library_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskCacheConfig {
	pub enabled: bool,
	/// Root of the per-project cache directories. `None` uses the platform cache dir.
	pub directory: Option<PathBuf>,
}

impl Default for RepositoryConfig {
	fn default() -> Self {
		Self {
			library_cache_capacity: 64,
			disk_cache: DiskCacheConfig::default(),
			cache_version: env!("CARGO_PKG_VERSION").to_string(),
			sample_data_dir: PathBuf::from("sampledata"),
			parallel_library_loading: true,
		}
	}
}

impl Default for DiskCacheConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			directory: None,
		}
	}
}

impl DiskCacheConfig {
	/// Resolved cache root, or `None` if caching is disabled or no cache dir exists.
	pub fn resolved_directory(&self) -> Option<PathBuf> {
		if !self.enabled {
			return None;
		}
		self.directory
			.clone()
			.or_else(|| dirs::cache_dir().map(|d| d.join("resrepo")))
	}
}

impl RepositoryConfig {
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&text)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_partial_toml_keeps_defaults() {
		let config = RepositoryConfig::from_toml_str(
			r#"
library_cache_capacity = 8

[disk_cache]
enabled = false
"#,
		)
		.unwrap();
		assert_eq!(config.library_cache_capacity, 8);
		assert!(!config.disk_cache.enabled);
		assert_eq!(config.disk_cache.resolved_directory(), None);
		assert_eq!(config.sample_data_dir, PathBuf::from("sampledata"));
		assert!(config.parallel_library_loading);
	}

	#[test]
	fn test_invalid_toml() {
		assert!(matches!(
			RepositoryConfig::from_toml_str("library_cache_capacity = \"many\""),
			Err(ConfigError::Parse(_))
		));
	}

	#[test]
	fn test_load_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let err = RepositoryConfig::load(&dir.path().join("resrepo.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}
}
