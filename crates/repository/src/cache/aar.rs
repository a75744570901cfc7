//! Process-wide cache of library repositories.

use std::path::PathBuf;

use resrepo_model::ResourceNamespace;
use tracing::debug;

use super::SingleflightCache;
use crate::error::{RepositoryError, Result};
use crate::leaf::{AarProtoRepository, AarSourceRepository};
use crate::library::ExternalLibrary;
use crate::lock::RepositoryDomain;
use crate::repository::Repository;

/// Library repositories keyed by their resource folder or archive path.
///
/// Each library is loaded at most once at a time, however many modules ask for it.
#[derive(Debug)]
pub struct AarRepositoryCache {
	source: SingleflightCache<PathBuf, Repository>,
	compiled: SingleflightCache<PathBuf, Repository>,
}

impl AarRepositoryCache {
	pub fn new(capacity: usize) -> Self {
		let log_eviction = |path: &PathBuf, repo: &Repository| {
			debug!(path = %path.display(), repository = %repo.name(), "library repository evicted");
		};
		Self {
			source: SingleflightCache::new(capacity).with_eviction_callback(log_eviction),
			compiled: SingleflightCache::new(capacity).with_eviction_callback(log_eviction),
		}
	}

	/// Repository for `library`, preferring the compiled archive when it has one.
	pub fn get(&self, domain: &RepositoryDomain, library: &ExternalLibrary, namespace: &ResourceNamespace) -> Result<Repository> {
		if library.res_apk.is_some() {
			self.get_compiled(domain, library, namespace)
		} else {
			self.get_source(domain, library, namespace)
		}
	}

	pub fn get_source(
		&self,
		domain: &RepositoryDomain,
		library: &ExternalLibrary,
		namespace: &ResourceNamespace,
	) -> Result<Repository> {
		let key = library.res_folder.clone().ok_or_else(|| RepositoryError::MissingResourceFolder {
			library: library.name.to_string(),
		})?;
		self.source.get_or_create(&key, || {
			AarSourceRepository::create(domain, library, namespace.clone())
		})
	}

	pub fn get_compiled(
		&self,
		domain: &RepositoryDomain,
		library: &ExternalLibrary,
		namespace: &ResourceNamespace,
	) -> Result<Repository> {
		let key = library.res_apk.clone().ok_or_else(|| RepositoryError::MissingResourceApk {
			library: library.name.to_string(),
		})?;
		self.compiled.get_or_create(&key, || {
			AarProtoRepository::create(domain, library, namespace.clone())
		})
	}

	/// Drops the cached repositories of `library`; the next request reloads it.
	pub fn invalidate(&self, library: &ExternalLibrary) {
		if let Some(folder) = &library.res_folder {
			self.source.invalidate(folder);
		}
		if let Some(apk) = &library.res_apk {
			self.compiled.invalidate(apk);
		}
	}

	pub fn invalidate_all(&self) {
		self.source.invalidate_all();
		self.compiled.invalidate_all();
	}

	pub fn len(&self) -> usize {
		self.source.len() + self.compiled.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	#[test]
	fn test_same_library_shared_until_invalidated() {
		let dir = tempfile::tempdir().unwrap();
		let res = dir.path().join("res");
		fs::create_dir_all(res.join("values")).unwrap();
		fs::write(res.join("values/v.xml"), r#"<resources><bool name="on">true</bool></resources>"#).unwrap();
		let library = ExternalLibrary::new("lib").with_res_folder(&res);
		let domain = RepositoryDomain::new();
		let cache = AarRepositoryCache::new(4);
		let ns = ResourceNamespace::ResAuto;

		let first = cache.get(&domain, &library, &ns).unwrap();
		let second = cache.get(&domain, &library, &ns).unwrap();
		assert_eq!(first, second);
		assert_eq!(cache.len(), 1);

		cache.invalidate(&library);
		let third = cache.get(&domain, &library, &ns).unwrap();
		assert_ne!(first, third);
	}

	#[test]
	fn test_errors_are_not_cached() {
		let cache = AarRepositoryCache::new(4);
		let library = ExternalLibrary::new("lib").with_res_folder("/nonexistent/res");
		let err = cache
			.get(&RepositoryDomain::new(), &library, &ResourceNamespace::ResAuto)
			.unwrap_err();
		assert!(matches!(err, RepositoryError::NotLocalDirectory { .. }));
		assert!(cache.is_empty());
	}
}
