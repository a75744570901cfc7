//! Maps generated `R` class names back to the repository that generates them.
//!
//! Every module and library registers the package of its generated class. Lookups resolve a
//! fully-qualified name such as `com.example.R$string` to the package owner. Two distinct
//! owners claiming one package is an error for that lookup, never a silent pick.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{RepositoryError, Result};
use crate::model::ModuleId;
use crate::repository::Repository;

#[derive(Debug, Clone)]
struct PackageClaim {
	owner: Arc<str>,
	registrant: ModuleId,
	repository: Repository,
}

/// The repository responsible for one generated package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGenerator {
	pub package: Arc<str>,
	pub owner: Arc<str>,
	pub repository: Repository,
}

#[derive(Debug, Default)]
pub struct ResourceClassRegistry {
	packages: RwLock<FxHashMap<Arc<str>, Vec<PackageClaim>>>,
}

impl ResourceClassRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records that `owner`, reached through `registrant`, generates `package`.
	///
	/// Registering the same owner twice for one registrant replaces the earlier claim.
	pub fn add(&self, package: &str, owner: &str, registrant: &ModuleId, repository: Repository) {
		let mut packages = self.packages.write();
		let claims = packages.entry(Arc::from(package)).or_default();
		claims.retain(|c| !(&*c.owner == owner && &c.registrant == registrant));
		claims.push(PackageClaim {
			owner: Arc::from(owner),
			registrant: registrant.clone(),
			repository,
		});
		if claims.iter().any(|c| &*c.owner != owner) {
			warn!(package, owner, "generated package claimed by more than one owner");
		}
		debug!(package, owner, registrant = %registrant, "registered generated package");
	}

	/// Drops every claim made through `registrant`.
	pub fn remove_registrant(&self, registrant: &ModuleId) {
		let mut packages = self.packages.write();
		packages.retain(|_, claims| {
			claims.retain(|c| &c.registrant != registrant);
			!claims.is_empty()
		});
	}

	pub fn clear(&self) {
		self.packages.write().clear();
	}

	/// Packages with at least one claim, sorted.
	pub fn packages(&self) -> Vec<Arc<str>> {
		let mut packages: Vec<_> = self.packages.read().keys().cloned().collect();
		packages.sort();
		packages
	}

	/// Generator of the `R` class (or nested class) named `class_name`.
	///
	/// `Ok(None)` if the name is not an `R` class or nobody claims its package. Fails with
	/// [`RepositoryError::AmbiguousPackage`] if two different owners claim the package.
	pub fn find_class_generator(&self, class_name: &str) -> Result<Option<ClassGenerator>> {
		let Some(package) = r_class_package(class_name) else {
			return Ok(None);
		};
		let packages = self.packages.read();
		let Some(claims) = packages.get(package) else {
			return Ok(None);
		};
		let Some(first) = claims.first() else {
			return Ok(None);
		};
		if let Some(other) = claims.iter().find(|c| c.owner != first.owner) {
			return Err(RepositoryError::AmbiguousPackage {
				package: package.to_string(),
				first: first.owner.to_string(),
				second: other.owner.to_string(),
			});
		}
		Ok(Some(ClassGenerator {
			package: Arc::from(package),
			owner: first.owner.clone(),
			repository: first.repository.clone(),
		}))
	}
}

/// Package of `pkg.R`, `pkg.R$type` or `pkg.R.type`.
fn r_class_package(class_name: &str) -> Option<&str> {
	let (outer, nested) = match class_name.split_once('$') {
		Some((outer, _)) => (outer, true),
		None => (class_name, false),
	};
	let (package, simple) = outer.rsplit_once('.')?;
	if simple == "R" {
		return (!package.is_empty()).then_some(package);
	}
	if nested {
		return None;
	}
	let (package, r) = package.rsplit_once('.')?;
	(r == "R" && !package.is_empty()).then_some(package)
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;
	use crate::lock::RepositoryDomain;

	#[rstest]
	#[case("com.example.R", Some("com.example"))]
	#[case("com.example.R$string", Some("com.example"))]
	#[case("com.example.R.string", Some("com.example"))]
	#[case("com.example.Main", None)]
	#[case("com.example.Main$R", None)]
	#[case("R", None)]
	fn test_r_class_package(#[case] name: &str, #[case] expected: Option<&str>) {
		assert_eq!(r_class_package(name), expected);
	}

	#[test]
	fn test_lookup_and_ambiguity() {
		let domain = RepositoryDomain::new();
		let app = ModuleId::new("app");
		let lib = ModuleId::new("lib");
		let registry = ResourceClassRegistry::new();
		let repo_a = Repository::empty(&domain, "a");
		let repo_b = Repository::empty(&domain, "b");

		registry.add("com.shared", "libA", &app, repo_a.clone());
		registry.add("com.shared", "libA", &lib, repo_a.clone());
		let generator = registry.find_class_generator("com.shared.R$id").unwrap().unwrap();
		assert_eq!(&*generator.owner, "libA");
		assert_eq!(generator.repository, repo_a);

		registry.add("com.shared", "libB", &lib, repo_b);
		let err = registry.find_class_generator("com.shared.R").unwrap_err();
		assert!(matches!(err, RepositoryError::AmbiguousPackage { ref package, .. } if package == "com.shared"));

		registry.remove_registrant(&lib);
		assert!(registry.find_class_generator("com.shared.R").unwrap().is_some());
		assert!(registry.find_class_generator("com.other.R").unwrap().is_none());
		assert!(registry.find_class_generator("com.shared.Other").unwrap().is_none());
	}
}
