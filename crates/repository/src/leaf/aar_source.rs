//! Repository over an extracted library: its `res/` folder plus symbol and visibility files.
//!
//! When the library has an `R.txt`, inline `@+id/` declarations are not scanned; the id names
//! come from the symbol file instead and are reported through `id_names`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use resrepo_model::{ResourceItem, ResourceNamespace, ResourceType, ResourceVisibility};
use resrepo_symbols::{PublicResources, SymbolTable};
use tracing::{debug, info_span, warn};

use super::LeafTable;
use crate::error::{RepositoryError, Result};
use crate::library::ExternalLibrary;
use crate::lock::{RepositoryDomain, TableGuard};
use crate::repository::{Repository, RepositoryKind, ResourceSource};
use crate::scan::{ScanContext, scan_directory};
use crate::table::{ResourceBucket, ResourceTable};

static MANIFEST_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"<manifest\b[^>]*?\bpackage\s*=\s*"([^"]+)""#).expect("manifest package pattern is valid")
});

pub struct AarSourceRepository {
	library_name: Arc<str>,
	res_folder: PathBuf,
	namespace: ResourceNamespace,
	package_name: Option<Arc<str>>,
	table: LeafTable,
	/// Ids declared in the symbol file; `None` without a symbol file.
	symbol_ids: Option<BTreeSet<Arc<str>>>,
}

impl AarSourceRepository {
	/// Scans `library`'s resource folder.
	///
	/// Fails if the library has no resource folder or it is not a local directory.
	pub fn create(domain: &RepositoryDomain, library: &ExternalLibrary, namespace: ResourceNamespace) -> Result<Repository> {
		let res_folder = library.res_folder.clone().ok_or_else(|| RepositoryError::MissingResourceFolder {
			library: library.name.to_string(),
		})?;
		if !res_folder.is_dir() {
			return Err(RepositoryError::NotLocalDirectory {
				library: library.name.to_string(),
				path: res_folder,
			});
		}
		let _span = info_span!("aar_source", library = %library.name).entered();

		let symbols = library.symbol_file_path().and_then(|path| match SymbolTable::read(&path) {
			Ok(symbols) => Some(symbols),
			Err(e) if e.is_not_found() => None,
			Err(e) => {
				warn!(library = %library.name, error = %e, "ignoring unreadable symbol file");
				None
			}
		});
		let ctx = ScanContext {
			namespace: namespace.clone(),
			library_name: Some(library.name.clone()),
			parse_inline_ids: symbols.is_none(),
		};
		let mut table = scan_directory(&res_folder, &ctx);
		apply_visibility(&mut table, library, &res_folder);

		let symbol_ids = symbols.map(|s| s.id_names().into_iter().map(Arc::from).collect::<BTreeSet<Arc<str>>>());
		let package_name = library.package_name.clone().or_else(|| manifest_package(&res_folder));
		debug!(
			items = table.item_count(),
			ids = symbol_ids.as_ref().map_or(0, BTreeSet::len),
			package = package_name.as_deref(),
			"loaded library resources"
		);

		let repo = Self {
			library_name: library.name.clone(),
			res_folder,
			namespace,
			package_name,
			table: LeafTable::new(table),
			symbol_ids,
		};
		Ok(Repository::new(domain, format!("aar:{}", library.name), RepositoryKind::AarSource(repo)))
	}

	pub fn res_folder(&self) -> &Path {
		&self.res_folder
	}

	/// Whether ids come from a symbol file rather than from inline declarations.
	pub fn has_symbol_file(&self) -> bool {
		self.symbol_ids.is_some()
	}
}

/// Marks items listed in `public.txt` public and every other item private.
///
/// Without a `public.txt` everything is public.
fn apply_visibility(table: &mut ResourceTable, library: &ExternalLibrary, res_folder: &Path) {
	let Some(root) = res_folder.parent() else {
		return;
	};
	let public = match PublicResources::read(&root.join("public.txt")) {
		Ok(public) => Some(public),
		Err(e) if e.is_not_found() => None,
		Err(e) => {
			warn!(library = %library.name, error = %e, "ignoring unreadable public.txt");
			return;
		}
	};
	let items: Vec<ResourceItem> = table
		.items()
		.map(|item| {
			let visibility = match &public {
				Some(p) if !p.is_public(item.res_type(), item.name()) => ResourceVisibility::Private,
				_ => ResourceVisibility::Public,
			};
			(**item).clone().with_visibility(visibility)
		})
		.collect();
	let mut rebuilt = ResourceTable::new();
	items.into_iter().for_each(|item| rebuilt.insert(item));
	*table = rebuilt;
}

fn manifest_package(res_folder: &Path) -> Option<Arc<str>> {
	let manifest = res_folder.parent()?.join("AndroidManifest.xml");
	let text = std::fs::read_to_string(manifest).ok()?;
	MANIFEST_PACKAGE.captures(&text).map(|c| Arc::from(&c[1]))
}

impl ResourceSource for AarSourceRepository {
	fn bucket(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace, res_type: ResourceType) -> Option<ResourceBucket> {
		self.table.bucket(namespace, res_type)
	}

	fn namespaces(&self, _guard: &TableGuard<'_>) -> BTreeSet<ResourceNamespace> {
		self.table.namespaces()
	}

	fn resource_types(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		self.table.resource_types(namespace)
	}

	fn resource_dirs(&self) -> Vec<PathBuf> {
		vec![self.res_folder.clone()]
	}

	fn modification_count(&self) -> u64 {
		self.table.modification_count()
	}

	fn id_names(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<Arc<str>> {
		match &self.symbol_ids {
			Some(ids) if *namespace == self.namespace => ids.clone(),
			_ => BTreeSet::new(),
		}
	}

	fn package_name(&self) -> Option<Arc<str>> {
		self.package_name.clone()
	}

	fn library_name(&self) -> Option<Arc<str>> {
		Some(self.library_name.clone())
	}
}

#[cfg(test)]
mod tests;
