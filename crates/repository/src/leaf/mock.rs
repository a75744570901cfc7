//! Test-only repository over a fixture directory or an explicit item list.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use resrepo_model::{
	FolderConfiguration, FolderType, ResourceItem, ResourceNamespace, ResourcePath, ResourceReference, ResourceType,
	ResourceValue, SourceLocator,
};

use super::LeafTable;
use crate::lock::{RepositoryDomain, TableGuard};
use crate::repository::{Repository, RepositoryKind, ResourceSource};
use crate::table::{ResourceBucket, ResourceTable};

pub struct MockRepository {
	root: Option<PathBuf>,
	table: LeafTable,
}

impl MockRepository {
	/// Every file under `root` becomes one item.
	///
	/// The type comes from the parent folder name when it is a resource folder, `raw`
	/// otherwise. The name is the file stem.
	pub fn from_directory(domain: &RepositoryDomain, root: impl Into<PathBuf>, namespace: ResourceNamespace) -> Repository {
		let root = root.into();
		let mut table = ResourceTable::new();
		for path in data_files(&root) {
			let res_type = path
				.parent()
				.and_then(Path::file_name)
				.and_then(|n| n.to_str())
				.and_then(FolderType::parse_folder_name)
				.and_then(|(folder, _)| folder.file_resource_type())
				.unwrap_or(ResourceType::Raw);
			let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
				continue;
			};
			let item = ResourceItem::new(
				ResourceReference::new(namespace.clone(), res_type, name),
				FolderConfiguration::default(),
				SourceLocator::File(path.clone()),
			)
			.with_value(ResourceValue::File(ResourcePath::Plain(path.clone())));
			table.insert(item);
		}
		let name = format!("mock:{}", root.display());
		let repo = Self {
			root: Some(root),
			table: LeafTable::new(table),
		};
		Repository::new(domain, name, RepositoryKind::Mock(repo))
	}

	/// Repository holding exactly `items`, in order.
	pub fn from_items(
		domain: &RepositoryDomain,
		name: impl Into<String>,
		items: impl IntoIterator<Item = ResourceItem>,
	) -> Repository {
		let mut table = ResourceTable::new();
		items.into_iter().for_each(|item| table.insert(item));
		let repo = Self {
			root: None,
			table: LeafTable::new(table),
		};
		Repository::new(domain, name, RepositoryKind::Mock(repo))
	}

	/// Adds `item` and bumps the counter.
	pub(crate) fn add(&self, _guard: &TableGuard<'_>, item: ResourceItem) {
		self.table.update(|t| t.insert(item));
	}
}

fn data_files(root: &Path) -> Vec<PathBuf> {
	let mut files: Vec<PathBuf> = WalkBuilder::new(root)
		.standard_filters(false)
		.hidden(true)
		.build()
		.filter_map(Result::ok)
		.filter(|e| e.file_type().is_some_and(|t| t.is_file()))
		.map(|e| e.into_path())
		.collect();
	files.sort();
	files
}

impl ResourceSource for MockRepository {
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
		self.root.iter().cloned().collect()
	}

	fn modification_count(&self) -> u64 {
		self.table.modification_count()
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	#[test]
	fn test_directory_fixture() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir_all(dir.path().join("drawable")).unwrap();
		fs::create_dir_all(dir.path().join("data")).unwrap();
		fs::write(dir.path().join("drawable/logo.png"), b"png").unwrap();
		fs::write(dir.path().join("data/users.csv"), b"a,b").unwrap();

		let ns = ResourceNamespace::ResAuto;
		let repo = MockRepository::from_directory(&RepositoryDomain::new(), dir.path(), ns.clone());
		assert!(repo.has_resources(&ns, ResourceType::Drawable, "logo"));
		assert!(repo.has_resources(&ns, ResourceType::Raw, "users"));
		assert_eq!(repo.resource_dirs(), vec![dir.path().to_path_buf()]);
	}
}
