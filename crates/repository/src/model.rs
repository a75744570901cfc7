//! What the repositories consume from the host's project model.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use resrepo_model::ResourceNamespace;

use crate::leaf::DynamicValueProvider;
use crate::library::ExternalLibrary;

/// Stable identifier of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ModuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Whether a module's resources live in their own package namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Namespacing {
	/// Everything shares `res-auto`.
	#[default]
	Disabled,
	Required,
}

/// Snapshot of one module as seen by the resource layer.
#[derive(Clone)]
pub struct ModuleInfo {
	pub id: ModuleId,
	pub root: PathBuf,
	pub package_name: Option<Arc<str>>,
	pub namespacing: Namespacing,
	/// Resource folders, highest priority first.
	pub resource_dirs: Vec<PathBuf>,
	pub test_resource_dirs: Vec<PathBuf>,
	/// Local module dependencies, most specific first.
	pub dependencies: Vec<ModuleId>,
	pub libraries: Vec<ExternalLibrary>,
	pub dynamic_values: Option<Arc<dyn DynamicValueProvider>>,
}

impl fmt::Debug for ModuleInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModuleInfo")
			.field("id", &self.id)
			.field("root", &self.root)
			.field("package_name", &self.package_name)
			.field("namespacing", &self.namespacing)
			.field("resource_dirs", &self.resource_dirs)
			.field("test_resource_dirs", &self.test_resource_dirs)
			.field("dependencies", &self.dependencies)
			.field("libraries", &self.libraries)
			.field("dynamic_values", &self.dynamic_values.is_some())
			.finish()
	}
}

impl ModuleInfo {
	pub fn new(id: impl Into<Arc<str>>, root: impl Into<PathBuf>) -> Self {
		Self {
			id: ModuleId::new(id),
			root: root.into(),
			package_name: None,
			namespacing: Namespacing::Disabled,
			resource_dirs: Vec::new(),
			test_resource_dirs: Vec::new(),
			dependencies: Vec::new(),
			libraries: Vec::new(),
			dynamic_values: None,
		}
	}

	pub fn with_package_name(mut self, package: impl Into<Arc<str>>) -> Self {
		self.package_name = Some(package.into());
		self
	}

	pub fn with_namespacing(mut self, namespacing: Namespacing) -> Self {
		self.namespacing = namespacing;
		self
	}

	pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.resource_dirs.push(dir.into());
		self
	}

	pub fn with_test_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.test_resource_dirs.push(dir.into());
		self
	}

	pub fn with_dependency(mut self, module: impl Into<Arc<str>>) -> Self {
		self.dependencies.push(ModuleId::new(module));
		self
	}

	pub fn with_library(mut self, library: ExternalLibrary) -> Self {
		self.libraries.push(library);
		self
	}

	pub fn with_dynamic_values(mut self, provider: Arc<dyn DynamicValueProvider>) -> Self {
		self.dynamic_values = Some(provider);
		self
	}

	/// Namespace of this module's own resources.
	pub fn namespace(&self) -> ResourceNamespace {
		match (&self.namespacing, &self.package_name) {
			(Namespacing::Required, Some(package)) => ResourceNamespace::from_package_name(package),
			_ => ResourceNamespace::ResAuto,
		}
	}
}

/// Host project model.
pub trait ProjectModel: Send + Sync {
	fn project_root(&self) -> &Path;

	fn module(&self, id: &ModuleId) -> Option<ModuleInfo>;

	fn modules(&self) -> Vec<ModuleId>;
}

/// Notifications from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
	/// Source roots or dependencies changed.
	RootsChanged,
	SyncCompleted { success: bool },
	BuildVariantChanged,
	/// A file was created, modified or deleted.
	FileChanged(PathBuf),
}

/// [`ProjectModel`] kept in memory, for hosts that push module snapshots and for tests.
#[derive(Debug)]
pub struct InMemoryProjectModel {
	root: PathBuf,
	modules: RwLock<IndexMap<ModuleId, ModuleInfo>>,
}

impl InMemoryProjectModel {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			modules: RwLock::new(IndexMap::new()),
		}
	}

	/// Adds or replaces a module.
	pub fn set_module(&self, module: ModuleInfo) {
		self.modules.write().insert(module.id.clone(), module);
	}

	pub fn remove_module(&self, id: &ModuleId) -> Option<ModuleInfo> {
		self.modules.write().shift_remove(id)
	}
}

impl ProjectModel for InMemoryProjectModel {
	fn project_root(&self) -> &Path {
		&self.root
	}

	fn module(&self, id: &ModuleId) -> Option<ModuleInfo> {
		self.modules.read().get(id).cloned()
	}

	fn modules(&self) -> Vec<ModuleId> {
		self.modules.read().keys().cloned().collect()
	}
}
