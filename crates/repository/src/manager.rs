//! Per-module repository managers and the process-wide context owning them.
//!
//! # Role
//!
//! [`ResourceRepositories`] is created once per project. It owns the lock domain, the shared
//! folder repositories, the library repository cache, the disk cache and the generated-class
//! registry. [`ResourceRepositoryManager`] is a cheap handle to one module's lazily built
//! nodes:
//!
//! | Node | Children, highest priority first |
//! |---|---|
//! | module | resource folders, dynamic values, sample data |
//! | project | module node, then each dependency's project node |
//! | app | project node, then library repositories |
//! | test | test resource folders, then the app node |
//!
//! # Invariants
//!
//! - Nodes are built without holding the manager's slot lock, then installed only if the slot
//!   is still empty; a losing build is disposed.
//! - Folder repositories are shared per directory across modules.
//! - Dependency cycles between modules are cut, never followed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use resrepo_model::{ResourceItem, ResourceNamespace};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, info_span, warn};

use crate::cache::{AarRepositoryCache, DiskCache};
use crate::class_registry::{ClassGenerator, ResourceClassRegistry};
use crate::composite::CompositeRepository;
use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::leaf::{BuiltinSampleDataRepository, DynamicRepository, FolderRepository, SampleDataRepository};
use crate::library::ExternalLibrary;
use crate::lock::RepositoryDomain;
use crate::model::{ModuleId, ModuleInfo, Namespacing, ProjectEvent, ProjectModel};
use crate::repository::{Repository, RepositoryKind};
use crate::visitor::VisitResult;

struct Shared {
	domain: RepositoryDomain,
	model: Arc<dyn ProjectModel>,
	config: RepositoryConfig,
	managers: Mutex<FxHashMap<ModuleId, Arc<ManagerState>>>,
	folders: Mutex<FxHashMap<PathBuf, Repository>>,
	libraries: AarRepositoryCache,
	disk_cache: Option<DiskCache>,
	class_registry: ResourceClassRegistry,
}

/// Process-wide resource repository context for one project.
#[derive(Clone)]
pub struct ResourceRepositories {
	shared: Arc<Shared>,
}

impl ResourceRepositories {
	pub fn new(model: Arc<dyn ProjectModel>, config: RepositoryConfig) -> Self {
		let disk_cache = config
			.disk_cache
			.resolved_directory()
			.map(|dir| DiskCache::for_project(&dir, model.project_root(), config.cache_version.clone()));
		let libraries = AarRepositoryCache::new(config.library_cache_capacity);
		Self {
			shared: Arc::new(Shared {
				domain: RepositoryDomain::new(),
				model,
				config,
				managers: Mutex::new(FxHashMap::default()),
				folders: Mutex::new(FxHashMap::default()),
				libraries,
				disk_cache,
				class_registry: ResourceClassRegistry::new(),
			}),
		}
	}

	pub fn domain(&self) -> &RepositoryDomain {
		&self.shared.domain
	}

	pub fn config(&self) -> &RepositoryConfig {
		&self.shared.config
	}

	pub fn class_registry(&self) -> &ResourceClassRegistry {
		&self.shared.class_registry
	}

	pub fn library_cache(&self) -> &AarRepositoryCache {
		&self.shared.libraries
	}

	pub fn disk_cache(&self) -> Option<&DiskCache> {
		self.shared.disk_cache.as_ref()
	}

	/// Manager of `module`, or `None` if the project model does not know it.
	pub fn manager(&self, module: &ModuleId) -> Option<ResourceRepositoryManager> {
		self.shared.model.module(module)?;
		let state = self
			.shared
			.managers
			.lock()
			.entry(module.clone())
			.or_insert_with(|| Arc::new(ManagerState::new(module.clone())))
			.clone();
		Some(ResourceRepositoryManager {
			shared: self.shared.clone(),
			state,
		})
	}

	/// Resolves a generated `R` class name. See [`ResourceClassRegistry::find_class_generator`].
	pub fn find_class_generator(&self, class_name: &str) -> Result<Option<ClassGenerator>> {
		self.shared.class_registry.find_class_generator(class_name)
	}

	/// Folder repositories currently shared, by directory.
	pub fn folder_repositories(&self) -> Vec<Repository> {
		let mut folders: Vec<(PathBuf, Repository)> =
			self.shared.folders.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
		folders.sort_by(|a, b| a.0.cmp(&b.0));
		folders.into_iter().map(|(_, repo)| repo).collect()
	}

	/// Applies a host notification. Returns whether any repository was affected.
	pub fn handle_event(&self, event: &ProjectEvent) -> bool {
		debug!(?event, "project event");
		match event {
			ProjectEvent::RootsChanged => {
				self.roots_changed();
				true
			}
			ProjectEvent::SyncCompleted { success } => {
				for manager in self.managers() {
					manager.sync_completed();
				}
				if *success {
					self.roots_changed();
				}
				true
			}
			ProjectEvent::BuildVariantChanged => {
				for manager in self.managers() {
					manager.reset();
				}
				self.prune_folders();
				true
			}
			ProjectEvent::FileChanged(path) => self.file_changed(path),
		}
	}

	/// Refreshes `module` and every module whose project node includes it.
	pub fn refresh_module(&self, module: &ModuleId) {
		let mut affected: FxHashSet<ModuleId> = FxHashSet::default();
		affected.insert(module.clone());
		let modules = self.shared.model.modules();
		loop {
			let before = affected.len();
			for id in &modules {
				let Some(info) = self.shared.model.module(id) else {
					continue;
				};
				if info.dependencies.iter().any(|d| affected.contains(d)) {
					affected.insert(id.clone());
				}
			}
			if affected.len() == before {
				break;
			}
		}
		let states: Vec<_> = {
			let managers = self.shared.managers.lock();
			affected.iter().filter_map(|id| managers.get(id).cloned()).collect()
		};
		for state in states {
			self.handle(state).reset();
		}
	}

	/// Drops every node, flushes folder snapshots and clears the caches.
	pub fn dispose(&self) {
		let managers: Vec<_> = self.shared.managers.lock().drain().map(|(_, state)| state).collect();
		for state in managers {
			self.handle(state).reset();
		}
		let folders: Vec<Repository> = self.shared.folders.lock().drain().map(|(_, repo)| repo).collect();
		for folder in folders {
			folder.dispose();
		}
		self.shared.libraries.invalidate_all();
		self.shared.class_registry.clear();
		info!("resource repositories disposed");
	}

	fn handle(&self, state: Arc<ManagerState>) -> ResourceRepositoryManager {
		ResourceRepositoryManager {
			shared: self.shared.clone(),
			state,
		}
	}

	fn managers(&self) -> Vec<ResourceRepositoryManager> {
		let states: Vec<_> = self.shared.managers.lock().values().cloned().collect();
		states.into_iter().map(|state| self.handle(state)).collect()
	}

	fn roots_changed(&self) {
		let _span = info_span!("roots_changed").entered();
		let known: FxHashSet<ModuleId> = self.shared.model.modules().into_iter().collect();
		let removed: Vec<Arc<ManagerState>> = {
			let mut managers = self.shared.managers.lock();
			let removed = managers
				.iter()
				.filter(|(id, _)| !known.contains(*id))
				.map(|(_, state)| state.clone())
				.collect();
			managers.retain(|id, _| known.contains(id));
			removed
		};
		for state in removed {
			info!(module = %state.module, "module removed");
			self.handle(state).reset();
		}
		for manager in self.managers() {
			manager.update_children();
		}
		self.prune_folders();
	}

	/// Disposes folder repositories no module references anymore.
	fn prune_folders(&self) {
		let mut referenced: FxHashSet<PathBuf> = FxHashSet::default();
		for id in self.shared.model.modules() {
			if let Some(info) = self.shared.model.module(&id) {
				referenced.extend(info.resource_dirs);
				referenced.extend(info.test_resource_dirs);
			}
		}
		let dropped: Vec<Repository> = {
			let mut folders = self.shared.folders.lock();
			let stale: Vec<PathBuf> = folders.keys().filter(|dir| !referenced.contains(*dir)).cloned().collect();
			stale.iter().filter_map(|dir| folders.remove(dir)).collect()
		};
		for folder in dropped {
			debug!(repository = %folder.name(), "dropping unreferenced folder repository");
			folder.dispose();
		}
	}

	fn file_changed(&self, path: &Path) -> bool {
		let folders: Vec<Repository> = self.shared.folders.lock().values().cloned().collect();
		let mut changed = false;
		for folder in folders {
			changed |= folder.rescan_file(path);
		}
		for manager in self.managers() {
			if let Some(sample) = manager.state.slots.lock().project_sample.clone() {
				changed |= sample.rescan_file(path);
			}
		}
		changed
	}
}

#[derive(Default)]
struct Slots {
	module: Option<Repository>,
	project: Option<Repository>,
	app: Option<Repository>,
	test: Option<Repository>,
	sample: Option<Repository>,
	project_sample: Option<Repository>,
	dynamic: Option<Repository>,
}

impl Slots {
	fn take_all(&mut self) -> Vec<Repository> {
		[
			self.test.take(),
			self.app.take(),
			self.project.take(),
			self.module.take(),
			self.sample.take(),
			self.project_sample.take(),
			self.dynamic.take(),
		]
		.into_iter()
		.flatten()
		.collect()
	}
}

/// Locales found in a project node, tagged with the node and counter they were computed at.
struct LocaleCache {
	repository: Repository,
	modification_count: u64,
	locales: BTreeSet<String>,
}

struct ManagerState {
	module: ModuleId,
	slots: Mutex<Slots>,
	locales: Mutex<Option<LocaleCache>>,
}

impl ManagerState {
	fn new(module: ModuleId) -> Self {
		Self {
			module,
			slots: Mutex::new(Slots::default()),
			locales: Mutex::new(None),
		}
	}
}

/// Handle to one module's repositories.
#[derive(Clone)]
pub struct ResourceRepositoryManager {
	shared: Arc<Shared>,
	state: Arc<ManagerState>,
}

impl std::fmt::Debug for ResourceRepositoryManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResourceRepositoryManager")
			.field("module", &self.state.module)
			.finish()
	}
}

impl ResourceRepositoryManager {
	pub fn module_id(&self) -> &ModuleId {
		&self.state.module
	}

	/// Current module snapshot. A module gone from the model reads as an empty module.
	fn info(&self) -> ModuleInfo {
		self.shared
			.model
			.module(&self.state.module)
			.unwrap_or_else(|| ModuleInfo::new(self.state.module.as_str(), PathBuf::new()))
	}

	/// Namespace of this module's own resources.
	pub fn namespace(&self) -> ResourceNamespace {
		self.info().namespace()
	}

	/// This module's own resources plus sample data.
	pub fn module_resources(&self) -> Repository {
		if let Some(repo) = self.state.slots.lock().module.clone() {
			return repo;
		}
		let info = self.info();
		let sample = self.sample_data_resources();
		let dynamic = self.dynamic_repository(&info);
		let repo = self.composite(format!("module:{}", info.id), info.package_name.clone());
		repo.set_children(self.module_children(&info, dynamic, sample));
		self.install(|s| &mut s.module, repo)
	}

	/// Module resources merged with those of local module dependencies.
	pub fn project_resources(&self) -> Repository {
		let mut visiting = FxHashSet::default();
		self.project_resources_visiting(&mut visiting)
	}

	fn project_resources_visiting(&self, visiting: &mut FxHashSet<ModuleId>) -> Repository {
		if let Some(repo) = self.state.slots.lock().project.clone() {
			return repo;
		}
		let info = self.info();
		visiting.insert(info.id.clone());
		let children = self.project_children(&info, visiting);
		visiting.remove(&info.id);
		let repo = self.composite(format!("project:{}", info.id), info.package_name.clone());
		repo.set_children(children);
		self.install(|s| &mut s.project, repo)
	}

	/// Project resources merged with library resources.
	pub fn app_resources(&self) -> Repository {
		if let Some(repo) = self.cached_app_resources() {
			return repo;
		}
		let info = self.info();
		let project = self.project_resources();
		let libraries = self.load_libraries(&info);
		let repo = self.composite(format!("app:{}", info.id), info.package_name.clone());
		repo.set_children(std::iter::once(project).chain(libraries.iter().map(|(_, r)| r.clone())).collect());
		let installed = self.install(|s| &mut s.app, repo);
		self.register_packages(&info, &installed, &libraries);
		installed
	}

	/// App node if already built.
	pub fn cached_app_resources(&self) -> Option<Repository> {
		self.state.slots.lock().app.clone()
	}

	/// Test resource folders layered over the app node.
	pub fn test_resources(&self) -> Repository {
		if let Some(repo) = self.state.slots.lock().test.clone() {
			return repo;
		}
		let info = self.info();
		let app = self.app_resources();
		let repo = self.composite(format!("test:{}", info.id), info.package_name.clone());
		repo.set_children(self.test_children(&info, app));
		self.install(|s| &mut s.test, repo)
	}

	/// Project sample data followed by the built-in sets.
	pub fn sample_data_resources(&self) -> Repository {
		if let Some(repo) = self.state.slots.lock().sample.clone() {
			return repo;
		}
		let info = self.info();
		let domain = &self.shared.domain;
		let project_sample =
			SampleDataRepository::create(domain, info.root.join(&self.shared.config.sample_data_dir), info.namespace());
		let project_sample = self.install(|s| &mut s.project_sample, project_sample);
		let repo = self.composite(format!("sample:{}", info.id), None);
		repo.set_children(vec![project_sample, BuiltinSampleDataRepository::create(domain)]);
		self.install(|s| &mut s.sample, repo)
	}

	/// App node for `namespace`. `None` for the framework namespace, which is not served here.
	pub fn resources_for_namespace(&self, namespace: &ResourceNamespace) -> Option<Repository> {
		match namespace {
			ResourceNamespace::Android => None,
			_ => Some(self.app_resources()),
		}
	}

	/// Locale qualifiers (`en`, `fr-rCA`) used in the project node.
	pub fn locales_in_project(&self) -> BTreeSet<String> {
		let project = self.project_resources();
		let count = project.modification_count();
		let mut cache = self.state.locales.lock();
		if let Some(cached) = cache.as_ref()
			&& cached.repository == project
			&& cached.modification_count == count
		{
			return cached.locales.clone();
		}
		let mut locales = BTreeSet::new();
		project.accept(&mut |item: &Arc<ResourceItem>| {
			if let Some((language, region)) = item.configuration.locale() {
				locales.insert(match region {
					Some(region) => format!("{language}-r{region}"),
					None => language.to_string(),
				});
			}
			VisitResult::Continue
		});
		*cache = Some(LocaleCache {
			repository: project,
			modification_count: count,
			locales: locales.clone(),
		});
		locales
	}

	/// Language codes used in the project node.
	pub fn languages_in_project(&self) -> BTreeSet<String> {
		self.locales_in_project()
			.into_iter()
			.map(|locale| locale.split('-').next().unwrap_or_default().to_string())
			.collect()
	}

	/// Disposes every node of this module; the next access rebuilds from scratch.
	///
	/// Idempotent. Modules depending on this one embed its project node, so they are reset
	/// too; see [`ResourceRepositories::refresh_module`].
	pub fn refresh_resources(&self) {
		self.reset();
		ResourceRepositories {
			shared: self.shared.clone(),
		}
		.refresh_module(&self.state.module);
	}

	fn reset(&self) {
		let old = self.state.slots.lock().take_all();
		*self.state.locales.lock() = None;
		self.shared.class_registry.remove_registrant(&self.state.module);
		if old.is_empty() {
			return;
		}
		for repo in &old {
			if matches!(repo.kind(), RepositoryKind::Composite(_)) {
				repo.dispose();
			}
		}
		info!(module = %self.state.module, nodes = old.len(), "resource repositories reset");
	}

	fn sync_completed(&self) {
		if let Some(dynamic) = self.state.slots.lock().dynamic.clone() {
			dynamic.sync_completed();
		}
	}

	/// Re-derives the children of every built node from the current module snapshot.
	fn update_children(&self) {
		let info = self.info();
		let (module, project, app, test) = {
			let slots = self.state.slots.lock();
			(slots.module.clone(), slots.project.clone(), slots.app.clone(), slots.test.clone())
		};
		if let Some(module) = module {
			let dynamic = self.dynamic_repository(&info);
			module.set_children(self.module_children(&info, dynamic, self.sample_data_resources()));
		}
		if let Some(project) = project {
			let mut visiting = FxHashSet::default();
			visiting.insert(info.id.clone());
			project.set_children(self.project_children(&info, &mut visiting));
		}
		if let Some(app) = &app {
			self.shared.class_registry.remove_registrant(&self.state.module);
			let libraries = self.load_libraries(&info);
			app.set_children(
				std::iter::once(self.project_resources())
					.chain(libraries.iter().map(|(_, r)| r.clone()))
					.collect(),
			);
			self.register_packages(&info, app, &libraries);
		}
		if let Some(test) = test {
			test.set_children(self.test_children(&info, self.app_resources()));
		}
	}

	fn module_children(&self, info: &ModuleInfo, dynamic: Option<Repository>, sample: Repository) -> Vec<Repository> {
		let mut children: Vec<Repository> = info.resource_dirs.iter().map(|dir| self.folder(dir, info)).collect();
		children.extend(dynamic);
		children.push(sample);
		children
	}

	fn project_children(&self, info: &ModuleInfo, visiting: &mut FxHashSet<ModuleId>) -> Vec<Repository> {
		let mut children = vec![self.module_resources()];
		for dependency in &info.dependencies {
			if visiting.contains(dependency) {
				warn!(module = %info.id, dependency = %dependency, "skipping cyclic module dependency");
				continue;
			}
			let Some(manager) = ResourceRepositories {
				shared: self.shared.clone(),
			}
			.manager(dependency) else {
				warn!(module = %info.id, dependency = %dependency, "unknown module dependency");
				continue;
			};
			children.push(manager.project_resources_visiting(visiting));
		}
		children
	}

	fn test_children(&self, info: &ModuleInfo, app: Repository) -> Vec<Repository> {
		let mut children: Vec<Repository> = info.test_resource_dirs.iter().map(|dir| self.folder(dir, info)).collect();
		children.push(app);
		children
	}

	fn dynamic_repository(&self, info: &ModuleInfo) -> Option<Repository> {
		let provider = info.dynamic_values.clone()?;
		if let Some(repo) = self.state.slots.lock().dynamic.clone() {
			return Some(repo);
		}
		let repo = DynamicRepository::create(&self.shared.domain, info.namespace(), provider);
		Some(self.install(|s| &mut s.dynamic, repo))
	}

	/// Shared folder repository for `dir`.
	fn folder(&self, dir: &Path, info: &ModuleInfo) -> Repository {
		if let Some(repo) = self.shared.folders.lock().get(dir) {
			return repo.clone();
		}
		let repo = FolderRepository::create(&self.shared.domain, dir, info.namespace(), self.shared.disk_cache.clone());
		self.shared
			.folders
			.lock()
			.entry(dir.to_path_buf())
			.or_insert(repo)
			.clone()
	}

	/// Libraries of this module and its transitive dependencies, loaded through the cache.
	fn load_libraries(&self, info: &ModuleInfo) -> Vec<(ExternalLibrary, Repository)> {
		let libraries = self.transitive_libraries(info);
		let load = |library: &ExternalLibrary| {
			let namespace = match (&info.namespacing, &library.package_name) {
				(Namespacing::Required, Some(package)) => ResourceNamespace::from_package_name(package),
				_ => ResourceNamespace::ResAuto,
			};
			match self.shared.libraries.get(&self.shared.domain, library, &namespace) {
				Ok(repo) => Some((library.clone(), repo)),
				Err(e) => {
					warn!(module = %info.id, library = %library.name, error = %e, "skipping library");
					None
				}
			}
		};
		if !self.shared.config.parallel_library_loading || libraries.len() < 2 {
			return libraries.iter().filter_map(&load).collect();
		}
		thread::scope(|scope| {
			let handles: Vec<_> = libraries.iter().map(|library| scope.spawn(|| load(library))).collect();
			handles
				.into_iter()
				.filter_map(|handle| match handle.join() {
					Ok(loaded) => loaded,
					Err(_) => {
						warn!(module = %info.id, "library loader panicked");
						None
					}
				})
				.collect()
		})
	}

	fn transitive_libraries(&self, info: &ModuleInfo) -> Vec<ExternalLibrary> {
		let mut seen_modules: FxHashSet<ModuleId> = FxHashSet::default();
		let mut seen_libraries: FxHashSet<Arc<str>> = FxHashSet::default();
		let mut out = Vec::new();
		let mut pending = vec![info.clone()];
		while let Some(module) = pending.pop() {
			if !seen_modules.insert(module.id.clone()) {
				continue;
			}
			for library in &module.libraries {
				if seen_libraries.insert(library.name.clone()) {
					out.push(library.clone());
				}
			}
			pending.extend(module.dependencies.iter().rev().filter_map(|id| self.shared.model.module(id)));
		}
		out
	}

	fn register_packages(&self, info: &ModuleInfo, app: &Repository, libraries: &[(ExternalLibrary, Repository)]) {
		let registry = &self.shared.class_registry;
		if let Some(package) = &info.package_name {
			registry.add(package, info.id.as_str(), &info.id, app.clone());
		}
		for (library, repo) in libraries {
			if let Some(package) = repo.package_name() {
				registry.add(&package, &library.name, &info.id, repo.clone());
			}
		}
	}

	fn composite(&self, name: String, package_name: Option<Arc<str>>) -> Repository {
		Repository::new(
			&self.shared.domain,
			name,
			RepositoryKind::Composite(CompositeRepository::new(package_name)),
		)
	}

	/// Installs `built` unless another thread filled the slot first.
	fn install(&self, slot: impl FnOnce(&mut Slots) -> &mut Option<Repository>, built: Repository) -> Repository {
		let winner = {
			let mut slots = self.state.slots.lock();
			slot(&mut slots).get_or_insert_with(|| built.clone()).clone()
		};
		if winner != built {
			debug!(module = %self.state.module, repository = %built.name(), "discarding concurrently built node");
			built.dispose();
		}
		winner
	}
}
