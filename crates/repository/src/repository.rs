//! Repository nodes.
//!
//! # Role
//!
//! A [`Repository`] is a cheap, cloneable handle to one node of a repository tree. Nodes are
//! a closed set of variants ([`RepositoryKind`]), each implementing [`ResourceSource`]. A
//! composite holds other nodes; leaves own a table populated from one source.
//!
//! # Invariants
//!
//! - Every public query acquires the domain's table lock for its whole duration.
//! - A child knows its parents only by [`RepositoryId`]; change notifications walk upward by
//!   looking ids up in the domain registry, so there are no reference cycles.
//! - Content changes bump the node's modification counter and every ancestor's.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use resrepo_model::{ResourceItem, ResourceNamespace, ResourceType};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::composite::CompositeRepository;
use crate::leaf::{
	AarProtoRepository, AarSourceRepository, BuiltinSampleDataRepository, DynamicRepository, FolderRepository,
	SampleDataRepository,
};
use crate::lock::{RepositoryDomain, RepositoryId, TableGuard};
use crate::table::ResourceBucket;
use crate::visitor::{ResourceVisitor, VisitResult};

/// Capability shared by every node variant.
///
/// All methods taking a [`TableGuard`] run under the domain's table lock.
pub trait ResourceSource: Send + Sync {
	/// Items of one `(namespace, type)` pair, or `None` if there are none.
	fn bucket(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace, res_type: ResourceType)
	-> Option<ResourceBucket>;

	fn namespaces(&self, guard: &TableGuard<'_>) -> BTreeSet<ResourceNamespace>;

	fn resource_types(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		ResourceType::ALL
			.into_iter()
			.filter(|&ty| self.bucket(guard, namespace, ty).is_some_and(|b| !b.is_empty()))
			.collect()
	}

	/// Visits every item, stopping when the visitor aborts.
	fn accept(&self, guard: &TableGuard<'_>, visitor: &mut dyn ResourceVisitor) -> VisitResult {
		for namespace in self.namespaces(guard) {
			if !visitor.should_visit_namespace(&namespace) {
				continue;
			}
			for res_type in self.resource_types(guard, &namespace) {
				if !visitor.should_visit_type(res_type) {
					continue;
				}
				let Some(bucket) = self.bucket(guard, &namespace, res_type) else {
					continue;
				};
				for item in bucket.items() {
					if visitor.visit(item) == VisitResult::Abort {
						return VisitResult::Abort;
					}
				}
			}
		}
		VisitResult::Continue
	}

	/// On-disk roots this node watches.
	fn resource_dirs(&self) -> Vec<PathBuf> {
		Vec::new()
	}

	fn modification_count(&self) -> u64;

	/// Id names known without a corresponding item, e.g. from a library symbol file.
	fn id_names(&self, _guard: &TableGuard<'_>, _namespace: &ResourceNamespace) -> BTreeSet<Arc<str>> {
		BTreeSet::new()
	}

	fn package_name(&self) -> Option<Arc<str>> {
		None
	}

	fn library_name(&self) -> Option<Arc<str>> {
		None
	}
}

/// Node variants.
pub enum RepositoryKind {
	Folder(FolderRepository),
	AarSource(AarSourceRepository),
	AarProto(AarProtoRepository),
	Dynamic(DynamicRepository),
	SampleData(SampleDataRepository),
	BuiltinSampleData(BuiltinSampleDataRepository),
	#[cfg(any(test, feature = "test-support"))]
	Mock(crate::leaf::MockRepository),
	Composite(CompositeRepository),
	/// Holds nothing. Stands in for a node that failed to build.
	Empty,
}

struct EmptySource;

impl ResourceSource for EmptySource {
	fn bucket(&self, _: &TableGuard<'_>, _: &ResourceNamespace, _: ResourceType) -> Option<ResourceBucket> {
		None
	}

	fn namespaces(&self, _: &TableGuard<'_>) -> BTreeSet<ResourceNamespace> {
		BTreeSet::new()
	}

	fn modification_count(&self) -> u64 {
		0
	}
}

impl RepositoryKind {
	fn source(&self) -> &dyn ResourceSource {
		match self {
			Self::Folder(r) => r,
			Self::AarSource(r) => r,
			Self::AarProto(r) => r,
			Self::Dynamic(r) => r,
			Self::SampleData(r) => r,
			Self::BuiltinSampleData(r) => r,
			#[cfg(any(test, feature = "test-support"))]
			Self::Mock(r) => r,
			Self::Composite(r) => r,
			Self::Empty => &EmptySource,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::Folder(_) => "folder",
			Self::AarSource(_) => "aar-source",
			Self::AarProto(_) => "aar-proto",
			Self::Dynamic(_) => "dynamic",
			Self::SampleData(_) => "sample-data",
			Self::BuiltinSampleData(_) => "builtin-sample-data",
			#[cfg(any(test, feature = "test-support"))]
			Self::Mock(_) => "mock",
			Self::Composite(_) => "composite",
			Self::Empty => "empty",
		}
	}
}

pub(crate) struct RepositoryInner {
	id: RepositoryId,
	name: String,
	domain: RepositoryDomain,
	parents: Mutex<FxHashSet<RepositoryId>>,
	disposed: AtomicBool,
	kind: RepositoryKind,
}

impl RepositoryInner {
	pub(crate) fn id(&self) -> RepositoryId {
		self.id
	}
}

/// Handle to a repository node.
#[derive(Clone)]
pub struct Repository {
	inner: Arc<RepositoryInner>,
}

impl fmt::Debug for Repository {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Repository")
			.field("id", &self.inner.id)
			.field("name", &self.inner.name)
			.field("kind", &self.inner.kind.label())
			.finish()
	}
}

impl PartialEq for Repository {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Repository {}

impl Repository {
	/// Creates and registers a node in `domain`.
	pub fn new(domain: &RepositoryDomain, name: impl Into<String>, kind: RepositoryKind) -> Self {
		let inner = Arc::new(RepositoryInner {
			id: domain.next_id(),
			name: name.into(),
			domain: domain.clone(),
			parents: Mutex::new(FxHashSet::default()),
			disposed: AtomicBool::new(false),
			kind,
		});
		domain.register(&inner);
		trace!(id = %inner.id, name = %inner.name, kind = inner.kind.label(), "created repository");
		Self { inner }
	}

	/// Node holding no resources.
	pub fn empty(domain: &RepositoryDomain, name: impl Into<String>) -> Self {
		Self::new(domain, name, RepositoryKind::Empty)
	}

	pub(crate) fn from_inner(inner: Arc<RepositoryInner>) -> Self {
		Self { inner }
	}

	pub fn id(&self) -> RepositoryId {
		self.inner.id
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn domain(&self) -> &RepositoryDomain {
		&self.inner.domain
	}

	pub fn kind(&self) -> &RepositoryKind {
		&self.inner.kind
	}

	pub fn as_folder(&self) -> Option<&FolderRepository> {
		match &self.inner.kind {
			RepositoryKind::Folder(f) => Some(f),
			_ => None,
		}
	}

	pub fn as_composite(&self) -> Option<&CompositeRepository> {
		match &self.inner.kind {
			RepositoryKind::Composite(c) => Some(c),
			_ => None,
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.load(Ordering::Acquire)
	}

	/// Merged items of one `(namespace, type)` pair, ordered by priority. Empty if none.
	pub fn get_resources(&self, namespace: &ResourceNamespace, res_type: ResourceType) -> ResourceBucket {
		let guard = self.lock_for_query();
		self.source().bucket(&guard, namespace, res_type).unwrap_or_default()
	}

	/// Items named `name`, highest priority first.
	pub fn get_resources_named(
		&self,
		namespace: &ResourceNamespace,
		res_type: ResourceType,
		name: &str,
	) -> Vec<Arc<ResourceItem>> {
		let guard = self.lock_for_query();
		self.source()
			.bucket(&guard, namespace, res_type)
			.map(|b| b.get(name).to_vec())
			.unwrap_or_default()
	}

	pub fn has_resources(&self, namespace: &ResourceNamespace, res_type: ResourceType, name: &str) -> bool {
		let guard = self.lock_for_query();
		self.source()
			.bucket(&guard, namespace, res_type)
			.is_some_and(|b| b.contains(name))
	}

	pub fn has_resources_of_type(&self, namespace: &ResourceNamespace, res_type: ResourceType) -> bool {
		let guard = self.lock_for_query();
		self.source()
			.bucket(&guard, namespace, res_type)
			.is_some_and(|b| !b.is_empty())
	}

	pub fn accept(&self, visitor: &mut dyn ResourceVisitor) -> VisitResult {
		let guard = self.lock_for_query();
		self.source().accept(&guard, visitor)
	}

	/// Every item of every namespace and type.
	pub fn all_resources(&self) -> Vec<Arc<ResourceItem>> {
		let mut out = Vec::new();
		self.accept(&mut |item: &Arc<ResourceItem>| {
			out.push(item.clone());
			VisitResult::Continue
		});
		out
	}

	pub fn resource_types(&self, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		let guard = self.lock_for_query();
		self.source().resource_types(&guard, namespace)
	}

	pub fn namespaces(&self) -> BTreeSet<ResourceNamespace> {
		let guard = self.lock_for_query();
		self.source().namespaces(&guard)
	}

	pub fn modification_count(&self) -> u64 {
		let _guard = self.inner.domain.lock();
		self.source().modification_count()
	}

	pub fn resource_dirs(&self) -> Vec<PathBuf> {
		self.source().resource_dirs()
	}

	pub fn package_name(&self) -> Option<Arc<str>> {
		self.source().package_name()
	}

	pub fn library_name(&self) -> Option<Arc<str>> {
		self.source().library_name()
	}

	/// Id names declared without items (symbol files), in `namespace`.
	pub fn id_names(&self, namespace: &ResourceNamespace) -> BTreeSet<Arc<str>> {
		let guard = self.lock_for_query();
		self.source().id_names(&guard, namespace)
	}

	/// Children of a composite, in priority order. Empty for leaves.
	pub fn children(&self) -> Vec<Repository> {
		let _guard = self.inner.domain.lock();
		match &self.inner.kind {
			RepositoryKind::Composite(c) => c.children().to_vec(),
			_ => Vec::new(),
		}
	}

	pub fn parent_ids(&self) -> Vec<RepositoryId> {
		self.inner.parents.lock().iter().copied().collect()
	}

	/// Replaces a composite's children and invalidates its merged views.
	///
	/// Children from another domain, and children that would create a cycle, are dropped
	/// with an error log. No-op on leaves.
	pub fn set_children(&self, children: Vec<Repository>) {
		let RepositoryKind::Composite(composite) = &self.inner.kind else {
			warn!(repository = %self.inner.name, "set_children called on a leaf repository");
			return;
		};
		let guard = self.inner.domain.lock();
		let children: Vec<Repository> = children
			.into_iter()
			.filter(|child| {
				if !child.domain().same_domain(&self.inner.domain) {
					tracing::error!(parent = %self.inner.name, child = %child.name(), "child belongs to another lock domain");
					return false;
				}
				if child.contains_node(&guard, self.id()) {
					tracing::error!(parent = %self.inner.name, child = %child.name(), "child would create a cycle");
					return false;
				}
				true
			})
			.collect();

		let old = composite.replace_children(&guard, children.clone());
		for child in old.iter() {
			child.inner.parents.lock().remove(&self.inner.id);
		}
		for child in &children {
			child.inner.parents.lock().insert(self.inner.id);
		}
		debug!(
			repository = %self.inner.name,
			children = children.len(),
			count = composite.modification_count(),
			"installed children"
		);
		self.notify_parents(&guard);
	}

	/// Takes the table lock for a query after rebuilding stale dynamic leaves below this
	/// node, so their providers run outside it.
	fn lock_for_query(&self) -> TableGuard<'_> {
		if !RepositoryDomain::is_locked_by_current_thread() {
			self.refresh_dynamic();
		}
		self.inner.domain.lock()
	}

	fn refresh_dynamic(&self) {
		match &self.inner.kind {
			RepositoryKind::Dynamic(dynamic) => dynamic.refresh(&self.inner.domain),
			RepositoryKind::Composite(composite) => {
				for child in composite.children().iter() {
					child.refresh_dynamic();
				}
			}
			_ => {}
		}
	}

	fn contains_node(&self, guard: &TableGuard<'_>, id: RepositoryId) -> bool {
		if self.inner.id == id {
			return true;
		}
		match &self.inner.kind {
			RepositoryKind::Composite(c) => c.children().iter().any(|child| child.contains_node(guard, id)),
			_ => false,
		}
	}

	/// Re-parses a single file and replaces everything previously read from it.
	///
	/// Returns whether the node was affected. Parsing happens before the table lock is taken.
	pub fn rescan_file(&self, path: &Path) -> bool {
		let changed = match &self.inner.kind {
			RepositoryKind::Folder(folder) => {
				if !folder.contains(path) {
					return false;
				}
				let parsed = folder.parse_file(path);
				let guard = self.inner.domain.lock();
				let changed = folder.apply_file(&guard, path, parsed);
				if changed {
					self.notify_parents(&guard);
				}
				changed
			}
			RepositoryKind::SampleData(sample) => {
				if !sample.contains(path) {
					return false;
				}
				self.rescan();
				true
			}
			_ => false,
		};
		trace!(repository = %self.inner.name, path = %path.display(), changed, "rescan file");
		changed
	}

	/// Rebuilds a leaf from its source. No-op on composites.
	pub fn rescan(&self) {
		match &self.inner.kind {
			RepositoryKind::Folder(folder) => {
				let table = folder.scan_table();
				let guard = self.inner.domain.lock();
				folder.install_table(&guard, table);
				self.notify_parents(&guard);
			}
			RepositoryKind::SampleData(sample) => {
				let table = sample.scan_table();
				let guard = self.inner.domain.lock();
				sample.install_table(&guard, table);
				self.notify_parents(&guard);
			}
			RepositoryKind::Dynamic(dynamic) => {
				let guard = self.inner.domain.lock();
				dynamic.mark_stale(&guard);
				self.notify_parents(&guard);
			}
			_ => {}
		}
	}

	/// Build-model sync finished: dynamic values are stale and will be rebuilt on next access.
	pub fn sync_completed(&self) {
		if let RepositoryKind::Dynamic(dynamic) = &self.inner.kind {
			let guard = self.inner.domain.lock();
			dynamic.mark_stale(&guard);
			self.notify_parents(&guard);
		}
	}

	/// Adds an item to a mock node and notifies its ancestors.
	#[cfg(any(test, feature = "test-support"))]
	pub fn add_mock_item(&self, item: ResourceItem) {
		if let RepositoryKind::Mock(mock) = &self.inner.kind {
			let guard = self.inner.domain.lock();
			mock.add(&guard, item);
			self.notify_parents(&guard);
		}
	}

	/// Detaches a node from the tree and flushes persistent state.
	///
	/// A disposed composite has no children and its ancestors are invalidated. Disposing
	/// twice is a no-op.
	pub fn dispose(&self) {
		if self.inner.disposed.swap(true, Ordering::AcqRel) {
			return;
		}
		match &self.inner.kind {
			RepositoryKind::Composite(composite) => {
				let guard = self.inner.domain.lock();
				let old = composite.replace_children(&guard, Vec::new());
				for child in old.iter() {
					child.inner.parents.lock().remove(&self.inner.id);
				}
				self.notify_parents(&guard);
			}
			RepositoryKind::Folder(folder) => folder.save_snapshot(),
			_ => {}
		}
		debug!(repository = %self.inner.name, "disposed");
	}

	/// Invalidates every ancestor's merged views and bumps their counters.
	pub(crate) fn notify_parents(&self, guard: &TableGuard<'_>) {
		let mut pending = self.parent_ids();
		let mut seen = FxHashSet::default();
		while let Some(id) = pending.pop() {
			if !seen.insert(id) {
				continue;
			}
			let Some(parent) = guard.domain().lookup(id) else {
				self.inner.parents.lock().remove(&id);
				continue;
			};
			if let RepositoryKind::Composite(composite) = &parent.inner.kind {
				composite.child_changed(guard);
				trace!(parent = %parent.name(), child = %self.inner.name, "child changed");
			}
			pending.extend(parent.parent_ids());
		}
	}

	pub(crate) fn source(&self) -> &dyn ResourceSource {
		self.inner.kind.source()
	}
}

#[cfg(test)]
mod tests;
