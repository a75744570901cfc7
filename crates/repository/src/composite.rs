//! Composite repositories.
//!
//! # Role
//!
//! Merges an ordered list of children into one view. For each `(namespace, type)` the merge
//! follows the type's [`OverridePolicy`]; by default the first child defining a name wins and
//! lower-priority children's items for that name are hidden.
//!
//! # Invariants
//!
//! - Merged buckets are cached until the child list is replaced or a child reports a change.
//! - The modification counter only grows: it is bumped on every structural or content change.
//! - The `id` view also contains symbol-file ids from children, appended after the merged id
//!   items for names no child defines as an item.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use resrepo_model::{FolderConfiguration, ResourceItem, ResourceNamespace, ResourceReference, ResourceType, SourceLocator};
use rustc_hash::FxHashMap;

use crate::lock::TableGuard;
use crate::repository::{Repository, ResourceSource};
use crate::table::ResourceBucket;

/// How same-named items from different children combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverridePolicy {
	/// The first child defining a name supplies all of its items.
	#[default]
	FirstWins,
	/// The last child defining a name supplies all of its items.
	LastWins,
	/// Every child's items are kept, in child order.
	Union,
}

/// Source label of ids synthesized from symbol files.
pub const SYMBOL_FILE_SOURCE: &str = "R.txt";

pub struct CompositeRepository {
	children: RwLock<Arc<[Repository]>>,
	default_policy: OverridePolicy,
	policies: FxHashMap<ResourceType, OverridePolicy>,
	merged: Mutex<FxHashMap<(ResourceNamespace, ResourceType), Option<ResourceBucket>>>,
	modification_count: AtomicU64,
	package_name: Option<Arc<str>>,
}

impl CompositeRepository {
	pub fn new(package_name: Option<Arc<str>>) -> Self {
		Self {
			children: RwLock::new(Arc::from(Vec::new())),
			default_policy: OverridePolicy::FirstWins,
			policies: FxHashMap::default(),
			merged: Mutex::new(FxHashMap::default()),
			modification_count: AtomicU64::new(1),
			package_name,
		}
	}

	pub fn with_default_policy(mut self, policy: OverridePolicy) -> Self {
		self.default_policy = policy;
		self
	}

	pub fn with_policy(mut self, res_type: ResourceType, policy: OverridePolicy) -> Self {
		self.policies.insert(res_type, policy);
		self
	}

	pub fn policy(&self, res_type: ResourceType) -> OverridePolicy {
		self.policies.get(&res_type).copied().unwrap_or(self.default_policy)
	}

	pub fn children(&self) -> Arc<[Repository]> {
		self.children.read().clone()
	}

	/// Swaps the child list, returning the previous one.
	pub(crate) fn replace_children(&self, _guard: &TableGuard<'_>, children: Vec<Repository>) -> Arc<[Repository]> {
		let old = std::mem::replace(&mut *self.children.write(), Arc::from(children));
		self.invalidate();
		old
	}

	pub(crate) fn child_changed(&self, _guard: &TableGuard<'_>) {
		self.invalidate();
	}

	fn invalidate(&self) {
		self.merged.lock().clear();
		self.modification_count.fetch_add(1, Ordering::AcqRel);
	}

	fn merge(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace, res_type: ResourceType) -> ResourceBucket {
		let children = self.children();
		let mut out = ResourceBucket::default();

		let buckets = children
			.iter()
			.filter_map(|child| child.source().bucket(guard, namespace, res_type));
		match self.policy(res_type) {
			OverridePolicy::FirstWins => buckets.for_each(|b| take(b, &mut out, true)),
			OverridePolicy::LastWins => {
				let collected: Vec<_> = buckets.collect();
				collected.into_iter().rev().for_each(|b| take(b, &mut out, true));
			}
			OverridePolicy::Union => buckets.for_each(|b| take(b, &mut out, false)),
		}

		if res_type == ResourceType::Id {
			for name in self.id_names(guard, namespace) {
				if out.contains(&name) {
					continue;
				}
				let item = ResourceItem::new(
					ResourceReference::new(namespace.clone(), ResourceType::Id, name),
					FolderConfiguration::default(),
					SourceLocator::synthetic(SYMBOL_FILE_SOURCE),
				);
				out.push(Arc::new(item));
			}
		}
		out
	}
}

fn take(bucket: ResourceBucket, out: &mut ResourceBucket, skip_existing: bool) {
	for (name, items) in bucket.iter() {
		if skip_existing && out.contains(name) {
			continue;
		}
		out.extend_name(name.clone(), items.iter().cloned());
	}
}

impl ResourceSource for CompositeRepository {
	fn bucket(
		&self,
		guard: &TableGuard<'_>,
		namespace: &ResourceNamespace,
		res_type: ResourceType,
	) -> Option<ResourceBucket> {
		let key = (namespace.clone(), res_type);
		if let Some(cached) = self.merged.lock().get(&key) {
			return cached.clone();
		}
		let merged = self.merge(guard, namespace, res_type);
		let merged = (!merged.is_empty()).then_some(merged);
		self.merged.lock().insert(key, merged.clone());
		merged
	}

	fn namespaces(&self, guard: &TableGuard<'_>) -> BTreeSet<ResourceNamespace> {
		self.children()
			.iter()
			.flat_map(|child| child.source().namespaces(guard))
			.collect()
	}

	fn resource_types(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		let mut types: BTreeSet<ResourceType> = self
			.children()
			.iter()
			.flat_map(|child| child.source().resource_types(guard, namespace))
			.collect();
		if !self.id_names(guard, namespace).is_empty() {
			types.insert(ResourceType::Id);
		}
		types
	}

	fn resource_dirs(&self) -> Vec<PathBuf> {
		let mut dirs = Vec::new();
		for child in self.children().iter() {
			for dir in child.source().resource_dirs() {
				if !dirs.contains(&dir) {
					dirs.push(dir);
				}
			}
		}
		dirs
	}

	fn modification_count(&self) -> u64 {
		self.modification_count.load(Ordering::Acquire)
	}

	fn id_names(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<Arc<str>> {
		self.children()
			.iter()
			.flat_map(|child| child.source().id_names(guard, namespace))
			.collect()
	}

	fn package_name(&self) -> Option<Arc<str>> {
		self.package_name
			.clone()
			.or_else(|| self.children().iter().find_map(|c| c.source().package_name()))
	}
}
