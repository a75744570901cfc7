//! Namespace × type × name indexed storage.
//!
//! # Invariants
//!
//! - An item stored under `(ns, type, name)` has `item.namespace == ns`. A mismatch is logged
//!   and the item is stored anyway.
//! - Insertion order within a name's list is preserved; it encodes override priority.
//! - Buckets are copy-on-write. A bucket handed to a reader is never mutated afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use resrepo_model::{ResourceItem, ResourceNamespace, ResourceType, SourceLocator};
use tracing::error;

/// Ordered multimap of name to items for one `(namespace, type)` pair.
#[derive(Debug, Clone, Default)]
pub struct ResourceBucket(Arc<IndexMap<Arc<str>, Vec<Arc<ResourceItem>>>>);

impl ResourceBucket {
	/// Items registered under `name`, in priority order. Empty if none.
	pub fn get(&self, name: &str) -> &[Arc<ResourceItem>] {
		self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.get(name).is_some_and(|items| !items.is_empty())
	}

	pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
		self.0.keys()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &[Arc<ResourceItem>])> {
		self.0.iter().map(|(k, v)| (k, v.as_slice()))
	}

	pub fn items(&self) -> impl Iterator<Item = &Arc<ResourceItem>> {
		self.0.values().flatten()
	}

	/// Number of distinct names.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn item_count(&self) -> usize {
		self.0.values().map(Vec::len).sum()
	}

	pub fn push(&mut self, item: Arc<ResourceItem>) {
		Arc::make_mut(&mut self.0)
			.entry(item.reference.name.clone())
			.or_default()
			.push(item);
	}

	/// Appends every item under `name`.
	pub fn extend_name(&mut self, name: Arc<str>, items: impl IntoIterator<Item = Arc<ResourceItem>>) {
		Arc::make_mut(&mut self.0).entry(name).or_default().extend(items);
	}

	/// Removes items matching `pred`, dropping names left with no items. Returns the count removed.
	pub fn remove_where(&mut self, mut pred: impl FnMut(&ResourceItem) -> bool) -> usize {
		if !self.items().any(|i| pred(i)) {
			return 0;
		}
		let map = Arc::make_mut(&mut self.0);
		let mut removed = 0;
		map.retain(|_, items| {
			let before = items.len();
			items.retain(|i| !pred(i));
			removed += before - items.len();
			!items.is_empty()
		});
		removed
	}
}

impl FromIterator<Arc<ResourceItem>> for ResourceBucket {
	fn from_iter<I: IntoIterator<Item = Arc<ResourceItem>>>(iter: I) -> Self {
		let mut bucket = Self::default();
		for item in iter {
			bucket.push(item);
		}
		bucket
	}
}

/// Two-level table: namespace → type → bucket.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
	map: BTreeMap<ResourceNamespace, BTreeMap<ResourceType, ResourceBucket>>,
}

impl ResourceTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bucket(&self, namespace: &ResourceNamespace, res_type: ResourceType) -> Option<&ResourceBucket> {
		self.map.get(namespace)?.get(&res_type)
	}

	/// Mutable bucket for `(namespace, type)`. Creates an empty one when `create_if_absent`.
	pub fn bucket_mut(
		&mut self,
		namespace: &ResourceNamespace,
		res_type: ResourceType,
		create_if_absent: bool,
	) -> Option<&mut ResourceBucket> {
		if create_if_absent {
			Some(self.map.entry(namespace.clone()).or_default().entry(res_type).or_default())
		} else {
			self.map.get_mut(namespace)?.get_mut(&res_type)
		}
	}

	/// Stores `item` under `(namespace, item.type, item.name)`.
	pub fn insert_into(&mut self, namespace: &ResourceNamespace, item: Arc<ResourceItem>) {
		if item.namespace() != namespace {
			error!(
				expected = %namespace,
				actual = %item.namespace(),
				resource = %item.reference,
				"item namespace does not match table bucket"
			);
		}
		let res_type = item.res_type();
		if let Some(bucket) = self.bucket_mut(namespace, res_type, true) {
			bucket.push(item);
		}
	}

	/// Stores `item` under its own namespace.
	pub fn insert(&mut self, item: ResourceItem) {
		let namespace = item.namespace().clone();
		self.insert_into(&namespace, Arc::new(item));
	}

	/// Removes every item from `source`. Returns the count removed.
	pub fn remove_source(&mut self, source: &SourceLocator) -> usize {
		let mut removed = 0;
		for types in self.map.values_mut() {
			for bucket in types.values_mut() {
				removed += bucket.remove_where(|item| &item.source == source);
			}
			types.retain(|_, b| !b.is_empty());
		}
		self.map.retain(|_, types| !types.is_empty());
		removed
	}

	pub fn namespaces(&self) -> impl Iterator<Item = &ResourceNamespace> {
		self.map.keys()
	}

	/// Types with a non-empty bucket in `namespace`.
	pub fn resource_types(&self, namespace: &ResourceNamespace) -> Vec<ResourceType> {
		self.map
			.get(namespace)
			.map(|types| types.iter().filter(|(_, b)| !b.is_empty()).map(|(t, _)| *t).collect())
			.unwrap_or_default()
	}

	/// Full traversal in namespace, type, name order.
	pub fn rows(&self) -> impl Iterator<Item = (&ResourceNamespace, ResourceType, &ResourceBucket)> {
		self.map
			.iter()
			.flat_map(|(ns, types)| types.iter().map(move |(t, b)| (ns, *t, b)))
	}

	pub fn items(&self) -> impl Iterator<Item = &Arc<ResourceItem>> {
		self.rows().flat_map(|(_, _, b)| b.items())
	}

	pub fn item_count(&self) -> usize {
		self.rows().map(|(_, _, b)| b.item_count()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.item_count() == 0
	}

	/// `(namespace, type, name) → item count`, for comparing tables.
	pub fn summary(&self) -> BTreeMap<(ResourceNamespace, ResourceType, String), usize> {
		let mut out = BTreeMap::new();
		for (ns, ty, bucket) in self.rows() {
			for (name, items) in bucket.iter() {
				out.insert((ns.clone(), ty, name.to_string()), items.len());
			}
		}
		out
	}
}
