//! Leaf repositories: one source each.

mod aar_proto;
mod aar_source;
mod dynamic;
mod folder;
#[cfg(any(test, feature = "test-support"))]
mod mock;
mod sample_data;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

pub use aar_proto::AarProtoRepository;
pub use aar_source::AarSourceRepository;
pub use dynamic::{DynamicRepository, DynamicValue, DynamicValueProvider};
pub use folder::FolderRepository;
#[cfg(any(test, feature = "test-support"))]
pub use mock::MockRepository;
use parking_lot::Mutex;
use resrepo_model::{ResourceNamespace, ResourceType};
pub use sample_data::{BuiltinSampleDataRepository, SampleDataRepository, builtin_sample_names};

use crate::table::{ResourceBucket, ResourceTable};

/// Table owned by a leaf, plus its modification counter.
///
/// Accessed only with the domain's table lock held; the mutex here is a leaf lock.
pub(crate) struct LeafTable {
	table: Mutex<ResourceTable>,
	modification_count: AtomicU64,
}

impl LeafTable {
	pub(crate) fn new(table: ResourceTable) -> Self {
		Self {
			table: Mutex::new(table),
			modification_count: AtomicU64::new(1),
		}
	}

	pub(crate) fn bucket(&self, namespace: &ResourceNamespace, res_type: ResourceType) -> Option<ResourceBucket> {
		self.table
			.lock()
			.bucket(namespace, res_type)
			.filter(|b| !b.is_empty())
			.cloned()
	}

	pub(crate) fn namespaces(&self) -> BTreeSet<ResourceNamespace> {
		self.table.lock().namespaces().cloned().collect()
	}

	pub(crate) fn resource_types(&self, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		self.table.lock().resource_types(namespace).into_iter().collect()
	}

	pub(crate) fn read<R>(&self, f: impl FnOnce(&ResourceTable) -> R) -> R {
		f(&self.table.lock())
	}

	/// Mutates the table and bumps the counter.
	pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ResourceTable) -> R) -> R {
		let out = f(&mut self.table.lock());
		self.bump();
		out
	}

	pub(crate) fn replace(&self, table: ResourceTable) {
		*self.table.lock() = table;
		self.bump();
	}

	pub(crate) fn bump(&self) {
		self.modification_count.fetch_add(1, Ordering::AcqRel);
	}

	pub(crate) fn modification_count(&self) -> u64 {
		self.modification_count.load(Ordering::Acquire)
	}
}
