//! Values declared by the build model rather than by files.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use resrepo_model::{
	FolderConfiguration, ResourceItem, ResourceNamespace, ResourceReference, ResourceType, ResourceValue, SourceLocator,
	is_valid_resource_name,
};
use tracing::{debug, warn};

use super::LeafTable;
use crate::lock::{RepositoryDomain, TableGuard};
use crate::repository::{Repository, RepositoryKind, ResourceSource};
use crate::table::{ResourceBucket, ResourceTable};

/// Source label of dynamic items.
pub const DYNAMIC_SOURCE: &str = "dynamic";

/// One generated value, e.g. a `resValue` of the build model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicValue {
	pub res_type: ResourceType,
	pub name: String,
	pub value: String,
}

impl DynamicValue {
	pub fn new(res_type: ResourceType, name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			res_type,
			name: name.into(),
			value: value.into(),
		}
	}
}

/// Supplies the current generated values of a module.
///
/// Queries call the provider before taking the table lock. A query issued while the thread
/// already holds that lock calls it under the lock, so implementations must not acquire the
/// host's outer lock.
pub trait DynamicValueProvider: Send + Sync {
	fn values(&self) -> Vec<DynamicValue>;
}

impl<F> DynamicValueProvider for F
where
	F: Fn() -> Vec<DynamicValue> + Send + Sync,
{
	fn values(&self) -> Vec<DynamicValue> {
		self()
	}
}

/// Repository rebuilt from its provider on first access after being marked stale.
pub struct DynamicRepository {
	namespace: ResourceNamespace,
	provider: Arc<dyn DynamicValueProvider>,
	table: LeafTable,
	/// Bumped by every invalidation.
	generation: AtomicU64,
	/// Generation the current table was built for.
	built: AtomicU64,
}

impl DynamicRepository {
	pub fn create(
		domain: &RepositoryDomain,
		namespace: ResourceNamespace,
		provider: Arc<dyn DynamicValueProvider>,
	) -> Repository {
		let repo = Self {
			namespace,
			provider,
			table: LeafTable::new(ResourceTable::new()),
			generation: AtomicU64::new(1),
			built: AtomicU64::new(0),
		};
		Repository::new(domain, "dynamic", RepositoryKind::Dynamic(repo))
	}

	/// Drops the current values; the next query rebuilds them.
	pub(crate) fn mark_stale(&self, _guard: &TableGuard<'_>) {
		self.generation.fetch_add(1, Ordering::AcqRel);
		self.table.bump();
	}

	fn is_stale(&self) -> bool {
		self.built.load(Ordering::Acquire) != self.generation.load(Ordering::Acquire)
	}

	/// Rebuilds a stale table, calling the provider before the table lock is taken.
	pub(crate) fn refresh(&self, domain: &RepositoryDomain) {
		if !self.is_stale() {
			return;
		}
		let generation = self.generation.load(Ordering::Acquire);
		let table = self.build_table();
		let guard = domain.lock();
		self.install(&guard, generation, table);
	}

	/// Fallback for queries that reach a stale table with the lock already held.
	fn ensure_fresh(&self, guard: &TableGuard<'_>) {
		if !self.is_stale() {
			return;
		}
		let generation = self.generation.load(Ordering::Acquire);
		let table = self.build_table();
		self.install(guard, generation, table);
	}

	/// Installs `table` unless it was invalidated while being built or is already installed.
	fn install(&self, _guard: &TableGuard<'_>, generation: u64, table: ResourceTable) {
		if self.generation.load(Ordering::Acquire) != generation || self.built.load(Ordering::Acquire) == generation {
			return;
		}
		debug!(items = table.item_count(), "rebuilt dynamic values");
		self.table.replace(table);
		self.built.store(generation, Ordering::Release);
	}

	fn build_table(&self) -> ResourceTable {
		let mut table = ResourceTable::new();
		for value in self.provider.values() {
			if !is_valid_resource_name(&value.name) {
				warn!(name = %value.name, "skipping dynamic value with invalid name");
				continue;
			}
			let item = ResourceItem::new(
				ResourceReference::new(self.namespace.clone(), value.res_type, value.name.as_str()),
				FolderConfiguration::default(),
				SourceLocator::synthetic(DYNAMIC_SOURCE),
			)
			.with_value(ResourceValue::from_text(&value.value));
			table.insert(item);
		}
		table
	}
}

impl ResourceSource for DynamicRepository {
	fn bucket(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace, res_type: ResourceType) -> Option<ResourceBucket> {
		self.ensure_fresh(guard);
		self.table.bucket(namespace, res_type)
	}

	fn namespaces(&self, guard: &TableGuard<'_>) -> BTreeSet<ResourceNamespace> {
		self.ensure_fresh(guard);
		self.table.namespaces()
	}

	fn resource_types(&self, guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		self.ensure_fresh(guard);
		self.table.resource_types(namespace)
	}

	fn modification_count(&self) -> u64 {
		self.table.modification_count()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use parking_lot::Mutex;

	use super::*;

	struct Values {
		calls: AtomicUsize,
		current: Mutex<Vec<DynamicValue>>,
	}

	impl DynamicValueProvider for Values {
		fn values(&self) -> Vec<DynamicValue> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.current.lock().clone()
		}
	}

	#[test]
	fn test_lazy_rebuild_after_sync() {
		let provider = Arc::new(Values {
			calls: AtomicUsize::new(0),
			current: Mutex::new(vec![DynamicValue::new(ResourceType::String, "app_name", "Demo")]),
		});
		let ns = ResourceNamespace::ResAuto;
		let repo = DynamicRepository::create(&RepositoryDomain::new(), ns.clone(), provider.clone());
		assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

		let items = repo.get_resources_named(&ns, ResourceType::String, "app_name");
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].value, Some(ResourceValue::Text("Demo".into())));
		assert_eq!(items[0].source, SourceLocator::synthetic(DYNAMIC_SOURCE));
		assert!(items[0].configuration.is_default());
		repo.has_resources(&ns, ResourceType::String, "app_name");
		assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

		*provider.current.lock() = vec![DynamicValue::new(ResourceType::Bool, "debug", "true")];
		let before = repo.modification_count();
		repo.sync_completed();
		assert!(repo.modification_count() > before);
		assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

		assert!(!repo.has_resources(&ns, ResourceType::String, "app_name"));
		assert!(repo.has_resources(&ns, ResourceType::Bool, "debug"));
		assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_closure_provider_skips_invalid_names() {
		let provider: Arc<dyn DynamicValueProvider> = Arc::new(|| {
			vec![
				DynamicValue::new(ResourceType::Integer, "max", "3"),
				DynamicValue::new(ResourceType::Integer, "bad name", "4"),
			]
		});
		let ns = ResourceNamespace::ResAuto;
		let repo = DynamicRepository::create(&RepositoryDomain::new(), ns.clone(), provider);
		assert_eq!(repo.get_resources(&ns, ResourceType::Integer).len(), 1);
	}

	struct LockAwareValues {
		called_under_lock: AtomicUsize,
	}

	impl DynamicValueProvider for LockAwareValues {
		fn values(&self) -> Vec<DynamicValue> {
			if RepositoryDomain::is_locked_by_current_thread() {
				self.called_under_lock.fetch_add(1, Ordering::SeqCst);
			}
			vec![DynamicValue::new(ResourceType::Bool, "enabled", "true")]
		}
	}

	#[test]
	fn test_provider_runs_outside_table_lock() {
		let domain = RepositoryDomain::new();
		let provider = Arc::new(LockAwareValues {
			called_under_lock: AtomicUsize::new(0),
		});
		let ns = ResourceNamespace::ResAuto;
		let dynamic = DynamicRepository::create(&domain, ns.clone(), provider.clone());
		let parent = Repository::new(
			&domain,
			"parent",
			RepositoryKind::Composite(crate::composite::CompositeRepository::new(None)),
		);
		parent.set_children(vec![dynamic.clone()]);

		assert!(parent.has_resources(&ns, ResourceType::Bool, "enabled"));
		dynamic.sync_completed();
		assert!(parent.has_resources(&ns, ResourceType::Bool, "enabled"));
		assert_eq!(provider.called_under_lock.load(Ordering::SeqCst), 0);
	}
}
