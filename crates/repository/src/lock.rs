//! The shared table lock and the host outer lock.
//!
//! # Lock ordering
//!
//! Every node of a repository tree belongs to one [`RepositoryDomain`], which owns the single
//! table lock. The host's application-level read/write lock ([`OuterLock`]) must always be
//! acquired before the table lock, never while it is held. [`OuterLock`] checks this on every
//! acquisition and records violations.
//!
//! Below the table lock sit the per-node interior mutexes. Those are leaf locks: they are
//! never held across a call into another node or across user callbacks.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use tracing::error;

use crate::repository::{Repository, RepositoryInner};

thread_local! {
	static TABLE_LOCK_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Stable identifier of a repository node within its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryId(u64);

impl fmt::Display for RepositoryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "repo#{}", self.0)
	}
}

/// Lock domain shared by every node of a repository tree.
///
/// Also owns the node registry used to route change notifications from children to
/// parents. Children store parent ids, never parent handles.
#[derive(Clone)]
pub struct RepositoryDomain {
	inner: Arc<DomainInner>,
}

struct DomainInner {
	table_lock: ReentrantMutex<()>,
	nodes: RwLock<FxHashMap<RepositoryId, Weak<RepositoryInner>>>,
	next_id: AtomicU64,
}

impl Default for RepositoryDomain {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for RepositoryDomain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RepositoryDomain")
			.field("nodes", &self.inner.nodes.read().len())
			.finish()
	}
}

impl RepositoryDomain {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(DomainInner {
				table_lock: ReentrantMutex::new(()),
				nodes: RwLock::new(FxHashMap::default()),
				next_id: AtomicU64::new(1),
			}),
		}
	}

	/// Acquires the table lock. Reentrant on the owning thread.
	pub fn lock(&self) -> TableGuard<'_> {
		let guard = self.inner.table_lock.lock();
		TABLE_LOCK_DEPTH.with(|d| d.set(d.get() + 1));
		TableGuard {
			_guard: guard,
			domain: self,
		}
	}

	/// Whether the current thread holds any table lock.
	pub fn is_locked_by_current_thread() -> bool {
		TABLE_LOCK_DEPTH.with(|d| d.get() > 0)
	}

	pub fn same_domain(&self, other: &RepositoryDomain) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	pub(crate) fn next_id(&self) -> RepositoryId {
		RepositoryId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
	}

	pub(crate) fn register(&self, node: &Arc<RepositoryInner>) {
		let mut nodes = self.inner.nodes.write();
		nodes.retain(|_, weak| weak.strong_count() > 0);
		nodes.insert(node.id(), Arc::downgrade(node));
	}

	pub(crate) fn lookup(&self, id: RepositoryId) -> Option<Repository> {
		let weak = self.inner.nodes.read().get(&id).cloned()?;
		weak.upgrade().map(Repository::from_inner)
	}

	/// Number of live nodes.
	pub fn node_count(&self) -> usize {
		self.inner.nodes.read().values().filter(|w| w.strong_count() > 0).count()
	}
}

/// Proof that the table lock of a domain is held.
pub struct TableGuard<'a> {
	_guard: ReentrantMutexGuard<'a, ()>,
	domain: &'a RepositoryDomain,
}

impl TableGuard<'_> {
	pub fn domain(&self) -> &RepositoryDomain {
		self.domain
	}
}

impl Drop for TableGuard<'_> {
	fn drop(&mut self) {
		TABLE_LOCK_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
	}
}

/// Stand-in for the host's application-level read/write lock.
///
/// Acquiring it while the current thread holds a table lock inverts the required order; such
/// acquisitions are logged and counted.
pub struct OuterLock<T> {
	lock: RwLock<T>,
	violations: AtomicUsize,
}

impl<T> OuterLock<T> {
	pub fn new(value: T) -> Self {
		Self {
			lock: RwLock::new(value),
			violations: AtomicUsize::new(0),
		}
	}

	pub fn read(&self) -> RwLockReadGuard<'_, T> {
		self.check_order("read");
		self.lock.read()
	}

	pub fn write(&self) -> RwLockWriteGuard<'_, T> {
		self.check_order("write");
		self.lock.write()
	}

	/// Acquisitions made while a table lock was held.
	pub fn order_violations(&self) -> usize {
		self.violations.load(Ordering::Relaxed)
	}

	fn check_order(&self, mode: &'static str) {
		if RepositoryDomain::is_locked_by_current_thread() {
			self.violations.fetch_add(1, Ordering::Relaxed);
			error!(mode, "outer lock acquired while holding the resource table lock");
		}
	}
}
