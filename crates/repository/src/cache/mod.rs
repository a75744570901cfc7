//! In-memory and on-disk caches.
//!
//! [`SingleflightCache`] is a bounded LRU with at-most-one construction per key: the first
//! caller for a missing key becomes the leader and runs the factory; concurrent callers for
//! the same key block until the leader publishes its result. Entries may be evicted at any
//! time; callers treat a miss as "rebuild".

mod aar;
mod disk;

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub use aar::AarRepositoryCache;
pub use disk::DiskCache;
use lru::LruCache;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{RepositoryError, Result};

type EvictFn<K, V> = Box<dyn Fn(&K, &V) + Send + Sync>;

struct CacheState<K: Hash + Eq, V> {
	entries: LruCache<K, V>,
	inflight: FxHashMap<K, Arc<InFlight<V>>>,
	/// Bumped by invalidation; a construction started under an older generation is not stored.
	generation: u64,
}

struct InFlight<V> {
	result: Mutex<Option<Result<V>>>,
	ready: Condvar,
}

impl<V: Clone> InFlight<V> {
	fn publish(&self, result: Result<V>) {
		*self.result.lock() = Some(result);
		self.ready.notify_all();
	}

	fn wait(&self) -> Result<V> {
		let mut slot = self.result.lock();
		loop {
			if let Some(result) = slot.as_ref() {
				return result.clone();
			}
			self.ready.wait(&mut slot);
		}
	}
}

/// Bounded cache with single-flight construction.
pub struct SingleflightCache<K: Hash + Eq, V> {
	state: Mutex<CacheState<K, V>>,
	on_evict: Option<EvictFn<K, V>>,
}

impl<K, V> fmt::Debug for SingleflightCache<K, V>
where
	K: Hash + Eq,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("SingleflightCache")
			.field("len", &state.entries.len())
			.field("capacity", &state.entries.cap())
			.field("inflight", &state.inflight.len())
			.finish()
	}
}

impl<K, V> SingleflightCache<K, V>
where
	K: Hash + Eq + Clone + fmt::Debug,
	V: Clone,
{
	/// Cache holding at most `capacity` entries (minimum one).
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		Self {
			state: Mutex::new(CacheState {
				entries: LruCache::new(capacity),
				inflight: FxHashMap::default(),
				generation: 0,
			}),
			on_evict: None,
		}
	}

	/// Registers a callback run for entries pushed out by capacity.
	pub fn with_eviction_callback(mut self, f: impl Fn(&K, &V) + Send + Sync + 'static) -> Self {
		self.on_evict = Some(Box::new(f));
		self
	}

	pub fn get(&self, key: &K) -> Option<V> {
		self.state.lock().entries.get(key).cloned()
	}

	/// Cached value for `key`, constructing it with `factory` on a miss.
	///
	/// Concurrent calls for the same key run `factory` once; every caller sees its result. A
	/// failed construction is not cached. If the leader unwinds, waiters get
	/// [`RepositoryError::Abandoned`].
	pub fn get_or_create(&self, key: &K, factory: impl FnOnce() -> Result<V>) -> Result<V> {
		let (inflight, generation) = {
			let mut state = self.state.lock();
			if let Some(value) = state.entries.get(key) {
				trace!(?key, "cache hit");
				return Ok(value.clone());
			}
			if let Some(inflight) = state.inflight.get(key) {
				let inflight = inflight.clone();
				drop(state);
				trace!(?key, "waiting for in-flight construction");
				return inflight.wait();
			}
			let inflight = Arc::new(InFlight {
				result: Mutex::new(None),
				ready: Condvar::new(),
			});
			state.inflight.insert(key.clone(), inflight.clone());
			(inflight, state.generation)
		};

		let leader = LeaderGuard {
			cache: self,
			key,
			inflight,
			completed: false,
		};
		let result = factory();
		leader.complete(generation, result)
	}

	/// Drops the entry for `key`. A construction in flight completes but is not stored.
	pub fn invalidate(&self, key: &K) {
		let mut state = self.state.lock();
		state.entries.pop(key);
		if state.inflight.contains_key(key) {
			state.generation += 1;
		}
		debug!(?key, "cache entry invalidated");
	}

	pub fn invalidate_all(&self) {
		let mut state = self.state.lock();
		state.entries.clear();
		state.generation += 1;
		debug!("cache cleared");
	}

	pub fn len(&self) -> usize {
		self.state.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn values(&self) -> Vec<V> {
		self.state.lock().entries.iter().map(|(_, v)| v.clone()).collect()
	}
}

/// Clears the in-flight slot if the leader never completes.
struct LeaderGuard<'a, K: Hash + Eq + Clone + fmt::Debug, V: Clone> {
	cache: &'a SingleflightCache<K, V>,
	key: &'a K,
	inflight: Arc<InFlight<V>>,
	completed: bool,
}

impl<K: Hash + Eq + Clone + fmt::Debug, V: Clone> LeaderGuard<'_, K, V> {
	fn complete(mut self, generation: u64, result: Result<V>) -> Result<V> {
		self.completed = true;
		let evicted = {
			let mut state = self.cache.state.lock();
			state.inflight.remove(self.key);
			match &result {
				Ok(value) if state.generation == generation => state
					.entries
					.push(self.key.clone(), value.clone())
					.filter(|(k, _)| k != self.key),
				_ => None,
			}
		};
		if let (Some((k, v)), Some(on_evict)) = (&evicted, &self.cache.on_evict) {
			trace!(key = ?k, "cache entry evicted");
			on_evict(k, v);
		}
		self.inflight.publish(result.clone());
		result
	}
}

impl<K: Hash + Eq + Clone + fmt::Debug, V: Clone> Drop for LeaderGuard<'_, K, V> {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		self.cache.state.lock().inflight.remove(self.key);
		self.inflight.publish(Err(RepositoryError::Abandoned {
			key: format!("{:?}", self.key),
		}));
	}
}
