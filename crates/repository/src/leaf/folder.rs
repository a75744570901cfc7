//! Repository scanned from a `res/` directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use resrepo_model::{ResourceItem, ResourceNamespace, ResourceType, SourceLocator};
use tracing::{info, info_span, warn};

use super::LeafTable;
use crate::cache::DiskCache;
use crate::fingerprint::{FileStamp, directory_stamps, is_stamped, stamps_fingerprint};
use crate::lock::{RepositoryDomain, TableGuard};
use crate::repository::{Repository, RepositoryKind, ResourceSource};
use crate::scan::{ResourceFile, ScanContext, parse_file, scan_directory};
use crate::table::{ResourceBucket, ResourceTable};

pub struct FolderRepository {
	root: PathBuf,
	ctx: ScanContext,
	table: LeafTable,
	disk_cache: Option<DiskCache>,
	loaded_from_cache: bool,
	full_rescans: AtomicUsize,
	/// Changed since the last snapshot was written.
	dirty: AtomicBool,
	/// Stamps of the files as they were when the table last read them, by relative path.
	synced: Mutex<BTreeMap<PathBuf, FileStamp>>,
}

/// A full scan together with the stamps taken before it.
pub(crate) struct FolderScan {
	table: ResourceTable,
	stamps: BTreeMap<PathBuf, FileStamp>,
}

/// A parsed file together with the stamp taken before it was read.
pub(crate) struct ParsedFile {
	items: Option<Vec<ResourceItem>>,
	stamp: Option<FileStamp>,
}

impl FolderRepository {
	/// Builds a repository for `root`, from the disk cache when its snapshot is fresh.
	pub fn create(
		domain: &RepositoryDomain,
		root: impl Into<PathBuf>,
		namespace: ResourceNamespace,
		disk_cache: Option<DiskCache>,
	) -> Repository {
		let root = root.into();
		let _span = info_span!("folder_repository", root = %root.display()).entered();
		let ctx = ScanContext {
			namespace,
			library_name: None,
			parse_inline_ids: true,
		};

		let cached = disk_cache.as_ref().and_then(|cache| {
			let stamps: BTreeMap<PathBuf, FileStamp> = directory_stamps(&root).into_iter().collect();
			let fingerprint = stamps_fingerprint(stamps.iter().map(|(p, s)| (p.as_path(), s)), cache.cache_version());
			cache.load(&root, fingerprint).map(|items| (items, stamps))
		});
		let loaded_from_cache = cached.is_some();
		let mut repo = Self {
			root: root.clone(),
			ctx,
			table: LeafTable::new(ResourceTable::new()),
			disk_cache,
			loaded_from_cache,
			full_rescans: AtomicUsize::new(0),
			dirty: AtomicBool::new(false),
			synced: Mutex::new(BTreeMap::new()),
		};

		match cached {
			Some((items, stamps)) => {
				let mut table = ResourceTable::new();
				items.into_iter().for_each(|item| table.insert(item));
				repo.table = LeafTable::new(table);
				repo.synced = Mutex::new(stamps);
			}
			None => {
				let scan = repo.scan_table();
				repo.table = LeafTable::new(scan.table);
				repo.synced = Mutex::new(scan.stamps);
				repo.dirty.store(true, Ordering::Release);
				repo.save_snapshot();
			}
		}

		let name = format!("folder:{}", root.display());
		Repository::new(domain, name, RepositoryKind::Folder(repo))
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn namespace(&self) -> &ResourceNamespace {
		&self.ctx.namespace
	}

	/// Whether the table came from a disk snapshot rather than a scan.
	pub fn loaded_from_cache(&self) -> bool {
		self.loaded_from_cache
	}

	/// Number of full directory scans performed.
	pub fn full_rescans(&self) -> usize {
		self.full_rescans.load(Ordering::Relaxed)
	}

	pub fn contains(&self, path: &Path) -> bool {
		path.starts_with(&self.root)
	}

	/// Scans the whole folder. Stamps are taken first, so an edit racing the scan makes the
	/// snapshot stale rather than wrong.
	pub(crate) fn scan_table(&self) -> FolderScan {
		self.full_rescans.fetch_add(1, Ordering::Relaxed);
		let stamps = directory_stamps(&self.root).into_iter().collect();
		let table = scan_directory(&self.root, &self.ctx);
		info!(root = %self.root.display(), items = table.item_count(), "scanned resource folder");
		FolderScan { table, stamps }
	}

	pub(crate) fn install_table(&self, _guard: &TableGuard<'_>, scan: FolderScan) {
		self.table.replace(scan.table);
		*self.synced.lock() = scan.stamps;
		self.dirty.store(true, Ordering::Release);
	}

	/// Parses `path` without touching the table, stamping it first.
	///
	/// `Some(items)` replaces whatever the file contributed before (an empty list for a
	/// deleted or non-resource file). `None` means the file failed to parse and its previous
	/// items and stamp are kept.
	pub(crate) fn parse_file(&self, path: &Path) -> ParsedFile {
		let stamp = FileStamp::of(path);
		let items = self.parse_items(path);
		ParsedFile { items, stamp }
	}

	fn parse_items(&self, path: &Path) -> Option<Vec<ResourceItem>> {
		if !path.is_file() {
			return Some(Vec::new());
		}
		let Some(file) = ResourceFile::classify(&self.root, path) else {
			return Some(Vec::new());
		};
		match parse_file(&file, &self.ctx) {
			Ok(items) => Some(items),
			Err(e) => {
				warn!(path = %path.display(), error = %e, "keeping previous items of unparsable file");
				None
			}
		}
	}

	/// Records the stamp `path` had when it was read. Returns whether it changed.
	fn sync_stamp(&self, path: &Path, stamp: Option<FileStamp>) -> bool {
		let Ok(relative) = path.strip_prefix(&self.root) else {
			return false;
		};
		if !is_stamped(relative) {
			return false;
		}
		let current = stamp.filter(|_| path.is_file());
		let mut synced = self.synced.lock();
		let previous = match current {
			Some(stamp) => synced.insert(relative.to_path_buf(), stamp),
			None => synced.remove(relative),
		};
		previous != current
	}

	/// Replaces every item sourced from `path` with `parsed`. Returns whether anything changed.
	pub(crate) fn apply_file(&self, _guard: &TableGuard<'_>, path: &Path, parsed: ParsedFile) -> bool {
		let Some(items) = parsed.items else {
			return false;
		};
		if self.sync_stamp(path, parsed.stamp) {
			self.dirty.store(true, Ordering::Release);
		}
		let source = SourceLocator::File(path.to_path_buf());
		if items.is_empty() && !self.table.read(|t| t.items().any(|i| i.source == source)) {
			return false;
		}
		self.table.update(|table| {
			table.remove_source(&source);
			items.into_iter().for_each(|item| table.insert(item));
		});
		self.dirty.store(true, Ordering::Release);
		true
	}

	/// Writes the current table to the disk cache if it changed since the last write.
	///
	/// The fingerprint comes from the stamps the table was built from, not from the directory
	/// as it is now, so edits that were never rescanned invalidate the snapshot.
	pub fn save_snapshot(&self) {
		let Some(cache) = &self.disk_cache else {
			return;
		};
		if !self.dirty.swap(false, Ordering::AcqRel) {
			return;
		}
		let items: Vec<ResourceItem> = self.table.read(|t| t.items().map(|i| (**i).clone()).collect());
		let fingerprint = {
			let synced = self.synced.lock();
			stamps_fingerprint(synced.iter().map(|(p, s)| (p.as_path(), s)), cache.cache_version())
		};
		if let Err(e) = cache.store(&self.root, fingerprint, items) {
			warn!(root = %self.root.display(), error = %e, "failed to write resource cache");
		}
	}
}

impl ResourceSource for FolderRepository {
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
		vec![self.root.clone()]
	}

	fn modification_count(&self) -> u64 {
		self.table.modification_count()
	}
}

#[cfg(test)]
mod tests;
