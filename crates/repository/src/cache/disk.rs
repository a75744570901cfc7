//! On-disk snapshots of folder repositories.
//!
//! One file per resource directory inside a per-project cache directory. Layout:
//! `MAGIC` (8 bytes), `SCHEMA_VERSION` (u32 LE), then a postcard-encoded [`Snapshot`].
//!
//! Any mismatch (schema, cache version, root, fingerprint) means "no snapshot". Files that
//! fail to decode are deleted. Errors never reach the caller; they become a rescan.

use std::io;
use std::path::{Path, PathBuf};

use resrepo_model::ResourceItem;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::fingerprint::path_key;

const MAGIC: &[u8; 8] = b"RESCACHE";
const SCHEMA_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

#[derive(Serialize, Deserialize)]
struct Snapshot {
	cache_version: String,
	root: PathBuf,
	fingerprint: u64,
	items: Vec<ResourceItem>,
}

/// Per-project directory of folder repository snapshots. Created on first write.
#[derive(Debug, Clone)]
pub struct DiskCache {
	dir: PathBuf,
	cache_version: String,
}

impl DiskCache {
	/// Cache for `project_root` under `cache_root`.
	pub fn for_project(cache_root: &Path, project_root: &Path, cache_version: impl Into<String>) -> Self {
		Self {
			dir: cache_root.join(path_key(project_root)),
			cache_version: cache_version.into(),
		}
	}

	pub fn directory(&self) -> &Path {
		&self.dir
	}

	pub fn cache_version(&self) -> &str {
		&self.cache_version
	}

	fn file_for(&self, root: &Path) -> PathBuf {
		self.dir.join(format!("{}.bin", path_key(root)))
	}

	/// Items stored for `root` if the snapshot matches `fingerprint`.
	pub fn load(&self, root: &Path, fingerprint: u64) -> Option<Vec<ResourceItem>> {
		let file = self.file_for(root);
		let bytes = match std::fs::read(&file) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
			Err(e) => {
				warn!(path = %file.display(), error = %e, "failed to read resource cache");
				return None;
			}
		};

		if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
			self.discard(&file, "bad header");
			return None;
		}
		let mut version = [0u8; 4];
		version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
		if u32::from_le_bytes(version) != SCHEMA_VERSION {
			self.discard(&file, "schema version changed");
			return None;
		}

		let snapshot: Snapshot = match postcard::from_bytes(&bytes[HEADER_LEN..]) {
			Ok(s) => s,
			Err(e) => {
				self.discard(&file, &e.to_string());
				return None;
			}
		};
		if snapshot.cache_version != self.cache_version {
			self.discard(&file, "cache version changed");
			return None;
		}
		if snapshot.root != root || snapshot.fingerprint != fingerprint {
			debug!(root = %root.display(), "resource cache is stale");
			return None;
		}
		trace!(root = %root.display(), items = snapshot.items.len(), "resource cache hit");
		Some(snapshot.items)
	}

	/// Writes a snapshot for `root`, replacing any previous one atomically.
	pub fn store(&self, root: &Path, fingerprint: u64, items: Vec<ResourceItem>) -> io::Result<()> {
		let snapshot = Snapshot {
			cache_version: self.cache_version.clone(),
			root: root.to_path_buf(),
			fingerprint,
			items,
		};
		let mut bytes = Vec::with_capacity(4096);
		bytes.extend_from_slice(MAGIC);
		bytes.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
		let body = postcard::to_allocvec(&snapshot).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
		bytes.extend_from_slice(&body);

		std::fs::create_dir_all(&self.dir)?;
		let file = self.file_for(root);
		let tmp = file.with_extension("bin.tmp");
		std::fs::write(&tmp, &bytes)?;
		std::fs::rename(&tmp, &file)?;
		trace!(root = %root.display(), bytes = bytes.len(), "stored resource cache");
		Ok(())
	}

	/// Deletes the snapshot for `root`, if any.
	pub fn remove(&self, root: &Path) {
		let _ = std::fs::remove_file(self.file_for(root));
	}

	/// Deletes every snapshot of this project.
	pub fn clear(&self) {
		if let Err(e) = std::fs::remove_dir_all(&self.dir)
			&& e.kind() != io::ErrorKind::NotFound
		{
			warn!(path = %self.dir.display(), error = %e, "failed to clear resource cache");
		}
	}

	fn discard(&self, file: &Path, reason: &str) {
		warn!(path = %file.display(), reason, "discarding resource cache");
		let _ = std::fs::remove_file(file);
	}
}
