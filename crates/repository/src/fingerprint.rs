//! Cheap change detection for resource directories.
//!
//! A directory's fingerprint hashes each file's relative path, modification time and length.
//! File contents are never read.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// Modification time and length of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileStamp {
	pub mtime_nanos: u64,
	pub len: u64,
}

impl FileStamp {
	pub fn of(path: &Path) -> Option<Self> {
		let meta = std::fs::metadata(path).ok()?;
		let mtime_nanos = meta
			.modified()
			.ok()
			.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
			.map(|d| d.as_nanos() as u64)
			.unwrap_or(0);
		Some(Self {
			mtime_nanos,
			len: meta.len(),
		})
	}
}

/// Stamps of every regular file under `root`, sorted by path.
pub fn directory_stamps(root: &Path) -> Vec<(PathBuf, FileStamp)> {
	let mut out: Vec<(PathBuf, FileStamp)> = WalkBuilder::new(root)
		.standard_filters(false)
		.hidden(true)
		.build()
		.filter_map(Result::ok)
		.filter(|e| e.file_type().is_some_and(|t| t.is_file()))
		.filter_map(|e| {
			let stamp = FileStamp::of(e.path())?;
			let relative = e.path().strip_prefix(root).ok()?.to_path_buf();
			Some((relative, stamp))
		})
		.collect();
	out.sort_by(|a, b| a.0.cmp(&b.0));
	out
}

/// Fingerprint of a directory's file set under a cache version.
pub fn directory_fingerprint(root: &Path, cache_version: &str) -> u64 {
	let stamps = directory_stamps(root);
	stamps_fingerprint(stamps.iter().map(|(path, stamp)| (path.as_path(), stamp)), cache_version)
}

/// Fingerprint of stamps sorted by relative path, as [`directory_fingerprint`] computes it.
pub fn stamps_fingerprint<'a>(stamps: impl IntoIterator<Item = (&'a Path, &'a FileStamp)>, cache_version: &str) -> u64 {
	let mut hasher = Xxh3::new();
	hasher.update(cache_version.as_bytes());
	hasher.update(&[0]);
	for (path, stamp) in stamps {
		hasher.update(path.to_string_lossy().as_bytes());
		hasher.update(&[0]);
		hasher.update(&stamp.mtime_nanos.to_le_bytes());
		hasher.update(&stamp.len.to_le_bytes());
	}
	hasher.digest()
}

/// Whether a file at `relative` is part of [`directory_stamps`].
pub fn is_stamped(relative: &Path) -> bool {
	!relative
		.components()
		.any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// Stable file-name-safe key for a path.
pub fn path_key(path: &Path) -> String {
	format!("{:016x}", xxh3_64(path.to_string_lossy().as_bytes()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_fingerprint_tracks_length_and_version() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("values").join("strings.xml");
		std::fs::create_dir_all(file.parent().unwrap()).unwrap();
		std::fs::write(&file, "<resources/>").unwrap();

		let before = directory_fingerprint(dir.path(), "1");
		assert_eq!(before, directory_fingerprint(dir.path(), "1"));
		assert_ne!(before, directory_fingerprint(dir.path(), "2"));

		std::fs::write(&file, "<resources></resources>").unwrap();
		assert_ne!(before, directory_fingerprint(dir.path(), "1"));
	}

	#[test]
	fn test_stamps_fingerprint_matches_directory() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir_all(dir.path().join("values")).unwrap();
		std::fs::write(dir.path().join("values/a.xml"), "<resources/>").unwrap();
		std::fs::write(dir.path().join(".hidden"), "x").unwrap();

		let stamps = directory_stamps(dir.path());
		assert_eq!(stamps.len(), 1);
		assert!(is_stamped(&stamps[0].0));
		assert!(!is_stamped(Path::new(".hidden")));
		let fingerprint = stamps_fingerprint(stamps.iter().map(|(p, s)| (p.as_path(), s)), "1");
		assert_eq!(fingerprint, directory_fingerprint(dir.path(), "1"));
	}

	#[test]
	fn test_path_key_is_stable() {
		assert_eq!(path_key(Path::new("/a/res")), path_key(Path::new("/a/res")));
		assert_ne!(path_key(Path::new("/a/res")), path_key(Path::new("/b/res")));
		assert_eq!(path_key(Path::new("/a/res")).len(), 16);
	}
}
