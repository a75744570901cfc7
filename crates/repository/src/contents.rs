//! Reading the bytes behind a file-based resource.

use std::fs::File;
use std::io::{self, Read};

use resrepo_model::ResourcePath;
use zip::result::ZipError;

use crate::error::ResourceIoError;

/// Reads a plain file or an `archive!/entry` path.
pub fn read_resource_bytes(path: &ResourcePath) -> Result<Vec<u8>, ResourceIoError> {
	match path {
		ResourcePath::Plain(file) => std::fs::read(file).map_err(|e| match e.kind() {
			io::ErrorKind::NotFound => ResourceIoError::NotFound(path.to_string()),
			_ => ResourceIoError::Io {
				path: file.clone(),
				source: e,
			},
		}),
		ResourcePath::InArchive { archive, entry } => {
			let io_error = |source| ResourceIoError::Io {
				path: archive.clone(),
				source,
			};
			let file = match File::open(archive) {
				Ok(file) => file,
				Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ResourceIoError::NotFound(path.to_string())),
				Err(e) => return Err(io_error(e)),
			};
			let archive_error = |source| ResourceIoError::Archive {
				archive: archive.clone(),
				source,
			};
			let mut zip = zip::ZipArchive::new(file).map_err(archive_error)?;
			let mut entry = match zip.by_name(entry) {
				Ok(entry) => entry,
				Err(ZipError::FileNotFound) => return Err(ResourceIoError::NotFound(path.to_string())),
				Err(e) => return Err(archive_error(e)),
			};
			let mut bytes = Vec::new();
			entry.read_to_end(&mut bytes).map_err(io_error)?;
			Ok(bytes)
		}
	}
}
