//! External library descriptors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A compile-time library dependency with resources.
///
/// A library is located by an extracted resource folder, a compiled resource archive, or both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalLibrary {
	pub name: Arc<str>,
	pub res_folder: Option<PathBuf>,
	pub res_apk: Option<PathBuf>,
	/// Defaults to `R.txt` next to the resource folder.
	pub symbol_file: Option<PathBuf>,
	pub package_name: Option<Arc<str>>,
}

impl ExternalLibrary {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			res_folder: None,
			res_apk: None,
			symbol_file: None,
			package_name: None,
		}
	}

	pub fn with_res_folder(mut self, path: impl Into<PathBuf>) -> Self {
		self.res_folder = Some(path.into());
		self
	}

	pub fn with_res_apk(mut self, path: impl Into<PathBuf>) -> Self {
		self.res_apk = Some(path.into());
		self
	}

	pub fn with_symbol_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.symbol_file = Some(path.into());
		self
	}

	pub fn with_package_name(mut self, package: impl Into<Arc<str>>) -> Self {
		self.package_name = Some(package.into());
		self
	}

	/// Library root: the directory holding the resource folder.
	pub fn root(&self) -> Option<&Path> {
		self.res_folder.as_deref().and_then(Path::parent)
	}

	/// Symbol file to read, explicit or the conventional `R.txt`.
	pub fn symbol_file_path(&self) -> Option<PathBuf> {
		self.symbol_file
			.clone()
			.or_else(|| self.root().map(|root| root.join("R.txt")))
	}
}
