use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors surfaced by repository construction and class-name resolution.
///
/// Cloneable so a failed single-flight construction can be handed to every waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
	#[error("library {library} has no resource folder")]
	MissingResourceFolder { library: String },

	#[error("resource folder {path} of library {library} is not a local directory")]
	NotLocalDirectory { library: String, path: PathBuf },

	#[error("library {library} has no compiled resource archive")]
	MissingResourceApk { library: String },

	#[error("resource archive {path} of library {library} is not a local file")]
	NotLocalFile { library: String, path: PathBuf },

	#[error("package {package} is generated by both {first} and {second}")]
	AmbiguousPackage { package: String, first: String, second: String },

	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: Arc<io::Error>,
	},

	#[error("construction of {key} was abandoned")]
	Abandoned { key: String },
}

impl RepositoryError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source: Arc::new(source),
		}
	}
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors reading the bytes of a single resource.
#[derive(Debug, thiserror::Error)]
pub enum ResourceIoError {
	#[error("resource not found: {0}")]
	NotFound(String),

	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("archive error in {archive}: {source}")]
	Archive {
		archive: PathBuf,
		#[source]
		source: zip::result::ZipError,
	},
}

/// Errors loading a [`crate::RepositoryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid config: {0}")]
	Parse(#[from] toml::de::Error),
}
