use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between an archive path and an entry inside it.
pub const ARCHIVE_SEPARATOR: &str = "!/";

/// Address of resource bytes: a plain file, or an entry inside a zip archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourcePath {
	Plain(PathBuf),
	InArchive { archive: PathBuf, entry: String },
}

impl ResourcePath {
	pub fn is_in_archive(&self) -> bool {
		matches!(self, Self::InArchive { .. })
	}
}

impl FromStr for ResourcePath {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.split_once(ARCHIVE_SEPARATOR) {
			Some((archive, entry)) => Self::InArchive {
				archive: PathBuf::from(archive),
				entry: entry.to_string(),
			},
			None => Self::Plain(PathBuf::from(s)),
		})
	}
}

impl fmt::Display for ResourcePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Plain(p) => write!(f, "{}", p.display()),
			Self::InArchive { archive, entry } => write!(f, "{}{ARCHIVE_SEPARATOR}{entry}", archive.display()),
		}
	}
}
