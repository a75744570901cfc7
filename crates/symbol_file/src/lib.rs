//! Symbol file readers.
//!
//! Libraries ship two small text files next to their `res/` folder:
//!
//! * `R.txt` lists every generated symbol as `<class> <type> <name> <value>`, where class is
//!   `int` or `int[]`. Array values are written as `{ v1, v2, ... }`.
//! * `public.txt` lists the resources a library exports as `<type> <name>`.
//!
//! Both readers are tolerant: a malformed line is skipped and logged, never fatal. Only
//! failing to read the file at all is an error.

mod public;
mod symbols;

use std::io;
use std::path::PathBuf;

pub use public::PublicResources;
pub use symbols::{Symbol, SymbolTable, SymbolValue};

/// Errors reading a symbol file from disk.
#[derive(Debug, thiserror::Error)]
pub enum SymbolFileError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

pub type Result<T> = std::result::Result<T, SymbolFileError>;

impl SymbolFileError {
	pub fn is_not_found(&self) -> bool {
		match self {
			Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
		}
	}
}
