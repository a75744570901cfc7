use std::path::Path;

use resrepo_model::ResourceType;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::{Result, SymbolFileError};

/// Resources a library declares public in `public.txt`.
#[derive(Debug, Clone, Default)]
pub struct PublicResources {
	entries: FxHashSet<(ResourceType, String)>,
}

impl PublicResources {
	pub fn parse(text: &str) -> Self {
		let mut entries = FxHashSet::default();
		for line in text.lines() {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			let parsed = line.split_once(' ').and_then(|(ty, name)| {
				let ty = ResourceType::from_name(ty).or_else(|| ResourceType::from_xml_tag(ty))?;
				let name = name.trim();
				(!name.is_empty()).then(|| (ty, name.to_string()))
			});
			match parsed {
				Some(entry) => {
					entries.insert(entry);
				}
				None => debug!(text = line, "skipping malformed public.txt line"),
			}
		}
		Self { entries }
	}

	pub fn read(path: &Path) -> Result<Self> {
		std::fs::read_to_string(path)
			.map(|text| Self::parse(&text))
			.map_err(|source| SymbolFileError::Io {
				path: path.to_path_buf(),
				source,
			})
	}

	pub fn is_public(&self, res_type: ResourceType, name: &str) -> bool {
		self.entries.contains(&(res_type, name.to_string()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
