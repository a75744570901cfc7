use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{FolderConfiguration, ResourceNamespace, ResourcePath, ResourceType};

/// Fully qualified resource identity: namespace, type and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceReference {
	pub namespace: ResourceNamespace,
	pub res_type: ResourceType,
	pub name: Arc<str>,
}

impl ResourceReference {
	pub fn new(namespace: ResourceNamespace, res_type: ResourceType, name: impl Into<Arc<str>>) -> Self {
		Self {
			namespace,
			res_type,
			name: name.into(),
		}
	}
}

impl fmt::Display for ResourceReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.namespace.package_name() {
			Some(pkg) => write!(f, "@{pkg}:{}/{}", self.res_type, self.name),
			None => write!(f, "@{}/{}", self.res_type, self.name),
		}
	}
}

/// Where a definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceLocator {
	/// A file on disk.
	File(PathBuf),
	/// An entry inside an archive.
	Archive { archive: PathBuf, entry: String },
	/// Produced at runtime rather than read from a file. The label names the producer.
	Synthetic(Arc<str>),
}

impl SourceLocator {
	pub fn synthetic(label: &str) -> Self {
		Self::Synthetic(Arc::from(label))
	}

	pub fn file_path(&self) -> Option<&Path> {
		match self {
			Self::File(p) => Some(p),
			_ => None,
		}
	}

	/// Address usable for reading this source's bytes.
	pub fn to_resource_path(&self) -> Option<ResourcePath> {
		match self {
			Self::File(p) => Some(ResourcePath::Plain(p.clone())),
			Self::Archive { archive, entry } => Some(ResourcePath::InArchive {
				archive: archive.clone(),
				entry: entry.clone(),
			}),
			Self::Synthetic(_) => None,
		}
	}
}

/// Visibility of a library resource to consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceVisibility {
	/// No visibility information is available.
	#[default]
	Undefined,
	Private,
	Public,
}

/// Content of a sample data resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleDataContent {
	/// One value per line of a plain text file.
	Lines(Vec<String>),
	/// Values selected from a JSON document by a `path/to/array` name.
	Json(Vec<String>),
	/// Image files contained in a directory.
	Images(Vec<PathBuf>),
}

impl SampleDataContent {
	pub fn len(&self) -> usize {
		match self {
			Self::Lines(v) | Self::Json(v) => v.len(),
			Self::Images(v) => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Parsed value of a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceValue {
	Text(String),
	/// A `@type/name` or `?attr` reference kept unresolved.
	Reference(String),
	/// A file-based resource; the value is the file itself.
	File(ResourcePath),
	Array(Vec<String>),
	Plurals(Vec<(String, String)>),
	Style {
		parent: Option<String>,
		items: Vec<(String, String)>,
	},
	Styleable {
		attrs: Vec<String>,
	},
	Attr {
		formats: Vec<String>,
	},
	SampleData(SampleDataContent),
}

impl ResourceValue {
	/// Classifies raw text found in a values file.
	pub fn from_text(text: &str) -> Self {
		let trimmed = text.trim();
		if trimmed.starts_with('@') || trimmed.starts_with('?') {
			Self::Reference(trimmed.to_string())
		} else {
			Self::Text(trimmed.to_string())
		}
	}
}

/// Identity of one definition. Two items with equal keys are the same definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
	pub reference: ResourceReference,
	pub configuration: FolderConfiguration,
	pub source: SourceLocator,
}

/// One definition of a resource under one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceItem {
	pub reference: ResourceReference,
	/// Library that contributed the definition, `None` for module-local resources.
	pub library_name: Option<Arc<str>>,
	pub configuration: FolderConfiguration,
	pub source: SourceLocator,
	pub value: Option<ResourceValue>,
	pub visibility: ResourceVisibility,
}

impl ResourceItem {
	pub fn new(reference: ResourceReference, configuration: FolderConfiguration, source: SourceLocator) -> Self {
		Self {
			reference,
			library_name: None,
			configuration,
			source,
			value: None,
			visibility: ResourceVisibility::Undefined,
		}
	}

	pub fn with_value(mut self, value: ResourceValue) -> Self {
		self.value = Some(value);
		self
	}

	pub fn with_library(mut self, library: Option<Arc<str>>) -> Self {
		self.library_name = library;
		self
	}

	pub fn with_visibility(mut self, visibility: ResourceVisibility) -> Self {
		self.visibility = visibility;
		self
	}

	pub fn namespace(&self) -> &ResourceNamespace {
		&self.reference.namespace
	}

	pub fn res_type(&self) -> ResourceType {
		self.reference.res_type
	}

	pub fn name(&self) -> &str {
		&self.reference.name
	}

	pub fn key(&self) -> ItemKey {
		ItemKey {
			reference: self.reference.clone(),
			configuration: self.configuration.clone(),
			source: self.source.clone(),
		}
	}
}
