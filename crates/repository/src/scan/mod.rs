//! Resource directory scanning.
//!
//! Walks a `res/` directory and turns each file into items. A file that cannot be parsed is
//! logged and skipped; the rest of the scan continues.

mod values;
mod xml;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use ignore::WalkBuilder;
use regex::Regex;
use resrepo_model::{
	FolderConfiguration, FolderType, ResourceItem, ResourceNamespace, ResourcePath, ResourceReference, ResourceType,
	ResourceValue, SourceLocator, is_valid_resource_name,
};
use tracing::{debug, warn};

use crate::table::ResourceTable;

/// Why a single resource file could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("i/o error: {0}")]
	Io(#[from] io::Error),
	#[error("malformed xml: {0}")]
	Malformed(String),
	#[error("root element is <{0}>, expected <resources>")]
	NotResources(String),
}

/// A file directly inside a typed resource folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
	pub path: PathBuf,
	pub folder_type: FolderType,
	pub configuration: FolderConfiguration,
}

impl ResourceFile {
	/// Classifies `path` as `<res>/<folder>/<file>`. `None` for anything else.
	pub fn classify(res_dir: &Path, path: &Path) -> Option<Self> {
		let relative = path.strip_prefix(res_dir).ok()?;
		let mut components = relative.components();
		let folder = components.next()?.as_os_str().to_str()?;
		let file = components.next()?.as_os_str().to_str()?;
		if components.next().is_some() || file.starts_with('.') {
			return None;
		}
		let (folder_type, configuration) = FolderType::parse_folder_name(folder)?;
		if folder_type == FolderType::Values && !file.ends_with(".xml") {
			return None;
		}
		Some(Self {
			path: path.to_path_buf(),
			folder_type,
			configuration,
		})
	}

	fn is_xml(&self) -> bool {
		self.path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xml"))
	}
}

/// Options shared by every file of one scan.
#[derive(Debug, Clone)]
pub struct ScanContext {
	pub namespace: ResourceNamespace,
	pub library_name: Option<Arc<str>>,
	/// Whether `@+id/` declarations inside layouts and other XML files become id items.
	pub parse_inline_ids: bool,
}

/// Lists every resource file under `res_dir`, sorted by path.
///
/// An unreadable or missing root yields an empty list.
pub fn walk_resource_files(res_dir: &Path) -> Vec<ResourceFile> {
	let mut files = Vec::new();
	let walker = WalkBuilder::new(res_dir)
		.standard_filters(false)
		.hidden(true)
		.max_depth(Some(2))
		.build();
	for entry in walker {
		let entry = match entry {
			Ok(e) => e,
			Err(e) => {
				debug!(root = %res_dir.display(), error = %e, "skipping unreadable entry");
				continue;
			}
		};
		if !entry.file_type().is_some_and(|t| t.is_file()) {
			continue;
		}
		if let Some(file) = ResourceFile::classify(res_dir, entry.path()) {
			files.push(file);
		}
	}
	files.sort_by(|a, b| a.path.cmp(&b.path));
	files
}

/// Parses one file into items.
pub fn parse_file(file: &ResourceFile, ctx: &ScanContext) -> Result<Vec<ResourceItem>, ParseError> {
	let source = SourceLocator::File(file.path.clone());
	match file.folder_type.file_resource_type() {
		None => {
			let text = std::fs::read_to_string(&file.path)?;
			values::parse_values(&text, ctx, &file.configuration, &source)
		}
		Some(res_type) => {
			let mut items = Vec::new();
			match file_resource_name(&file.path) {
				Some(name) => items.push(
					ResourceItem::new(
						ResourceReference::new(ctx.namespace.clone(), res_type, name),
						file.configuration.clone(),
						source.clone(),
					)
					.with_value(ResourceValue::File(ResourcePath::Plain(file.path.clone())))
					.with_library(ctx.library_name.clone()),
				),
				None => warn!(path = %file.path.display(), "invalid resource file name"),
			}
			if ctx.parse_inline_ids && file.folder_type.is_id_generating() && file.is_xml() {
				let text = std::fs::read_to_string(&file.path)?;
				for name in inline_ids(&text)? {
					items.push(
						ResourceItem::new(
							ResourceReference::new(ctx.namespace.clone(), ResourceType::Id, name),
							file.configuration.clone(),
							source.clone(),
						)
						.with_library(ctx.library_name.clone()),
					);
				}
			}
			Ok(items)
		}
	}
}

/// Scans every file under `res_dir` into a table, skipping files that fail to parse.
pub fn scan_directory(res_dir: &Path, ctx: &ScanContext) -> ResourceTable {
	let mut table = ResourceTable::new();
	for file in walk_resource_files(res_dir) {
		match parse_file(&file, ctx) {
			Ok(items) => items.into_iter().for_each(|item| table.insert(item)),
			Err(e) => warn!(path = %file.path.display(), error = %e, "skipping resource file"),
		}
	}
	table
}

/// Resource name of a file-based resource: the file name up to its first dot.
pub fn file_resource_name(path: &Path) -> Option<String> {
	let file_name = path.file_name()?.to_str()?;
	let name = file_name.split('.').next()?;
	is_valid_resource_name(name).then(|| name.to_string())
}

static INLINE_ID: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^@\+id/([A-Za-z_][A-Za-z0-9_.]*)$").expect("inline id pattern is valid"));

/// Distinct `@+id/name` declarations in attribute values, in document order.
fn inline_ids(text: &str) -> Result<Vec<String>, ParseError> {
	let root = xml::parse_document(text)?;
	let mut ids: Vec<String> = Vec::new();
	root.for_each_attr_value(&mut |value| {
		if let Some(caps) = INLINE_ID.captures(value.trim()) {
			let name = caps[1].to_string();
			if !ids.contains(&name) {
				ids.push(name);
			}
		}
	});
	Ok(ids)
}
