//! Sample data: user-provided files in the project and the built-in generators.
//!
//! A project's sample-data directory holds one source per entry:
//!
//! | Entry | Items |
//! |---|---|
//! | `name.json` | one item per array path, e.g. `users.json/users/name` |
//! | any other file | one item named after the file, one value per non-empty line |
//! | directory | one item named after the directory, its image files as values |
//!
//! The built-in set lives in the `tools` namespace, is built once per process and is shared
//! read-only by every project.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use resrepo_model::{
	FolderConfiguration, ResourceItem, ResourceNamespace, ResourceReference, ResourceType, ResourceValue,
	SampleDataContent, SourceLocator,
};
use serde_json::Value;
use tracing::{debug_span, info, warn};

use super::LeafTable;
use crate::lock::{RepositoryDomain, TableGuard};
use crate::repository::{Repository, RepositoryKind, ResourceSource};
use crate::table::{ResourceBucket, ResourceTable};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "xml"];

/// Source label of built-in sample data.
pub const BUILTIN_SAMPLE_SOURCE: &str = "builtin-sample-data";

pub struct SampleDataRepository {
	root: PathBuf,
	namespace: ResourceNamespace,
	table: LeafTable,
}

impl SampleDataRepository {
	pub fn create(domain: &RepositoryDomain, root: impl Into<PathBuf>, namespace: ResourceNamespace) -> Repository {
		let mut repo = Self {
			root: root.into(),
			namespace,
			table: LeafTable::new(ResourceTable::new()),
		};
		repo.table = LeafTable::new(repo.scan_table());
		let name = format!("sample-data:{}", repo.root.display());
		Repository::new(domain, name, RepositoryKind::SampleData(repo))
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn contains(&self, path: &Path) -> bool {
		path.starts_with(&self.root)
	}

	pub(crate) fn scan_table(&self) -> ResourceTable {
		let _span = debug_span!("sample_data", root = %self.root.display()).entered();
		let mut table = ResourceTable::new();
		if !self.root.is_dir() {
			return table;
		}
		let entries = WalkBuilder::new(&self.root)
			.standard_filters(false)
			.hidden(true)
			.max_depth(Some(1))
			.sort_by_file_name(|a, b| a.cmp(b))
			.build()
			.filter_map(Result::ok)
			.filter(|e| e.depth() == 1);
		for entry in entries {
			for (name, content) in read_entry(entry.path()) {
				let item = ResourceItem::new(
					ResourceReference::new(self.namespace.clone(), ResourceType::SampleData, name),
					FolderConfiguration::default(),
					SourceLocator::File(entry.path().to_path_buf()),
				)
				.with_value(ResourceValue::SampleData(content));
				table.insert(item);
			}
		}
		info!(root = %self.root.display(), items = table.item_count(), "scanned sample data");
		table
	}

	pub(crate) fn install_table(&self, _guard: &TableGuard<'_>, table: ResourceTable) {
		self.table.replace(table);
	}
}

fn read_entry(path: &Path) -> Vec<(String, SampleDataContent)> {
	let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
		return Vec::new();
	};
	if path.is_dir() {
		return vec![(file_name.to_string(), SampleDataContent::Images(images_in(path)))];
	}
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(e) => {
			warn!(path = %path.display(), error = %e, "skipping unreadable sample data file");
			return Vec::new();
		}
	};
	if path.extension().is_some_and(|e| e == "json") {
		return match serde_json::from_str::<Value>(&text) {
			Ok(json) => {
				let mut out = Vec::new();
				json_paths(file_name, &json, &mut out);
				out.into_iter().map(|(n, v)| (n, SampleDataContent::Json(v))).collect()
			}
			Err(e) => {
				warn!(path = %path.display(), error = %e, "skipping malformed sample data json");
				Vec::new()
			}
		};
	}
	let lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect();
	vec![(file_name.to_string(), SampleDataContent::Lines(lines))]
}

fn images_in(dir: &Path) -> Vec<PathBuf> {
	let mut images: Vec<PathBuf> = fs::read_dir(dir)
		.into_iter()
		.flatten()
		.filter_map(Result::ok)
		.map(|e| e.path())
		.filter(|p| {
			p.extension()
				.and_then(|e| e.to_str())
				.is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
		})
		.collect();
	images.sort();
	images
}

/// Collects every array reachable in `value` as `(path, values)`.
///
/// Arrays of objects yield one entry per scalar field, named `path/field`.
fn json_paths(path: &str, value: &Value, out: &mut Vec<(String, Vec<String>)>) {
	match value {
		Value::Object(map) => {
			for (key, child) in map {
				json_paths(&format!("{path}/{key}"), child, out);
			}
		}
		Value::Array(elements) if elements.iter().all(Value::is_object) && !elements.is_empty() => {
			let mut fields: Vec<&String> = Vec::new();
			for key in elements.iter().filter_map(Value::as_object).flat_map(|o| o.keys()) {
				if !fields.contains(&key) {
					fields.push(key);
				}
			}
			for field in fields {
				let values: Vec<String> = elements.iter().filter_map(|e| e.get(field)).filter_map(scalar).collect();
				if !values.is_empty() {
					out.push((format!("{path}/{field}"), values));
				}
			}
		}
		Value::Array(elements) => {
			let values: Vec<String> = elements.iter().filter_map(scalar).collect();
			if !values.is_empty() {
				out.push((path.to_string(), values));
			}
		}
		_ => {}
	}
}

fn scalar(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

impl ResourceSource for SampleDataRepository {
	fn bucket(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace, res_type: ResourceType) -> Option<ResourceBucket> {
		self.table.bucket(namespace, res_type)
	}

	fn namespaces(&self, _guard: &TableGuard<'_>) -> BTreeSet<ResourceNamespace> {
		self.table.namespaces()
	}

	fn resource_types(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		self.table.resource_types(namespace)
	}

	fn resource_dirs(&self) -> Vec<PathBuf> {
		vec![self.root.clone()]
	}

	fn modification_count(&self) -> u64 {
		self.table.modification_count()
	}
}

static BUILTIN: LazyLock<ResourceTable> = LazyLock::new(builtin_table);

const FIRST_NAMES: &[&str] = &[
	"Alice", "Bruno", "Chiara", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonas", "Kemi", "Lars",
];
const LAST_NAMES: &[&str] = &[
	"Anders", "Bakker", "Castillo", "Dubois", "Eriksen", "Fujita", "Garcia", "Hansen", "Ivanova", "Jensen", "Kowalski",
	"Lopez",
];
const CITIES: &[&str] = &[
	"Amsterdam", "Buenos Aires", "Cairo", "Dublin", "Edinburgh", "Florence", "Geneva", "Helsinki", "Istanbul", "Jakarta",
];
const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore \
	et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea \
	commodo consequat.";
const DAYS: &[&str] = &["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

fn builtin_generators() -> Vec<(&'static str, SampleDataContent)> {
	let lines = |values: Vec<String>| SampleDataContent::Lines(values);
	let owned = |values: &[&str]| values.iter().map(|s| s.to_string()).collect::<Vec<_>>();
	let images = |set: &str, count: usize| {
		SampleDataContent::Images((1..=count).map(|i| PathBuf::from(format!("{set}/{set}_{i}.png"))).collect())
	};
	let full_names = FIRST_NAMES
		.iter()
		.zip(LAST_NAMES)
		.map(|(first, last)| format!("{first} {last}"))
		.collect();
	let words: Vec<String> = LOREM.split_whitespace().map(|w| w.trim_matches([',', '.']).to_string()).collect();
	let days_of_month = 1..=12u32;

	vec![
		("full_names", lines(full_names)),
		("first_names", lines(owned(FIRST_NAMES))),
		("last_names", lines(owned(LAST_NAMES))),
		("cities", lines(owned(CITIES))),
		("us_zipcodes", lines((0..10).map(|i| format!("{:05}", 10001 + i * 8123)).collect())),
		("us_phones", lines((0..10).map(|i| format!("(555) {:03}-{:04}", 100 + i * 37, 1000 + i * 611)).collect())),
		("lorem", lines(vec![LOREM.to_string()])),
		("lorem/random", lines(words)),
		("date/day_of_week", lines(owned(DAYS))),
		("date/ddmmyy", lines(days_of_month.clone().map(|m| format!("{:02}-{m:02}-24", 2 * m)).collect())),
		("date/mmddyy", lines(days_of_month.map(|m| format!("{m:02}-{:02}-24", 2 * m)).collect())),
		("date/hhmm", lines((0..12).map(|h| format!("{:02}:{:02}", h * 2, h * 5)).collect())),
		("date/hhmmss", lines((0..12).map(|h| format!("{:02}:{:02}:{:02}", h * 2, h * 5, h * 4)).collect())),
		("avatars", images("avatars", 8)),
		("backgrounds/scenic", images("scenic", 6)),
	]
}

fn builtin_table() -> ResourceTable {
	let mut table = ResourceTable::new();
	for (name, content) in builtin_generators() {
		let item = ResourceItem::new(
			ResourceReference::new(ResourceNamespace::Tools, ResourceType::SampleData, name),
			FolderConfiguration::default(),
			SourceLocator::synthetic(BUILTIN_SAMPLE_SOURCE),
		)
		.with_value(ResourceValue::SampleData(content));
		table.insert(item);
	}
	table
}

/// Names of the built-in sample data sets, e.g. `lorem/random`.
pub fn builtin_sample_names() -> Vec<&'static str> {
	builtin_generators().into_iter().map(|(name, _)| name).collect()
}

/// View over the process-wide built-in sample data.
pub struct BuiltinSampleDataRepository;

impl BuiltinSampleDataRepository {
	pub fn create(domain: &RepositoryDomain) -> Repository {
		Repository::new(domain, "builtin-sample-data", RepositoryKind::BuiltinSampleData(Self))
	}
}

impl ResourceSource for BuiltinSampleDataRepository {
	fn bucket(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace, res_type: ResourceType) -> Option<ResourceBucket> {
		BUILTIN.bucket(namespace, res_type).filter(|b| !b.is_empty()).cloned()
	}

	fn namespaces(&self, _guard: &TableGuard<'_>) -> BTreeSet<ResourceNamespace> {
		BUILTIN.namespaces().cloned().collect()
	}

	fn resource_types(&self, _guard: &TableGuard<'_>, namespace: &ResourceNamespace) -> BTreeSet<ResourceType> {
		BUILTIN.resource_types(namespace).into_iter().collect()
	}

	fn modification_count(&self) -> u64 {
		1
	}
}

#[cfg(test)]
mod tests;
