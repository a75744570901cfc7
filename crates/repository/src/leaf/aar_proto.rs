//! Repository over a compiled resource archive.
//!
//! The archive is a zip holding `resources.pb`, the protobuf-encoded resource table, plus the
//! compiled files it references. File-based items point into the archive with
//! `archive!/entry` paths.

mod proto;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use prost::Message;
use resrepo_model::{
	FolderConfiguration, Qualifier, ResourceItem, ResourceNamespace, ResourcePath, ResourceReference, ResourceType,
	ResourceValue, ResourceVisibility, SourceLocator, is_valid_resource_name,
};
use tracing::{debug, info_span, warn};

use self::proto::{compound_value, item, primitive, value};
use super::LeafTable;
use crate::error::{RepositoryError, Result};
use crate::library::ExternalLibrary;
use crate::lock::{RepositoryDomain, TableGuard};
use crate::repository::{Repository, RepositoryKind, ResourceSource};
use crate::table::{ResourceBucket, ResourceTable};

/// Archive entry holding the encoded resource table.
pub const RESOURCE_TABLE_ENTRY: &str = "resources.pb";

#[derive(Debug, thiserror::Error)]
enum ArchiveError {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error(transparent)]
	Zip(#[from] zip::result::ZipError),
	#[error(transparent)]
	Decode(#[from] prost::DecodeError),
}

pub struct AarProtoRepository {
	library_name: Arc<str>,
	archive: PathBuf,
	package_name: Option<Arc<str>>,
	table: LeafTable,
}

impl AarProtoRepository {
	/// Loads `library`'s compiled resource archive.
	///
	/// Fails if the library has no archive or it is not a local file. A corrupt archive yields
	/// an empty repository.
	pub fn create(domain: &RepositoryDomain, library: &ExternalLibrary, namespace: ResourceNamespace) -> Result<Repository> {
		let archive = library.res_apk.clone().ok_or_else(|| RepositoryError::MissingResourceApk {
			library: library.name.to_string(),
		})?;
		if !archive.is_file() {
			return Err(RepositoryError::NotLocalFile {
				library: library.name.to_string(),
				path: archive,
			});
		}
		let _span = info_span!("aar_proto", library = %library.name).entered();

		let (table, encoded_package) = match read_resource_table(&archive) {
			Ok(encoded) => {
				let package = encoded.package.first().map(|p| p.package_name.clone()).filter(|p| !p.is_empty());
				(build_table(&encoded, &archive, &namespace, &library.name), package)
			}
			Err(e) => {
				warn!(archive = %archive.display(), error = %e, "unreadable resource archive");
				(ResourceTable::new(), None)
			}
		};
		let package_name = library.package_name.clone().or_else(|| encoded_package.map(Arc::from));
		debug!(items = table.item_count(), package = package_name.as_deref(), "loaded compiled library resources");

		let repo = Self {
			library_name: library.name.clone(),
			archive,
			package_name,
			table: LeafTable::new(table),
		};
		Ok(Repository::new(domain, format!("aar-proto:{}", library.name), RepositoryKind::AarProto(repo)))
	}

	pub fn archive(&self) -> &Path {
		&self.archive
	}
}

fn read_resource_table(archive: &Path) -> std::result::Result<proto::ResourceTable, ArchiveError> {
	let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
	let mut entry = zip.by_name(RESOURCE_TABLE_ENTRY)?;
	let mut bytes = Vec::new();
	entry.read_to_end(&mut bytes)?;
	Ok(proto::ResourceTable::decode(bytes.as_slice())?)
}

fn build_table(encoded: &proto::ResourceTable, archive: &Path, namespace: &ResourceNamespace, library: &Arc<str>) -> ResourceTable {
	let mut table = ResourceTable::new();
	let table_source = SourceLocator::Archive {
		archive: archive.to_path_buf(),
		entry: RESOURCE_TABLE_ENTRY.to_string(),
	};
	for package in &encoded.package {
		for ty in &package.r#type {
			let Some(res_type) = ResourceType::from_name(&ty.name) else {
				debug!(resource_type = %ty.name, "skipping unknown resource type");
				continue;
			};
			for entry in &ty.entry {
				if !is_valid_resource_name(&entry.name) {
					warn!(name = %entry.name, "skipping invalid resource name");
					continue;
				}
				let visibility = match entry.visibility.as_ref().map(|v| v.level()) {
					Some(proto::VisibilityLevel::Public) => ResourceVisibility::Public,
					Some(proto::VisibilityLevel::Private) => ResourceVisibility::Private,
					_ => ResourceVisibility::Undefined,
				};
				for config_value in &entry.config_value {
					let configuration = config_value.config.as_ref().map(configuration).unwrap_or_default();
					let (source, resolved) = match config_value.value.as_ref().and_then(|v| v.kind.as_ref()) {
						Some(value::Kind::Item(encoded)) => match &encoded.value {
							Some(item::Value::File(file)) => (
								SourceLocator::Archive {
									archive: archive.to_path_buf(),
									entry: file.path.clone(),
								},
								Some(ResourceValue::File(ResourcePath::InArchive {
									archive: archive.to_path_buf(),
									entry: file.path.clone(),
								})),
							),
							_ => (table_source.clone(), item_value(encoded)),
						},
						Some(value::Kind::CompoundValue(compound)) => (table_source.clone(), compound_to_value(compound)),
						None => (table_source.clone(), None),
					};
					let mut resource = ResourceItem::new(
						ResourceReference::new(namespace.clone(), res_type, entry.name.as_str()),
						configuration,
						source,
					)
					.with_library(Some(library.clone()))
					.with_visibility(visibility);
					resource.value = resolved;
					table.insert(resource);
				}
			}
		}
	}
	table
}

fn configuration(config: &proto::Configuration) -> FolderConfiguration {
	let mut qualifiers = Vec::new();
	if !config.locale.is_empty() {
		let mut parts = config.locale.split(['-', '_']);
		if let Some(language) = parts.next().filter(|l| !l.is_empty()) {
			qualifiers.push(Qualifier::Locale {
				language: Arc::from(language),
				region: parts.next().map(Arc::from),
			});
		}
	}
	if config.smallest_screen_width_dp != 0 {
		qualifiers.push(Qualifier::SmallestWidth(config.smallest_screen_width_dp));
	}
	if config.screen_width_dp != 0 {
		qualifiers.push(Qualifier::ScreenWidth(config.screen_width_dp));
	}
	if config.screen_height_dp != 0 {
		qualifiers.push(Qualifier::ScreenHeight(config.screen_height_dp));
	}
	match config.orientation {
		1 => qualifiers.push(Qualifier::Orientation(Arc::from("port"))),
		2 => qualifiers.push(Qualifier::Orientation(Arc::from("land"))),
		3 => qualifiers.push(Qualifier::Orientation(Arc::from("square"))),
		_ => {}
	}
	match config.ui_mode_night {
		1 => qualifiers.push(Qualifier::Night(false)),
		2 => qualifiers.push(Qualifier::Night(true)),
		_ => {}
	}
	if let Some(density) = density_name(config.density) {
		qualifiers.push(Qualifier::Density(Arc::from(density)));
	}
	if config.sdk_version != 0 {
		qualifiers.push(Qualifier::Api(config.sdk_version));
	}
	if !config.product.is_empty() {
		qualifiers.push(Qualifier::Other(Arc::from(config.product.as_str())));
	}
	FolderConfiguration::new(qualifiers)
}

fn density_name(dpi: u32) -> Option<String> {
	Some(match dpi {
		0 => return None,
		120 => "ldpi".into(),
		160 => "mdpi".into(),
		213 => "tvdpi".into(),
		240 => "hdpi".into(),
		320 => "xhdpi".into(),
		480 => "xxhdpi".into(),
		640 => "xxxhdpi".into(),
		0xfffe => "anydpi".into(),
		0xffff => "nodpi".into(),
		other => format!("{other}dpi"),
	})
}

fn reference_text(reference: &proto::Reference) -> String {
	if reference.name.is_empty() {
		format!("@0x{:08x}", reference.id)
	} else {
		format!("@{}", reference.name)
	}
}

/// Text form of an item nested in a compound value.
fn item_text(item: &proto::Item) -> String {
	match &item.value {
		Some(item::Value::Ref(r)) => reference_text(r),
		Some(item::Value::Str(s) | item::Value::RawStr(s)) => s.value.clone(),
		Some(item::Value::File(f)) => f.path.clone(),
		Some(item::Value::Prim(p)) => primitive_text(p).unwrap_or_default(),
		Some(item::Value::Id(_)) | None => String::new(),
	}
}

fn primitive_text(prim: &proto::Primitive) -> Option<String> {
	Some(match prim.value.as_ref()? {
		primitive::Value::Float(v) => v.to_string(),
		primitive::Value::IntDecimal(v) => v.to_string(),
		primitive::Value::IntHexadecimal(v) => format!("0x{v:x}"),
		primitive::Value::Boolean(v) => v.to_string(),
		primitive::Value::ColorArgb8(v) => format!("#{v:08x}"),
	})
}

fn item_value(item: &proto::Item) -> Option<ResourceValue> {
	match item.value.as_ref()? {
		item::Value::Ref(r) => Some(ResourceValue::Reference(reference_text(r))),
		item::Value::Str(s) | item::Value::RawStr(s) => Some(ResourceValue::Text(s.value.clone())),
		item::Value::Prim(p) => primitive_text(p).map(ResourceValue::Text),
		item::Value::Id(_) | item::Value::File(_) => None,
	}
}

const ATTR_FORMATS: &[(u32, &str)] = &[
	(1, "reference"),
	(1 << 1, "string"),
	(1 << 2, "integer"),
	(1 << 3, "boolean"),
	(1 << 4, "color"),
	(1 << 5, "float"),
	(1 << 6, "dimension"),
	(1 << 7, "fraction"),
	(1 << 16, "enum"),
	(1 << 17, "flags"),
];

const PLURAL_ARITY: &[&str] = &["zero", "one", "two", "few", "many", "other"];

fn compound_to_value(compound: &proto::CompoundValue) -> Option<ResourceValue> {
	let attr_name = |r: &Option<proto::Reference>| r.as_ref().map(|r| r.name.clone()).unwrap_or_default();
	Some(match compound.value.as_ref()? {
		compound_value::Value::Attr(attr) => ResourceValue::Attr {
			formats: ATTR_FORMATS
				.iter()
				.filter(|(bit, _)| attr.format_flags & bit != 0)
				.map(|(_, name)| name.to_string())
				.collect(),
		},
		compound_value::Value::Style(style) => ResourceValue::Style {
			parent: style.parent.as_ref().map(|p| p.name.clone()),
			items: style
				.entry
				.iter()
				.map(|e| (attr_name(&e.key), e.item.as_ref().map(item_text).unwrap_or_default()))
				.collect(),
		},
		compound_value::Value::Styleable(styleable) => ResourceValue::Styleable {
			attrs: styleable.entry.iter().map(|e| attr_name(&e.attr)).collect(),
		},
		compound_value::Value::Array(array) => ResourceValue::Array(
			array
				.element
				.iter()
				.map(|e| e.item.as_ref().map(item_text).unwrap_or_default())
				.collect(),
		),
		compound_value::Value::Plural(plural) => ResourceValue::Plurals(
			plural
				.entry
				.iter()
				.map(|e| {
					let arity = usize::try_from(e.arity).ok().and_then(|i| PLURAL_ARITY.get(i)).unwrap_or(&"other");
					(arity.to_string(), e.item.as_ref().map(item_text).unwrap_or_default())
				})
				.collect(),
		),
	})
}

impl ResourceSource for AarProtoRepository {
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
		vec![self.archive.clone()]
	}

	fn modification_count(&self) -> u64 {
		self.table.modification_count()
	}

	fn package_name(&self) -> Option<Arc<str>> {
		self.package_name.clone()
	}

	fn library_name(&self) -> Option<Arc<str>> {
		Some(self.library_name.clone())
	}
}
