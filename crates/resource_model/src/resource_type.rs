use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FolderConfiguration;

/// Kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
	Anim,
	Animator,
	Array,
	Attr,
	Bool,
	Color,
	Dimen,
	Drawable,
	Font,
	Fraction,
	Id,
	Integer,
	Interpolator,
	Layout,
	Macro,
	Menu,
	Mipmap,
	Navigation,
	Plurals,
	Raw,
	SampleData,
	String,
	Style,
	Styleable,
	Transition,
	Xml,
}

impl ResourceType {
	pub const ALL: [ResourceType; 26] = [
		Self::Anim,
		Self::Animator,
		Self::Array,
		Self::Attr,
		Self::Bool,
		Self::Color,
		Self::Dimen,
		Self::Drawable,
		Self::Font,
		Self::Fraction,
		Self::Id,
		Self::Integer,
		Self::Interpolator,
		Self::Layout,
		Self::Macro,
		Self::Menu,
		Self::Mipmap,
		Self::Navigation,
		Self::Plurals,
		Self::Raw,
		Self::SampleData,
		Self::String,
		Self::Style,
		Self::Styleable,
		Self::Transition,
		Self::Xml,
	];

	/// Name as used in `R` classes, symbol files and `@type/name` references.
	pub fn name(self) -> &'static str {
		match self {
			Self::Anim => "anim",
			Self::Animator => "animator",
			Self::Array => "array",
			Self::Attr => "attr",
			Self::Bool => "bool",
			Self::Color => "color",
			Self::Dimen => "dimen",
			Self::Drawable => "drawable",
			Self::Font => "font",
			Self::Fraction => "fraction",
			Self::Id => "id",
			Self::Integer => "integer",
			Self::Interpolator => "interpolator",
			Self::Layout => "layout",
			Self::Macro => "macro",
			Self::Menu => "menu",
			Self::Mipmap => "mipmap",
			Self::Navigation => "navigation",
			Self::Plurals => "plurals",
			Self::Raw => "raw",
			Self::SampleData => "sample",
			Self::String => "string",
			Self::Style => "style",
			Self::Styleable => "styleable",
			Self::Transition => "transition",
			Self::Xml => "xml",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.name() == name)
	}

	/// Maps a child element of `<resources>` to the type it declares.
	///
	/// Handles the aliases the resource compiler accepts (`string-array`, `declare-styleable`,
	/// `item type="..."` is resolved by the caller).
	pub fn from_xml_tag(tag: &str) -> Option<Self> {
		match tag {
			"string-array" | "integer-array" | "array" => Some(Self::Array),
			"declare-styleable" => Some(Self::Styleable),
			"eat-comment" | "skip" | "public" | "java-symbol" | "add-resource" | "overlayable" | "item" => None,
			other => Self::from_name(other).filter(|t| !matches!(t, Self::SampleData)),
		}
	}
}

impl fmt::Display for ResourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Kind of folder directly under a `res/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderType {
	Anim,
	Animator,
	Color,
	Drawable,
	Font,
	Interpolator,
	Layout,
	Menu,
	Mipmap,
	Navigation,
	Raw,
	Transition,
	Values,
	Xml,
}

impl FolderType {
	fn from_prefix(prefix: &str) -> Option<Self> {
		Some(match prefix {
			"anim" => Self::Anim,
			"animator" => Self::Animator,
			"color" => Self::Color,
			"drawable" => Self::Drawable,
			"font" => Self::Font,
			"interpolator" => Self::Interpolator,
			"layout" => Self::Layout,
			"menu" => Self::Menu,
			"mipmap" => Self::Mipmap,
			"navigation" => Self::Navigation,
			"raw" => Self::Raw,
			"transition" => Self::Transition,
			"values" => Self::Values,
			"xml" => Self::Xml,
			_ => return None,
		})
	}

	/// Splits a folder name like `layout-land` into its type and configuration.
	///
	/// Returns `None` for folders that are not resource folders.
	pub fn parse_folder_name(name: &str) -> Option<(Self, FolderConfiguration)> {
		let (prefix, qualifiers) = match name.split_once('-') {
			Some((p, q)) => (p, Some(q)),
			None => (name, None),
		};
		let folder_type = Self::from_prefix(prefix)?;
		let config = match qualifiers {
			Some(q) => FolderConfiguration::parse_qualifiers(q)?,
			None => FolderConfiguration::default(),
		};
		Some((folder_type, config))
	}

	/// Resource type produced by each file in the folder. `None` for `values`.
	pub fn file_resource_type(self) -> Option<ResourceType> {
		Some(match self {
			Self::Anim => ResourceType::Anim,
			Self::Animator => ResourceType::Animator,
			Self::Color => ResourceType::Color,
			Self::Drawable => ResourceType::Drawable,
			Self::Font => ResourceType::Font,
			Self::Interpolator => ResourceType::Interpolator,
			Self::Layout => ResourceType::Layout,
			Self::Menu => ResourceType::Menu,
			Self::Mipmap => ResourceType::Mipmap,
			Self::Navigation => ResourceType::Navigation,
			Self::Raw => ResourceType::Raw,
			Self::Transition => ResourceType::Transition,
			Self::Xml => ResourceType::Xml,
			Self::Values => return None,
		})
	}

	/// Whether XML files in this folder may declare `@+id/` resources inline.
	pub fn is_id_generating(self) -> bool {
		matches!(
			self,
			Self::Layout | Self::Menu | Self::Navigation | Self::Transition | Self::Xml | Self::Drawable
		)
	}
}

/// Checks a resource name as declared in a values file or derived from a file name.
pub fn is_valid_resource_name(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("string-array", Some(ResourceType::Array))]
	#[case("declare-styleable", Some(ResourceType::Styleable))]
	#[case("dimen", Some(ResourceType::Dimen))]
	#[case("eat-comment", None)]
	#[case("sample", None)]
	fn test_xml_tags(#[case] tag: &str, #[case] expected: Option<ResourceType>) {
		assert_eq!(ResourceType::from_xml_tag(tag), expected);
	}

	#[test]
	fn test_folder_name_with_qualifiers() {
		let (ty, config) = FolderType::parse_folder_name("layout-land").unwrap();
		assert_eq!(ty, FolderType::Layout);
		assert!(!config.is_default());
		assert!(FolderType::parse_folder_name("layouts").is_none());
		assert!(FolderType::parse_folder_name("values").unwrap().1.is_default());
	}

	#[test]
	fn test_resource_names() {
		assert!(is_valid_resource_name("app_name"));
		assert!(is_valid_resource_name("Theme.App"));
		assert!(!is_valid_resource_name("1abc"));
		assert!(!is_valid_resource_name("bad-name"));
		assert!(!is_valid_resource_name(""));
	}
}
