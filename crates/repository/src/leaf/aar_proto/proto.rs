//! Subset of the compiled resource table schema (`resources.pb`).
//!
//! Only the fields read by the repository are declared; prost skips the rest.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceTable {
	#[prost(message, repeated, tag = "2")]
	pub package: Vec<Package>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Package {
	#[prost(string, tag = "2")]
	pub package_name: String,
	#[prost(message, repeated, tag = "3")]
	pub r#type: Vec<Type>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Type {
	#[prost(string, tag = "2")]
	pub name: String,
	#[prost(message, repeated, tag = "3")]
	pub entry: Vec<Entry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Entry {
	#[prost(string, tag = "2")]
	pub name: String,
	#[prost(message, optional, tag = "3")]
	pub visibility: Option<Visibility>,
	#[prost(message, repeated, tag = "6")]
	pub config_value: Vec<ConfigValue>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Visibility {
	#[prost(enumeration = "VisibilityLevel", tag = "1")]
	pub level: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum VisibilityLevel {
	Unknown = 0,
	Private = 1,
	Public = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigValue {
	#[prost(message, optional, tag = "1")]
	pub config: Option<Configuration>,
	#[prost(message, optional, tag = "2")]
	pub value: Option<Value>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Configuration {
	#[prost(string, tag = "3")]
	pub locale: String,
	#[prost(uint32, tag = "7")]
	pub screen_width_dp: u32,
	#[prost(uint32, tag = "8")]
	pub screen_height_dp: u32,
	#[prost(uint32, tag = "9")]
	pub smallest_screen_width_dp: u32,
	/// 1 portrait, 2 landscape, 3 square.
	#[prost(int32, tag = "15")]
	pub orientation: i32,
	/// 1 not night, 2 night.
	#[prost(int32, tag = "17")]
	pub ui_mode_night: i32,
	#[prost(uint32, tag = "18")]
	pub density: u32,
	#[prost(uint32, tag = "24")]
	pub sdk_version: u32,
	#[prost(string, tag = "25")]
	pub product: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
	#[prost(oneof = "value::Kind", tags = "4, 5")]
	pub kind: Option<value::Kind>,
}

pub mod value {
	#[derive(Clone, PartialEq, ::prost::Oneof)]
	pub enum Kind {
		#[prost(message, tag = "4")]
		Item(super::Item),
		#[prost(message, tag = "5")]
		CompoundValue(super::CompoundValue),
	}
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Item {
	#[prost(oneof = "item::Value", tags = "1, 2, 3, 5, 6, 7")]
	pub value: Option<item::Value>,
}

pub mod item {
	#[derive(Clone, PartialEq, ::prost::Oneof)]
	pub enum Value {
		#[prost(message, tag = "1")]
		Ref(super::Reference),
		#[prost(message, tag = "2")]
		Str(super::StringValue),
		#[prost(message, tag = "3")]
		RawStr(super::StringValue),
		#[prost(message, tag = "5")]
		File(super::FileReference),
		#[prost(message, tag = "6")]
		Id(super::Id),
		#[prost(message, tag = "7")]
		Prim(super::Primitive),
	}
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Reference {
	#[prost(uint32, tag = "2")]
	pub id: u32,
	/// `package:type/name`, or `type/name` for the table's own package.
	#[prost(string, tag = "3")]
	pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringValue {
	#[prost(string, tag = "1")]
	pub value: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileReference {
	#[prost(string, tag = "1")]
	pub path: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Id {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Primitive {
	#[prost(oneof = "primitive::Value", tags = "3, 6, 7, 8, 9")]
	pub value: Option<primitive::Value>,
}

pub mod primitive {
	#[derive(Clone, PartialEq, ::prost::Oneof)]
	pub enum Value {
		#[prost(float, tag = "3")]
		Float(f32),
		#[prost(int32, tag = "6")]
		IntDecimal(i32),
		#[prost(uint32, tag = "7")]
		IntHexadecimal(u32),
		#[prost(bool, tag = "8")]
		Boolean(bool),
		#[prost(uint32, tag = "9")]
		ColorArgb8(u32),
	}
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompoundValue {
	#[prost(oneof = "compound_value::Value", tags = "1, 2, 3, 4, 5")]
	pub value: Option<compound_value::Value>,
}

pub mod compound_value {
	#[derive(Clone, PartialEq, ::prost::Oneof)]
	pub enum Value {
		#[prost(message, tag = "1")]
		Attr(super::Attribute),
		#[prost(message, tag = "2")]
		Style(super::Style),
		#[prost(message, tag = "3")]
		Styleable(super::Styleable),
		#[prost(message, tag = "4")]
		Array(super::Array),
		#[prost(message, tag = "5")]
		Plural(super::Plural),
	}
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Attribute {
	#[prost(uint32, tag = "1")]
	pub format_flags: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Style {
	#[prost(message, optional, tag = "1")]
	pub parent: Option<Reference>,
	#[prost(message, repeated, tag = "3")]
	pub entry: Vec<StyleEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StyleEntry {
	#[prost(message, optional, tag = "3")]
	pub key: Option<Reference>,
	#[prost(message, optional, tag = "4")]
	pub item: Option<Item>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Styleable {
	#[prost(message, repeated, tag = "1")]
	pub entry: Vec<StyleableEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StyleableEntry {
	#[prost(message, optional, tag = "3")]
	pub attr: Option<Reference>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Array {
	#[prost(message, repeated, tag = "1")]
	pub element: Vec<ArrayElement>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArrayElement {
	#[prost(message, optional, tag = "1")]
	pub item: Option<Item>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Plural {
	#[prost(message, repeated, tag = "1")]
	pub entry: Vec<PluralEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PluralEntry {
	/// 0 zero, 1 one, 2 two, 3 few, 4 many, 5 other.
	#[prost(int32, tag = "3")]
	pub arity: i32,
	#[prost(message, optional, tag = "4")]
	pub item: Option<Item>,
}
