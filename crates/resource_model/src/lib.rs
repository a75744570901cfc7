//! Core resource data model.
//!
//! # Purpose
//!
//! Defines the identities and values every resource repository trades in: the
//! [`ResourceNamespace`] × [`ResourceType`] × name triple ([`ResourceReference`]), the
//! configuration a definition applies to ([`FolderConfiguration`]), where a definition came
//! from ([`SourceLocator`]), and the definition itself ([`ResourceItem`]).
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`ResourceNamespace`] | Scoping domain disambiguating same-named resources. |
//! | [`ResourceType`] | Kind of resource (`string`, `layout`, `id`, ...). |
//! | [`FolderType`] | Kind of `res/` sub-folder and the resource type it yields. |
//! | [`FolderConfiguration`] | Ordered qualifier set (locale, density, API level, ...). |
//! | [`ResourceItem`] | One definition of a resource under one configuration. |
//! | [`ResourcePath`] | Plain file path or `archive!/entry` address of resource bytes. |
//!
//! # Invariants
//!
//! - Item identity is reference + configuration + source. Two items that differ only in
//!   source are distinct and both retained by tables.
//! - Everything here is plain data: no locking, no I/O.

mod configuration;
mod item;
mod namespace;
mod path;
mod resource_type;

pub use configuration::{FolderConfiguration, Qualifier};
pub use item::{
	ItemKey, ResourceItem, ResourceReference, ResourceValue, ResourceVisibility, SampleDataContent, SourceLocator,
};
pub use namespace::ResourceNamespace;
pub use path::{ARCHIVE_SEPARATOR, ResourcePath};
pub use resource_type::{FolderType, ResourceType, is_valid_resource_name};
