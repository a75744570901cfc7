//! Layered resource repositories.
//!
//! # Purpose
//!
//! Answers "which definitions of `@type/name` are visible from here" for a multi-module
//! project. Each source of resources (a `res/` folder, a library, generated values, sample
//! data) is a leaf [`Repository`]; composites stack leaves by priority and merge their views.
//! A per-module [`ResourceRepositoryManager`] builds and owns the stacks, and a
//! [`ResourceRepositories`] context shares folders, libraries and caches across modules.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Repository`] | Handle to a node; every query goes through it. |
//! | [`CompositeRepository`] | Ordered merge of children with per-type [`OverridePolicy`]. |
//! | [`RepositoryDomain`] | Shared table lock and node registry of one tree. |
//! | [`ResourceTable`] | Items grouped by namespace, type and name. |
//! | [`SingleflightCache`] | Bounded cache computing each key once at a time. |
//! | [`DiskCache`] | Fingerprinted folder snapshots. |
//! | [`ResourceClassRegistry`] | Generated `R` class package ownership. |
//!
//! # Locking
//!
//! Lock order is host [`OuterLock`], then the domain table lock, then leaf-internal locks.
//! Acquiring the outer lock while holding the table lock is a bug; debug builds report it.

pub mod cache;
mod class_registry;
mod composite;
mod config;
mod contents;
mod error;
pub mod fingerprint;
mod leaf;
mod library;
mod lock;
mod manager;
mod model;
mod repository;
pub mod scan;
mod table;
mod visitor;

pub use cache::{AarRepositoryCache, DiskCache, SingleflightCache};
pub use class_registry::{ClassGenerator, ResourceClassRegistry};
pub use composite::{CompositeRepository, OverridePolicy, SYMBOL_FILE_SOURCE};
pub use config::{DiskCacheConfig, RepositoryConfig};
pub use contents::read_resource_bytes;
pub use error::{ConfigError, RepositoryError, ResourceIoError, Result};
#[cfg(any(test, feature = "test-support"))]
pub use leaf::MockRepository;
pub use leaf::{
	AarProtoRepository, AarSourceRepository, BuiltinSampleDataRepository, DynamicRepository, DynamicValue,
	DynamicValueProvider, FolderRepository, SampleDataRepository, builtin_sample_names,
};
pub use library::ExternalLibrary;
pub use lock::{OuterLock, RepositoryDomain, RepositoryId, TableGuard};
pub use manager::{ResourceRepositories, ResourceRepositoryManager};
pub use model::{InMemoryProjectModel, ModuleId, ModuleInfo, Namespacing, ProjectEvent, ProjectModel};
pub use repository::{Repository, RepositoryKind, ResourceSource};
pub use table::{ResourceBucket, ResourceTable};
pub use visitor::{ResourceVisitor, VisitResult};
