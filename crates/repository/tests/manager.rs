use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use resrepo::{
	DiskCacheConfig, DynamicValue, ExternalLibrary, InMemoryProjectModel, ModuleId, ModuleInfo, ProjectEvent,
	RepositoryConfig, RepositoryError, ResourceRepositories,
};
use resrepo_model::{ResourceNamespace, ResourceType};
use tempfile::TempDir;

const NS: ResourceNamespace = ResourceNamespace::ResAuto;

fn write(path: &Path, contents: &str) {
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, contents).unwrap();
}

fn strings(entries: &[(&str, &str)]) -> String {
	let body: String = entries
		.iter()
		.map(|(name, value)| format!("<string name=\"{name}\">{value}</string>"))
		.collect();
	format!("<resources>{body}</resources>")
}

struct Fixture {
	dir: TempDir,
	model: Arc<InMemoryProjectModel>,
	repos: ResourceRepositories,
}

impl Fixture {
	fn new() -> Self {
		let _ = tracing_subscriber::fmt::try_init();
		let dir = tempfile::tempdir().unwrap();
		let model = Arc::new(InMemoryProjectModel::new(dir.path()));
		let config = RepositoryConfig {
			disk_cache: DiskCacheConfig {
				enabled: true,
				directory: Some(dir.path().join(".cache")),
			},
			..RepositoryConfig::default()
		};
		let repos = ResourceRepositories::new(model.clone(), config);
		Self { dir, model, repos }
	}

	fn root(&self) -> &Path {
		self.dir.path()
	}

	/// Module `id` with one `res/` folder holding `values/strings.xml`.
	fn module(&self, id: &str, entries: &[(&str, &str)]) -> ModuleInfo {
		let res = self.root().join(id).join("res");
		write(&res.join("values/strings.xml"), &strings(entries));
		ModuleInfo::new(id, self.root().join(id)).with_resource_dir(res)
	}

	fn library(&self, name: &str, entries: &[(&str, &str)]) -> ExternalLibrary {
		let res = self.root().join("libs").join(name).join("res");
		write(&res.join("values/values.xml"), &strings(entries));
		ExternalLibrary::new(name).with_res_folder(res).with_package_name(format!("com.{name}"))
	}
}

fn texts(repo: &resrepo::Repository, name: &str) -> Vec<String> {
	repo.get_resources_named(&NS, ResourceType::String, name)
		.iter()
		.filter_map(|item| match &item.value {
			Some(resrepo_model::ResourceValue::Text(t)) => Some(t.clone()),
			_ => None,
		})
		.collect()
}

#[test]
fn test_layers_override_in_priority_order() {
	let fx = Fixture::new();
	let lib = fx.library("widgets", &[("title", "Library"), ("lib_only", "L")]);
	fx.model.set_module(
		fx.module("app", &[("title", "App")])
			.with_dependency("core")
			.with_package_name("com.app"),
	);
	fx.model
		.set_module(fx.module("core", &[("title", "Core"), ("core_only", "C")]).with_library(lib));

	let app = fx.repos.manager(&ModuleId::new("app")).unwrap();
	assert_eq!(texts(&app.module_resources(), "title"), vec!["App"]);
	assert!(app.module_resources().get_resources_named(&NS, ResourceType::String, "core_only").is_empty());

	let project = app.project_resources();
	assert_eq!(texts(&project, "title"), vec!["App"]);
	assert_eq!(texts(&project, "core_only"), vec!["C"]);
	assert!(texts(&project, "lib_only").is_empty());

	let all = app.app_resources();
	assert_eq!(texts(&all, "lib_only"), vec!["L"]);
	assert_eq!(texts(&all, "title"), vec!["App"]);
	assert_eq!(app.cached_app_resources(), Some(all.clone()));
	assert_eq!(app.app_resources(), all);
	assert_eq!(app.test_resources().children().last(), Some(&all));
}

#[test]
fn test_unknown_module_has_no_manager() {
	let fx = Fixture::new();
	assert!(fx.repos.manager(&ModuleId::new("missing")).is_none());
}

#[test]
fn test_folders_and_libraries_are_shared() {
	let fx = Fixture::new();
	let lib = fx.library("shared", &[("x", "1")]);
	let common = fx.root().join("common/res");
	write(&common.join("values/strings.xml"), &strings(&[("common", "yes")]));
	fx.model.set_module(fx.module("a", &[]).with_resource_dir(&common).with_library(lib.clone()));
	fx.model.set_module(fx.module("b", &[]).with_resource_dir(&common).with_library(lib));

	let a = fx.repos.manager(&ModuleId::new("a")).unwrap().app_resources();
	let b = fx.repos.manager(&ModuleId::new("b")).unwrap().app_resources();
	assert_eq!(texts(&a, "common"), vec!["yes"]);
	assert_eq!(texts(&b, "x"), vec!["1"]);
	assert_eq!(fx.repos.folder_repositories().len(), 3);
	assert_eq!(fx.repos.library_cache().len(), 1);
}

#[test]
fn test_cyclic_dependencies_terminate() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("a", &[("a", "1")]).with_dependency("b"));
	fx.model.set_module(fx.module("b", &[("b", "2")]).with_dependency("a"));

	let project = fx.repos.manager(&ModuleId::new("a")).unwrap().project_resources();
	assert_eq!(texts(&project, "a"), vec!["1"]);
	assert_eq!(texts(&project, "b"), vec!["2"]);
}

#[test]
fn test_refresh_rebuilds_nodes() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("app", &[("title", "Old")]));
	let manager = fx.repos.manager(&ModuleId::new("app")).unwrap();
	let before = manager.app_resources();

	manager.refresh_resources();
	manager.refresh_resources();
	assert!(before.is_disposed());
	assert_eq!(manager.cached_app_resources(), None);
	let after = manager.app_resources();
	assert_ne!(after, before);
	assert_eq!(texts(&after, "title"), vec!["Old"]);
}

#[test]
fn test_dependency_refresh_rebuilds_dependents() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("app", &[("a", "1")]).with_dependency("lib"));
	fx.model.set_module(fx.module("lib", &[("b", "2")]));
	let app = fx.repos.manager(&ModuleId::new("app")).unwrap();
	let lib = fx.repos.manager(&ModuleId::new("lib")).unwrap();
	let old = app.project_resources();
	assert_eq!(texts(&old, "b"), vec!["2"]);
	let count = old.modification_count();

	lib.refresh_resources();
	assert!(old.is_disposed());
	assert!(old.modification_count() > count);

	let project = app.project_resources();
	assert_ne!(project, old);
	assert_eq!(texts(&project, "b"), vec!["2"]);

	let file = fx.root().join("app/res/values/strings.xml");
	write(&file, &strings(&[("a", "1"), ("c", "3")]));
	fx.repos.handle_event(&ProjectEvent::FileChanged(file));
	assert_eq!(texts(&project, "b"), vec!["2"]);
	assert_eq!(texts(&project, "c"), vec!["3"]);
	assert_eq!(texts(&lib.project_resources(), "b"), vec!["2"]);
}

#[test]
fn test_file_change_reaches_app_node() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("app", &[("title", "Old")]));
	let app = fx.repos.manager(&ModuleId::new("app")).unwrap().app_resources();
	let count = app.modification_count();

	let file = fx.root().join("app/res/values/strings.xml");
	write(&file, &strings(&[("title", "New")]));
	assert!(fx.repos.handle_event(&ProjectEvent::FileChanged(file)));
	assert!(app.modification_count() > count);
	assert_eq!(texts(&app, "title"), vec!["New"]);

	let outside = fx.root().join("notes.txt");
	write(&outside, "hi");
	assert!(!fx.repos.handle_event(&ProjectEvent::FileChanged(outside)));
}

#[test]
fn test_roots_change_keeps_node_identity() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("app", &[("title", "App")]));
	let manager = fx.repos.manager(&ModuleId::new("app")).unwrap();
	let project = manager.project_resources();
	assert!(texts(&project, "extra").is_empty());

	let extra = fx.root().join("app/extra-res");
	write(&extra.join("values/strings.xml"), &strings(&[("extra", "E")]));
	fx.model.set_module(fx.module("app", &[("title", "App")]).with_resource_dir(&extra));
	fx.repos.handle_event(&ProjectEvent::RootsChanged);

	assert_eq!(manager.project_resources(), project);
	assert_eq!(texts(&project, "extra"), vec!["E"]);

	fx.model.set_module(fx.module("app", &[("title", "App")]));
	fx.repos.handle_event(&ProjectEvent::RootsChanged);
	assert!(texts(&project, "extra").is_empty());
	assert_eq!(fx.repos.folder_repositories().len(), 1);
}

#[test]
fn test_removed_module_is_reset() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("gone", &[("x", "1")]));
	let app = fx.repos.manager(&ModuleId::new("gone")).unwrap().app_resources();

	fx.model.remove_module(&ModuleId::new("gone"));
	fx.repos.handle_event(&ProjectEvent::RootsChanged);
	assert!(app.is_disposed());
	assert!(fx.repos.folder_repositories().is_empty());
	assert!(fx.repos.manager(&ModuleId::new("gone")).is_none());
}

#[test]
fn test_ambiguous_generated_package() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("one", &[]).with_package_name("com.same"));
	fx.model.set_module(fx.module("two", &[]).with_package_name("com.same"));
	fx.model.set_module(fx.module("three", &[]).with_package_name("com.unique"));

	for id in ["one", "two", "three"] {
		fx.repos.manager(&ModuleId::new(id)).unwrap().app_resources();
	}
	let err = fx.repos.find_class_generator("com.same.R$string").unwrap_err();
	assert!(matches!(err, RepositoryError::AmbiguousPackage { .. }));

	let generator = fx.repos.find_class_generator("com.unique.R").unwrap().unwrap();
	assert_eq!(&*generator.owner, "three");
	assert!(fx.repos.find_class_generator("com.absent.R").unwrap().is_none());

	fx.repos.manager(&ModuleId::new("two")).unwrap().refresh_resources();
	assert!(fx.repos.find_class_generator("com.same.R").unwrap().is_some());
}

#[test]
fn test_library_packages_are_registered() {
	let fx = Fixture::new();
	let lib = fx.library("ui", &[("x", "1")]);
	fx.model.set_module(fx.module("app", &[]).with_library(lib));
	let manager = fx.repos.manager(&ModuleId::new("app")).unwrap();
	manager.app_resources();

	let generator = fx.repos.find_class_generator("com.ui.R$string").unwrap().unwrap();
	assert_eq!(&*generator.owner, "ui");
	assert_eq!(texts(&generator.repository, "x"), vec!["1"]);
}

#[test]
fn test_broken_library_is_skipped() {
	let fx = Fixture::new();
	let broken = ExternalLibrary::new("broken").with_res_folder(fx.root().join("nowhere/res"));
	fx.model.set_module(fx.module("app", &[("title", "App")]).with_library(broken));

	let app = fx.repos.manager(&ModuleId::new("app")).unwrap().app_resources();
	assert_eq!(texts(&app, "title"), vec!["App"]);
	assert_eq!(app.children().len(), 1);
}

#[test]
fn test_locales_in_project() {
	let fx = Fixture::new();
	let info = fx.module("app", &[("title", "App")]);
	let res = fx.root().join("app/res");
	write(&res.join("values-fr/strings.xml"), &strings(&[("title", "Appli")]));
	write(&res.join("values-en-rGB/strings.xml"), &strings(&[("title", "App")]));
	fx.model.set_module(info);

	let manager = fx.repos.manager(&ModuleId::new("app")).unwrap();
	let locales: Vec<String> = manager.locales_in_project().into_iter().collect();
	assert_eq!(locales, vec!["en-rGB", "fr"]);
	let languages: Vec<String> = manager.languages_in_project().into_iter().collect();
	assert_eq!(languages, vec!["en", "fr"]);

	let file = res.join("values-de/strings.xml");
	write(&file, &strings(&[("title", "Anw")]));
	fx.repos.handle_event(&ProjectEvent::FileChanged(file));
	assert!(manager.locales_in_project().contains("de"));
}

#[test]
fn test_dynamic_and_sample_data() {
	let fx = Fixture::new();
	let provider = Arc::new(|| vec![DynamicValue::new(ResourceType::String, "build_flavor", "free")]);
	write(&fx.root().join("app/sampledata/names"), "Ada\nGrace\n");
	fx.model.set_module(fx.module("app", &[]).with_dynamic_values(provider));

	let manager = fx.repos.manager(&ModuleId::new("app")).unwrap();
	let module = manager.module_resources();
	assert_eq!(texts(&module, "build_flavor"), vec!["free"]);
	assert!(module.has_resources(&NS, ResourceType::SampleData, "names"));
	assert!(module.has_resources(&ResourceNamespace::Tools, ResourceType::SampleData, "first_names"));

	let count = module.modification_count();
	fx.repos.handle_event(&ProjectEvent::SyncCompleted { success: false });
	assert!(module.modification_count() > count);
	assert_eq!(texts(&module, "build_flavor"), vec!["free"]);
}

#[test]
fn test_namespaces() {
	let fx = Fixture::new();
	fx.model.set_module(
		fx.module("app", &[])
			.with_package_name("com.app")
			.with_namespacing(resrepo::Namespacing::Required),
	);
	let manager = fx.repos.manager(&ModuleId::new("app")).unwrap();
	assert_eq!(manager.namespace(), ResourceNamespace::from_package_name("com.app"));
	assert!(manager.resources_for_namespace(&ResourceNamespace::Android).is_none());
	assert!(manager.resources_for_namespace(&manager.namespace()).is_some());
}

#[test]
fn test_dispose_flushes_everything() {
	let fx = Fixture::new();
	fx.model.set_module(fx.module("app", &[("title", "App")]).with_package_name("com.app"));
	let app = fx.repos.manager(&ModuleId::new("app")).unwrap().app_resources();

	fx.repos.dispose();
	assert!(app.is_disposed());
	assert!(fx.repos.folder_repositories().is_empty());
	assert!(fx.repos.class_registry().packages().is_empty());
	assert!(fx.repos.library_cache().is_empty());
}
