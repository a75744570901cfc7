use std::fs;

use pretty_assertions::assert_eq;

use super::*;

const NS: ResourceNamespace = ResourceNamespace::ResAuto;

fn library_fixture(root: &Path) -> ExternalLibrary {
	let res = root.join("res");
	fs::create_dir_all(res.join("values")).unwrap();
	fs::create_dir_all(res.join("layout")).unwrap();
	fs::write(
		res.join("values/values.xml"),
		r#"<resources><string name="title">T</string><color name="accent">#fff</color></resources>"#,
	)
	.unwrap();
	fs::write(res.join("layout/row.xml"), r#"<FrameLayout android:id="@+id/inline"/>"#).unwrap();
	fs::write(
		root.join("AndroidManifest.xml"),
		"<?xml version=\"1.0\"?>\n<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"\n    package=\"com.example.lib\"/>",
	)
	.unwrap();
	ExternalLibrary::new("com.example:lib:1.0").with_res_folder(res)
}

#[test]
fn test_symbol_file_supplies_ids() {
	let dir = tempfile::tempdir().unwrap();
	let library = library_fixture(dir.path());
	fs::write(
		dir.path().join("R.txt"),
		"int id foo 0x7f010001\nint id bar 0x7f010002\nint string title 0x7f020001\n",
	)
	.unwrap();

	let repo = AarSourceRepository::create(&RepositoryDomain::new(), &library, NS).unwrap();
	let expected: BTreeSet<Arc<str>> = ["bar", "foo"].into_iter().map(Arc::from).collect();
	assert_eq!(repo.id_names(&NS), expected);
	assert!(!repo.has_resources(&NS, ResourceType::Id, "inline"));
	assert!(repo.id_names(&ResourceNamespace::Android).is_empty());
	assert_eq!(repo.package_name().as_deref(), Some("com.example.lib"));
	assert_eq!(repo.library_name().as_deref(), Some("com.example:lib:1.0"));

	let title = repo.get_resources_named(&NS, ResourceType::String, "title");
	assert_eq!(title[0].library_name.as_deref(), Some("com.example:lib:1.0"));
}

#[test]
fn test_without_symbol_file_scans_inline_ids() {
	let dir = tempfile::tempdir().unwrap();
	let library = library_fixture(dir.path()).with_package_name("com.override");

	let repo = AarSourceRepository::create(&RepositoryDomain::new(), &library, NS).unwrap();
	assert!(repo.has_resources(&NS, ResourceType::Id, "inline"));
	assert!(repo.id_names(&NS).is_empty());
	assert_eq!(repo.package_name().as_deref(), Some("com.override"));
}

#[test]
fn test_public_txt_visibility() {
	let dir = tempfile::tempdir().unwrap();
	let library = library_fixture(dir.path());
	let visibility = |repo: &Repository, ty, name| repo.get_resources_named(&NS, ty, name)[0].visibility;

	let repo = AarSourceRepository::create(&RepositoryDomain::new(), &library, NS).unwrap();
	assert_eq!(visibility(&repo, ResourceType::Color, "accent"), ResourceVisibility::Public);

	fs::write(dir.path().join("public.txt"), "string title\n").unwrap();
	let repo = AarSourceRepository::create(&RepositoryDomain::new(), &library, NS).unwrap();
	assert_eq!(visibility(&repo, ResourceType::String, "title"), ResourceVisibility::Public);
	assert_eq!(visibility(&repo, ResourceType::Color, "accent"), ResourceVisibility::Private);
}

#[test]
fn test_construction_errors() {
	let dir = tempfile::tempdir().unwrap();
	let domain = RepositoryDomain::new();

	let err = AarSourceRepository::create(&domain, &ExternalLibrary::new("none"), NS).unwrap_err();
	assert!(matches!(err, RepositoryError::MissingResourceFolder { .. }));

	let file = dir.path().join("res.zip");
	fs::write(&file, b"").unwrap();
	let err = AarSourceRepository::create(&domain, &ExternalLibrary::new("file").with_res_folder(&file), NS).unwrap_err();
	assert!(matches!(err, RepositoryError::NotLocalDirectory { path, .. } if path == file));
}
