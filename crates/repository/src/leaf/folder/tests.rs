use std::fs;

use pretty_assertions::assert_eq;

use super::*;

const NS: ResourceNamespace = ResourceNamespace::ResAuto;

fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
	let path = root.join(rel);
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(&path, text).unwrap();
	path
}

#[test]
fn test_incremental_rescan_removes_deleted_item() {
	let dir = tempfile::tempdir().unwrap();
	let res = dir.path().join("res");
	let strings = write(
		&res,
		"values/strings.xml",
		r#"<resources><string name="x">1</string><string name="y">2</string><string name="x">dup</string></resources>"#,
	);
	write(&res, "values/more.xml", r#"<resources><string name="z">3</string></resources>"#);

	let repo = FolderRepository::create(&RepositoryDomain::new(), &res, NS, None);
	assert_eq!(repo.get_resources_named(&NS, ResourceType::String, "x").len(), 2);
	let before = repo.modification_count();

	fs::write(&strings, r#"<resources><string name="y">2</string></resources>"#).unwrap();
	assert!(repo.rescan_file(&strings));

	assert!(!repo.has_resources(&NS, ResourceType::String, "x"));
	assert!(repo.has_resources(&NS, ResourceType::String, "y"));
	assert!(repo.has_resources(&NS, ResourceType::String, "z"));
	assert!(repo.modification_count() > before);
	assert_eq!(repo.as_folder().unwrap().full_rescans(), 1);
}

#[test]
fn test_unparsable_edit_keeps_previous_items() {
	let dir = tempfile::tempdir().unwrap();
	let strings = write(dir.path(), "values/strings.xml", r#"<resources><string name="x">1</string></resources>"#);
	let repo = FolderRepository::create(&RepositoryDomain::new(), dir.path(), NS, None);

	fs::write(&strings, "<resources><string name=").unwrap();
	assert!(!repo.rescan_file(&strings));
	assert!(repo.has_resources(&NS, ResourceType::String, "x"));

	fs::remove_file(&strings).unwrap();
	assert!(repo.rescan_file(&strings));
	assert!(!repo.has_resources(&NS, ResourceType::String, "x"));
}

#[test]
fn test_new_file_and_outside_path() {
	let dir = tempfile::tempdir().unwrap();
	let res = dir.path().join("res");
	fs::create_dir_all(&res).unwrap();
	let repo = FolderRepository::create(&RepositoryDomain::new(), &res, NS, None);

	let layout = write(&res, "layout/main.xml", r#"<LinearLayout android:id="@+id/root"/>"#);
	assert!(repo.rescan_file(&layout));
	assert!(repo.has_resources(&NS, ResourceType::Layout, "main"));
	assert!(repo.has_resources(&NS, ResourceType::Id, "root"));

	let outside = write(dir.path(), "other/values/strings.xml", "<resources/>");
	assert!(!repo.rescan_file(&outside));
}

#[test]
fn test_disk_cache_round_trip() {
	let project = tempfile::tempdir().unwrap();
	let cache_root = tempfile::tempdir().unwrap();
	let res = project.path().join("res");
	write(&res, "values/strings.xml", r#"<resources><string name="a">A</string><string name="b">B</string></resources>"#);
	write(&res, "values-de/strings.xml", r#"<resources><string name="a">Ä</string></resources>"#);
	write(&res, "drawable/icon.png", "png");
	let cache = DiskCache::for_project(cache_root.path(), project.path(), "1");
	let domain = RepositoryDomain::new();

	let first = FolderRepository::create(&domain, &res, NS, Some(cache.clone()));
	assert!(!first.as_folder().unwrap().loaded_from_cache());
	let expected = first.as_folder().unwrap().table.read(ResourceTable::summary);

	let second = FolderRepository::create(&domain, &res, NS, Some(cache.clone()));
	let folder = second.as_folder().unwrap();
	assert!(folder.loaded_from_cache());
	assert_eq!(folder.full_rescans(), 0);
	assert_eq!(folder.table.read(ResourceTable::summary), expected);

	// A changed file alters the fingerprint, forcing a rescan.
	write(&res, "values/strings.xml", r#"<resources><string name="a">A</string></resources>"#);
	let third = FolderRepository::create(&domain, &res, NS, Some(cache));
	let folder = third.as_folder().unwrap();
	assert!(!folder.loaded_from_cache());
	assert_eq!(folder.full_rescans(), 1);
	assert!(!third.has_resources(&NS, ResourceType::String, "b"));
}

#[test]
fn test_snapshot_written_on_dispose_after_edit() {
	let project = tempfile::tempdir().unwrap();
	let cache_root = tempfile::tempdir().unwrap();
	let res = project.path().join("res");
	let strings = write(&res, "values/strings.xml", r#"<resources><string name="a">A</string></resources>"#);
	let cache = DiskCache::for_project(cache_root.path(), project.path(), "1");
	let domain = RepositoryDomain::new();

	let repo = FolderRepository::create(&domain, &res, NS, Some(cache.clone()));
	fs::write(&strings, r#"<resources><string name="c">C</string></resources>"#).unwrap();
	repo.rescan_file(&strings);
	repo.dispose();

	let reopened = FolderRepository::create(&domain, &res, NS, Some(cache));
	assert!(reopened.as_folder().unwrap().loaded_from_cache());
	assert!(reopened.has_resources(&NS, ResourceType::String, "c"));
	assert!(!reopened.has_resources(&NS, ResourceType::String, "a"));
}

#[test]
fn test_snapshot_ignores_unsynced_edits() {
	let project = tempfile::tempdir().unwrap();
	let cache_root = tempfile::tempdir().unwrap();
	let res = project.path().join("res");
	let first = write(&res, "values/first.xml", r#"<resources><string name="a">A</string></resources>"#);
	let second = write(&res, "values/second.xml", r#"<resources><string name="b">B</string></resources>"#);
	let cache = DiskCache::for_project(cache_root.path(), project.path(), "1");
	let domain = RepositoryDomain::new();

	let repo = FolderRepository::create(&domain, &res, NS, Some(cache.clone()));
	fs::write(&first, r#"<resources><string name="a">changed</string></resources>"#).unwrap();
	fs::write(&second, r#"<resources><string name="b">B2</string></resources>"#).unwrap();
	assert!(repo.rescan_file(&second));
	repo.dispose();

	let reopened = FolderRepository::create(&domain, &res, NS, Some(cache));
	assert!(!reopened.as_folder().unwrap().loaded_from_cache());
	let a = reopened.get_resources_named(&NS, ResourceType::String, "a");
	assert_eq!(a[0].value, Some(resrepo_model::ResourceValue::Text("changed".into())));
}

#[test]
fn test_unreadable_root_is_empty() {
	let dir = tempfile::tempdir().unwrap();
	let repo = FolderRepository::create(&RepositoryDomain::new(), dir.path().join("missing"), NS, None);
	assert!(repo.namespaces().is_empty());
	assert_eq!(repo.resource_dirs(), vec![dir.path().join("missing")]);
}
