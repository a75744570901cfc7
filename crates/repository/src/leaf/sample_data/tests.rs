use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;

fn content(repo: &Repository, ns: &ResourceNamespace, name: &str) -> SampleDataContent {
	let items = repo.get_resources_named(ns, ResourceType::SampleData, name);
	match items.first().and_then(|i| i.value.clone()) {
		Some(ResourceValue::SampleData(content)) => content,
		other => panic!("no sample data for {name}: {other:?}"),
	}
}

#[test]
fn test_project_sample_sources() {
	let dir = tempfile::tempdir().unwrap();
	let root = dir.path();
	fs::write(root.join("colors"), "red\n\n green \nblue\n").unwrap();
	fs::write(
		root.join("users.json"),
		r#"{"users": [{"name": "Ann", "age": 31}, {"name": "Bob", "admin": true}], "tags": ["a", "b"]}"#,
	)
	.unwrap();
	fs::create_dir(root.join("photos")).unwrap();
	fs::write(root.join("photos/b.png"), b"").unwrap();
	fs::write(root.join("photos/a.JPG"), b"").unwrap();
	fs::write(root.join("photos/notes.txt"), b"").unwrap();
	fs::write(root.join("broken.json"), "{").unwrap();

	let ns = ResourceNamespace::ResAuto;
	let repo = SampleDataRepository::create(&RepositoryDomain::new(), root, ns.clone());

	assert_eq!(
		content(&repo, &ns, "colors"),
		SampleDataContent::Lines(vec!["red".into(), "green".into(), "blue".into()])
	);
	assert_eq!(
		content(&repo, &ns, "users.json/users/name"),
		SampleDataContent::Json(vec!["Ann".into(), "Bob".into()])
	);
	assert_eq!(content(&repo, &ns, "users.json/users/age"), SampleDataContent::Json(vec!["31".into()]));
	assert_eq!(
		content(&repo, &ns, "users.json/tags"),
		SampleDataContent::Json(vec!["a".into(), "b".into()])
	);
	assert_eq!(
		content(&repo, &ns, "photos"),
		SampleDataContent::Images(vec![root.join("photos/a.JPG"), root.join("photos/b.png")])
	);
	assert!(!repo.has_resources(&ns, ResourceType::SampleData, "broken.json"));
}

#[test]
fn test_rescan_on_file_change() {
	let dir = tempfile::tempdir().unwrap();
	let ns = ResourceNamespace::ResAuto;
	let repo = SampleDataRepository::create(&RepositoryDomain::new(), dir.path(), ns.clone());
	assert!(repo.namespaces().is_empty());

	let file = dir.path().join("names");
	fs::write(&file, "Zoe\n").unwrap();
	assert!(repo.rescan_file(&file));
	assert_eq!(content(&repo, &ns, "names"), SampleDataContent::Lines(vec!["Zoe".into()]));
}

#[test]
fn test_builtin_set_is_shared() {
	let first = BuiltinSampleDataRepository::create(&RepositoryDomain::new());
	let second = BuiltinSampleDataRepository::create(&RepositoryDomain::new());
	let ns = ResourceNamespace::Tools;

	for name in builtin_sample_names() {
		assert!(first.has_resources(&ns, ResourceType::SampleData, name), "{name}");
	}
	let a = first.get_resources_named(&ns, ResourceType::SampleData, "lorem/random");
	let b = second.get_resources_named(&ns, ResourceType::SampleData, "lorem/random");
	assert!(Arc::ptr_eq(&a[0], &b[0]));
	assert!(!first.has_resources(&ResourceNamespace::ResAuto, ResourceType::SampleData, "lorem"));
	match &a[0].value {
		Some(ResourceValue::SampleData(SampleDataContent::Lines(words))) => assert!(words.contains(&"ipsum".to_string())),
		other => panic!("unexpected value {other:?}"),
	}
}
