use pretty_assertions::assert_eq;
use resrepo_model::{FolderConfiguration, ResourceReference, ResourceValue, SourceLocator};

use super::*;
use crate::leaf::MockRepository;
use crate::lock::OuterLock;

fn string(name: &str, value: &str, source: &str) -> ResourceItem {
	ResourceItem::new(
		ResourceReference::new(ResourceNamespace::ResAuto, ResourceType::String, name),
		FolderConfiguration::default(),
		SourceLocator::File(PathBuf::from(source)),
	)
	.with_value(ResourceValue::Text(value.to_string()))
}

fn composite(domain: &RepositoryDomain, name: &str) -> Repository {
	Repository::new(domain, name, RepositoryKind::Composite(CompositeRepository::new(None)))
}

fn text_of(repo: &Repository, name: &str) -> Vec<String> {
	repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::String, name)
		.iter()
		.filter_map(|item| match &item.value {
			Some(ResourceValue::Text(t)) => Some(t.clone()),
			_ => None,
		})
		.collect()
}

#[test]
fn test_first_child_overrides() {
	let domain = RepositoryDomain::new();
	let a = MockRepository::from_items(&domain, "a", [string("app_name", "A", "a.xml"), string("only_a", "1", "a.xml")]);
	let b = MockRepository::from_items(&domain, "b", [string("app_name", "B", "b.xml"), string("only_b", "2", "b.xml")]);
	let root = composite(&domain, "root");
	root.set_children(vec![a.clone(), b.clone()]);

	assert_eq!(text_of(&root, "app_name"), vec!["A"]);
	assert!(root.has_resources(&ResourceNamespace::ResAuto, ResourceType::String, "only_a"));
	assert!(root.has_resources(&ResourceNamespace::ResAuto, ResourceType::String, "only_b"));
	assert_eq!(root.children(), vec![a.clone(), b.clone()]);

	let before = root.modification_count();
	root.set_children(vec![b.clone()]);
	assert!(root.modification_count() > before);
	assert_eq!(text_of(&root, "app_name"), vec!["B"]);
	assert!(!root.has_resources(&ResourceNamespace::ResAuto, ResourceType::String, "only_a"));
	assert!(a.parent_ids().is_empty());
	assert_eq!(b.parent_ids(), vec![root.id()]);
}

#[test]
fn test_child_change_reaches_every_ancestor() {
	let domain = RepositoryDomain::new();
	let leaf = MockRepository::from_items(&domain, "leaf", Vec::<ResourceItem>::new());
	let middle = composite(&domain, "middle");
	let top = composite(&domain, "top");
	middle.set_children(vec![leaf.clone()]);
	top.set_children(vec![middle.clone()]);
	assert!(!top.has_resources(&ResourceNamespace::ResAuto, ResourceType::String, "late"));

	let (leaf_before, middle_before, top_before) =
		(leaf.modification_count(), middle.modification_count(), top.modification_count());
	leaf.add_mock_item(string("late", "x", "late.xml"));

	assert!(leaf.modification_count() > leaf_before);
	assert!(middle.modification_count() > middle_before);
	assert!(top.modification_count() > top_before);
	assert_eq!(text_of(&top, "late"), vec!["x"]);
}

#[test]
fn test_cycles_and_foreign_children_are_rejected() {
	let domain = RepositoryDomain::new();
	let a = composite(&domain, "a");
	let b = composite(&domain, "b");
	a.set_children(vec![b.clone()]);
	b.set_children(vec![a.clone()]);
	assert!(b.children().is_empty());

	a.set_children(vec![a.clone()]);
	assert!(a.children().is_empty());

	let other = RepositoryDomain::new();
	let foreign = MockRepository::from_items(&other, "foreign", [string("x", "1", "x.xml")]);
	let local = MockRepository::from_items(&domain, "local", [string("y", "2", "y.xml")]);
	a.set_children(vec![foreign, local.clone()]);
	assert_eq!(a.children(), vec![local]);
}

#[test]
fn test_set_children_on_leaf_is_ignored() {
	let domain = RepositoryDomain::new();
	let leaf = MockRepository::from_items(&domain, "leaf", [string("x", "1", "x.xml")]);
	let other = MockRepository::from_items(&domain, "other", Vec::<ResourceItem>::new());
	leaf.set_children(vec![other]);
	assert!(leaf.children().is_empty());
	assert_eq!(leaf.all_resources().len(), 1);
}

#[test]
fn test_accept_stops_on_abort() {
	let domain = RepositoryDomain::new();
	let repo = MockRepository::from_items(
		&domain,
		"repo",
		[string("a", "1", "v.xml"), string("b", "2", "v.xml"), string("c", "3", "v.xml")],
	);
	let mut seen = Vec::new();
	let result = repo.accept(&mut |item: &Arc<ResourceItem>| {
		seen.push(item.name().to_string());
		if seen.len() == 2 { VisitResult::Abort } else { VisitResult::Continue }
	});
	assert_eq!(result, VisitResult::Abort);
	assert_eq!(seen, vec!["a", "b"]);
}

#[test]
fn test_queries_inside_outer_lock_keep_order() {
	let domain = RepositoryDomain::new();
	let repo = MockRepository::from_items(&domain, "repo", [string("a", "1", "v.xml")]);
	let outer = OuterLock::new(());
	{
		let _read = outer.read();
		assert!(repo.has_resources(&ResourceNamespace::ResAuto, ResourceType::String, "a"));
	}
	assert_eq!(outer.order_violations(), 0);

	repo.accept(&mut |_: &Arc<ResourceItem>| {
		let _inverted = outer.read();
		VisitResult::Continue
	});
	assert_eq!(outer.order_violations(), 1);
}

#[test]
fn test_dispose_detaches_children_once() {
	let domain = RepositoryDomain::new();
	let leaf = MockRepository::from_items(&domain, "leaf", [string("a", "1", "v.xml")]);
	let root = composite(&domain, "root");
	root.set_children(vec![leaf.clone()]);

	root.dispose();
	assert!(root.is_disposed());
	assert!(root.children().is_empty());
	assert!(leaf.parent_ids().is_empty());
	assert!(root.all_resources().is_empty());
	root.dispose();
	assert!(!leaf.is_disposed());
}

#[test]
fn test_disposed_composite_invalidates_ancestors() {
	let domain = RepositoryDomain::new();
	let leaf = MockRepository::from_items(&domain, "leaf", [string("a", "1", "v.xml")]);
	let middle = composite(&domain, "middle");
	let top = composite(&domain, "top");
	middle.set_children(vec![leaf]);
	top.set_children(vec![middle.clone()]);
	assert_eq!(text_of(&top, "a"), vec!["1"]);

	let before = top.modification_count();
	middle.dispose();
	assert!(top.modification_count() > before);
	assert!(text_of(&top, "a").is_empty());
}

#[test]
fn test_dropped_parent_is_forgotten() {
	let domain = RepositoryDomain::new();
	let leaf = MockRepository::from_items(&domain, "leaf", Vec::<ResourceItem>::new());
	{
		let root = composite(&domain, "root");
		root.set_children(vec![leaf.clone()]);
		assert_eq!(leaf.parent_ids().len(), 1);
	}
	leaf.add_mock_item(string("a", "1", "v.xml"));
	assert!(leaf.parent_ids().is_empty());
}
