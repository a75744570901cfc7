use pretty_assertions::assert_eq;

use super::*;

const WIDGET: &str = "\
int attr attrA 0x7f010000
int attr attrB 0x7f010001
int[] styleable Widget { 1, 2, 3 }
int styleable Widget_attrB 1
int styleable Widget_attrA 0
int styleable Widget_attrC 2
";

#[test]
fn test_id_names_exact() {
	let table = SymbolTable::parse(
		"int id foo 0x7f010001\nint id bar 0x7f010002\nint string app_name 0x7f020000\n",
	);
	let ids: Vec<String> = table.id_names().into_iter().collect();
	assert_eq!(ids, vec!["bar".to_string(), "foo".to_string()]);
}

#[test]
fn test_styleable_reordered_to_caller_order() {
	let table = SymbolTable::parse(WIDGET);
	assert_eq!(
		table.styleable_attr_values("Widget", &["attrA", "attrB", "attrC"]),
		Some(vec![2, 1, 3])
	);
	assert_eq!(
		table.styleable_attr_values("Widget", &["attrC", "attrA", "attrB"]),
		Some(vec![3, 2, 1])
	);
}

#[test]
fn test_styleable_count_mismatch_is_not_found() {
	let table = SymbolTable::parse(
		"int[] styleable Widget { 1, 2, 3 }\nint styleable Widget_attrA 0\nint styleable Widget_attrB 1\n",
	);
	assert_eq!(table.styleable_attr_values("Widget", &["attrA", "attrB"]), None);

	let table = SymbolTable::parse(WIDGET);
	assert_eq!(table.styleable_attr_values("Widget", &["attrA", "attrB"]), None);
	assert_eq!(table.styleable_attr_values("Widget", &["attrA", "attrB", "attrD"]), None);
	assert_eq!(table.styleable_attr_values("Missing", &[]), None);
}

#[test]
fn test_nested_styleable_attrs_excluded() {
	let table = SymbolTable::parse(
		"\
int[] styleable Outer { 10 }
int styleable Outer_color 0
int[] styleable Outer_Inner { 20, 30 }
int styleable Outer_Inner_size 0
int styleable Outer_Inner_android_text 1
",
	);
	assert_eq!(table.styleable_attr_values("Outer", &["color"]), Some(vec![10]));
	assert_eq!(
		table.styleable_attr_values("Outer_Inner", &["android:text", "size"]),
		Some(vec![30, 20])
	);
}

#[test]
fn test_malformed_lines_skipped() {
	let table = SymbolTable::parse(
		"garbage\nint id ok 0x1\nint id broken zz\nint[] styleable S { 1, x }\nlong id x 1\n\nint id  spaced   7\n",
	);
	assert_eq!(table.len(), 2);
	assert_eq!(table.get(ResourceType::Id, "spaced").map(|s| &s.value), Some(&SymbolValue::Int(7)));
}

#[test]
fn test_read_missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let err = SymbolTable::read(&dir.path().join("R.txt")).unwrap_err();
	assert!(err.is_not_found());
}

#[test]
fn test_read_from_disk() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("R.txt");
	std::fs::write(&path, WIDGET).unwrap();
	let table = SymbolTable::read(&path).unwrap();
	let attrs: Vec<&str> = table.names_of(ResourceType::Attr).collect();
	assert_eq!(attrs, vec!["attrA", "attrB"]);
}
