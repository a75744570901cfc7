use resrepo_model::{
	FolderConfiguration, ResourceItem, ResourceReference, ResourceType, ResourceValue, SourceLocator,
	is_valid_resource_name,
};
use tracing::warn;

use super::xml::{Element, parse_document};
use super::{ParseError, ScanContext};

/// Parses a `values` file. Invalid entries are skipped; an invalid document is an error.
pub(super) fn parse_values(
	text: &str,
	ctx: &ScanContext,
	configuration: &FolderConfiguration,
	source: &SourceLocator,
) -> Result<Vec<ResourceItem>, ParseError> {
	let root = parse_document(text)?;
	if root.name != "resources" {
		return Err(ParseError::NotResources(root.name));
	}

	let mut items = Vec::new();
	let mut push = |res_type: ResourceType, name: &str, value: Option<ResourceValue>| {
		let mut item = ResourceItem::new(
			ResourceReference::new(ctx.namespace.clone(), res_type, name),
			configuration.clone(),
			source.clone(),
		)
		.with_library(ctx.library_name.clone());
		item.value = value;
		items.push(item);
	};

	for element in root.elements() {
		let res_type = match element.name.as_str() {
			"item" => element.attr("type").and_then(ResourceType::from_name),
			tag => ResourceType::from_xml_tag(tag),
		};
		let Some(res_type) = res_type else {
			continue;
		};
		let Some(name) = element.attr("name").filter(|n| is_valid_resource_name(n)) else {
			warn!(
				path = ?source,
				tag = %element.name,
				name = element.attr("name"),
				"skipping value with a missing or invalid name"
			);
			continue;
		};

		match res_type {
			ResourceType::Styleable => {
				let mut attrs = Vec::new();
				for attr in element.elements().filter(|e| e.name == "attr") {
					let Some(attr_name) = attr.attr("name") else {
						continue;
					};
					attrs.push(attr_name.to_string());
					// A nested attr with a format or values declares the attr itself.
					let declares = attr.attr("format").is_some() || attr.elements().next().is_some();
					if declares && !attr_name.contains(':') && is_valid_resource_name(attr_name) {
						push(ResourceType::Attr, attr_name, Some(attr_value(attr)));
					}
				}
				push(res_type, name, Some(ResourceValue::Styleable { attrs }));
			}
			ResourceType::Attr => push(res_type, name, Some(attr_value(element))),
			_ => push(res_type, name, value_of(res_type, element)),
		}
	}
	Ok(items)
}

fn attr_value(element: &Element) -> ResourceValue {
	let mut formats: Vec<String> = element
		.attr("format")
		.map(|f| f.split('|').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
		.unwrap_or_default();
	for child in element.elements() {
		if matches!(child.name.as_str(), "enum" | "flag") && !formats.contains(&child.name) {
			formats.push(child.name.clone());
		}
	}
	ResourceValue::Attr { formats }
}

fn value_of(res_type: ResourceType, element: &Element) -> Option<ResourceValue> {
	match res_type {
		ResourceType::Array => Some(ResourceValue::Array(
			element
				.elements()
				.filter(|e| e.name == "item")
				.map(|e| e.text().trim().to_string())
				.collect(),
		)),
		ResourceType::Plurals => Some(ResourceValue::Plurals(
			element
				.elements()
				.filter(|e| e.name == "item")
				.filter_map(|e| Some((e.attr("quantity")?.to_string(), e.text().trim().to_string())))
				.collect(),
		)),
		ResourceType::Style => Some(ResourceValue::Style {
			parent: element.attr("parent").map(str::to_string),
			items: element
				.elements()
				.filter(|e| e.name == "item")
				.filter_map(|e| Some((e.attr("name")?.to_string(), e.text().trim().to_string())))
				.collect(),
		}),
		_ => {
			let text = element.text();
			if res_type == ResourceType::Id && text.trim().is_empty() {
				None
			} else {
				Some(ResourceValue::from_text(&text))
			}
		}
	}
}
