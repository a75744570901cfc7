//! Minimal XML reader for resource files.
//!
//! Builds a small element tree. Handles comments, processing instructions, doctype, CDATA
//! and the predefined and numeric entities. Namespace prefixes are kept as part of names.

use super::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
	Element(Element),
	Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
	pub name: String,
	pub attrs: Vec<(String, String)>,
	pub children: Vec<Node>,
}

impl Element {
	pub fn attr(&self, name: &str) -> Option<&str> {
		self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
	}

	pub fn elements(&self) -> impl Iterator<Item = &Element> {
		self.children.iter().filter_map(|n| match n {
			Node::Element(e) => Some(e),
			Node::Text(_) => None,
		})
	}

	/// Concatenated text of this element and its descendants.
	pub fn text(&self) -> String {
		let mut out = String::new();
		self.collect_text(&mut out);
		out
	}

	fn collect_text(&self, out: &mut String) {
		for child in &self.children {
			match child {
				Node::Text(t) => out.push_str(t),
				Node::Element(e) => e.collect_text(out),
			}
		}
	}

	/// Calls `f` for every attribute value in this element and its descendants.
	pub fn for_each_attr_value(&self, f: &mut dyn FnMut(&str)) {
		for (_, v) in &self.attrs {
			f(v);
		}
		for e in self.elements() {
			e.for_each_attr_value(f);
		}
	}
}

/// Parses a whole document and returns its root element.
pub(crate) fn parse_document(input: &str) -> Result<Element, ParseError> {
	let mut reader = Reader { input, pos: 0 };
	let mut stack: Vec<Element> = Vec::new();
	let mut root: Option<Element> = None;

	while reader.pos < input.len() {
		let rest = reader.rest();
		if rest.starts_with("<!--") {
			reader.skip_past("-->")?;
		} else if rest.starts_with("<?") {
			reader.skip_past("?>")?;
		} else if let Some(after) = rest.strip_prefix("<![CDATA[") {
			let end = after.find("]]>").ok_or_else(|| malformed("unterminated CDATA"))?;
			let text = after[..end].to_string();
			reader.pos += "<![CDATA[".len() + end + "]]>".len();
			push_text(&mut stack, text)?;
		} else if rest.starts_with("<!") {
			reader.skip_past(">")?;
		} else if rest.starts_with("</") {
			reader.pos += 2;
			let name = reader.read_name()?;
			reader.skip_ws();
			reader.expect(">")?;
			let element = stack.pop().ok_or_else(|| malformed("unexpected closing tag"))?;
			if element.name != name {
				return Err(malformed(&format!("expected </{}>, found </{name}>", element.name)));
			}
			close(&mut stack, &mut root, element)?;
		} else if rest.starts_with('<') {
			reader.pos += 1;
			let (element, self_closing) = reader.read_start_tag()?;
			if self_closing {
				close(&mut stack, &mut root, element)?;
			} else {
				stack.push(element);
			}
		} else {
			let end = rest.find('<').unwrap_or(rest.len());
			let raw = &rest[..end];
			reader.pos += end;
			if stack.is_empty() {
				if !raw.trim().is_empty() {
					return Err(malformed("text outside the root element"));
				}
			} else {
				push_text(&mut stack, decode_entities(raw)?)?;
			}
		}
	}

	if let Some(open) = stack.last() {
		return Err(malformed(&format!("unclosed <{}>", open.name)));
	}
	root.ok_or_else(|| malformed("no root element"))
}

fn malformed(reason: &str) -> ParseError {
	ParseError::Malformed(reason.to_string())
}

fn push_text(stack: &mut [Element], text: String) -> Result<(), ParseError> {
	let parent = stack.last_mut().ok_or_else(|| malformed("text outside the root element"))?;
	parent.children.push(Node::Text(text));
	Ok(())
}

fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), ParseError> {
	match stack.last_mut() {
		Some(parent) => parent.children.push(Node::Element(element)),
		None if root.is_none() => *root = Some(element),
		None => return Err(malformed("multiple root elements")),
	}
	Ok(())
}

struct Reader<'a> {
	input: &'a str,
	pos: usize,
}

impl<'a> Reader<'a> {
	fn rest(&self) -> &'a str {
		&self.input[self.pos..]
	}

	fn skip_past(&mut self, terminator: &str) -> Result<(), ParseError> {
		let end = self
			.rest()
			.find(terminator)
			.ok_or_else(|| malformed(&format!("missing {terminator}")))?;
		self.pos += end + terminator.len();
		Ok(())
	}

	fn skip_ws(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	fn expect(&mut self, token: &str) -> Result<(), ParseError> {
		if self.rest().starts_with(token) {
			self.pos += token.len();
			Ok(())
		} else {
			Err(malformed(&format!("expected {token}")))
		}
	}

	fn read_name(&mut self) -> Result<String, ParseError> {
		let rest = self.rest();
		let end = rest
			.find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')))
			.unwrap_or(rest.len());
		if end == 0 {
			return Err(malformed("expected a name"));
		}
		self.pos += end;
		Ok(rest[..end].to_string())
	}

	fn read_start_tag(&mut self) -> Result<(Element, bool), ParseError> {
		let mut element = Element {
			name: self.read_name()?,
			..Element::default()
		};
		loop {
			self.skip_ws();
			let rest = self.rest();
			if rest.starts_with("/>") {
				self.pos += 2;
				return Ok((element, true));
			}
			if rest.starts_with('>') {
				self.pos += 1;
				return Ok((element, false));
			}
			let name = self.read_name()?;
			self.skip_ws();
			self.expect("=")?;
			self.skip_ws();
			let quote = self
				.rest()
				.chars()
				.next()
				.filter(|c| matches!(c, '"' | '\''))
				.ok_or_else(|| malformed("expected a quoted attribute value"))?;
			self.pos += 1;
			let end = self
				.rest()
				.find(quote)
				.ok_or_else(|| malformed("unterminated attribute value"))?;
			let value = decode_entities(&self.rest()[..end])?;
			self.pos += end + 1;
			element.attrs.push((name, value));
		}
	}
}

fn decode_entities(raw: &str) -> Result<String, ParseError> {
	if !raw.contains('&') {
		return Ok(raw.to_string());
	}
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;
	while let Some(start) = rest.find('&') {
		out.push_str(&rest[..start]);
		let after = &rest[start + 1..];
		let end = after.find(';').ok_or_else(|| malformed("unterminated entity"))?;
		let entity = &after[..end];
		let decoded = match entity {
			"lt" => '<',
			"gt" => '>',
			"amp" => '&',
			"quot" => '"',
			"apos" => '\'',
			_ => {
				let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
					u32::from_str_radix(hex, 16).ok()
				} else if let Some(dec) = entity.strip_prefix('#') {
					dec.parse().ok()
				} else {
					None
				};
				code.and_then(char::from_u32)
					.ok_or_else(|| malformed(&format!("unknown entity &{entity};")))?
			}
		};
		out.push(decoded);
		rest = &after[end + 1..];
	}
	out.push_str(rest);
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nested_document() {
		let root = parse_document(
			r#"<?xml version="1.0" encoding="utf-8"?>
<!-- header -->
<resources xmlns:xliff="urn:oasis:names:tc:xliff:document:1.2">
    <string name="greeting">Hello <xliff:g id="n">%s</xliff:g> &amp; bye</string>
    <item type="id" name="anchor"/>
    <string name="raw"><![CDATA[<b>bold</b>]]></string>
</resources>"#,
		)
		.unwrap();
		assert_eq!(root.name, "resources");
		let elements: Vec<_> = root.elements().collect();
		assert_eq!(elements.len(), 3);
		assert_eq!(elements[0].text(), "Hello %s & bye");
		assert_eq!(elements[1].attr("type"), Some("id"));
		assert_eq!(elements[2].text(), "<b>bold</b>");
	}

	#[test]
	fn test_mismatched_tags_rejected() {
		assert!(parse_document("<resources><string></resources>").is_err());
		assert!(parse_document("<a/><b/>").is_err());
		assert!(parse_document("").is_err());
		assert!(parse_document("<a x=1/>").is_err());
	}
}
