use std::collections::BTreeSet;
use std::path::Path;

use resrepo_model::ResourceType;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{Result, SymbolFileError};

/// Value of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolValue {
	Int(u32),
	IntArray(Vec<u32>),
}

/// One line of a symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
	pub res_type: ResourceType,
	pub name: String,
	pub value: SymbolValue,
}

/// Parsed `R.txt` contents, in file order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
	symbols: Vec<Symbol>,
	index: FxHashMap<(ResourceType, String), usize>,
}

impl SymbolTable {
	/// Parses symbol file text, skipping lines that do not match the format.
	pub fn parse(text: &str) -> Self {
		let mut table = Self::default();
		for (lineno, line) in text.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			match parse_line(line) {
				Some(symbol) => table.push(symbol),
				None => debug!(line = lineno + 1, text = line, "skipping malformed symbol line"),
			}
		}
		table
	}

	pub fn read(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|source| SymbolFileError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let table = Self::parse(&text);
		trace!(path = %path.display(), symbols = table.len(), "read symbol file");
		Ok(table)
	}

	fn push(&mut self, symbol: Symbol) {
		let key = (symbol.res_type, symbol.name.clone());
		self.index.entry(key).or_insert(self.symbols.len());
		self.symbols.push(symbol);
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	pub fn symbols(&self) -> &[Symbol] {
		&self.symbols
	}

	pub fn get(&self, res_type: ResourceType, name: &str) -> Option<&Symbol> {
		self.index
			.get(&(res_type, name.to_string()))
			.map(|&i| &self.symbols[i])
	}

	/// Names of every symbol of one type, in file order.
	pub fn names_of(&self, res_type: ResourceType) -> impl Iterator<Item = &str> + '_ {
		self.symbols
			.iter()
			.filter(move |s| s.res_type == res_type)
			.map(|s| s.name.as_str())
	}

	/// Names of all `int id` symbols.
	pub fn id_names(&self) -> BTreeSet<String> {
		self.symbols
			.iter()
			.filter(|s| s.res_type == ResourceType::Id && matches!(s.value, SymbolValue::Int(_)))
			.map(|s| s.name.clone())
			.collect()
	}

	/// Attribute ids of a styleable, ordered to match `attrs`.
	///
	/// The `int styleable <styleable>_<attr>` lines, taken in file order, name the entries of
	/// the styleable's array positionally. The result holds, for each requested attribute, the
	/// array entry its line names. `android:foo` is matched against `android_foo`.
	///
	/// Returns `None` if the styleable is absent, if its array length differs from the number
	/// of attribute lines or from `attrs.len()`, or if a requested attribute is not declared.
	pub fn styleable_attr_values(&self, styleable: &str, attrs: &[&str]) -> Option<Vec<u32>> {
		let values = match &self.get(ResourceType::Styleable, styleable)?.value {
			SymbolValue::IntArray(values) => values,
			SymbolValue::Int(_) => return None,
		};

		let prefix = format!("{styleable}_");
		// Nested styleables (`Outer` and `Outer_Inner`) share a prefix; their attrs are excluded.
		let nested: Vec<String> = self
			.symbols
			.iter()
			.filter(|s| {
				s.res_type == ResourceType::Styleable
					&& matches!(s.value, SymbolValue::IntArray(_))
					&& s.name.starts_with(&prefix)
			})
			.map(|s| format!("{}_", s.name))
			.collect();

		let declared: Vec<&str> = self
			.symbols
			.iter()
			.filter(|s| s.res_type == ResourceType::Styleable && matches!(s.value, SymbolValue::Int(_)))
			.filter_map(|s| s.name.strip_prefix(&prefix).map(|attr| (s, attr)))
			.filter(|(s, _)| !nested.iter().any(|n| s.name.starts_with(n.as_str())))
			.map(|(_, attr)| attr)
			.collect();

		if declared.len() != values.len() || attrs.len() != values.len() {
			debug!(
				styleable,
				declared = declared.len(),
				values = values.len(),
				requested = attrs.len(),
				"styleable entry count mismatch"
			);
			return None;
		}

		let by_name: FxHashMap<&str, u32> = declared.into_iter().zip(values.iter().copied()).collect();
		attrs
			.iter()
			.map(|attr| by_name.get(attr.replace(':', "_").as_str()).copied())
			.collect()
	}
}

fn parse_line(line: &str) -> Option<Symbol> {
	let (class, rest) = split_token(line)?;
	let (res_type, rest) = split_token(rest)?;
	let (name, rest) = split_token(rest)?;
	let res_type = ResourceType::from_name(res_type)?;
	let rest = rest.trim();

	let value = match class {
		"int" => SymbolValue::Int(parse_int(rest)?),
		"int[]" => {
			let inner = rest.strip_prefix('{')?.strip_suffix('}')?.trim();
			let values = if inner.is_empty() {
				Vec::new()
			} else {
				inner.split(',').map(|v| parse_int(v.trim())).collect::<Option<Vec<_>>>()?
			};
			SymbolValue::IntArray(values)
		}
		_ => return None,
	};

	Some(Symbol {
		res_type,
		name: name.to_string(),
		value,
	})
}

fn split_token(s: &str) -> Option<(&str, &str)> {
	let s = s.trim_start();
	if s.is_empty() {
		return None;
	}
	let end = s.find(char::is_whitespace).unwrap_or(s.len());
	Some(s.split_at(end))
}

fn parse_int(s: &str) -> Option<u32> {
	match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
		Some(hex) => u32::from_str_radix(hex, 16).ok(),
		None => s.parse().ok(),
	}
}

#[cfg(test)]
mod tests;
