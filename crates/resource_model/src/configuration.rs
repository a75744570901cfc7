use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A single folder qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Qualifier {
	Locale { language: Arc<str>, region: Option<Arc<str>> },
	SmallestWidth(u32),
	ScreenWidth(u32),
	ScreenHeight(u32),
	Orientation(Arc<str>),
	Night(bool),
	Density(Arc<str>),
	Api(u32),
	/// Any qualifier not modelled explicitly, kept verbatim.
	Other(Arc<str>),
}

impl Qualifier {
	fn parse(segment: &str) -> Option<Self> {
		if segment.is_empty() {
			return None;
		}
		Some(match segment {
			"land" | "port" | "square" => Self::Orientation(Arc::from(segment)),
			"night" => Self::Night(true),
			"notnight" => Self::Night(false),
			"ldpi" | "mdpi" | "tvdpi" | "hdpi" | "xhdpi" | "xxhdpi" | "xxxhdpi" | "nodpi" | "anydpi" => {
				Self::Density(Arc::from(segment))
			}
			_ => {
				if let Some(v) = segment.strip_prefix('v').and_then(|s| s.parse().ok()) {
					Self::Api(v)
				} else if let Some(v) = dp_value(segment, "sw") {
					Self::SmallestWidth(v)
				} else if let Some(v) = dp_value(segment, "w") {
					Self::ScreenWidth(v)
				} else if let Some(v) = dp_value(segment, "h") {
					Self::ScreenHeight(v)
				} else if segment.ends_with("dpi") && segment[..segment.len() - 3].parse::<u32>().is_ok() {
					Self::Density(Arc::from(segment))
				} else if let Some(tag) = segment.strip_prefix("b+") {
					let mut parts = tag.split('+');
					let language = parts.next().filter(|l| !l.is_empty())?;
					Self::Locale {
						language: Arc::from(language),
						region: parts.next().map(Arc::from),
					}
				} else if segment.len() == 2 && segment.bytes().all(|b| b.is_ascii_lowercase()) {
					Self::Locale {
						language: Arc::from(segment),
						region: None,
					}
				} else {
					Self::Other(Arc::from(segment))
				}
			}
		})
	}
}

fn dp_value(segment: &str, prefix: &str) -> Option<u32> {
	segment.strip_prefix(prefix)?.strip_suffix("dp")?.parse().ok()
}

impl fmt::Display for Qualifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Locale { language, region: None } => f.write_str(language),
			Self::Locale {
				language,
				region: Some(region),
			} => write!(f, "{language}-r{region}"),
			Self::SmallestWidth(v) => write!(f, "sw{v}dp"),
			Self::ScreenWidth(v) => write!(f, "w{v}dp"),
			Self::ScreenHeight(v) => write!(f, "h{v}dp"),
			Self::Orientation(o) => f.write_str(o),
			Self::Night(true) => f.write_str("night"),
			Self::Night(false) => f.write_str("notnight"),
			Self::Density(d) => f.write_str(d),
			Self::Api(v) => write!(f, "v{v}"),
			Self::Other(s) => f.write_str(s),
		}
	}
}

/// Qualifier set a resource definition applies to. Empty means the default configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderConfiguration {
	qualifiers: SmallVec<[Qualifier; 2]>,
}

impl FolderConfiguration {
	pub fn new(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
		Self {
			qualifiers: qualifiers.into_iter().collect(),
		}
	}

	/// Parses the part of a folder name after the type prefix, e.g. `en-rUS-land`.
	///
	/// A region segment (`rUS`) attaches to the preceding language. Returns `None` for
	/// malformed input (empty segments, a region with no language).
	pub fn parse_qualifiers(input: &str) -> Option<Self> {
		let mut qualifiers: SmallVec<[Qualifier; 2]> = SmallVec::new();
		for segment in input.split('-') {
			if let Some(region) = segment.strip_prefix('r').filter(|r| r.len() == 2 && r.bytes().all(|b| b.is_ascii_uppercase())) {
				match qualifiers.last_mut() {
					Some(Qualifier::Locale { region: slot @ None, .. }) => {
						*slot = Some(Arc::from(region));
						continue;
					}
					_ => return None,
				}
			}
			qualifiers.push(Qualifier::parse(segment)?);
		}
		Some(Self { qualifiers })
	}

	/// Configuration for a locale given as `language` or `language-rREGION`.
	pub fn for_locale(language: &str, region: Option<&str>) -> Self {
		Self::new([Qualifier::Locale {
			language: Arc::from(language),
			region: region.map(Arc::from),
		}])
	}

	pub fn is_default(&self) -> bool {
		self.qualifiers.is_empty()
	}

	pub fn qualifiers(&self) -> &[Qualifier] {
		&self.qualifiers
	}

	/// Language and optional region of this configuration.
	pub fn locale(&self) -> Option<(&str, Option<&str>)> {
		self.qualifiers.iter().find_map(|q| match q {
			Qualifier::Locale { language, region } => Some((&**language, region.as_deref())),
			_ => None,
		})
	}
}

impl fmt::Display for FolderConfiguration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, q) in self.qualifiers.iter().enumerate() {
			if i > 0 {
				f.write_str("-")?;
			}
			write!(f, "{q}")?;
		}
		Ok(())
	}
}
