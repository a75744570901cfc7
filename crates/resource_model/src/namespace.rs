use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Scoping domain for resource names.
///
/// Non-namespaced projects put every local and library resource into [`Self::ResAuto`].
/// Namespaced projects give each module and library its own [`Self::Package`] namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceNamespace {
	/// The shared namespace used when namespacing is disabled.
	ResAuto,
	/// The framework (`android:`) namespace.
	Android,
	/// The `tools:` namespace holding sample data.
	Tools,
	/// A package-scoped namespace.
	Package(Arc<str>),
}

impl ResourceNamespace {
	pub const ANDROID_PACKAGE: &'static str = "android";
	pub const TOOLS_URI: &'static str = "http://schemas.android.com/tools";
	pub const RES_AUTO_URI: &'static str = "http://schemas.android.com/apk/res-auto";

	/// Namespace for a package, mapping the framework package to [`Self::Android`].
	pub fn from_package_name(package: &str) -> Self {
		if package == Self::ANDROID_PACKAGE {
			Self::Android
		} else {
			Self::Package(Arc::from(package))
		}
	}

	/// Package backing this namespace, if any.
	pub fn package_name(&self) -> Option<&str> {
		match self {
			Self::Android => Some(Self::ANDROID_PACKAGE),
			Self::Package(p) => Some(p),
			Self::ResAuto | Self::Tools => None,
		}
	}

	/// XML namespace URI for this namespace.
	pub fn xml_uri(&self) -> String {
		match self {
			Self::ResAuto => Self::RES_AUTO_URI.to_string(),
			Self::Tools => Self::TOOLS_URI.to_string(),
			Self::Android => "http://schemas.android.com/apk/res/android".to_string(),
			Self::Package(p) => format!("http://schemas.android.com/apk/res/{p}"),
		}
	}
}

impl fmt::Display for ResourceNamespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ResAuto => f.write_str("res-auto"),
			Self::Android => f.write_str("android"),
			Self::Tools => f.write_str("tools"),
			Self::Package(p) => f.write_str(p),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_framework_package_maps_to_android() {
		assert_eq!(ResourceNamespace::from_package_name("android"), ResourceNamespace::Android);
		assert_eq!(
			ResourceNamespace::from_package_name("com.example.lib").package_name(),
			Some("com.example.lib")
		);
		assert_eq!(ResourceNamespace::ResAuto.package_name(), None);
	}
}
