use std::sync::Arc;

use resrepo_model::{ResourceItem, ResourceNamespace, ResourceType};

/// Whether a traversal continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
	Continue,
	Abort,
}

/// Bulk traversal callback for [`crate::Repository::accept`].
///
/// Runs with the table lock held; implementations must not acquire the host outer lock.
pub trait ResourceVisitor {
	fn visit(&mut self, item: &Arc<ResourceItem>) -> VisitResult;

	fn should_visit_namespace(&mut self, _namespace: &ResourceNamespace) -> bool {
		true
	}

	fn should_visit_type(&mut self, _res_type: ResourceType) -> bool {
		true
	}
}

impl<F> ResourceVisitor for F
where
	F: FnMut(&Arc<ResourceItem>) -> VisitResult,
{
	fn visit(&mut self, item: &Arc<ResourceItem>) -> VisitResult {
		self(item)
	}
}
