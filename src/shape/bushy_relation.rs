use crate::plan::PlanNode;
use crate::properties::relations_of;
use crate::shape::{CheckName, ShapeCheck};

/// Flags bushy joins involving `target`.
///
/// A join is bushy here when both its outer and inner inputs cover more than one base relation.
/// This differs from [`NonLeftDeep`](crate::shape::NonLeftDeep), which only looks at whether the
/// inner input is a join. Bushy joins among other relations are allowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BushyWithRelation {
    target: String,
}

impl BushyWithRelation {
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl ShapeCheck for BushyWithRelation {
    fn name(&self) -> CheckName {
        CheckName::TargetNotInBushy
    }

    fn violates_at(&self, node: &PlanNode) -> bool {
        if !node.is_join() {
            return false;
        }
        let (outer, inner) = match node.binary_inputs() {
            Some(inputs) => inputs,
            None => return false,
        };

        let outer = relations_of(outer);
        let inner = relations_of(inner);
        outer.len() > 1
            && inner.len() > 1
            && (outer.contains(&self.target) || inner.contains(&self.target))
    }
}
