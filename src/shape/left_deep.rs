use crate::plan::PlanNode;
use crate::shape::{canonicalize, CheckName, ShapeCheck};

/// Flags joins whose inner input is itself a join, looking through transparent wrappers such as
/// the `Hash` node of a hash join.
///
/// In a left deep plan every inner operand is a single relation, so any such join makes the plan
/// bushy at that point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NonLeftDeep;

impl ShapeCheck for NonLeftDeep {
    fn name(&self) -> CheckName {
        CheckName::BushyShape
    }

    fn violates_at(&self, node: &PlanNode) -> bool {
        if !node.is_join() {
            return false;
        }
        node.inner()
            .map(|inner| canonicalize(inner).is_join())
            .unwrap_or(false)
    }
}
