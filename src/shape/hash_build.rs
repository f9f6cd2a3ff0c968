use crate::operator::{JoinKind, NodeKind, TransparentKind};
use crate::plan::PlanNode;
use crate::shape::{CheckName, ShapeCheck};

/// Flags hash joins whose hash table is built directly from the output of another join.
///
/// Only `Hash Join -> Hash -> <join>` counts. Unlike [`NonLeftDeep`](crate::shape::NonLeftDeep),
/// no wrappers are skipped: a `Sort` or `Materialize` between the `Hash` node and the join hides
/// it from this check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntermediateHashBuild;

impl ShapeCheck for IntermediateHashBuild {
    fn name(&self) -> CheckName {
        CheckName::NoIntermediateHashBuild
    }

    fn violates_at(&self, node: &PlanNode) -> bool {
        if node.kind() != NodeKind::Join(JoinKind::HashJoin) {
            return false;
        }
        match node.inner() {
            Some(hash) if hash.kind() == NodeKind::Transparent(TransparentKind::Hash) => hash
                .inputs()
                .first()
                .map(PlanNode::is_join)
                .unwrap_or(false),
            _ => false,
        }
    }
}
