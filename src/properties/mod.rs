//! Properties of plan nodes.
//!
//! Properties are derived bottom up exactly once, when a node is built from its already built
//! inputs, so checks looking at many operands never walk the same subtree twice.

mod logical;
pub use logical::*;

use crate::plan::PlanNode;

/// Relation set of `node`'s subtree.
pub fn relations_of(node: &PlanNode) -> &RelationSet {
    node.logical_prop().relations()
}
