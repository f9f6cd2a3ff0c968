//! Classification of plan node types.
//!
//! Node types are kept as plain strings on [`PlanNode`](crate::plan::PlanNode), since the engine
//! keeps growing new operators. Only the two closed sets below drive shape analysis; every other
//! node type classifies as [`NodeKind::Other`] and is walked like any other node.

mod join;
pub use join::*;
mod transparent;
pub use transparent::*;

use std::str::FromStr;

use enum_as_inner::EnumAsInner;

/// Node type used when a plan node carries no `Node Type`.
pub const UNKNOWN_NODE_TYPE: &str = "Unknown";

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum NodeKind {
    Join(JoinKind),
    Transparent(TransparentKind),
    Other,
}

impl NodeKind {
    /// Matching is exact and case sensitive.
    pub fn classify(node_type: &str) -> Self {
        if let Ok(join) = JoinKind::from_str(node_type) {
            NodeKind::Join(join)
        } else if let Ok(transparent) = TransparentKind::from_str(node_type) {
            NodeKind::Transparent(transparent)
        } else {
            NodeKind::Other
        }
    }
}
