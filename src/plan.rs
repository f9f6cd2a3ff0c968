use std::collections::VecDeque;

use crate::corpus::DocumentMeta;
use crate::operator::{NodeKind, UNKNOWN_NODE_TYPE};
use crate::properties::LogicalProperty;

pub type PlanNodeId = u32;

/// One node of an execution plan.
///
/// Inputs are owned by their parent and kept in the order the engine reported them. For joins
/// that order is meaningful: input 0 is the outer side and input 1 the inner side, see
/// [`PlanNode::outer`] and [`PlanNode::inner`].
#[derive(Clone, Debug)]
pub struct PlanNode {
    id: PlanNodeId,
    node_type: String,
    join_type: Option<String>,
    relation_name: Option<String>,
    alias: Option<String>,
    inputs: Vec<PlanNode>,
    logical_prop: LogicalProperty,
}

/// The `eq` should ignore `id`.
impl PartialEq for PlanNode {
    fn eq(&self, other: &Self) -> bool {
        self.node_type == other.node_type
            && self.join_type == other.join_type
            && self.relation_name == other.relation_name
            && self.alias == other.alias
            && self.inputs == other.inputs
            && self.logical_prop == other.logical_prop
    }
}

impl PlanNode {
    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(&self.node_type)
    }

    pub fn is_join(&self) -> bool {
        self.kind().as_join().is_some()
    }

    pub fn join_type(&self) -> Option<&str> {
        self.join_type.as_deref()
    }

    pub fn relation_name(&self) -> Option<&str> {
        self.relation_name.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn inputs(&self) -> &[PlanNode] {
        &self.inputs
    }

    pub fn logical_prop(&self) -> &LogicalProperty {
        &self.logical_prop
    }

    /// Outer (left, probe) side of a binary operator.
    pub fn outer(&self) -> Option<&PlanNode> {
        self.binary_inputs().map(|(outer, _)| outer)
    }

    /// Inner (right, build) side of a binary operator.
    pub fn inner(&self) -> Option<&PlanNode> {
        self.binary_inputs().map(|(_, inner)| inner)
    }

    /// Outer and inner inputs, if this node has at least two inputs.
    pub fn binary_inputs(&self) -> Option<(&PlanNode, &PlanNode)> {
        match self.inputs.as_slice() {
            [outer, inner, ..] => Some((outer, inner)),
            _ => None,
        }
    }

    /// The only input, if this node has exactly one.
    pub fn single_input(&self) -> Option<&PlanNode> {
        match self.inputs.as_slice() {
            [input] => Some(input),
            _ => None,
        }
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(PlanNode::node_count).sum::<usize>()
    }
}

/// Generates plan node ids in visiting order.
pub struct PlanNodeIdGen {
    next: PlanNodeId,
}

impl PlanNodeIdGen {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next(&mut self) -> PlanNodeId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for PlanNodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// An execution plan tree.
#[derive(PartialEq, Debug, Clone)]
pub struct Plan {
    root: PlanNode,
}

/// Breadth first iterator of a plan tree.
struct BFSPlanNodeIter<'a> {
    queue: VecDeque<&'a PlanNode>,
}

impl<'a> Iterator for BFSPlanNodeIter<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.inputs.iter());
        Some(node)
    }
}

impl Plan {
    /// Wraps `root`, numbering its nodes in pre-order starting from 0.
    pub fn new(mut root: PlanNode) -> Self {
        let mut id_gen = PlanNodeIdGen::new();
        assign_ids(&mut root, &mut id_gen);
        Self { root }
    }

    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    pub fn bfs_iterator(&self) -> impl Iterator<Item = &PlanNode> {
        BFSPlanNodeIter {
            queue: VecDeque::from([&self.root]),
        }
    }

    /// Number of join operators with both inputs present.
    pub fn join_count(&self) -> usize {
        self.bfs_iterator()
            .filter(|node| node.is_join() && node.binary_inputs().is_some())
            .count()
    }
}

fn assign_ids(node: &mut PlanNode, id_gen: &mut PlanNodeIdGen) {
    node.id = id_gen.next();
    for input in &mut node.inputs {
        assign_ids(input, id_gen);
    }
}

/// A parsed plan together with where it came from.
#[derive(Debug, Clone)]
pub struct PlanDocument {
    plan: Plan,
    meta: DocumentMeta,
}

impl PlanDocument {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            meta: DocumentMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: DocumentMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn root(&self) -> &PlanNode {
        self.plan.root()
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }
}

pub struct PlanNodeBuilder {
    plan_node: PlanNode,
}

impl PlanNodeBuilder {
    /// An empty node type is replaced by `"Unknown"`.
    pub fn new<S: Into<String>>(node_type: S) -> Self {
        let mut node_type = node_type.into();
        if node_type.is_empty() {
            node_type = UNKNOWN_NODE_TYPE.to_string();
        }

        Self {
            plan_node: PlanNode {
                id: 0,
                node_type,
                join_type: None,
                relation_name: None,
                alias: None,
                inputs: vec![],
                logical_prop: LogicalProperty::default(),
            },
        }
    }

    pub fn join_type<S: Into<String>>(mut self, join_type: S) -> Self {
        self.plan_node.join_type = Some(join_type.into());
        self
    }

    pub fn relation_name<S: Into<String>>(mut self, relation_name: S) -> Self {
        self.plan_node.relation_name = Some(relation_name.into());
        self
    }

    pub fn alias<S: Into<String>>(mut self, alias: S) -> Self {
        self.plan_node.alias = Some(alias.into());
        self
    }

    pub fn add_input(mut self, input: PlanNode) -> Self {
        self.plan_node.inputs.push(input);
        self
    }

    pub fn add_inputs<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = PlanNode>,
    {
        self.plan_node.inputs.extend(inputs);
        self
    }

    /// Finishes the node, deriving its logical property from the inputs added so far.
    pub fn build(self) -> PlanNode {
        let mut plan_node = self.plan_node;
        plan_node.logical_prop = LogicalProperty::derive(
            plan_node.relation_name.as_deref(),
            plan_node.inputs.iter().map(PlanNode::logical_prop),
        );
        plan_node
    }
}
