//! Structural checks over plan trees.
//!
//! Every check is a per node test plugged into the same pre-order walk: a check holds for a plan
//! when its test fires at any node, wherever that node sits in the tree. Checks never fail; a
//! plan that could be parsed can always be checked.
//!
//! The crate knows two notions of a bushy join and keeps them apart:
//!
//! * [`NonLeftDeep`]: the inner input of a join is itself a join.
//! * [`BushyWithRelation`]: both inputs of a join cover more than one base relation.

mod canonical;
pub use canonical::*;
mod left_deep;
pub use left_deep::*;
mod hash_build;
pub use hash_build::*;
mod bushy_relation;
pub use bushy_relation::*;

use std::ops::ControlFlow;

use enum_dispatch::enum_dispatch;
use log::trace;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{PlanError, PlanResult};
use crate::plan::{PlanNode, PlanNodeId};
use crate::properties::relations_of;

/// Stable names of the shape checks, as used on the command line and in reports.
#[derive(
    Clone, Copy, Debug, Hash, Eq, PartialEq, AsRefStr, Display, EnumIter, EnumString, Serialize,
)]
pub enum CheckName {
    #[strum(serialize = "bushy-shape")]
    #[serde(rename = "bushy-shape")]
    BushyShape,
    #[strum(serialize = "no-intermediate-hash-build")]
    #[serde(rename = "no-intermediate-hash-build")]
    NoIntermediateHashBuild,
    #[strum(serialize = "target-not-in-bushy")]
    #[serde(rename = "target-not-in-bushy")]
    TargetNotInBushy,
}

impl CheckName {
    pub fn requires_target(&self) -> bool {
        matches!(self, CheckName::TargetNotInBushy)
    }
}

#[enum_dispatch]
pub trait ShapeCheck {
    fn name(&self) -> CheckName;

    /// Tests `node` alone, without looking at violations deeper in its subtree.
    fn violates_at(&self, node: &PlanNode) -> bool;

    /// Whether the check fires anywhere in the subtree rooted at `root`.
    fn holds(&self, root: &PlanNode) -> bool {
        self.find_violation(root).is_some()
    }

    /// First violating node in pre-order.
    fn find_violation(&self, root: &PlanNode) -> Option<Violation> {
        let mut found = None;
        let _ = visit_pre_order(root, &mut vec![], &mut |node: &PlanNode, path: &[usize]| {
            if self.violates_at(node) {
                found = Some(Violation::new(node, path));
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// All violating nodes in pre-order.
    fn collect_violations(&self, root: &PlanNode) -> Vec<Violation> {
        let mut violations = vec![];
        let _ = visit_pre_order(root, &mut vec![], &mut |node: &PlanNode, path: &[usize]| {
            if self.violates_at(node) {
                trace!(
                    "Check {} fired at node {} ({}) path {:?}",
                    self.name(),
                    node.id(),
                    node.node_type(),
                    path
                );
                violations.push(Violation::new(node, path));
            }
            ControlFlow::Continue(())
        });
        violations
    }
}

#[enum_dispatch(ShapeCheck)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeCheckImpl {
    NonLeftDeep,
    IntermediateHashBuild,
    BushyWithRelation,
}

impl ShapeCheckImpl {
    /// Creates the check called `name`. `target` is only used, and then required, by
    /// [`CheckName::TargetNotInBushy`].
    pub fn new(name: CheckName, target: Option<&str>) -> PlanResult<Self> {
        match name {
            CheckName::BushyShape => Ok(NonLeftDeep.into()),
            CheckName::NoIntermediateHashBuild => Ok(IntermediateHashBuild.into()),
            CheckName::TargetNotInBushy => match target {
                Some(target) if !target.is_empty() => Ok(BushyWithRelation::new(target).into()),
                _ => Err(PlanError::MissingTarget(name.to_string())),
            },
        }
    }
}

/// Where a check fired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Input indexes leading from the root to the violating node.
    pub path: Vec<usize>,
    pub node_id: PlanNodeId,
    pub node_type: String,
    pub join_type: Option<String>,
    pub outer_relations: Vec<String>,
    pub inner_relations: Vec<String>,
}

impl Violation {
    fn new(node: &PlanNode, path: &[usize]) -> Self {
        let relations = |input: Option<&PlanNode>| -> Vec<String> {
            input
                .map(|n| relations_of(n).iter().cloned().collect())
                .unwrap_or_default()
        };

        Self {
            path: path.to_vec(),
            node_id: node.id(),
            node_type: node.node_type().to_string(),
            join_type: node.join_type().map(str::to_string),
            outer_relations: relations(node.outer()),
            inner_relations: relations(node.inner()),
        }
    }
}

/// Visits `node` and then every input subtree in order, until `f` breaks.
fn visit_pre_order<'a, F>(node: &'a PlanNode, path: &mut Vec<usize>, f: &mut F) -> ControlFlow<()>
where
    F: FnMut(&'a PlanNode, &[usize]) -> ControlFlow<()>,
{
    if f(node, path).is_break() {
        return ControlFlow::Break(());
    }
    for (idx, input) in node.inputs().iter().enumerate() {
        path.push(idx);
        let flow = visit_pre_order(input, path, f);
        path.pop();
        if flow.is_break() {
            return flow;
        }
    }
    ControlFlow::Continue(())
}

/// Whether some join in the tree has a join, possibly wrapped, as its inner input.
pub fn has_non_left_deep_shape(node: &PlanNode) -> bool {
    NonLeftDeep.holds(node)
}

/// Whether some hash join builds its hash table directly from another join.
pub fn has_intermediate_hash_build(node: &PlanNode) -> bool {
    IntermediateHashBuild.holds(node)
}

/// Whether `target` takes part in a join whose inputs both cover several relations.
pub fn has_bushy_involving_relation(node: &PlanNode, target: &str) -> bool {
    BushyWithRelation::new(target).holds(node)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::plan::{Plan, PlanNodeBuilder};

    fn scan(relation: &str) -> PlanNode {
        PlanNodeBuilder::new("Seq Scan").relation_name(relation).build()
    }

    fn node(node_type: &str, inputs: Vec<PlanNode>) -> PlanNode {
        PlanNodeBuilder::new(node_type).add_inputs(inputs).build()
    }

    /// Two bushy hash joins, one below the other's outer side.
    fn nested_bushy_plan() -> Plan {
        let low = node(
            "Hash Join",
            vec![
                scan("t1"),
                node("Hash", vec![node("Nested Loop", vec![scan("t2"), scan("t3")])]),
            ],
        );
        let top = node(
            "Hash Join",
            vec![
                low,
                node("Hash", vec![node("Merge Join", vec![scan("t4"), scan("t5")])]),
            ],
        );
        Plan::new(node("Sort", vec![top]))
    }

    #[test]
    fn test_check_names_round_trip() {
        for name in CheckName::iter() {
            assert_eq!(CheckName::from_str(name.as_ref()).unwrap(), name);
        }
        assert!(CheckName::from_str("bushy").is_err());
        assert!(CheckName::TargetNotInBushy.requires_target());
        assert!(!CheckName::BushyShape.requires_target());
    }

    #[test]
    fn test_new_check_requires_target() {
        let err = ShapeCheckImpl::new(CheckName::TargetNotInBushy, None).unwrap_err();
        assert!(matches!(err, PlanError::MissingTarget(_)));
        assert!(ShapeCheckImpl::new(CheckName::TargetNotInBushy, Some("")).is_err());

        let check = ShapeCheckImpl::new(CheckName::TargetNotInBushy, Some("t3")).unwrap();
        assert_eq!(check, ShapeCheckImpl::BushyWithRelation(BushyWithRelation::new("t3")));
        assert_eq!(check.name(), CheckName::TargetNotInBushy);

        let check = ShapeCheckImpl::new(CheckName::BushyShape, Some("ignored")).unwrap();
        assert_eq!(check.name(), CheckName::BushyShape);
    }

    #[test]
    fn test_find_violation_reports_first_in_pre_order() {
        let plan = nested_bushy_plan();
        let violation = NonLeftDeep.find_violation(plan.root()).unwrap();
        assert_eq!(violation.path, vec![0]);
        assert_eq!(violation.node_id, 1);
        assert_eq!(violation.node_type, "Hash Join");
        assert_eq!(violation.outer_relations, vec!["t1", "t2", "t3"]);
        assert_eq!(violation.inner_relations, vec!["t4", "t5"]);
    }

    #[test]
    fn test_collect_violations() {
        let plan = nested_bushy_plan();
        let paths: Vec<Vec<usize>> = IntermediateHashBuild
            .collect_violations(plan.root())
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(paths, vec![vec![0], vec![0, 0]]);

        let check = BushyWithRelation::new("t4");
        let violations = check.collect_violations(plan.root());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, vec![0]);
        // t2 sits in the outer side of the same bushy join.
        assert_eq!(
            BushyWithRelation::new("t2").collect_violations(plan.root()),
            violations
        );
        assert!(BushyWithRelation::new("t6")
            .collect_violations(plan.root())
            .is_empty());
    }

    #[test]
    fn test_free_functions_match_checks() {
        let plan = nested_bushy_plan();
        assert!(has_non_left_deep_shape(plan.root()));
        assert!(has_intermediate_hash_build(plan.root()));
        assert!(has_bushy_involving_relation(plan.root(), "t1"));
        assert!(!has_bushy_involving_relation(plan.root(), "t9"));

        let dispatched = ShapeCheckImpl::from(NonLeftDeep);
        assert_eq!(dispatched.holds(plan.root()), NonLeftDeep.holds(plan.root()));
    }

    #[test]
    fn test_unknown_operators_are_walked() {
        let plan = Plan::new(node(
            "Custom Scan",
            vec![node(
                "Nested Loop",
                vec![scan("t1"), node("Nested Loop", vec![scan("t2"), scan("t3")])],
            )],
        ));
        assert_eq!(NonLeftDeep.find_violation(plan.root()).unwrap().path, vec![0]);
    }
}
