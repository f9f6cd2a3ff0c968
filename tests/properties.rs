use plan_shape::corpus::{compare, compare_outcome, Outcome};
use plan_shape::explain::parse_plan_document;
use plan_shape::plan::{Plan, PlanNode, PlanNodeBuilder};
use plan_shape::properties::relations_of;
use plan_shape::shape::{
    canonicalize, has_non_left_deep_shape, BushyWithRelation, IntermediateHashBuild, NonLeftDeep,
    ShapeCheck, ShapeCheckImpl,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const JOINS: &[&str] = &["Hash Join", "Merge Join", "Nested Loop"];
const WRAPPERS: &[&str] = &[
    "Hash",
    "Sort",
    "Materialize",
    "Memoize",
    "Gather",
    "Limit",
    "Aggregate",
    "Subquery Scan",
];

fn node(node_type: &str, inputs: Vec<PlanNode>) -> PlanNode {
    PlanNodeBuilder::new(node_type).add_inputs(inputs).build()
}

fn arb_plan_node() -> impl Strategy<Value = PlanNode> {
    let leaf = prop_oneof![
        (0..6u8).prop_map(|i| PlanNodeBuilder::new("Seq Scan")
            .relation_name(format!("t{}", i))
            .build()),
        Just(PlanNodeBuilder::new("Result").build()),
    ];
    leaf.prop_recursive(6, 64, 3, |inner| {
        prop_oneof![
            (prop::sample::select(JOINS), inner.clone(), inner.clone())
                .prop_map(|(join, outer, inner)| node(join, vec![outer, inner])),
            (prop::sample::select(WRAPPERS), inner.clone())
                .prop_map(|(wrapper, input)| node(wrapper, vec![input])),
            prop::collection::vec(inner, 0..3).prop_map(|inputs| node("Append", inputs)),
        ]
    })
}

fn to_json(node: &PlanNode) -> Value {
    let mut obj = Map::new();
    obj.insert("Node Type".to_string(), json!(node.node_type()));
    if let Some(relation) = node.relation_name() {
        obj.insert("Relation Name".to_string(), json!(relation));
    }
    if !node.inputs().is_empty() {
        let inputs: Vec<Value> = node.inputs().iter().map(to_json).collect();
        obj.insert("Plans".to_string(), Value::Array(inputs));
    }
    Value::Object(obj)
}

fn arb_check() -> impl Strategy<Value = ShapeCheckImpl> {
    prop_oneof![
        Just(ShapeCheckImpl::from(NonLeftDeep)),
        Just(ShapeCheckImpl::from(IntermediateHashBuild)),
        (0..6u8).prop_map(|i| ShapeCheckImpl::from(BushyWithRelation::new(format!("t{}", i)))),
    ]
}

proptest! {
    #[test]
    fn parse_is_idempotent(root in arb_plan_node()) {
        let text = format!("banner\n{}\n(1 row)", json!([{ "Plan": to_json(&root) }]));
        let first = parse_plan_document(&text).unwrap();
        let second = parse_plan_document(&text).unwrap();
        prop_assert_eq!(first.plan(), second.plan());
        prop_assert_eq!(first.root(), &root);
    }

    #[test]
    fn relations_cover_inputs(root in arb_plan_node()) {
        let plan = Plan::new(root);
        for node in plan.bfs_iterator() {
            let relations = relations_of(node);
            for input in node.inputs() {
                prop_assert!(relations.is_superset(relations_of(input)));
            }
            if node.inputs().is_empty() {
                let expected: Vec<&str> = node.relation_name().into_iter().collect();
                prop_assert_eq!(relations.iter().map(String::as_str).collect::<Vec<_>>(), expected);
            }
        }
    }

    #[test]
    fn canonicalize_is_idempotent(root in arb_plan_node()) {
        let plan = Plan::new(root);
        for node in plan.bfs_iterator() {
            let canonical = canonicalize(node);
            prop_assert!(std::ptr::eq(canonicalize(canonical), canonical));
            prop_assert!(canonical.node_count() <= node.node_count());
            if node.is_join() {
                prop_assert!(std::ptr::eq(canonical, node));
            }
        }
    }

    #[test]
    fn bushy_shape_needs_a_join(root in arb_plan_node()) {
        let plan = Plan::new(root);
        if has_non_left_deep_shape(plan.root()) {
            prop_assert!(plan.join_count() > 0);
        }
    }

    #[test]
    fn compare_follows_outcome_table(
        before in arb_plan_node(),
        after in arb_plan_node(),
        check in arb_check(),
    ) {
        let held_before = check.holds(&before);
        let held_after = check.holds(&after);
        let outcome = compare(&before, &after, &check);

        prop_assert_eq!(outcome, compare_outcome(held_before, held_after));
        prop_assert_eq!(outcome == Outcome::Pass, held_before && !held_after);
        prop_assert_eq!(outcome == Outcome::Inconclusive, !held_before && !held_after);
        if held_after {
            prop_assert_eq!(outcome, Outcome::Fail);
        }
    }

    #[test]
    fn holds_matches_collected_violations(root in arb_plan_node(), check in arb_check()) {
        let violations = check.collect_violations(&root);
        prop_assert_eq!(check.holds(&root), !violations.is_empty());
        if let Some(first) = check.find_violation(&root) {
            prop_assert_eq!(&first, &violations[0]);
        }
    }
}
