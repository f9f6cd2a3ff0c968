use plan_shape::corpus::{compare, Outcome};
use plan_shape::explain::parse_plan_document;
use plan_shape::plan::PlanDocument;
use plan_shape::shape::{
    has_bushy_involving_relation, has_intermediate_hash_build, has_non_left_deep_shape,
    CheckName, ShapeCheckImpl,
};
use serde_json::{json, Value};

fn scan(relation: &str) -> Value {
    json!({"Node Type": "Seq Scan", "Relation Name": relation, "Alias": relation})
}

fn hash_join(outer: Value, inner: Value) -> Value {
    json!({"Node Type": "Hash Join", "Join Type": "Inner", "Plans": [outer, inner]})
}

fn hash(input: Value) -> Value {
    json!({"Node Type": "Hash", "Plans": [input]})
}

fn parse(plan: Value) -> PlanDocument {
    parse_plan_document(&json!([{ "Plan": plan }]).to_string()).unwrap()
}

#[test]
fn test_inner_join_is_not_left_deep() {
    let doc = parse_plan_document(
        r#"{"Node Type":"Hash Join","Plans":[{"Node Type":"Seq Scan","Relation Name":"t1"},{"Node Type":"Hash Join","Plans":[{"Node Type":"Seq Scan","Relation Name":"t2"},{"Node Type":"Seq Scan","Relation Name":"t3"}]}]}"#,
    )
    .unwrap();
    assert!(has_non_left_deep_shape(doc.root()));
}

#[test]
fn test_hash_built_from_join() {
    let doc = parse(hash_join(
        scan("t1"),
        hash(hash_join(scan("t2"), hash(scan("t3")))),
    ));
    assert!(has_intermediate_hash_build(doc.root()));
    assert!(has_non_left_deep_shape(doc.root()));
}

#[test]
fn test_bushy_join_with_target() {
    let doc = parse(bushy_plan("t3"));
    assert!(has_bushy_involving_relation(doc.root(), "t3"));
    assert!(!has_bushy_involving_relation(doc.root(), "t5"));
}

#[test]
fn test_left_deep_chain_passes_every_check() {
    let mut plan = scan("t0");
    for i in 1..=5 {
        plan = hash_join(plan, hash(scan(&format!("t{}", i))));
    }
    let doc = parse(json!({"Node Type": "Aggregate", "Plans": [plan]}));
    assert_eq!(doc.plan().join_count(), 5);

    assert!(!has_non_left_deep_shape(doc.root()));
    assert!(!has_intermediate_hash_build(doc.root()));
    for i in 0..=5 {
        assert!(!has_bushy_involving_relation(doc.root(), &format!("t{}", i)));
    }
}

#[test]
fn test_compare_target_removed_from_bushy_join() {
    let before = parse(bushy_plan("t3"));
    // Same plan with the target's scan replaced by another relation.
    let after = parse(bushy_plan("t5"));
    let check = ShapeCheckImpl::new(CheckName::TargetNotInBushy, Some("t3")).unwrap();

    assert_eq!(compare(before.root(), after.root(), &check), Outcome::Pass);
    assert_eq!(compare(after.root(), after.root(), &check), Outcome::Inconclusive);
    assert_eq!(compare(before.root(), before.root(), &check), Outcome::Fail);
}

#[test]
fn test_sort_between_hash_and_join() {
    // Merge joins below a hash need their input sorted; the wrapper hides the join from the hash
    // build check but not from the left deep check.
    let build = json!({"Node Type": "Sort", "Plans": [
        {"Node Type": "Merge Join", "Plans": [scan("t2"), scan("t3")]}
    ]});
    let doc = parse(hash_join(scan("t1"), hash(build)));
    assert!(!has_intermediate_hash_build(doc.root()));
    assert!(has_non_left_deep_shape(doc.root()));
}

#[test]
fn test_realistic_explain_output() {
    let text = r#"
                                  QUERY PLAN
------------------------------------------------------------------------------
 [
   {
     "Plan": {
       "Node Type": "Gather",
       "Parallel Aware": false,
       "Plans": [
         {
           "Node Type": "Nested Loop",
           "Parent Relationship": "Outer",
           "Join Type": "Inner",
           "Plans": [
             {"Node Type": "Seq Scan", "Parent Relationship": "Outer", "Relation Name": "orders", "Alias": "o"},
             {"Node Type": "Memoize", "Parent Relationship": "Inner", "Plans": [
               {"Node Type": "Index Scan", "Parent Relationship": "Outer", "Relation Name": "customers", "Alias": "c"}
             ]}
           ]
         }
       ]
     },
     "Planning Time": 0.412
   }
 ]
(1 row)
"#;
    let doc = parse_plan_document(text).unwrap();
    assert_eq!(doc.root().node_type(), "Gather");
    assert!(!has_non_left_deep_shape(doc.root()));
    assert!(!has_bushy_involving_relation(doc.root(), "customers"));
}

/// Join of `{t1, t2}` with `{third, t4}`.
fn bushy_plan(third: &str) -> Value {
    hash_join(
        hash_join(scan("t1"), hash(scan("t2"))),
        hash(hash_join(scan(third), hash(scan("t4")))),
    )
}
