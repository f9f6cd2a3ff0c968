//! ## Background
//!
//! A join order policy is only as good as the plans it makes the planner produce. Two policies
//! are of interest here. The first restricts join enumeration to left deep trees, where the inner
//! operand of every join is a single base relation (possibly under a `Hash`, `Sort` or similar
//! wrapper) and hash tables are never built from the output of another join. The second prunes
//! bushy joins involving relations without statistics: such a relation may still be joined, but
//! never inside a join where both operands already combine several relations.
//!
//! Whether a policy had the intended effect can be read off the plans the engine reports with
//! `EXPLAIN (FORMAT JSON)`. This crate decodes those plans and decides the structural properties
//! above, for single documents and for before/after pairs captured with the policy disabled and
//! enabled.
//!
//! ## Design
//!
//! ### Plan model
//!
//! A plan is an owned tree of [`plan::PlanNode`]s. Node types stay plain strings; only the join
//! operators and a fixed set of transparent single input operators are recognized (see
//! [`operator`]), everything else is walked without special treatment. The order of a node's
//! inputs is kept exactly as reported, since for joins input 0 is the outer side and input 1 the
//! inner side.
//!
//! Every node carries a [`properties::LogicalProperty`] holding the set of relations under it,
//! derived bottom up once when the node is built.
//!
//! ### Shape checks
//!
//! A check is a test of a single node plugged into a shared pre-order walk (see [`shape`]). A
//! check holds for a plan when it fires at any node. Checks are total; the only failure mode of
//! the crate is a document that cannot be decoded.
//!
//! ### Corpus evaluation
//!
//! [`corpus`] loads captured documents, runs a check over them and compares before/after pairs.
//! Per document failures are reported as `ERROR` verdicts and never stop a batch.

#[macro_use]
extern crate prettytable;

pub mod corpus;
pub mod error;
pub mod explain;
pub mod operator;
pub mod plan;
pub mod properties;
pub mod shape;
