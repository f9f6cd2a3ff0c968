//! Evaluation of shape checks over a corpus of captured plans.
//!
//! A corpus is a set of plan documents tagged with the query they were captured for, the policy
//! mode (`off` or `on`) and optionally the target relation. Documents can be checked one by one
//! ([`evaluate`]) or as before/after pairs ([`compare_batch`]), where the check is expected to
//! hold with the policy off and not with it on.

mod meta;
pub use meta::*;
mod load;
pub use load::*;
mod evaluate;
pub use evaluate::*;
mod report;
pub use report::*;
