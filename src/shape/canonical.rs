use crate::plan::PlanNode;

/// Skips transparent wrappers (`Hash`, `Sort`, `Materialize`, ...) above `node`.
///
/// Returns the first node on the single input chain starting at `node` which is a join, does not
/// have exactly one input, or is not a transparent operator. That is `node` itself when it is
/// already canonical.
pub fn canonicalize(node: &PlanNode) -> &PlanNode {
    let mut current = node;
    while let Some(input) = current.single_input() {
        if current.kind().as_transparent().is_none() {
            break;
        }
        current = input;
    }
    current
}
