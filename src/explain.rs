//! Decoding of `EXPLAIN (FORMAT JSON)` output.
//!
//! The engine reports a plan as a json array holding one object, whose `Plan` member is the root
//! node:
//!
//! ```json
//! [{"Plan": {"Node Type": "Hash Join", "Join Type": "Inner", "Plans": [...]}}]
//! ```
//!
//! Captured output often carries client banners or headers before the json and a row count
//! footer after it. Decoding starts at the first opening bracket and stops after the first
//! complete json value.

use log::trace;
use serde::Deserialize;
use serde_json::{Deserializer, Map, Value};

use crate::error::{PlanError, PlanResult};
use crate::plan::{Plan, PlanDocument, PlanNode, PlanNodeBuilder};

const PLAN_KEY: &str = "Plan";
const NODE_TYPE_KEY: &str = "Node Type";
const JOIN_TYPE_KEY: &str = "Join Type";
const RELATION_NAME_KEY: &str = "Relation Name";
const ALIAS_KEY: &str = "Alias";
const PLANS_KEY: &str = "Plans";

/// Parses captured explain output into a plan document without metadata.
pub fn parse_plan_document(text: &str) -> PlanResult<PlanDocument> {
    let value = locate_json(text)?;
    let root = locate_plan_root(&value)?;
    let root = json_to_plan_node(root, &mut vec![])?;
    Ok(PlanDocument::new(Plan::new(root)))
}

/// Deepest array or object nesting accepted. Every plan node takes two levels, its object and
/// its `Plans` array, so this admits join chains several hundred deep.
pub const MAX_JSON_DEPTH: usize = 1024;

/// Decodes the first json array or object in `text`, ignoring whatever surrounds it.
fn locate_json(text: &str) -> PlanResult<Value> {
    let start = text
        .find(|c: char| c == '[' || c == '{')
        .ok_or_else(|| PlanError::malformed("no json array or object found"))?;
    if start > 0 {
        trace!("Skipping {} bytes of leading text before plan json", start);
    }

    let json = &text[start..];
    let depth = nesting_depth(json);
    if depth > MAX_JSON_DEPTH {
        return Err(PlanError::malformed(format!(
            "json nested deeper than {} levels",
            MAX_JSON_DEPTH
        )));
    }

    let mut deserializer = Deserializer::from_str(json);
    // Depth was bounded above.
    deserializer.disable_recursion_limit();
    Value::deserialize(&mut deserializer)
        .map_err(|e| PlanError::malformed(format!("invalid json: {}", e)))
}

/// Nesting depth of the json value `json` starts with. Scanning stops once the value is closed
/// or the depth exceeds [`MAX_JSON_DEPTH`].
fn nesting_depth(json: &str) -> usize {
    let (mut depth, mut max_depth) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
                if max_depth > MAX_JSON_DEPTH {
                    break;
                }
            }
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    max_depth
}

fn locate_plan_root(value: &Value) -> PlanResult<&Map<String, Value>> {
    match value {
        Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| PlanError::malformed("plan array is empty"))?;
            match first {
                Value::Object(obj) if obj.contains_key(PLAN_KEY) => plan_member(obj),
                _ => Err(PlanError::malformed(
                    "first element of plan array has no `Plan` member",
                )),
            }
        }
        Value::Object(obj) if obj.contains_key(PLAN_KEY) => plan_member(obj),
        // Bare root node, as written in hand made fixtures.
        Value::Object(obj) if obj.contains_key(NODE_TYPE_KEY) => Ok(obj),
        Value::Object(_) => Err(PlanError::malformed(
            "object has neither a `Plan` nor a `Node Type` member",
        )),
        _ => Err(PlanError::malformed("plan document is not an array or object")),
    }
}

fn plan_member(obj: &Map<String, Value>) -> PlanResult<&Map<String, Value>> {
    match obj.get(PLAN_KEY) {
        Some(Value::Object(root)) => Ok(root),
        _ => Err(PlanError::malformed("`Plan` member is not an object")),
    }
}

/// `path` holds the input indexes leading to `obj`, for error messages.
fn json_to_plan_node(obj: &Map<String, Value>, path: &mut Vec<usize>) -> PlanResult<PlanNode> {
    let node_type = string_field(obj, NODE_TYPE_KEY, path)?.unwrap_or_default();
    let mut builder = PlanNodeBuilder::new(node_type);
    if let Some(join_type) = string_field(obj, JOIN_TYPE_KEY, path)? {
        builder = builder.join_type(join_type);
    }
    if let Some(relation_name) = string_field(obj, RELATION_NAME_KEY, path)? {
        builder = builder.relation_name(relation_name);
    }
    if let Some(alias) = string_field(obj, ALIAS_KEY, path)? {
        builder = builder.alias(alias);
    }

    let inputs = match obj.get(PLANS_KEY) {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(plans)) => {
            let mut inputs = Vec::with_capacity(plans.len());
            for (idx, plan) in plans.iter().enumerate() {
                path.push(idx);
                let input = match plan {
                    Value::Object(child) => json_to_plan_node(child, path)?,
                    _ => {
                        return Err(PlanError::malformed(format!(
                            "plan node at {:?} is not an object",
                            path
                        )))
                    }
                };
                path.pop();
                inputs.push(input);
            }
            inputs
        }
        Some(_) => {
            return Err(PlanError::malformed(format!(
                "`{}` of plan node at {:?} is not an array",
                PLANS_KEY, path
            )))
        }
    };

    Ok(builder.add_inputs(inputs).build())
}

fn string_field(obj: &Map<String, Value>, key: &str, path: &[usize]) -> PlanResult<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PlanError::malformed(format!(
            "`{}` of plan node at {:?} is not a string",
            key, path
        ))),
    }
}
