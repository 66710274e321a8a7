//! Execution context assembly
//!
//! The context is the mapping carried along a single traversal path. It is
//! seeded with the user's `global_input` object and re-enriched at every hop
//! with the reserved keys below. Each branch of execution owns an independent
//! copy: forking at a branch point clones the parent's context for each
//! child, so sibling branches cannot observe each other's mutations.
//!
//! # Reserved keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `global_input` | the parsed user JSON, present from the seed onward |
//! | `__prev_output` | the immediately preceding step's output, `null` at a path start |
//! | `__all_inputs` | single-predecessor view: `[prev_output]`, empty at a path start |
//! | `__inputs_by_node` | single-predecessor view: `{parent_step_id: prev_output}`, empty at a path start |
//! | `step_index` | depth along this path, starting at 1 |
//! | `path_id` | depth-keyed branch label (see [`crate::engine::path_label`]) |

use crate::graph::StepId;
use serde_json::{json, Map, Value};

/// Key holding the user-supplied run input
pub const GLOBAL_INPUT: &str = "global_input";
/// Key holding the parent step's output
pub const PREV_OUTPUT: &str = "__prev_output";
/// Key holding the single-predecessor input array
pub const ALL_INPUTS: &str = "__all_inputs";
/// Key holding the single-predecessor input map
pub const INPUTS_BY_NODE: &str = "__inputs_by_node";
/// Key holding the depth along the current path
pub const STEP_INDEX: &str = "step_index";
/// Key holding the current path label
pub const PATH_ID: &str = "path_id";

/// Seed context for a root task
pub fn seed(global_input: Value) -> Value {
    json!({ GLOBAL_INPUT: global_input })
}

/// Build the invocation context for one step
///
/// Starts from the path's carried context and layers the reserved keys on
/// top. A handler-replaced carried context that is not a JSON object
/// contributes no fields of its own; the reserved keys are still injected.
pub fn enrich(
    carried: &Value,
    prev: Option<(&StepId, &Value)>,
    depth: usize,
    label: &str,
) -> Value {
    let mut map: Map<String, Value> = carried.as_object().cloned().unwrap_or_default();

    match prev {
        Some((parent, output)) => {
            map.insert(PREV_OUTPUT.to_string(), output.clone());
            map.insert(ALL_INPUTS.to_string(), json!([output.clone()]));
            map.insert(
                INPUTS_BY_NODE.to_string(),
                json!({ parent.clone(): output.clone() }),
            );
        }
        None => {
            map.insert(PREV_OUTPUT.to_string(), Value::Null);
            map.insert(ALL_INPUTS.to_string(), json!([]));
            map.insert(INPUTS_BY_NODE.to_string(), json!({}));
        }
    }
    map.insert(STEP_INDEX.to_string(), json!(depth));
    map.insert(PATH_ID.to_string(), json!(label));

    Value::Object(map)
}
