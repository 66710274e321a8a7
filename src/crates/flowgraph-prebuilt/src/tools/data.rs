//! Data transformation demo tools

use crate::error::PrebuiltError;
use flowgraph_core::registry::Tool;
use serde_json::{json, Value};
use std::sync::Arc;

/// Pull every number out of a JSON value, recursing through arrays.
fn collect_numbers(value: &Value, out: &mut Vec<f64>) {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                out.push(f);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_numbers(item, out);
            }
        }
        _ => {}
    }
}

fn normalize_source(ctx: &Value) -> Result<Vec<f64>, PrebuiltError> {
    let source = ctx
        .get("__prev_output")
        .filter(|v| !v.is_null())
        .or_else(|| ctx.get("global_input").and_then(|input| input.get("values")))
        .ok_or_else(|| PrebuiltError::MissingInput("values".to_string()))?;

    let mut numbers = Vec::new();
    collect_numbers(source, &mut numbers);
    if numbers.is_empty() {
        return Err(PrebuiltError::MissingInput(
            "no numeric values to normalize".to_string(),
        ));
    }
    Ok(numbers)
}

fn normalize(values: &[f64]) -> (Vec<f64>, f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let scaled = values
        .iter()
        .map(|v| if range == 0.0 { 0.0 } else { (v - min) / range })
        .collect();
    (scaled, min, max)
}

/// `data.normalize`: min-max scale the upstream numbers into `[0, 1]`
///
/// Reads the predecessor's output when one exists, otherwise
/// `global_input.values`. Returns an output/context envelope so the
/// normalization stats ride along to downstream steps without displacing
/// `global_input`.
pub fn normalize_tool() -> Tool {
    Tool::new(
        "data.normalize",
        "Normalize",
        "Min-max scales upstream numeric values into the unit interval",
        "data",
        Arc::new(|ctx| {
            Box::pin(async move {
                let values = normalize_source(&ctx)?;
                let (scaled, min, max) = normalize(&values);
                Ok(json!({
                    "output": scaled,
                    "context": {
                        "global_input": ctx.get("global_input").cloned().unwrap_or(Value::Null),
                        "normalize_stats": {"min": min, "max": max, "count": values.len()},
                    },
                }))
            })
        }),
    )
}
