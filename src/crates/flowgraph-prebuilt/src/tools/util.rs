//! Utility demo tools

use flowgraph_core::registry::Tool;
use serde_json::{json, Value};
use std::sync::Arc;

/// `utils.echo`: return the run's global input unchanged
pub fn echo_tool() -> Tool {
    Tool::new(
        "utils.echo",
        "Echo",
        "Returns the global input unchanged",
        "utils",
        Arc::new(|ctx| {
            Box::pin(async move { Ok(ctx.get("global_input").cloned().unwrap_or(Value::Null)) })
        }),
    )
}

/// `utils.log`: summarize the predecessor's output
///
/// Produces a small record of what flowed in, useful as a terminal sink on a
/// branch when demonstrating fan-out.
pub fn log_tool() -> Tool {
    Tool::new(
        "utils.log",
        "Log",
        "Records a summary of the upstream output",
        "utils",
        Arc::new(|ctx| {
            Box::pin(async move {
                let upstream = ctx.get("__prev_output").cloned().unwrap_or(Value::Null);
                let kind = match &upstream {
                    Value::Null => "null",
                    Value::Bool(_) => "bool",
                    Value::Number(_) => "number",
                    Value::String(_) => "string",
                    Value::Array(_) => "array",
                    Value::Object(_) => "object",
                };
                Ok(json!({"logged": upstream, "kind": kind}))
            })
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_returns_global_input() {
        let tool = echo_tool();
        let ctx = json!({"global_input": {"a": 1}, "__prev_output": null});
        let out = (tool.handler)(ctx).await.unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[tokio::test]
    async fn log_tags_the_upstream_kind() {
        let tool = log_tool();
        let ctx = json!({"__prev_output": [1, 2, 3]});
        let out = (tool.handler)(ctx).await.unwrap();
        assert_eq!(out["kind"], "array");
        assert_eq!(out["logged"], json!([1, 2, 3]));
    }
}
