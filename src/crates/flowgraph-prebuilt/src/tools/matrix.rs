//! Matrix math demo tools
//!
//! Operands are read from `global_input` (`"a"` and `"b"`), the way the
//! workflow builder's demo inputs supply them. Shape errors fail the step
//! and prune its path without touching sibling branches.

use crate::error::PrebuiltError;
use flowgraph_core::registry::Tool;
use serde_json::{json, Value};
use std::sync::Arc;

type Matrix = Vec<Vec<f64>>;

fn matrix_arg(ctx: &Value, key: &str) -> Result<Matrix, PrebuiltError> {
    let raw = ctx
        .get("global_input")
        .and_then(|input| input.get(key))
        .cloned()
        .ok_or_else(|| PrebuiltError::MissingInput(key.to_string()))?;
    serde_json::from_value(raw)
        .map_err(|_| PrebuiltError::InvalidShape(format!("'{key}' must be a numeric matrix")))
}

fn check_rectangular(name: &str, m: &Matrix) -> Result<(), PrebuiltError> {
    if m.is_empty() || m[0].is_empty() {
        return Err(PrebuiltError::InvalidShape(format!("'{name}' is empty")));
    }
    let width = m[0].len();
    if m.iter().any(|row| row.len() != width) {
        return Err(PrebuiltError::InvalidShape(format!(
            "'{name}' has ragged rows"
        )));
    }
    Ok(())
}

fn add(ctx: &Value) -> Result<Matrix, PrebuiltError> {
    let a = matrix_arg(ctx, "a")?;
    let b = matrix_arg(ctx, "b")?;
    check_rectangular("a", &a)?;
    check_rectangular("b", &b)?;
    if a.len() != b.len() || a[0].len() != b[0].len() {
        return Err(PrebuiltError::DimensionMismatch(format!(
            "{}x{} + {}x{}",
            a.len(),
            a[0].len(),
            b.len(),
            b[0].len()
        )));
    }
    Ok(a.iter()
        .zip(&b)
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| x + y).collect())
        .collect())
}

fn multiply(ctx: &Value) -> Result<Matrix, PrebuiltError> {
    let a = matrix_arg(ctx, "a")?;
    let b = matrix_arg(ctx, "b")?;
    check_rectangular("a", &a)?;
    check_rectangular("b", &b)?;
    let (rows, inner, cols) = (a.len(), a[0].len(), b[0].len());
    if inner != b.len() {
        return Err(PrebuiltError::DimensionMismatch(format!(
            "{}x{} * {}x{}",
            rows,
            inner,
            b.len(),
            cols
        )));
    }
    let mut result = vec![vec![0.0; cols]; rows];
    for (i, row) in a.iter().enumerate() {
        for (k, x) in row.iter().enumerate() {
            for (j, y) in b[k].iter().enumerate() {
                result[i][j] += x * y;
            }
        }
    }
    Ok(result)
}

/// `matrix.add`: elementwise sum of `global_input.a` and `global_input.b`
pub fn add_tool() -> Tool {
    Tool::new(
        "matrix.add",
        "Matrix Add",
        "Elementwise sum of the input matrices a and b",
        "matrix",
        Arc::new(|ctx| Box::pin(async move { Ok(json!(add(&ctx)?)) })),
    )
}

/// `matrix.multiply`: matrix product of `global_input.a` and `global_input.b`
pub fn multiply_tool() -> Tool {
    Tool::new(
        "matrix.multiply",
        "Matrix Multiply",
        "Matrix product of the input matrices a and b",
        "matrix",
        Arc::new(|ctx| Box::pin(async move { Ok(json!(multiply(&ctx)?)) })),
    )
}
