//! Ready-made demo tools
//!
//! A small catalog exercising the interesting handler shapes: pure functions
//! over `global_input` (matrix math), a context-enriching envelope returner
//! (normalize), and passthrough sinks (echo, log).

pub mod data;
pub mod matrix;
pub mod util;

use flowgraph_core::registry::ToolRegistry;

/// Build a registry containing every demo tool
///
/// Registered ids: `matrix.add`, `matrix.multiply`, `data.normalize`,
/// `utils.echo`, `utils.log`.
pub fn demo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(matrix::add_tool());
    registry.register(matrix::multiply_tool());
    registry.register(data::normalize_tool());
    registry.register(util::echo_tool());
    registry.register(util::log_tool());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_registry_contains_all_tools() {
        let registry = demo_registry();
        assert_eq!(
            registry.tool_ids(),
            vec![
                "data.normalize",
                "matrix.add",
                "matrix.multiply",
                "utils.echo",
                "utils.log",
            ]
        );
    }
}
