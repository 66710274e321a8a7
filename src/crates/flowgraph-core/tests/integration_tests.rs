//! Integration tests for complete workflow runs
//!
//! These exercise the graph model, patch builder, registry dispatch, and
//! execution engine together in realistic scenarios.

use flowgraph_core::{
    apply_patch, ExecutionEngine, EngineConfig, EngineEvent, GraphPatch, PatchEdge, PatchNode,
    RunOutcome, StepStatus, TaskBudget, Tool, ToolRegistry, WorkflowError, WorkflowGraph,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;

/// A tool that records every invocation context it receives.
fn recording_tool(id: &str, seen: Arc<Mutex<Vec<Value>>>, result: Value) -> Tool {
    Tool::new(
        id,
        id,
        "recording test tool",
        "test",
        Arc::new(move |ctx| {
            let seen = seen.clone();
            let result = result.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(ctx);
                Ok(result)
            })
        }),
    )
}

fn simple_tool(id: &str, result: Value) -> Tool {
    Tool::new(
        id,
        id,
        "test tool",
        "test",
        Arc::new(move |_| {
            let result = result.clone();
            Box::pin(async move { Ok(result) })
        }),
    )
}

fn failing_tool(id: &str, message: &str) -> Tool {
    let message = message.to_string();
    Tool::new(
        id,
        id,
        "failing test tool",
        "test",
        Arc::new(move |_| {
            let message = message.clone();
            Box::pin(async move { Err(message.into()) })
        }),
    )
}

#[tokio::test]
async fn no_root_graph_is_rejected_with_empty_log() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("t", json!(1)));

    // Two-node cycle: every step has an incoming edge.
    let mut graph = WorkflowGraph::new();
    let a = graph.add_step("t", &registry).unwrap().id.clone();
    let b = graph.add_step("t", &registry).unwrap().id.clone();
    graph.add_edge(&b, &a).unwrap(); // auto-chain already made a -> b

    let engine = ExecutionEngine::new();
    let err = engine.run(&graph, "{}", &registry).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NoRootSteps));
}

#[tokio::test]
async fn context_isolation_across_branches() {
    // root -> a -> a2, root -> b. `a` replaces the path context with a
    // secret; `a2` must see it, `b` must not.
    let contexts = Arc::new(Mutex::new(Vec::new()));

    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("root", json!("root-out")));
    registry.register(Tool::new(
        "leak",
        "leak",
        "replaces the path context",
        "test",
        Arc::new(|_| {
            Box::pin(async move {
                Ok(json!({"output": "a-out", "context": {"secret": 1}}))
            })
        }),
    ));
    registry.register(recording_tool("observe", contexts.clone(), json!("seen")));

    let mut graph = WorkflowGraph::new();
    let root = graph.add_step("root", &registry).unwrap().id.clone();
    let a = graph.add_step("leak", &registry).unwrap().id.clone();
    let a2 = graph.add_step("observe", &registry).unwrap().id.clone();
    let b = graph.add_step("observe", &registry).unwrap().id.clone();
    // Auto-chain created root->a->a2->b; keep root->a and a->a2, replace
    // a2->b with root->b.
    let unwanted = graph
        .connections()
        .iter()
        .find(|c| c.source == a2 && c.target == b)
        .unwrap()
        .id
        .clone();
    graph.delete_edge(&unwanted);
    graph.add_edge(&root, &b).unwrap();
    assert!(graph.has_edge(&root, &a) && graph.has_edge(&a, &a2));

    let engine = ExecutionEngine::new();
    let report = engine.run(&graph, r#"{"x": 1}"#, &registry).await.unwrap();
    assert!(report.completed());
    assert_eq!(report.entries.len(), 4);

    let seen = contexts.lock().unwrap();
    assert_eq!(seen.len(), 2);
    // a2 ran first (depth-first under reverse push) and sees the secret.
    assert_eq!(seen[0]["secret"], json!(1));
    // b's context is untouched by a's replacement.
    assert!(seen[1].get("secret").is_none());
    assert_eq!(seen[1]["global_input"], json!({"x": 1}));
}

#[tokio::test]
async fn sibling_step_numbers_share_label_with_increasing_suffixes() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("t", json!(null)));

    let mut graph = WorkflowGraph::new();
    let root = graph.add_step("t", &registry).unwrap().id.clone();
    let left = graph.add_step("t", &registry).unwrap().id.clone();
    let right = graph.add_step("t", &registry).unwrap().id.clone();
    // Undo auto-chain left->right, fork both from the root instead.
    let unwanted = graph
        .connections()
        .iter()
        .find(|c| c.source == left && c.target == right)
        .unwrap()
        .id
        .clone();
    graph.delete_edge(&unwanted);
    graph.add_edge(&root, &right).unwrap();

    let engine = ExecutionEngine::new();
    let report = engine.run(&graph, "{}", &registry).await.unwrap();

    let numbers: Vec<&str> = report
        .entries
        .iter()
        .map(|e| e.step_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["A1", "B1", "B2"]);
    assert_eq!(report.entries[1].path_id, "B");
    assert_eq!(report.entries[2].path_id, "B");
    assert_eq!(report.entries[1].step_index, 2);
    assert_eq!(report.entries[2].step_index, 2);
}

#[tokio::test]
async fn error_containment_prunes_only_the_failing_path() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("root", json!("ok")));
    registry.register(failing_tool("boom", "dimension mismatch"));
    registry.register(simple_tool("after", json!("never")));

    // root -> boom -> after
    let mut graph = WorkflowGraph::new();
    graph.add_step("root", &registry).unwrap();
    graph.add_step("boom", &registry).unwrap();
    graph.add_step("after", &registry).unwrap();

    let engine = ExecutionEngine::new();
    let report = engine.run(&graph, "{}", &registry).await.unwrap();

    assert!(report.completed());
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].tool_id, "root");
    assert_eq!(report.entries[0].status, StepStatus::Success);
    assert_eq!(report.entries[1].tool_id, "boom");
    assert_eq!(report.entries[1].status, StepStatus::Error);
    assert_eq!(report.entries[1].response, json!("dimension mismatch"));
}

#[tokio::test]
async fn failing_branch_leaves_siblings_unaffected() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("root", json!("ok")));
    registry.register(failing_tool("boom", "nope"));
    registry.register(simple_tool("fine", json!("fine")));

    // root forks to boom and fine.
    let mut graph = WorkflowGraph::new();
    let root = graph.add_step("root", &registry).unwrap().id.clone();
    graph.add_step("boom", &registry).unwrap();
    let fine = graph.add_step("fine", &registry).unwrap().id.clone();
    let unwanted = graph
        .connections()
        .iter()
        .find(|c| c.target == fine)
        .unwrap()
        .id
        .clone();
    graph.delete_edge(&unwanted);
    graph.add_edge(&root, &fine).unwrap();

    let engine = ExecutionEngine::new();
    let report = engine.run(&graph, "{}", &registry).await.unwrap();

    let statuses: Vec<(&str, StepStatus)> = report
        .entries
        .iter()
        .map(|e| (e.tool_id.as_str(), e.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("root", StepStatus::Success),
            ("boom", StepStatus::Error),
            ("fine", StepStatus::Success),
        ]
    );
}

#[tokio::test]
async fn fork_scenario_orders_children_by_edge_declaration() {
    // Graph: A(matrix.add) -> B(data.normalize), A -> C(utils.log).
    // Expected log: A first, then B, then C.
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("matrix.add", json!([[2]])));
    registry.register(simple_tool("data.normalize", json!([1.0])));
    registry.register(simple_tool("utils.log", json!("logged")));

    let mut graph = WorkflowGraph::new();
    let patch = GraphPatch {
        reset: false,
        nodes: vec![
            PatchNode { id: Some("A".into()), tool_id: "matrix.add".into() },
            PatchNode { id: Some("B".into()), tool_id: "data.normalize".into() },
            PatchNode { id: Some("C".into()), tool_id: "utils.log".into() },
        ],
        edges: vec![
            PatchEdge { source: "A".into(), target: "B".into() },
            PatchEdge { source: "A".into(), target: "C".into() },
        ],
    };
    let report = apply_patch(&mut graph, patch, &registry);
    assert_eq!(report.steps_added, 3);
    assert_eq!(report.edges_added, 2);

    let engine = ExecutionEngine::new();
    let report = engine.run(&graph, r#"{"x": 1}"#, &registry).await.unwrap();

    let order: Vec<&str> = report.entries.iter().map(|e| e.tool_id.as_str()).collect();
    assert_eq!(order, vec!["matrix.add", "data.normalize", "utils.log"]);
    assert_eq!(report.entries[0].step_number, "A1");
    assert_eq!(report.entries[1].step_number, "B1");
    assert_eq!(report.entries[2].step_number, "B2");

    // B and C both saw A's output as their predecessor view.
    assert_eq!(report.entries[1].request["__prev_output"], json!([[2]]));
    assert_eq!(report.entries[2].request["__prev_output"], json!([[2]]));
    assert_eq!(
        report.entries[1].request["__inputs_by_node"],
        json!({"A": [[2]]})
    );
}

#[tokio::test]
async fn idempotent_edge_merge_across_patches() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("t", json!(null)));

    let mut graph = WorkflowGraph::new();
    let first = GraphPatch {
        reset: false,
        nodes: vec![
            PatchNode { id: Some("a".into()), tool_id: "t".into() },
            PatchNode { id: Some("b".into()), tool_id: "t".into() },
        ],
        edges: vec![PatchEdge { source: "a".into(), target: "b".into() }],
    };
    apply_patch(&mut graph, first, &registry);

    let second = GraphPatch {
        reset: false,
        nodes: vec![PatchNode { id: Some("c".into()), tool_id: "t".into() }],
        edges: vec![PatchEdge { source: "a".into(), target: "b".into() }],
    };
    let report = apply_patch(&mut graph, second, &registry);

    assert_eq!(report.edges_added, 0);
    assert_eq!(report.edges_dropped, 1);
    assert_eq!(
        graph
            .connections()
            .iter()
            .filter(|c| c.source == "a" && c.target == "b")
            .count(),
        1
    );
}

#[tokio::test]
async fn runaway_cycle_trips_the_circuit_breaker() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("t", json!(null)));

    // root -> x -> y -> x: a cycle reachable from a legitimate root, the
    // kind the patch builder never produces but direct edge edits can.
    let mut graph = WorkflowGraph::new();
    let root = graph.add_step("t", &registry).unwrap().id.clone();
    let x = graph.add_step("t", &registry).unwrap().id.clone();
    let y = graph.add_step("t", &registry).unwrap().id.clone();
    let _ = root;
    graph.add_edge(&y, &x).unwrap();

    let engine = ExecutionEngine::new();
    let report = engine.run(&graph, "{}", &registry).await.unwrap();

    match &report.outcome {
        RunOutcome::Aborted { reason } => {
            assert!(reason.contains("cycle"), "unexpected reason: {reason}");
        }
        RunOutcome::Completed => panic!("run should have been aborted"),
    }
    // Partial log is retained: budget = 3 * max(2, 3+1) * 4 = 48 pops.
    assert!(!report.entries.is_empty());
    assert_eq!(report.tasks_processed, 49);
}

#[tokio::test]
async fn fixed_budget_overrides_the_formula() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("t", json!(null)));

    let mut graph = WorkflowGraph::new();
    graph.add_step("t", &registry).unwrap();
    graph.add_step("t", &registry).unwrap();
    graph.add_step("t", &registry).unwrap();

    let engine = ExecutionEngine::with_config(EngineConfig {
        task_budget: TaskBudget::Fixed(2),
    });
    let report = engine.run(&graph, "{}", &registry).await.unwrap();

    assert!(matches!(report.outcome, RunOutcome::Aborted { .. }));
    assert_eq!(report.entries.len(), 2);
}

#[tokio::test]
async fn streaming_run_delivers_entries_then_finished() {
    let mut registry = ToolRegistry::new();
    registry.register(simple_tool("t", json!("out")));

    let mut graph = WorkflowGraph::new();
    graph.add_step("t", &registry).unwrap();
    graph.add_step("t", &registry).unwrap();

    let engine = ExecutionEngine::new();
    let mut events = engine.run_stream(graph, "{}", Arc::new(registry));

    let mut numbers = Vec::new();
    let mut finished = false;
    while let Some(event) = events.next().await {
        match event {
            EngineEvent::Entry(entry) => numbers.push(entry.step_number),
            EngineEvent::Finished {
                entries,
                tasks_processed,
            } => {
                assert_eq!(entries, 2);
                assert_eq!(tasks_processed, 2);
                finished = true;
            }
            EngineEvent::Aborted { reason } => panic!("unexpected abort: {reason}"),
        }
    }
    assert!(finished);
    assert_eq!(numbers, vec!["A1", "B1"]);
}

#[tokio::test]
async fn streaming_config_error_aborts_with_no_entries() {
    let registry = ToolRegistry::new();
    let graph = WorkflowGraph::new();

    let engine = ExecutionEngine::new();
    let mut events = engine.run_stream(graph, "{}", Arc::new(registry));

    match events.next().await {
        Some(EngineEvent::Aborted { reason }) => {
            assert!(reason.contains("no root step"), "unexpected: {reason}");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn global_input_reaches_every_path() {
    let contexts = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ToolRegistry::new();
    registry.register(recording_tool("observe", contexts.clone(), json!(null)));

    let mut graph = WorkflowGraph::new();
    graph.add_step("observe", &registry).unwrap();
    graph.add_step("observe", &registry).unwrap();

    let engine = ExecutionEngine::new();
    engine
        .run(&graph, r#"{"query": "hello"}"#, &registry)
        .await
        .unwrap();

    let seen = contexts.lock().unwrap();
    assert_eq!(seen.len(), 2);
    for ctx in seen.iter() {
        assert_eq!(ctx["global_input"], json!({"query": "hello"}));
    }
    // Depth metadata advances along the chain.
    assert_eq!(seen[0]["step_index"], json!(1));
    assert_eq!(seen[1]["step_index"], json!(2));
    assert_eq!(seen[0]["path_id"], json!("A"));
    assert_eq!(seen[1]["path_id"], json!("B"));
}
