//! End-to-end compilation of saved editor workspaces.

use serde_json::{json, Value};
use std::path::PathBuf;
use workflow_compiler::{
    compile_to_json, compile_workspace, compile_workspace_with_options, load_workspace_file,
    parse_workspace, CompileError, CompileOptions, IterationIds, TopBlockOrder, Workspace,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> Workspace {
    load_workspace_file(fixture(name), TopBlockOrder::Position).unwrap()
}

fn ids(document: &workflow_compiler::Document) -> Vec<&str> {
    document.steps.iter().map(|s| s.id.as_str()).collect()
}

#[test]
fn empty_workspace_yields_empty_document() {
    let workspace = parse_workspace("{}", TopBlockOrder::Position).unwrap();
    let json = compile_to_json(&workspace, &CompileOptions::default()).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, json!({ "steps": [] }));
}

#[test]
fn linear_chain_matches_expected_document() {
    let document = compile_workspace(&load("laser_wait_acquire.json")).unwrap();
    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(
        value,
        json!({
            "steps": [
                {
                    "id": "laser1",
                    "stepName": "Set Laser Power",
                    "mainFuncName": "set_laser_power",
                    "mainParams": { "channel": "488nm", "power": 50 },
                    "preFuncs": [],
                    "preParams": {},
                    "postFuncs": [],
                    "postParams": {}
                },
                {
                    "id": "wait1",
                    "stepName": "Wait Time",
                    "mainFuncName": "wait_time",
                    "mainParams": { "seconds": 2 },
                    "preFuncs": [],
                    "preParams": {},
                    "postFuncs": [],
                    "postParams": {}
                },
                {
                    "id": "frame1",
                    "stepName": "Acquire Frame",
                    "mainFuncName": "acquire_frame",
                    "mainParams": { "channel": "GFP" },
                    "preFuncs": [],
                    "preParams": {},
                    "postFuncs": [],
                    "postParams": {}
                }
            ]
        })
    );
}

#[test]
fn configured_hooks_reach_the_document() {
    let mut options = CompileOptions::default();
    options.hooks.insert(
        "acquire_frame".to_string(),
        workflow_compiler::compiler::StepHooks {
            post: vec!["process_data".into(), "save_frame_zarr".into()],
            ..Default::default()
        },
    );
    let document =
        compile_workspace_with_options(&load("laser_wait_acquire.json"), &options).unwrap();
    assert!(document.steps[0].post_funcs.is_empty());
    assert_eq!(document.steps[2].post_funcs, vec!["process_data", "save_frame_zarr"]);
}

#[test]
fn zero_trip_loop_around_large_loop_is_empty() {
    let json = r#"{"blocks": {"languageVersion": 0, "blocks": [{
        "type": "controls_repeat_ext", "id": "outer",
        "inputs": {
            "TIMES": {"shadow": {"type": "math_number", "id": "zero", "fields": {"NUM": 0}}},
            "DO": {"block": {
                "type": "controls_repeat_ext", "id": "inner",
                "inputs": {
                    "TIMES": {"shadow": {"type": "math_number", "id": "many", "fields": {"NUM": 200000}}},
                    "DO": {"block": {"type": "wait_time_block", "id": "w"}}
                }
            }}
        }
    }]}}"#;
    let workspace = parse_workspace(json, TopBlockOrder::Position).unwrap();
    let document = compile_workspace(&workspace).unwrap();
    assert!(document.is_empty());
}

#[test]
fn long_chain_compiles() {
    let depth = 5_000;
    let mut json = String::from(r#"{"blocks": {"blocks": ["#);
    for i in 0..depth {
        json.push_str(&format!(r#"{{"type": "wait_time_block", "id": "w{i}""#));
        if i + 1 < depth {
            json.push_str(r#", "next": {"block": "#);
        }
    }
    json.push_str(&"}}".repeat(depth - 1));
    json.push_str("}]}}");

    let workspace = parse_workspace(&json, TopBlockOrder::Position).unwrap();
    let document = compile_workspace(&workspace).unwrap();
    assert_eq!(document.len(), depth);
    assert_eq!(document.steps[depth - 1].id, format!("w{}", depth - 1));
}

#[test]
fn nested_repeats_unroll_to_product() {
    let document = compile_workspace(&load("nested_repeat.json")).unwrap();

    // 2 x (move + 3 x snap)
    assert_eq!(document.len(), 8);
    assert_eq!(
        ids(&document),
        vec!["move", "snap", "snap", "snap", "move", "snap", "snap", "snap"]
    );
    let move_params = serde_json::to_value(&document.steps[0].main_params).unwrap();
    assert_eq!(move_params, json!({ "x": 100, "y": 0, "z": 5.5 }));
}

#[test]
fn indexed_ids_distinguish_iterations() {
    let options = CompileOptions::default().with_iteration_ids(IterationIds::Indexed);
    let document = compile_workspace_with_options(&load("nested_repeat.json"), &options).unwrap();
    assert_eq!(
        ids(&document),
        vec![
            "move#0", "snap#0.0", "snap#0.1", "snap#0.2", "move#1", "snap#1.0", "snap#1.1",
            "snap#1.2"
        ]
    );
}

#[test]
fn top_level_chains_follow_canvas_position() {
    let document = compile_workspace(&load("two_chains.json")).unwrap();
    assert_eq!(ids(&document), vec!["early", "late"]);

    let listed = load_workspace_file(fixture("two_chains.json"), TopBlockOrder::AsListed).unwrap();
    let document = compile_workspace(&listed).unwrap();
    assert_eq!(ids(&document), vec!["late", "early"]);
}

#[test]
fn compilation_is_deterministic() {
    let options = CompileOptions::default();
    let first = compile_to_json(&load("nested_repeat.json"), &options).unwrap();
    for _ in 0..5 {
        let again = compile_to_json(&load("nested_repeat.json"), &options).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn unknown_block_fails_the_whole_load() {
    let err = load_workspace_file(fixture("unknown_block.json"), TopBlockOrder::Position)
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnknownBlockType { ref block_type, ref block_id }
            if block_type == "controls_whileUntil" && block_id == "loop1"
    ));
    assert_eq!(err.block_id(), Some("loop1"));
}

#[test]
fn step_limit_applies_to_unrolled_output() {
    let options = CompileOptions::default().with_max_steps(7);
    let err = compile_workspace_with_options(&load("nested_repeat.json"), &options).unwrap_err();
    assert!(matches!(err, CompileError::StepLimitExceeded { limit: 7, .. }));

    let options = CompileOptions::default().with_max_steps(8);
    assert!(compile_workspace_with_options(&load("nested_repeat.json"), &options).is_ok());
}

#[test]
fn missing_workspace_file_is_io_error() {
    let err = load_workspace_file(fixture("does_not_exist.json"), TopBlockOrder::Position)
        .unwrap_err();
    assert!(matches!(err, CompileError::Io(_)));
}
