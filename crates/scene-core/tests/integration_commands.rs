//! Integration tests for the AgentCommand JSON protocol.
//!
//! Tests the full command pipeline: JSON string -> parse -> execute -> response.

use scene_core::command::{execute_json, execute_json_batch};
use scene_core::harness::PlacementHarness;
use scene_core::i18n::Lang;

#[test]
fn test_command_load_object() {
    let mut h = PlacementHarness::new();
    let json = r#"{"command": "load_object", "object": {"parts": [
        {"type": "floor", "position": [0, 0, 0], "size": [4, 0.2, 4]},
        {"type": "wall", "position": [0, 1, -1.9], "size": [4, 2, 0.2]}
    ]}}"#;

    let resp = execute_json(&mut h, json).unwrap();
    assert!(resp.success, "{:?}", resp.error);
    let data = resp.data.unwrap();
    assert_eq!(data["part_count"], 2);
    assert_eq!(data["footprint"], serde_json::json!([4, 4]));
}

#[test]
fn test_command_load_invalid_object_fails() {
    let mut h = PlacementHarness::new();
    let json = r#"{"command": "load_object", "object": {"parts": [
        {"type": "wall", "position": [0, 1, 0], "size": [4, 0, 0.2]}
    ]}}"#;

    let resp = execute_json(&mut h, json).unwrap();
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("size"));
}

#[test]
fn test_command_full_workflow_via_json_batch() {
    let mut h = PlacementHarness::new();
    // Default view: 20 px per unit, origin at (400, 300)
    let json = r#"[
        {"command": "pointer_move", "x": 446, "y": 262},
        {"command": "click", "x": 446, "y": 262},
        {"command": "rotate"},
        {"command": "inspect"}
    ]"#;

    let responses = execute_json_batch(&mut h, json).unwrap();
    assert_eq!(responses.len(), 4);
    for resp in &responses {
        assert!(resp.success, "Failed: {:?}", resp.error);
    }

    let hover = responses[0].data.as_ref().unwrap();
    assert_eq!(hover["hover_cell"], serde_json::json!([2.0, -2.0]));

    let placed = responses[1].data.as_ref().unwrap();
    assert_eq!(placed["outcome"], "placed");

    let rotated = responses[2].data.as_ref().unwrap();
    assert_eq!(rotated["rotation_degrees"], 90.0);

    let state = responses[3].data.as_ref().unwrap();
    assert_eq!(state["placed"], serde_json::json!([2.0, 1.1, -2.0]));
    let yaw = state["record"]["rotation"][1].as_f64().unwrap();
    assert_eq!(yaw.to_degrees().round(), 90.0);
}

#[test]
fn test_command_drag_then_reset() {
    let mut h = PlacementHarness::new();
    let json = r#"[
        {"command": "pointer_down", "x": 400, "y": 300},
        {"command": "pointer_move", "x": 420, "y": 300},
        {"command": "pointer_up", "x": 420, "y": 300},
        {"command": "click", "x": 400, "y": 300},
        {"command": "reset"},
        {"command": "inspect"}
    ]"#;

    let responses = execute_json_batch(&mut h, json).unwrap();
    assert_eq!(responses[2].data.as_ref().unwrap()["outcome"], "dragged");
    assert_eq!(responses[3].data.as_ref().unwrap()["outcome"], "placed");
    assert!(responses[5].data.as_ref().unwrap()["placed"].is_null());
}

#[test]
fn test_command_hint_follows_language() {
    let mut h = PlacementHarness::new();
    h.set_language(Lang::En);
    let data = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap().data.unwrap();
    assert_eq!(data["hint"], "Click a cell to place the object");
}

#[test]
fn test_command_batch_rejects_malformed_array() {
    let mut h = PlacementHarness::new();
    assert!(execute_json_batch(&mut h, r#"[{"command": "rotate"}, {"x": 1}]"#).is_err());
}
