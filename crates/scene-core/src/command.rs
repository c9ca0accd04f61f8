//! JSON command protocol for driving a placement session headlessly.

use serde::{Deserialize, Serialize};
use shared::BuildingObject;

use crate::harness::PlacementHarness;
use crate::placement::PointerUpOutcome;
use crate::rotation::rad_to_deg;

/// A command an agent or test script can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AgentCommand {
    /// Start a new placement session for an object
    LoadObject { object: BuildingObject },
    /// Press at a screen position
    PointerDown { x: f64, y: f64 },
    /// Move the pointer; updates hover and drag detection
    PointerMove { x: f64, y: f64 },
    /// Pointer left the viewport
    PointerLeave,
    /// Release at a screen position
    PointerUp { x: f64, y: f64 },
    /// Press and release at one screen position
    Click { x: f64, y: f64 },
    /// Turn the placed object by 90°
    Rotate,
    /// Clear hover, placement and rotation
    Reset,
    /// Report the session state
    Inspect,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

fn release_response(harness: &PlacementHarness, outcome: PointerUpOutcome) -> CommandResponse {
    let mut data = serde_json::to_value(outcome).unwrap_or_default();
    if outcome == PointerUpOutcome::OutOfBounds {
        data["message"] = harness.message("place.out_of_bounds").into();
    }
    CommandResponse::ok_with_data(data)
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut PlacementHarness, cmd: AgentCommand) -> CommandResponse {
    match cmd {
        AgentCommand::LoadObject { object } => match harness.load_object(object) {
            Ok(()) => CommandResponse::ok_with_data(serde_json::json!({
                "part_count": harness.object().parts.len(),
                "footprint": harness.hover_footprint().as_array(),
            })),
            Err(e) => CommandResponse::err(e.to_string()),
        },

        AgentCommand::PointerDown { x, y } => {
            harness.pointer_down(x, y);
            CommandResponse::ok()
        }

        AgentCommand::PointerMove { x, y } => {
            let hover = harness.pointer_move(x, y);
            CommandResponse::ok_with_data(serde_json::json!({ "hover_cell": hover }))
        }

        AgentCommand::PointerLeave => {
            harness.pointer_leave();
            CommandResponse::ok()
        }

        AgentCommand::PointerUp { x, y } => {
            let outcome = harness.pointer_up(x, y);
            release_response(harness, outcome)
        }

        AgentCommand::Click { x, y } => {
            let outcome = harness.click(x, y);
            release_response(harness, outcome)
        }

        AgentCommand::Rotate => match harness.rotate() {
            Some(yaw) => CommandResponse::ok_with_data(serde_json::json!({
                "rotation_degrees": rad_to_deg(yaw).round(),
                "footprint": harness.hover_footprint().as_array(),
            })),
            None => CommandResponse::err("Nothing placed to rotate"),
        },

        AgentCommand::Reset => {
            harness.reset();
            CommandResponse::ok()
        }

        AgentCommand::Inspect => {
            let state = harness.state();
            let placed = state.placed_object.as_ref().map(|p| p.position());
            CommandResponse::ok_with_data(serde_json::json!({
                "hover_cell": state.hover_cell.map(|c| [c.x, c.z]),
                "placed": placed,
                "rotation_degrees": rad_to_deg(state.rotation_y).round(),
                "footprint": harness.hover_footprint().as_array(),
                "record": harness.placement_record(),
                "hint": harness.hint(),
            }))
        }
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut PlacementHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: AgentCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut PlacementHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<AgentCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds.into_iter().map(|cmd| execute_command(harness, cmd)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_rotate() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"command": "rotate"}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::Rotate));
    }

    #[test]
    fn test_command_serde_pointer_move() {
        let json = r#"{"command": "pointer_move", "x": 12.5, "y": 40}"#;
        match serde_json::from_str(json).unwrap() {
            AgentCommand::PointerMove { x, y } => assert_eq!((x, y), (12.5, 40.0)),
            other => panic!("Expected PointerMove, got {other:?}"),
        }
    }

    #[test]
    fn test_command_serde_load_object() {
        let json = r#"{"command": "load_object", "object": {"parts": [
            {"type": "floor", "position": [0, 0, 0], "size": [2, 0.2, 2]}
        ]}}"#;
        match serde_json::from_str(json).unwrap() {
            AgentCommand::LoadObject { object } => assert_eq!(object.parts[0].color, "#b0b0b0"),
            other => panic!("Expected LoadObject, got {other:?}"),
        }
    }

    #[test]
    fn test_execute_rotate_without_placement_fails() {
        let mut h = PlacementHarness::new();
        let resp = execute_json(&mut h, r#"{"command": "rotate"}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.error.is_some());
    }

    #[test]
    fn test_execute_click_outside_grid() {
        let mut h = PlacementHarness::new();
        // x = (780 - 400) / 20 = 19 world units, beyond the 10-unit grid
        let resp = execute_json(&mut h, r#"{"command": "click", "x": 780, "y": 300}"#).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data["outcome"], "out_of_bounds");
        assert!(data["message"].as_str().is_some());
        assert!(!h.is_placed());
    }

    #[test]
    fn test_execute_inspect_empty_session() {
        let mut h = PlacementHarness::new();
        let data = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap().data.unwrap();
        assert!(data["placed"].is_null());
        assert!(data["record"].is_null());
        assert_eq!(data["footprint"], serde_json::json!([4, 4]));
    }

    #[test]
    fn test_execute_pointer_leave_clears_hover() {
        let mut h = PlacementHarness::new();
        execute_json(&mut h, r#"{"command": "pointer_move", "x": 446, "y": 262}"#).unwrap();
        assert!(h.state().hover_cell.is_some());

        let resp = execute_json(&mut h, r#"{"command": "pointer_leave"}"#).unwrap();
        assert!(resp.success);
        let data = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap().data.unwrap();
        assert!(data["hover_cell"].is_null());
    }

    #[test]
    fn test_execute_invalid_json() {
        let mut h = PlacementHarness::new();
        assert!(execute_json(&mut h, "not valid json").is_err());
        assert!(execute_json(&mut h, r#"{"command": "fly"}"#).is_err());
    }
}
