//! JSON command protocol for scripted sessions.
//!
//! Each command maps onto one harness call; responses carry a success
//! flag plus optional error text or data.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use shared::{PoleId, SceneRecord};

use crate::error::Result;
use crate::geometry::Ray;
use crate::harness::TestHarness;
use crate::tools::{ClickOutcome, Key, PointerInput, PoleHit, ToolKind};

/// Camera ray as plain arrays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaySample {
    pub origin: [f64; 3],
    pub direction: [f64; 3],
}

/// Hovered pole surface as plain arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverSample {
    pub pole_id: PoleId,
    pub point: [f64; 3],
    pub normal: [f64; 3],
}

/// Pointer sample in wire form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray: Option<RaySample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<HoverSample>,
}

impl From<PointerSample> for PointerInput {
    fn from(sample: PointerSample) -> Self {
        Self {
            ground: sample.ground.map(DVec3::from_array),
            ray: sample
                .ray
                .map(|r| Ray::new(DVec3::from_array(r.origin), DVec3::from_array(r.direction))),
            hover: sample.hover.map(|h| PoleHit {
                pole_id: h.pole_id,
                point: DVec3::from_array(h.point),
                normal: DVec3::from_array(h.normal),
            }),
        }
    }
}

/// A command a script can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AgentCommand {
    /// Activate a placement tool
    SelectTool { tool: ToolKind },
    PointerMove {
        #[serde(default)]
        pointer: PointerSample,
    },
    LeftClick {
        #[serde(default)]
        pointer: PointerSample,
    },
    RightClick,
    Key { key: Key },
    /// Undo the last operation.
    Undo,
    /// Redo the last undone operation.
    Redo,
    /// Clear the inventory.
    Clear,
    /// List committed poles and lashings plus the active tool.
    Inspect,
    /// Export the scene as JSON.
    ExportScene,
    /// Replace the scene.
    LoadScene { scene: SceneRecord },
    /// Remove poles and every lashing bound to them.
    DeletePoles { ids: Vec<PoleId> },
    TranslatePole { id: PoleId, delta: [f64; 3] },
    ResizePole {
        id: PoleId,
        #[serde(default = "default_at_top")]
        at_top: bool,
        length: f64,
    },
}

fn default_at_top() -> bool {
    true
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

fn click_data(outcome: &ClickOutcome) -> serde_json::Value {
    match outcome {
        ClickOutcome::Advanced(state) => serde_json::json!({ "outcome": "advanced", "state": state }),
        ClickOutcome::Committed { poles, lashings } => {
            serde_json::json!({ "outcome": "committed", "poles": poles, "lashings": lashings })
        }
        ClickOutcome::Rejected => serde_json::json!({ "outcome": "rejected" }),
    }
}

fn inspect(harness: &TestHarness) -> serde_json::Value {
    let poles: Vec<serde_json::Value> = harness
        .inventory
        .poles()
        .iter()
        .map(|pole| {
            serde_json::json!({
                "id": pole.id(),
                "position": pole.position().to_array(),
                "direction": pole.direction().to_array(),
                "length": pole.length(),
            })
        })
        .collect();
    let lashings: Vec<serde_json::Value> = harness
        .inventory
        .lashings()
        .iter()
        .map(|lashing| {
            serde_json::json!({
                "id": lashing.id(),
                "kind": lashing.kind(),
                "poles": lashing.pole_ids(),
                "center": lashing.center().to_array(),
                "threatened": lashing.is_threatened(),
            })
        })
        .collect();
    serde_json::json!({
        "pole_count": poles.len(),
        "lashing_count": lashings.len(),
        "poles": poles,
        "lashings": lashings,
        "tool": harness.tool_kind(),
        "state": harness.tool_state(),
        "preview_poles": harness.preview_pole_count(),
        "colliding": harness.colliding_poles(),
        "blocked": harness.is_blocked(),
    })
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: AgentCommand) -> CommandResponse {
    match cmd {
        AgentCommand::SelectTool { tool } => {
            harness.select_tool(tool);
            CommandResponse::ok_with_data(serde_json::json!({ "tool": tool }))
        }

        AgentCommand::PointerMove { pointer } => {
            harness.pointer_move(&pointer.into());
            CommandResponse::ok_with_data(serde_json::json!({
                "preview_poles": harness.preview_pole_count(),
                "preview_lashings": harness.preview_lashing_count(),
                "colliding": harness.colliding_poles(),
            }))
        }

        AgentCommand::LeftClick { pointer } => {
            if harness.tool_kind().is_none() {
                return CommandResponse::err("no tool selected");
            }
            let outcome = harness.left_click(&pointer.into());
            CommandResponse::ok_with_data(click_data(&outcome))
        }

        AgentCommand::RightClick => {
            harness.right_click();
            CommandResponse::ok_with_data(serde_json::json!({ "state": harness.tool_state() }))
        }

        AgentCommand::Key { key } => {
            harness.key(key);
            CommandResponse::ok_with_data(serde_json::json!({ "state": harness.tool_state() }))
        }

        AgentCommand::Undo => {
            let success = harness.undo();
            CommandResponse::ok_with_data(serde_json::json!({ "undone": success }))
        }

        AgentCommand::Redo => {
            let success = harness.redo();
            CommandResponse::ok_with_data(serde_json::json!({ "redone": success }))
        }

        AgentCommand::Clear => {
            harness.clear();
            CommandResponse::ok()
        }

        AgentCommand::Inspect => CommandResponse::ok_with_data(inspect(harness)),

        AgentCommand::ExportScene => match harness.export_scene_json() {
            Ok(json) => CommandResponse::ok_with_data(serde_json::json!({ "scene_json": json })),
            Err(e) => CommandResponse::err(e.to_string()),
        },

        AgentCommand::LoadScene { scene } => {
            let report = harness.load_scene(&scene);
            CommandResponse::ok_with_data(serde_json::json!({
                "poles": report.poles,
                "lashings": report.lashings,
                "skipped_poles": report.skipped_poles,
                "skipped_lashings": report.skipped_lashings,
            }))
        }

        AgentCommand::DeletePoles { ids } => {
            let removed = harness.delete_poles(&ids);
            CommandResponse::ok_with_data(serde_json::json!({
                "poles": removed.poles,
                "lashings": removed.lashings,
            }))
        }

        AgentCommand::TranslatePole { id, delta } => {
            match harness.translate_pole(&id, DVec3::from_array(delta)) {
                Ok(()) => CommandResponse::ok(),
                Err(e) => CommandResponse::err(e.to_string()),
            }
        }

        AgentCommand::ResizePole { id, at_top, length } => match harness.resize_pole(&id, at_top, length) {
            Ok(()) => {
                let length = harness.inventory.pole(&id).map(|p| p.length());
                CommandResponse::ok_with_data(serde_json::json!({ "length": length }))
            }
            Err(e) => CommandResponse::err(e.to_string()),
        },
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse> {
    let cmd: AgentCommand = serde_json::from_str(json)?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(harness: &mut TestHarness, json: &str) -> Result<Vec<CommandResponse>> {
    let cmds: Vec<AgentCommand> = serde_json::from_str(json)?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(harness, cmd))
        .collect())
}
