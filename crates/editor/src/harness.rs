//! Headless harness for driving the editor programmatically.
//!
//! Owns the settings, the inventory and the active tool, and forwards
//! pointer/key events the way an interactive front end would.

use std::sync::Arc;

use glam::DVec3;
use shared::{PoleId, SceneRecord};

use crate::error::Result;
use crate::geometry::Ray;
use crate::state::{EditorSettings, Inventory, LoadReport, Removed};
use crate::tools::{create_tool, ClickOutcome, Key, PlacementState, PointerInput, Tool, ToolKind};

/// Headless editor session: settings, inventory and the active tool
pub struct TestHarness {
    pub settings: Arc<EditorSettings>,
    pub inventory: Inventory,
    tool: Option<Box<dyn Tool>>,
    last_input: PointerInput,
}

impl TestHarness {
    /// Create a new empty harness with default settings.
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::default())
    }

    pub fn with_settings(settings: EditorSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            inventory: Inventory::new(),
            tool: None,
            last_input: PointerInput::default(),
        }
    }

    // ── Tools ─────────────────────────────────────────────────

    /// Activate a tool, deactivating the previous one
    pub fn select_tool(&mut self, kind: ToolKind) {
        if let Some(previous) = self.tool.as_mut() {
            previous.deactivate();
        }
        tracing::debug!(tool = ?kind, "tool selected");
        self.tool = Some(create_tool(kind, Arc::clone(&self.settings)));
    }

    pub fn deselect_tool(&mut self) {
        if let Some(mut previous) = self.tool.take() {
            previous.deactivate();
        }
    }

    pub fn tool(&self) -> Option<&dyn Tool> {
        self.tool.as_deref()
    }

    pub fn tool_kind(&self) -> Option<ToolKind> {
        self.tool.as_ref().map(|t| t.kind())
    }

    pub fn tool_state(&self) -> Option<PlacementState> {
        self.tool.as_ref().map(|t| t.state())
    }

    // ── Events ────────────────────────────────────────────────

    pub fn pointer_move(&mut self, input: &PointerInput) {
        self.last_input = input.clone();
        if let Some(tool) = self.tool.as_mut() {
            tool.on_pointer_move(input, &self.inventory);
        }
    }

    /// Forward a left click; `Rejected` without an active tool
    pub fn left_click(&mut self, input: &PointerInput) -> ClickOutcome {
        self.last_input = input.clone();
        match self.tool.as_mut() {
            Some(tool) => tool.on_left_click(input, &mut self.inventory),
            None => ClickOutcome::Rejected,
        }
    }

    pub fn right_click(&mut self) {
        if let Some(tool) = self.tool.as_mut() {
            tool.on_right_click(&self.inventory);
        }
    }

    pub fn key(&mut self, key: Key) {
        if let Some(tool) = self.tool.as_mut() {
            tool.on_key(key, &self.inventory);
        }
    }

    /// Move the cursor onto the ground at (x, z)
    pub fn move_ground(&mut self, x: f64, z: f64) {
        self.pointer_move(&PointerInput::at_ground(DVec3::new(x, 0.0, z)));
    }

    /// Click the ground at (x, z)
    pub fn click_ground(&mut self, x: f64, z: f64) -> ClickOutcome {
        self.left_click(&PointerInput::at_ground(DVec3::new(x, 0.0, z)))
    }

    /// Point the camera ray horizontally through (x, height, z)
    pub fn move_ray_at_height(&mut self, x: f64, height: f64, z: f64) {
        let ray = Ray::new(DVec3::new(x, height, z + 10.0), -DVec3::Z);
        self.pointer_move(&PointerInput::default().with_ray(ray));
    }

    /// Re-run the active tool against the last pointer sample, after the
    /// inventory changed underneath it
    fn refresh_tool(&mut self) {
        let input = self.last_input.clone();
        if let Some(tool) = self.tool.as_mut() {
            tool.on_pointer_move(&input, &self.inventory);
        }
    }

    // ── Inventory ─────────────────────────────────────────────

    /// Undo the last operation
    pub fn undo(&mut self) -> bool {
        if !self.inventory.can_undo() {
            return false;
        }
        self.inventory.undo();
        self.refresh_tool();
        true
    }

    /// Redo the last undone operation
    pub fn redo(&mut self) -> bool {
        if !self.inventory.can_redo() {
            return false;
        }
        self.inventory.redo();
        self.refresh_tool();
        true
    }

    /// Clear the inventory and drop any in-progress placement
    pub fn clear(&mut self) {
        self.inventory.clear();
        if let Some(tool) = self.tool.as_mut() {
            tool.deactivate();
        }
    }

    pub fn delete_poles(&mut self, ids: &[PoleId]) -> Removed {
        let removed = self.inventory.remove_poles(ids);
        self.refresh_tool();
        removed
    }

    pub fn translate_pole(&mut self, id: &str, delta: DVec3) -> Result<()> {
        self.inventory.translate_pole(id, delta)?;
        self.refresh_tool();
        Ok(())
    }

    pub fn resize_pole(&mut self, id: &str, resize_at_top: bool, minimum_length: f64) -> Result<()> {
        self.inventory
            .resize_pole(id, resize_at_top, minimum_length, &self.settings.catalog)?;
        self.refresh_tool();
        Ok(())
    }

    /// Load a scene (replaces current) and drop any in-progress placement
    pub fn load_scene(&mut self, scene: &SceneRecord) -> LoadReport {
        let report = self.inventory.load_record(scene, &self.settings.catalog);
        if let Some(tool) = self.tool.as_mut() {
            tool.deactivate();
        }
        report
    }

    /// Load a scene from JSON (replaces current)
    pub fn load_scene_json(&mut self, json: &str) -> Result<LoadReport> {
        let scene: SceneRecord = serde_json::from_str(json)?;
        Ok(self.load_scene(&scene))
    }

    /// Export the current scene as JSON
    pub fn export_scene_json(&self) -> Result<String> {
        self.inventory.export_json()
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn pole_count(&self) -> usize {
        self.inventory.poles().len()
    }

    pub fn lashing_count(&self) -> usize {
        self.inventory.lashings().len()
    }

    /// Poles in the active tool's preview
    pub fn preview_pole_count(&self) -> usize {
        self.tool.as_ref().map_or(0, |t| t.preview_poles().len())
    }

    pub fn preview_lashing_count(&self) -> usize {
        self.tool.as_ref().map_or(0, |t| t.preview_lashings().len())
    }

    pub fn colliding_poles(&self) -> Vec<PoleId> {
        self.tool
            .as_ref()
            .map(|t| t.colliding_poles().to_vec())
            .unwrap_or_default()
    }

    pub fn is_blocked(&self) -> bool {
        self.tool.as_ref().is_some_and(|t| t.is_blocked())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
