use std::path::Path;

use anyhow::{Context, Result, bail};
use canopy_types::{DisplayMode, SurfaceId, Tag};
use canopy_ui::Element;
use serde::Deserialize;
use serde_json::Value;

/// A scripted session against one surface.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default = "default_surface")]
    pub surface_id: SurfaceId,
    pub width: f32,
    pub height: f32,
    pub steps: Vec<Step>,
}

fn default_surface() -> SurfaceId {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    /// Replace the surface content.
    Render { elements: Vec<Element> },
    /// Replace the state data of the node with `tag`.
    SetState { tag: Tag, state: Value },
    Resize { width: f32, height: f32 },
    DisplayMode { mode: DisplayMode },
    /// Raise an event on the node with `tag`.
    Event {
        tag: Tag,
        name: String,
        #[serde(default)]
        payload: Value,
    },
    Stop,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Render { .. } => "render",
            Step::SetState { .. } => "setState",
            Step::Resize { .. } => "resize",
            Step::DisplayMode { .. } => "displayMode",
            Step::Event { .. } => "event",
            Step::Stop => "stop",
        }
    }
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        let scene: Scene = serde_json::from_str(&source)
            .with_context(|| format!("failed to parse scene {}", path.display()))?;
        scene.validate()?;
        Ok(scene)
    }

    fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.height.is_finite()) || self.width < 0.0 || self.height < 0.0 {
            bail!("scene size must be finite and non-negative");
        }
        if let Some(position) = self.steps.iter().position(|step| matches!(step, Step::Stop)) {
            if position + 1 != self.steps.len() {
                bail!("`stop` must be the last step");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene() {
        let scene: Scene = serde_json::from_str(
            r#"{
                "width": 320,
                "height": 480,
                "steps": [
                    { "op": "render", "elements": [{ "component": "Text", "tag": 10, "props": { "text": "Hi" } }] },
                    { "op": "setState", "tag": 10, "state": { "offset": 3 } },
                    { "op": "displayMode", "mode": "hidden" },
                    { "op": "event", "tag": 10, "name": "press" },
                    { "op": "stop" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scene.surface_id, 1);
        assert_eq!(scene.steps.len(), 5);
        assert!(matches!(scene.steps[2], Step::DisplayMode { mode: DisplayMode::Hidden }));
        assert!(matches!(&scene.steps[3], Step::Event { payload: Value::Null, .. }));
        scene.validate().unwrap();
    }

    #[test]
    fn test_stop_must_be_last() {
        let scene: Scene = serde_json::from_str(
            r#"{ "width": 1, "height": 1, "steps": [{ "op": "stop" }, { "op": "resize", "width": 2, "height": 2 }] }"#,
        )
        .unwrap();

        assert!(scene.validate().is_err());
    }
}
