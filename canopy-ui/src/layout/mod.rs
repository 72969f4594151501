mod engine;

pub use engine::StackLayout;

use std::fmt;

use canopy_types::{DisplayType, LayoutConstraints, LayoutContext, LayoutMetrics};
use serde_json::Value;

use crate::error::LayoutError;
use crate::shadow::ShadowNode;

/// Computes frames for a whole tree.
///
/// Implementations must be deterministic: identical trees, constraints and
/// context give identical output.
pub trait LayoutEngine: fmt::Debug + Send + Sync {
    fn layout(
        &self,
        root: &ShadowNode,
        constraints: &LayoutConstraints,
        context: &LayoutContext,
    ) -> Result<LayoutOutput, LayoutError>;
}

/// Per-node layout result, shaped exactly like the tree it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutput {
    pub metrics: LayoutMetrics,
    pub children: Vec<LayoutOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackDirection {
    #[default]
    Column,
    Row,
}

/// The style fields the layout engine reads from props.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutStyle {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub direction: StackDirection,
    pub padding: f32,
    pub display: DisplayType,
}

impl LayoutStyle {
    /// Reads `width`, `height`, `flexDirection`, `padding` and `display`.
    pub fn from_fields<'a, F>(field: F) -> Self
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        let number = |name: &str| field(name).and_then(Value::as_f64).map(|value| value as f32);
        let direction = match field("flexDirection").and_then(Value::as_str) {
            Some("row") => StackDirection::Row,
            _ => StackDirection::Column,
        };
        let display = match field("display").and_then(Value::as_str) {
            Some("none") => DisplayType::None,
            _ => DisplayType::Flex,
        };

        Self {
            width: number("width"),
            height: number("height"),
            direction,
            padding: number("padding").unwrap_or(0.0).max(0.0),
            display,
        }
    }
}
