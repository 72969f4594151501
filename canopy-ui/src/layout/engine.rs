use canopy_types::{
    DisplayType, LayoutConstraints, LayoutContext, LayoutDirection, LayoutMetrics, Point, Rect,
    Size,
};

use super::{LayoutEngine, LayoutOutput, LayoutStyle, StackDirection};
use crate::error::LayoutError;
use crate::shadow::{ShadowNode, ShadowNodeTraits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

impl StackDirection {
    fn main_axis(self) -> Axis {
        match self {
            StackDirection::Column => Axis::Vertical,
            StackDirection::Row => Axis::Horizontal,
        }
    }
}

/// Stacks children along a column or a row inside the parent's padded box.
///
/// Explicit `width`/`height` win; otherwise a child stretches across the
/// cross axis and takes its content extent along the main axis. The root
/// fills the maximum constraint when it is finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackLayout;

impl StackLayout {
    pub fn new() -> Self {
        Self
    }

    fn style(node: &ShadowNode) -> Result<LayoutStyle, LayoutError> {
        let style = node.props().layout_style();
        for (name, value) in [("width", style.width), ("height", style.height)] {
            if value.is_some_and(|value| !value.is_finite() || value < 0.0) {
                return Err(LayoutError::Engine {
                    tag: node.tag(),
                    message: format!("{name} must be a finite, non-negative number"),
                });
            }
        }
        if !style.padding.is_finite() {
            return Err(LayoutError::Engine {
                tag: node.tag(),
                message: "padding must be finite".to_string(),
            });
        }
        Ok(style)
    }

    fn is_leaf(node: &ShadowNode) -> bool {
        node.traits().contains(ShadowNodeTraits::LEAF_YOGA_NODE)
    }

    /// Size `node` wants along `axis` when nothing else decides it.
    fn extent(node: &ShadowNode, style: &LayoutStyle, axis: Axis) -> Result<f32, LayoutError> {
        let explicit = match axis {
            Axis::Horizontal => style.width,
            Axis::Vertical => style.height,
        };
        if let Some(value) = explicit {
            return Ok(value);
        }
        if style.display == DisplayType::None {
            return Ok(0.0);
        }

        let mut content: f32 = 0.0;
        if !Self::is_leaf(node) {
            for child in node.children() {
                let child_style = Self::style(child)?;
                if child_style.display == DisplayType::None {
                    continue;
                }
                let child_extent = Self::extent(child, &child_style, axis)?;
                if style.direction.main_axis() == axis {
                    content += child_extent;
                } else {
                    content = content.max(child_extent);
                }
            }
        }
        Ok(content + style.padding * 2.0)
    }

    fn layout_node(
        node: &ShadowNode,
        style: &LayoutStyle,
        frame: Rect,
        direction: LayoutDirection,
        context: &LayoutContext,
    ) -> Result<LayoutOutput, LayoutError> {
        let metrics = LayoutMetrics {
            frame: Self::round_to_pixels(frame, context.point_scale_factor),
            display_type: style.display,
            layout_direction: direction,
            point_scale_factor: context.point_scale_factor,
        };

        if style.display == DisplayType::None || Self::is_leaf(node) {
            return Ok(LayoutOutput {
                metrics,
                children: node
                    .children()
                    .iter()
                    .map(|child| Self::collapsed(child, context))
                    .collect(),
            });
        }

        let content = Rect::new(
            style.padding,
            style.padding,
            (frame.size.width - style.padding * 2.0).max(0.0),
            (frame.size.height - style.padding * 2.0).max(0.0),
        );

        let mut cursor = 0.0;
        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let child_style = Self::style(child)?;
            if child_style.display == DisplayType::None {
                children.push(Self::collapsed(child, context));
                continue;
            }

            let child_frame = match style.direction {
                StackDirection::Column => {
                    let height = Self::extent(child, &child_style, Axis::Vertical)?;
                    let width = child_style.width.unwrap_or(content.size.width);
                    let origin = Point::new(content.origin.x, content.origin.y + cursor);
                    cursor += height;
                    Rect {
                        origin,
                        size: Size::new(width, height),
                    }
                }
                StackDirection::Row => {
                    let width = Self::extent(child, &child_style, Axis::Horizontal)?;
                    let height = child_style.height.unwrap_or(content.size.height);
                    let origin = Point::new(content.origin.x + cursor, content.origin.y);
                    cursor += width;
                    Rect {
                        origin,
                        size: Size::new(width, height),
                    }
                }
            };

            children.push(Self::layout_node(
                child,
                &child_style,
                child_frame,
                direction,
                context,
            )?);
        }

        Ok(LayoutOutput { metrics, children })
    }

    fn collapsed(node: &ShadowNode, context: &LayoutContext) -> LayoutOutput {
        LayoutOutput {
            metrics: LayoutMetrics {
                frame: Rect::default(),
                display_type: DisplayType::None,
                layout_direction: LayoutDirection::Undefined,
                point_scale_factor: context.point_scale_factor,
            },
            children: node
                .children()
                .iter()
                .map(|child| Self::collapsed(child, context))
                .collect(),
        }
    }

    fn round_to_pixels(frame: Rect, scale: f32) -> Rect {
        if scale <= 0.0 || !scale.is_finite() {
            return frame;
        }
        let round = |value: f32| (value * scale).round() / scale;
        Rect::new(
            round(frame.origin.x),
            round(frame.origin.y),
            round(frame.size.width),
            round(frame.size.height),
        )
    }
}

impl LayoutEngine for StackLayout {
    fn layout(
        &self,
        root: &ShadowNode,
        constraints: &LayoutConstraints,
        context: &LayoutContext,
    ) -> Result<LayoutOutput, LayoutError> {
        if !constraints.is_valid() {
            return Err(LayoutError::InvalidConstraints(format!(
                "minimum {:?} does not fit inside maximum {:?}",
                constraints.minimum_size, constraints.maximum_size
            )));
        }

        let style = Self::style(root)?;
        let fill = |explicit: Option<f32>, maximum: f32, axis: Axis| match explicit {
            Some(value) => Ok(value),
            None if maximum.is_finite() => Ok(maximum),
            None => Self::extent(root, &style, axis),
        };
        let size = Size::new(
            fill(style.width, constraints.maximum_size.width, Axis::Horizontal)?,
            fill(style.height, constraints.maximum_size.height, Axis::Vertical)?,
        );
        let frame = Rect {
            origin: Point::ZERO,
            size: constraints.clamp(size),
        };

        Self::layout_node(root, &style, frame, constraints.layout_direction, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventEmitter;
    use crate::shadow::{
        ComponentDescriptor, RawProps, ShadowNodeFamily, ShadowNodePtr, ViewComponentDescriptor,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn node(tag: i32, props: Value, children: Vec<ShadowNodePtr>) -> ShadowNodePtr {
        let descriptor: Arc<dyn ComponentDescriptor> = Arc::new(ViewComponentDescriptor::new("View"));
        let raw: RawProps = serde_json::from_value(props).unwrap();
        let props = descriptor.clone_props(None, &raw).unwrap();
        let family = ShadowNodeFamily::new(tag, 1, Arc::new(EventEmitter::detached(tag)), descriptor);
        Arc::new(ShadowNode::new(family, props, None, children))
    }

    fn frames(output: &LayoutOutput) -> Vec<Rect> {
        let mut out = vec![output.metrics.frame];
        for child in &output.children {
            out.extend(frames(child));
        }
        out
    }

    #[test]
    fn test_column_stacks_children() {
        let root = node(
            1,
            json!({}),
            vec![
                node(2, json!({ "height": 20 }), vec![]),
                node(3, json!({ "height": 30, "width": 50 }), vec![]),
            ],
        );
        let constraints = LayoutConstraints::exact(Size::new(100.0, 200.0));
        let output = StackLayout
            .layout(&root, &constraints, &LayoutContext::default())
            .unwrap();

        assert_eq!(
            frames(&output),
            vec![
                Rect::new(0.0, 0.0, 100.0, 200.0),
                Rect::new(0.0, 0.0, 100.0, 20.0),
                Rect::new(0.0, 20.0, 50.0, 30.0),
            ]
        );
    }

    #[test]
    fn test_row_with_padding_and_auto_width() {
        let root = node(
            1,
            json!({ "flexDirection": "row", "padding": 5 }),
            vec![
                node(2, json!({ "width": 10 }), vec![]),
                node(
                    3,
                    json!({ "flexDirection": "row" }),
                    vec![
                        node(4, json!({ "width": 7 }), vec![]),
                        node(5, json!({ "width": 8 }), vec![]),
                    ],
                ),
            ],
        );
        let constraints = LayoutConstraints::exact(Size::new(100.0, 40.0));
        let output = StackLayout
            .layout(&root, &constraints, &LayoutContext::default())
            .unwrap();

        assert_eq!(output.children[0].metrics.frame, Rect::new(5.0, 5.0, 10.0, 30.0));
        assert_eq!(output.children[1].metrics.frame, Rect::new(15.0, 5.0, 15.0, 30.0));
        assert_eq!(
            output.children[1].children[1].metrics.frame,
            Rect::new(7.0, 0.0, 8.0, 30.0)
        );
    }

    #[test]
    fn test_hidden_children_collapse() {
        let root = node(
            1,
            json!({}),
            vec![
                node(2, json!({ "height": 10, "display": "none" }), vec![node(4, json!({}), vec![])]),
                node(3, json!({ "height": 10 }), vec![]),
            ],
        );
        let constraints = LayoutConstraints::exact(Size::new(50.0, 50.0));
        let output = StackLayout
            .layout(&root, &constraints, &LayoutContext::default())
            .unwrap();

        assert_eq!(output.children[0].metrics.display_type, DisplayType::None);
        assert_eq!(output.children[0].metrics.frame, Rect::default());
        assert_eq!(output.children[0].children.len(), 1);
        assert_eq!(output.children[1].metrics.frame, Rect::new(0.0, 0.0, 50.0, 10.0));
    }

    #[test]
    fn test_unbounded_root_takes_content_size() {
        let root = node(
            1,
            json!({ "width": 30 }),
            vec![node(2, json!({ "height": 12 }), vec![]), node(3, json!({ "height": 3 }), vec![])],
        );
        let output = StackLayout
            .layout(&root, &LayoutConstraints::default(), &LayoutContext::default())
            .unwrap();
        assert_eq!(output.metrics.frame, Rect::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn test_frames_snap_to_pixel_grid() {
        let root = node(1, json!({}), vec![node(2, json!({ "height": 10.3 }), vec![])]);
        let context = LayoutContext {
            point_scale_factor: 2.0,
            ..LayoutContext::default()
        };
        let constraints = LayoutConstraints::exact(Size::new(10.0, 10.0));
        let output = StackLayout.layout(&root, &constraints, &context).unwrap();
        assert_eq!(output.children[0].metrics.frame.size.height, 10.5);
        assert_eq!(output.children[0].metrics.point_scale_factor, 2.0);
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        let root = node(1, json!({}), vec![node(2, json!({ "width": 1e39 }), vec![])]);
        let constraints = LayoutConstraints::exact(Size::new(10.0, 10.0));
        let error = StackLayout
            .layout(&root, &constraints, &LayoutContext::default())
            .unwrap_err();
        assert!(matches!(error, LayoutError::Engine { tag: 2, .. }));

        let inverted = LayoutConstraints::new(Size::new(10.0, 10.0), Size::new(1.0, 1.0));
        let error = StackLayout
            .layout(&root, &inverted, &LayoutContext::default())
            .unwrap_err();
        assert!(matches!(error, LayoutError::InvalidConstraints(_)));
    }
}
