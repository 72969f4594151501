use crate::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    #[default]
    Undefined,
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    None,
    #[default]
    Flex,
}

/// Output of layout for one node, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub frame: Rect,
    pub display_type: DisplayType,
    pub layout_direction: LayoutDirection,
    pub point_scale_factor: f32,
}

impl LayoutMetrics {
    pub fn with_frame(frame: Rect) -> Self {
        Self {
            frame,
            display_type: DisplayType::Flex,
            layout_direction: LayoutDirection::Undefined,
            point_scale_factor: 1.0,
        }
    }
}

/// Size bounds the root of a surface must be laid out within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConstraints {
    pub minimum_size: Size,
    pub maximum_size: Size,
    pub layout_direction: LayoutDirection,
}

impl LayoutConstraints {
    pub fn new(minimum_size: Size, maximum_size: Size) -> Self {
        Self {
            minimum_size,
            maximum_size,
            layout_direction: LayoutDirection::Undefined,
        }
    }

    /// Constraints that pin the root to exactly `size`.
    pub fn exact(size: Size) -> Self {
        Self::new(size, size)
    }

    pub fn clamp(&self, size: Size) -> Size {
        Size {
            width: size
                .width
                .max(self.minimum_size.width)
                .min(self.maximum_size.width),
            height: size
                .height
                .max(self.minimum_size.height)
                .min(self.maximum_size.height),
        }
    }

    pub fn is_valid(&self) -> bool {
        let Size { width, height } = self.minimum_size;
        !width.is_nan()
            && !height.is_nan()
            && width >= 0.0
            && height >= 0.0
            && self.maximum_size.width >= width
            && self.maximum_size.height >= height
    }
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self::new(Size::ZERO, Size::infinite())
    }
}

/// Environment-wide inputs to layout that are not part of any node's style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutContext {
    pub point_scale_factor: f32,
    pub font_size_multiplier: f32,
    pub swap_left_and_right_in_rtl: bool,
    pub viewport_offset: Point,
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self {
            point_scale_factor: 1.0,
            font_size_multiplier: 1.0,
            swap_left_and_right_in_rtl: false,
            viewport_offset: Point::ZERO,
        }
    }
}
