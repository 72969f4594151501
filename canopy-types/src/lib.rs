//! Identifiers, geometry and layout inputs shared by the canopy crates.

mod display;
mod geometry;
mod layout;

pub use display::DisplayMode;
pub use geometry::{Point, Rect, Size};
pub use layout::{DisplayType, LayoutConstraints, LayoutContext, LayoutDirection, LayoutMetrics};

/// Stable identity of one logical component instance across all of its revisions.
pub type Tag = i32;

/// Identifies one independently rendered UI root.
pub type SurfaceId = i32;

/// Tag value that is never handed out to a real component.
pub const NO_TAG: Tag = -1;
