//! Shadow tree and commit pipeline.
//!
//! A surface's UI is described by an immutable tree of [`ShadowNode`]s. Each
//! [`ShadowTree::commit`] produces a new [`ShadowTreeRevision`]; the
//! [`MountingCoordinator`] turns successive revisions into ordered
//! [`ShadowViewMutation`] lists that a host view layer pulls and applies.

pub mod error;
pub mod events;
pub mod layout;
pub mod mounting;
pub mod scheduler;
pub mod shadow;
pub mod tree;
pub mod ui_manager;

pub use crate::shadow::{
    ComponentDescriptor, ComponentDescriptorRegistry, ComponentHandle, ComponentName,
    ContextContainer, DynamicProps, Element, Props, RawProps, ShadowNode, ShadowNodeFamily,
    ShadowNodeFragment, ShadowNodePtr, ShadowNodeTraits, SharedProps, SharedState, State,
    StateCoordinator, StateUpdate, ViewComponentDescriptor,
};
pub use error::{BoxError, CommitError, LayoutError, SchedulerError};
pub use events::{EventDispatcher, EventEmitter, RawEvent};
pub use layout::{LayoutEngine, LayoutStyle, StackDirection, StackLayout};
pub use mounting::{
    HostViewLayer, MountingCoordinator, MountingTransaction, ShadowView, ShadowViewMutation,
    StubViewError, StubViewTree, SurfaceTelemetry, TransactionTelemetry,
    calculate_shadow_view_mutations,
};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerDelegate, SchedulerToolbox};
pub use tree::{
    CommitOptions, CommitStatus, RootShadowNode, ShadowTree, ShadowTreeDelegate,
    ShadowTreeRegistry, ShadowTreeRevision, UiManagerCommitHook,
};
pub use ui_manager::{UiManager, UiManagerDelegate};

pub use canopy_types::{
    DisplayMode, LayoutConstraints, LayoutContext, LayoutMetrics, Point, Rect, Size, SurfaceId,
    Tag,
};
