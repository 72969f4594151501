use std::fmt;
use std::sync::Arc;

use canopy_types::{LayoutMetrics, SurfaceId, Tag};

use crate::events::EventEmitter;
use crate::shadow::{
    ComponentHandle, ComponentName, ShadowNode, ShadowNodeTraits, SharedProps, SharedState,
};

/// The display-relevant part of a shadow node, as the host sees it.
#[derive(Clone)]
pub struct ShadowView {
    pub component_name: ComponentName,
    pub component_handle: ComponentHandle,
    pub surface_id: SurfaceId,
    pub tag: Tag,
    pub traits: ShadowNodeTraits,
    pub props: SharedProps,
    pub event_emitter: Arc<EventEmitter>,
    pub layout_metrics: LayoutMetrics,
    pub state: Option<SharedState>,
}

impl ShadowView {
    pub fn new(node: &ShadowNode) -> Self {
        Self {
            component_name: node.component_name().clone(),
            component_handle: node.component_handle(),
            surface_id: node.surface_id(),
            tag: node.tag(),
            traits: node.traits(),
            props: node.props().clone(),
            event_emitter: node.event_emitter().clone(),
            layout_metrics: node.layout_metrics(),
            state: node.state().cloned(),
        }
    }
}

impl From<&ShadowNode> for ShadowView {
    fn from(node: &ShadowNode) -> Self {
        Self::new(node)
    }
}

/// Props compare by identity first, then by value. Emitters and states
/// compare by identity only.
impl PartialEq for ShadowView {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.surface_id == other.surface_id
            && self.component_handle == other.component_handle
            && self.layout_metrics == other.layout_metrics
            && Arc::ptr_eq(&self.event_emitter, &other.event_emitter)
            && match (&self.state, &other.state) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
            && (Arc::ptr_eq(&self.props, &other.props) || self.props.props_eq(other.props.as_ref()))
    }
}

impl fmt::Debug for ShadowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowView")
            .field("component", &self.component_name)
            .field("tag", &self.tag)
            .field("props", &self.props)
            .field("frame", &self.layout_metrics.frame)
            .field("state_revision", &self.state.as_ref().map(|state| state.revision()))
            .finish()
    }
}
