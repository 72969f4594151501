use std::fmt;
use std::sync::Arc;

use canopy_types::{SurfaceId, Tag};

use super::descriptor::ComponentDescriptor;
use super::props::{ComponentHandle, ComponentName};
use super::state::{SharedState, StateCoordinator};
use crate::events::EventEmitter;

/// Identity shared by every revision of one logical component instance.
///
/// Nodes hold their family strongly; states point back to it weakly.
pub struct ShadowNodeFamily {
    tag: Tag,
    surface_id: SurfaceId,
    event_emitter: Arc<EventEmitter>,
    descriptor: Arc<dyn ComponentDescriptor>,
    state_coordinator: StateCoordinator,
}

impl ShadowNodeFamily {
    pub fn new(
        tag: Tag,
        surface_id: SurfaceId,
        event_emitter: Arc<EventEmitter>,
        descriptor: Arc<dyn ComponentDescriptor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            tag,
            surface_id,
            event_emitter,
            descriptor,
            state_coordinator: StateCoordinator::new(),
        })
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn event_emitter(&self) -> &Arc<EventEmitter> {
        &self.event_emitter
    }

    pub fn component_descriptor(&self) -> &Arc<dyn ComponentDescriptor> {
        &self.descriptor
    }

    pub fn component_name(&self) -> &ComponentName {
        self.descriptor.component_name()
    }

    pub fn component_handle(&self) -> ComponentHandle {
        self.descriptor.component_handle()
    }

    pub fn state_coordinator(&self) -> &StateCoordinator {
        &self.state_coordinator
    }

    /// The newest state that has been part of a committed revision.
    pub fn most_recent_state(&self) -> Option<SharedState> {
        self.state_coordinator.most_recent()
    }
}

impl fmt::Debug for ShadowNodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNodeFamily")
            .field("tag", &self.tag)
            .field("surface_id", &self.surface_id)
            .field("component", &self.descriptor.component_name())
            .finish()
    }
}
