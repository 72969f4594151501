use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use canopy_types::{LayoutConstraints, LayoutContext, SurfaceId, Tag};
use serde_json::Value;

use crate::error::{BoxError, LayoutError};
use crate::events::EventEmitter;
use crate::layout::{LayoutEngine, LayoutOutput};
use crate::shadow::{
    ComponentDescriptor, ComponentHandle, ComponentName, Props, RawProps, ShadowNode,
    ShadowNodeFamily, ShadowNodeFragment, ShadowNodePtr, ShadowNodeTraits, SharedProps,
};

pub const ROOT_COMPONENT_NAME: &str = "RootView";

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Props of a surface root: the layout inputs for the whole tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootProps {
    pub layout_constraints: LayoutConstraints,
    pub layout_context: LayoutContext,
}

impl Props for RootProps {
    fn component_handle(&self) -> ComponentHandle {
        ComponentHandle::from_name(ROOT_COMPONENT_NAME)
    }

    fn props_eq(&self, other: &dyn Props) -> bool {
        other
            .as_any()
            .downcast_ref::<RootProps>()
            .is_some_and(|other| self == other)
    }

    fn field(&self, _name: &str) -> Option<&Value> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Descriptor for surface roots; accepts `layoutConstraints` and `layoutContext`.
#[derive(Debug)]
pub struct RootComponentDescriptor {
    name: ComponentName,
}

impl RootComponentDescriptor {
    pub fn new() -> Self {
        Self {
            name: ComponentName::from(ROOT_COMPONENT_NAME),
        }
    }
}

impl Default for RootComponentDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentDescriptor for RootComponentDescriptor {
    fn component_name(&self) -> &ComponentName {
        &self.name
    }

    fn traits(&self) -> ShadowNodeTraits {
        ShadowNodeTraits::ROOT_NODE_KIND | ShadowNodeTraits::VIEW_KIND
    }

    fn clone_props(
        &self,
        base: Option<&SharedProps>,
        raw: &RawProps,
    ) -> Result<SharedProps, BoxError> {
        let mut props = base
            .and_then(|props| props.as_any().downcast_ref::<RootProps>())
            .cloned()
            .unwrap_or_default();
        if let Some(value) = raw.get("layoutConstraints") {
            props.layout_constraints = serde_json::from_value(value.clone())?;
        }
        if let Some(value) = raw.get("layoutContext") {
            props.layout_context = serde_json::from_value(value.clone())?;
        }
        Ok(Arc::new(props))
    }
}

/// Root of one surface's tree.
///
/// Held by value while a commit builds it, so layout can write frames into
/// it before it is shared. A generation number tracks whether the current
/// content has been laid out.
#[derive(Debug, Clone)]
pub struct RootShadowNode {
    node: ShadowNode,
    props: Arc<RootProps>,
    generation: u64,
    laid_out_generation: u64,
}

impl RootShadowNode {
    pub fn new(family: Arc<ShadowNodeFamily>, props: RootProps) -> Self {
        let props = Arc::new(props);
        let shared: SharedProps = props.clone();
        Self {
            node: ShadowNode::new(family, shared, None, Vec::new()),
            props,
            generation: next_generation(),
            laid_out_generation: 0,
        }
    }

    /// Empty root for `surface_id`; the root's tag equals the surface id.
    pub fn for_surface(
        surface_id: SurfaceId,
        constraints: LayoutConstraints,
        context: LayoutContext,
        event_emitter: Arc<EventEmitter>,
    ) -> Self {
        let family = ShadowNodeFamily::new(
            surface_id,
            surface_id,
            event_emitter,
            Arc::new(RootComponentDescriptor::new()),
        );
        Self::new(
            family,
            RootProps {
                layout_constraints: constraints,
                layout_context: context,
            },
        )
    }

    fn derive(&self, node: ShadowNode, props: Arc<RootProps>) -> Self {
        Self {
            node,
            props,
            generation: next_generation(),
            laid_out_generation: 0,
        }
    }

    pub fn node(&self) -> &ShadowNode {
        &self.node
    }

    pub fn tag(&self) -> Tag {
        self.node.tag()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.node.surface_id()
    }

    pub fn family(&self) -> &Arc<ShadowNodeFamily> {
        self.node.family()
    }

    pub fn children(&self) -> &[ShadowNodePtr] {
        self.node.children()
    }

    pub fn layout_constraints(&self) -> &LayoutConstraints {
        &self.props.layout_constraints
    }

    pub fn layout_context(&self) -> &LayoutContext {
        &self.props.layout_context
    }

    pub fn is_laid_out(&self) -> bool {
        self.generation == self.laid_out_generation
    }

    /// Copy with some parts replaced. Props, when given, must be [`RootProps`].
    pub fn clone_with(&self, mut fragment: ShadowNodeFragment) -> Self {
        let props = match fragment.props.take() {
            Some(props) => {
                let Some(root_props) = props.as_any().downcast_ref::<RootProps>() else {
                    panic!(
                        "root of surface {} cloned with non-root props",
                        self.surface_id()
                    );
                };
                let root_props = Arc::new(root_props.clone());
                let shared: SharedProps = root_props.clone();
                fragment.props = Some(shared);
                root_props
            }
            None => self.props.clone(),
        };
        self.derive(self.node.clone_with(fragment), props)
    }

    pub fn with_children(&self, children: Vec<ShadowNodePtr>) -> Self {
        self.clone_with(ShadowNodeFragment::new().children(children))
    }

    /// Copy with new root-level layout inputs; children are shared.
    pub fn clone_with_layout(&self, constraints: LayoutConstraints, context: LayoutContext) -> Self {
        let props = Arc::new(RootProps {
            layout_constraints: constraints,
            layout_context: context,
        });
        let shared: SharedProps = props.clone();
        let node = self.node.clone_with(ShadowNodeFragment::new().props(shared));
        self.derive(node, props)
    }

    /// See [`ShadowNode::clone_tree`].
    pub fn clone_tree<F>(&self, family: &ShadowNodeFamily, callback: F) -> Option<Self>
    where
        F: FnOnce(&ShadowNode) -> ShadowNode,
    {
        let node = self.node.clone_tree(family, callback)?;
        Some(self.derive(node, self.props.clone()))
    }

    /// See [`ShadowNode::progress_state`].
    pub fn progress_state(&self, committed: &RootShadowNode) -> Option<Self> {
        let node = self.node.progress_state(Some(committed.node()))?;
        Some(self.derive(node, self.props.clone()))
    }

    /// Lays the tree out unless the current content already is.
    ///
    /// Returns whether layout ran. Nodes whose frame changed are appended to
    /// `affected` in pre-order; nodes whose frame and children are unchanged
    /// keep their identity.
    pub fn layout_if_needed(
        &mut self,
        engine: &dyn LayoutEngine,
        affected: Option<&mut Vec<ShadowNodePtr>>,
    ) -> Result<bool, LayoutError> {
        if self.is_laid_out() {
            return Ok(false);
        }

        let output = engine.layout(
            &self.node,
            &self.props.layout_constraints,
            &self.props.layout_context,
        )?;

        let mut changed = Vec::new();
        let root = Arc::new(self.node.clone());
        let laid_out = apply_layout(&root, &output, &mut changed)?;
        drop(root);
        self.node = Arc::try_unwrap(laid_out).unwrap_or_else(|shared| (*shared).clone());
        self.laid_out_generation = self.generation;

        if let Some(affected) = affected {
            affected.extend(changed);
        }
        Ok(true)
    }
}

fn apply_layout(
    node: &ShadowNodePtr,
    output: &LayoutOutput,
    affected: &mut Vec<ShadowNodePtr>,
) -> Result<ShadowNodePtr, LayoutError> {
    if node.children().len() != output.children.len() {
        return Err(LayoutError::Engine {
            tag: node.tag(),
            message: format!(
                "layout produced {} child frames for {} children",
                output.children.len(),
                node.children().len()
            ),
        });
    }

    let frame_changed = node.layout_metrics() != output.metrics;
    let slot = frame_changed.then(|| {
        affected.push(node.clone());
        affected.len() - 1
    });

    let mut children: Option<Vec<ShadowNodePtr>> = None;
    for (index, (child, child_output)) in node.children().iter().zip(&output.children).enumerate() {
        let laid_out = apply_layout(child, child_output, affected)?;
        if !Arc::ptr_eq(&laid_out, child) {
            children.get_or_insert_with(|| node.children().to_vec())[index] = laid_out;
        }
    }

    if !frame_changed && children.is_none() {
        return Ok(node.clone());
    }

    let mut fragment = ShadowNodeFragment::new().layout_metrics(output.metrics);
    fragment.children = children;
    let laid_out = Arc::new(node.clone_with(fragment));
    if let Some(slot) = slot {
        affected[slot] = laid_out.clone();
    }
    Ok(laid_out)
}
