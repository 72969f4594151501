use std::sync::{Arc, Weak};

use canopy_types::{LayoutConstraints, LayoutContext, SurfaceId, Tag};
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::error::{BoxError, SchedulerError};
use crate::events::{EventDispatcher, EventEmitter};
use crate::layout::LayoutEngine;
use crate::mounting::MountingCoordinator;
use crate::scheduler::SchedulerConfig;
use crate::shadow::{
    ComponentDescriptorRegistry, ContextContainer, RawProps, ShadowNode, ShadowNodeFamily,
    ShadowNodeFragment, ShadowNodePtr, ShadowNodeTraits, State, StateUpdate,
};
use crate::tree::{
    CommitOptions, CommitSource, CommitStatus, RootShadowNode, ShadowTree, ShadowTreeDelegate,
    ShadowTreeRegistry, UiManagerCommitHook,
};

/// Told about every published revision; implemented by the scheduler.
pub trait UiManagerDelegate: Send + Sync {
    fn ui_manager_did_finish_transaction(
        &self,
        mounting_coordinator: &Arc<MountingCoordinator>,
        mount_synchronously: bool,
    );
}

/// Builds nodes from descriptors and routes commits of every running surface.
pub struct UiManager {
    self_ref: Weak<UiManager>,
    component_registry: Arc<ComponentDescriptorRegistry>,
    context_container: Arc<ContextContainer>,
    event_dispatcher: Arc<EventDispatcher>,
    layout_engine: Arc<dyn LayoutEngine>,
    config: SchedulerConfig,
    shadow_trees: ShadowTreeRegistry,
    commit_hooks: RwLock<Vec<Arc<dyn UiManagerCommitHook>>>,
    delegate: RwLock<Option<Arc<dyn UiManagerDelegate>>>,
}

fn same_hook(a: &Arc<dyn UiManagerCommitHook>, b: &Arc<dyn UiManagerCommitHook>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl UiManager {
    pub fn new(
        component_registry: Arc<ComponentDescriptorRegistry>,
        context_container: Arc<ContextContainer>,
        layout_engine: Arc<dyn LayoutEngine>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            component_registry,
            context_container,
            event_dispatcher: EventDispatcher::new(),
            layout_engine,
            config,
            shadow_trees: ShadowTreeRegistry::new(),
            commit_hooks: RwLock::new(Vec::new()),
            delegate: RwLock::new(None),
        })
    }

    pub fn set_delegate(&self, delegate: Option<Arc<dyn UiManagerDelegate>>) {
        *self.delegate.write() = delegate;
    }

    pub fn component_registry(&self) -> &Arc<ComponentDescriptorRegistry> {
        &self.component_registry
    }

    pub fn context_container(&self) -> &Arc<ContextContainer> {
        &self.context_container
    }

    pub fn event_dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.event_dispatcher
    }

    pub fn shadow_tree_registry(&self) -> &ShadowTreeRegistry {
        &self.shadow_trees
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// A brand-new node with its own family and, if the descriptor asks for
    /// one, an initial state.
    pub fn create_node(
        &self,
        tag: Tag,
        component_name: &str,
        surface_id: SurfaceId,
        props: &RawProps,
        children: Vec<ShadowNodePtr>,
    ) -> Result<ShadowNodePtr, SchedulerError> {
        let descriptor = self
            .component_registry
            .get(component_name)
            .ok_or_else(|| SchedulerError::UnknownComponent(component_name.to_string()))?;
        let props = descriptor
            .clone_props(None, props)
            .map_err(|error| SchedulerError::InvalidProps {
                component: component_name.to_string(),
                message: error.to_string(),
            })?;

        let family = ShadowNodeFamily::new(
            tag,
            surface_id,
            Arc::new(EventEmitter::new(tag, &self.event_dispatcher)),
            descriptor.clone(),
        );
        let state = descriptor
            .initial_state_data(&props)
            .map(|data| State::initial(&family, data));

        trace!(tag, component = component_name, surface_id, "node created");
        Ok(Arc::new(ShadowNode::new(family, props, state, children)))
    }

    /// A new revision of `node` with raw props applied on top of its current
    /// props and, optionally, new children.
    pub fn clone_node(
        &self,
        node: &ShadowNode,
        props: Option<&RawProps>,
        children: Option<Vec<ShadowNodePtr>>,
    ) -> Result<ShadowNodePtr, SchedulerError> {
        let mut fragment = ShadowNodeFragment::new();
        if let Some(raw) = props {
            let descriptor = node.family().component_descriptor();
            let props = descriptor
                .clone_props(Some(node.props()), raw)
                .map_err(|error| SchedulerError::InvalidProps {
                    component: node.component_name().to_string(),
                    message: error.to_string(),
                })?;
            fragment = fragment.props(props);
        }
        fragment.children = children;
        Ok(Arc::new(node.clone_with(fragment)))
    }

    pub fn start_surface(
        &self,
        surface_id: SurfaceId,
        constraints: LayoutConstraints,
        context: LayoutContext,
    ) -> Result<Arc<ShadowTree>, SchedulerError> {
        let root = RootShadowNode::for_surface(
            surface_id,
            constraints,
            context,
            Arc::new(EventEmitter::new(surface_id, &self.event_dispatcher)),
        );
        let delegate: Weak<dyn ShadowTreeDelegate> = self.self_ref.clone();
        let tree = Arc::new(ShadowTree::new(
            root,
            self.layout_engine.clone(),
            Some(delegate),
            &self.config,
        ));

        if !self.shadow_trees.add(tree.clone()) {
            return Err(SchedulerError::SurfaceAlreadyRunning(surface_id));
        }
        info!(surface_id, "surface started");
        Ok(tree)
    }

    /// Commits an empty tree so the host tears every view down, then
    /// forgets the surface. The returned tree still holds undelivered
    /// transactions.
    pub fn stop_surface(&self, surface_id: SurfaceId) -> Result<Arc<ShadowTree>, SchedulerError> {
        let tree = self.tree(surface_id)?;
        tree.commit_empty_tree(&CommitOptions::default())?;
        self.shadow_trees.remove(surface_id);
        info!(surface_id, "surface stopped");
        Ok(tree)
    }

    fn tree(&self, surface_id: SurfaceId) -> Result<Arc<ShadowTree>, SchedulerError> {
        self.shadow_trees
            .get(surface_id)
            .ok_or(SchedulerError::SurfaceNotFound(surface_id))
    }

    /// Replaces the root's children.
    pub fn complete_surface(
        &self,
        surface_id: SurfaceId,
        children: Vec<ShadowNodePtr>,
        options: &CommitOptions,
    ) -> Result<CommitStatus, SchedulerError> {
        let tree = self.tree(surface_id)?;
        let status = tree.commit(
            |old_root| Ok(Some(old_root.with_children(children.clone()))),
            options,
        )?;
        Ok(status)
    }

    pub fn constrain_surface_layout(
        &self,
        surface_id: SurfaceId,
        constraints: LayoutConstraints,
        context: LayoutContext,
    ) -> Result<CommitStatus, SchedulerError> {
        let tree = self.tree(surface_id)?;
        let status = tree.commit(
            |old_root| {
                if *old_root.layout_constraints() == constraints
                    && *old_root.layout_context() == context
                {
                    return Ok(None);
                }
                Ok(Some(old_root.clone_with_layout(constraints, context)))
            },
            &CommitOptions::default(),
        )?;
        Ok(status)
    }

    /// Commits a new state for one family by cloning the path to its
    /// current node. No-op if the family is no longer mounted or the update
    /// declines.
    pub fn update_state(&self, update: &StateUpdate) -> Result<CommitStatus, SchedulerError> {
        let family = update.family();
        let tree = self.tree(family.surface_id())?;
        let options = CommitOptions {
            source: CommitSource::StateUpdate,
            ..CommitOptions::default()
        };

        let status = tree.commit(
            |old_root| {
                let mut outcome: Result<bool, BoxError> = Ok(true);
                let new_root = old_root.clone_tree(family, |node| {
                    let current = node.state().map(|state| state.data().clone()).unwrap_or_default();
                    match update.apply(&current) {
                        Ok(Some(data)) => {
                            let state = match node.state() {
                                Some(state) => state.successor(data),
                                None => State::initial(node.family(), data),
                            };
                            let mut cloned = node.clone_with(ShadowNodeFragment::new().state(state));
                            cloned.insert_traits(ShadowNodeTraits::CLONED_BY_NATIVE_STATE_UPDATE);
                            cloned
                        }
                        Ok(None) => {
                            outcome = Ok(false);
                            node.clone()
                        }
                        Err(error) => {
                            outcome = Err(error);
                            node.clone()
                        }
                    }
                });

                let Some(new_root) = new_root else {
                    debug!(tag = family.tag(), "state update for unmounted family ignored");
                    return Ok(None);
                };
                match outcome {
                    Ok(true) => Ok(Some(new_root)),
                    Ok(false) => Ok(None),
                    Err(error) => Err(error),
                }
            },
            &options,
        )?;
        Ok(status)
    }

    /// The node of `node`'s family in the latest committed revision.
    pub fn newest_clone_of_shadow_node(&self, node: &ShadowNode) -> Option<ShadowNodePtr> {
        let tree = self.shadow_trees.get(node.surface_id())?;
        let revision = tree.current_revision();
        let root = revision.root().node();
        let path = root.path_to(node.family())?;
        root.descendant(&path).cloned()
    }

    /// # Panics
    ///
    /// Panics if `hook` is already registered.
    pub fn register_commit_hook(&self, hook: Arc<dyn UiManagerCommitHook>) {
        {
            let mut hooks = self.commit_hooks.write();
            assert!(
                !hooks.iter().any(|existing| same_hook(existing, &hook)),
                "commit hook registered twice"
            );
            hooks.push(hook.clone());
        }
        hook.commit_hook_was_registered(self);
    }

    /// # Panics
    ///
    /// Panics if `hook` is not registered.
    pub fn unregister_commit_hook(&self, hook: &Arc<dyn UiManagerCommitHook>) {
        {
            let mut hooks = self.commit_hooks.write();
            let position = hooks.iter().position(|existing| same_hook(existing, hook));
            let Some(position) = position else {
                panic!("unregistering a commit hook that was never registered");
            };
            hooks.remove(position);
        }
        hook.commit_hook_was_unregistered(self);
    }

    pub fn commit_hook_count(&self) -> usize {
        self.commit_hooks.read().len()
    }
}

impl ShadowTreeDelegate for UiManager {
    fn shadow_tree_will_commit(
        &self,
        shadow_tree: &ShadowTree,
        old_root: &RootShadowNode,
        new_root: RootShadowNode,
        options: &CommitOptions,
    ) -> Result<RootShadowNode, BoxError> {
        let hooks = self.commit_hooks.read().clone();
        hooks.iter().try_fold(new_root, |root, hook| {
            hook.shadow_tree_will_commit(shadow_tree, old_root, root, options)
        })
    }

    fn shadow_tree_did_finish_transaction(
        &self,
        mounting_coordinator: &Arc<MountingCoordinator>,
        mount_synchronously: bool,
    ) {
        let delegate = self.delegate.read().clone();
        if let Some(delegate) = delegate {
            delegate.ui_manager_did_finish_transaction(mounting_coordinator, mount_synchronously);
        }
    }
}
