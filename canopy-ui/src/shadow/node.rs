use std::sync::Arc;

use canopy_types::{LayoutMetrics, SurfaceId, Tag};
use smallvec::SmallVec;

use super::family::ShadowNodeFamily;
use super::props::{ComponentHandle, ComponentName, SharedProps};
use super::state::SharedState;
use super::traits::ShadowNodeTraits;
use crate::events::EventEmitter;

pub type ShadowNodePtr = Arc<ShadowNode>;

/// Child indices leading from a node down to one of its descendants.
pub type NodePath = SmallVec<[usize; 16]>;

/// One component instance's committed props, state and children.
///
/// Nodes are never mutated once shared. Changes produce a new node through
/// [`ShadowNode::clone_with`], which shares every untouched child.
#[derive(Debug, Clone)]
pub struct ShadowNode {
    family: Arc<ShadowNodeFamily>,
    props: SharedProps,
    state: Option<SharedState>,
    children: Vec<ShadowNodePtr>,
    traits: ShadowNodeTraits,
    layout_metrics: LayoutMetrics,
}

/// The parts of a node to replace when cloning; `None` keeps the original.
#[derive(Debug, Clone, Default)]
pub struct ShadowNodeFragment {
    pub props: Option<SharedProps>,
    pub children: Option<Vec<ShadowNodePtr>>,
    pub state: Option<SharedState>,
    pub layout_metrics: Option<LayoutMetrics>,
}

impl ShadowNodeFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn props(mut self, props: SharedProps) -> Self {
        self.props = Some(props);
        self
    }

    pub fn children(mut self, children: Vec<ShadowNodePtr>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn state(mut self, state: SharedState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn layout_metrics(mut self, layout_metrics: LayoutMetrics) -> Self {
        self.layout_metrics = Some(layout_metrics);
        self
    }
}

impl ShadowNode {
    pub fn new(
        family: Arc<ShadowNodeFamily>,
        props: SharedProps,
        state: Option<SharedState>,
        children: Vec<ShadowNodePtr>,
    ) -> Self {
        let traits = family.component_descriptor().traits();
        Self {
            family,
            props,
            state,
            children,
            traits,
            layout_metrics: LayoutMetrics::default(),
        }
    }

    pub fn clone_with(&self, fragment: ShadowNodeFragment) -> ShadowNode {
        ShadowNode {
            family: self.family.clone(),
            props: fragment.props.unwrap_or_else(|| self.props.clone()),
            state: fragment.state.or_else(|| self.state.clone()),
            children: fragment.children.unwrap_or_else(|| self.children.clone()),
            traits: self.traits,
            layout_metrics: fragment.layout_metrics.unwrap_or(self.layout_metrics),
        }
    }

    pub fn tag(&self) -> Tag {
        self.family.tag()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.family.surface_id()
    }

    pub fn family(&self) -> &Arc<ShadowNodeFamily> {
        &self.family
    }

    pub fn props(&self) -> &SharedProps {
        &self.props
    }

    pub fn state(&self) -> Option<&SharedState> {
        self.state.as_ref()
    }

    pub fn children(&self) -> &[ShadowNodePtr] {
        &self.children
    }

    pub fn traits(&self) -> ShadowNodeTraits {
        self.traits
    }

    pub fn layout_metrics(&self) -> LayoutMetrics {
        self.layout_metrics
    }

    pub fn component_name(&self) -> &ComponentName {
        self.family.component_name()
    }

    pub fn component_handle(&self) -> ComponentHandle {
        self.family.component_handle()
    }

    pub fn event_emitter(&self) -> &Arc<EventEmitter> {
        self.family.event_emitter()
    }

    pub fn same_family(&self, other: &ShadowNode) -> bool {
        Arc::ptr_eq(&self.family, &other.family)
    }

    pub(crate) fn insert_traits(&mut self, traits: ShadowNodeTraits) {
        self.traits.insert(traits);
    }

    /// Child indices from `self` to the node of `family`, or `None` if the
    /// family is not in this subtree. An empty path means `self` is that node.
    pub fn path_to(&self, family: &ShadowNodeFamily) -> Option<NodePath> {
        let mut path = NodePath::new();
        if self.find_path(family, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn find_path(&self, family: &ShadowNodeFamily, path: &mut NodePath) -> bool {
        if std::ptr::eq(self.family.as_ref(), family) {
            return true;
        }
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            if child.find_path(family, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Node reached by following a non-empty `path` from `self`.
    pub fn descendant(&self, path: &[usize]) -> Option<&ShadowNodePtr> {
        let (&first, rest) = path.split_first()?;
        let mut node = self.children.get(first)?;
        for &index in rest {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// Replaces the node of `family` with `callback(node)` and copies every
    /// ancestor on the way back up; all other subtrees are shared.
    ///
    /// `callback` is only invoked when the family is found.
    pub fn clone_tree<F>(&self, family: &ShadowNodeFamily, callback: F) -> Option<ShadowNode>
    where
        F: FnOnce(&ShadowNode) -> ShadowNode,
    {
        let path = self.path_to(family)?;
        Some(self.replace_along(&path, callback))
    }

    fn replace_along<F>(&self, path: &[usize], callback: F) -> ShadowNode
    where
        F: FnOnce(&ShadowNode) -> ShadowNode,
    {
        match path.split_first() {
            None => callback(self),
            Some((&index, rest)) => {
                let replaced = self.children[index].replace_along(rest, callback);
                let mut children = self.children.clone();
                children[index] = Arc::new(replaced);
                self.clone_with(ShadowNodeFragment::new().children(children))
            }
        }
    }

    /// Swaps every outdated state in this subtree for the family's most
    /// recently committed one. Subtrees shared with `committed` are skipped.
    ///
    /// Returns `None` when nothing needed progressing.
    pub fn progress_state(&self, committed: Option<&ShadowNode>) -> Option<ShadowNode> {
        if committed.is_some_and(|committed| std::ptr::eq(committed, self)) {
            return None;
        }

        let newer_state = self
            .state
            .as_ref()
            .and_then(|state| self.family.state_coordinator().newer_than(state));

        let mut children: Option<Vec<ShadowNodePtr>> = None;
        for (index, child) in self.children.iter().enumerate() {
            let committed_child = committed
                .filter(|committed| committed.same_family(self))
                .and_then(|committed| committed.children.get(index))
                .map(|child| child.as_ref());
            if let Some(progressed) = child.progress_state(committed_child) {
                children.get_or_insert_with(|| self.children.clone())[index] =
                    Arc::new(progressed);
            }
        }

        if newer_state.is_none() && children.is_none() {
            return None;
        }

        Some(ShadowNode {
            family: self.family.clone(),
            props: self.props.clone(),
            state: newer_state.or_else(|| self.state.clone()),
            children: children.unwrap_or_else(|| self.children.clone()),
            traits: self.traits,
            layout_metrics: self.layout_metrics,
        })
    }

    /// Records the states of this subtree as committed, skipping subtrees
    /// shared with the previously committed tree.
    pub fn record_committed_states(&self, previous: Option<&ShadowNode>) {
        if previous.is_some_and(|previous| std::ptr::eq(previous, self)) {
            return;
        }
        if let Some(state) = &self.state {
            self.family.state_coordinator().set_most_recent(state);
        }
        for (index, child) in self.children.iter().enumerate() {
            let previous_child = previous
                .filter(|previous| previous.same_family(self))
                .and_then(|previous| previous.children.get(index))
                .map(|child| child.as_ref());
            child.record_committed_states(previous_child);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.subtree_size())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::{
        ComponentDescriptor, RawProps, State, ViewComponentDescriptor,
    };
    use serde_json::json;

    fn node(tag: Tag, children: Vec<ShadowNodePtr>) -> ShadowNodePtr {
        let descriptor: Arc<dyn ComponentDescriptor> = Arc::new(ViewComponentDescriptor::new("View"));
        let props = descriptor.clone_props(None, &RawProps::new()).unwrap();
        let family = ShadowNodeFamily::new(
            tag,
            1,
            Arc::new(EventEmitter::detached(tag)),
            descriptor,
        );
        Arc::new(ShadowNode::new(family, props, None, children))
    }

    #[test]
    fn test_clone_with_shares_untouched_children() {
        let a = node(2, vec![]);
        let b = node(3, vec![]);
        let parent = node(1, vec![a.clone(), b.clone()]);

        let metrics = LayoutMetrics::with_frame(canopy_types::Rect::new(0.0, 0.0, 5.0, 5.0));
        let clone = parent.clone_with(ShadowNodeFragment::new().layout_metrics(metrics));

        assert!(clone.same_family(&parent));
        assert!(Arc::ptr_eq(&clone.children()[0], &a));
        assert!(Arc::ptr_eq(&clone.children()[1], &b));
        assert!(Arc::ptr_eq(clone.props(), parent.props()));
        assert_eq!(clone.layout_metrics(), metrics);
    }

    #[test]
    fn test_path_to_descendant() {
        let leaf = node(4, vec![]);
        let middle = node(3, vec![node(5, vec![]), leaf.clone()]);
        let root = node(1, vec![node(2, vec![]), middle]);

        let path = root.path_to(leaf.family()).unwrap();
        assert_eq!(path.as_slice(), &[1, 1]);
        assert_eq!(root.descendant(&path).unwrap().tag(), 4);
        assert!(root.path_to(node(9, vec![]).family()).is_none());
        assert!(root.path_to(root.family()).unwrap().is_empty());
    }

    #[test]
    fn test_clone_tree_copies_only_the_path() {
        let untouched = node(2, vec![node(6, vec![])]);
        let target = node(4, vec![]);
        let middle = node(3, vec![target.clone()]);
        let root = node(1, vec![untouched.clone(), middle.clone()]);

        let cloned = root
            .clone_tree(target.family(), |old| {
                old.clone_with(ShadowNodeFragment::new().children(vec![node(5, vec![])]))
            })
            .unwrap();

        assert!(Arc::ptr_eq(&cloned.children()[0], &untouched));
        assert!(!Arc::ptr_eq(&cloned.children()[1], &middle));
        assert_eq!(cloned.children()[1].children()[0].children()[0].tag(), 5);
        assert_eq!(root.children()[1].children()[0].children().len(), 0);
    }

    #[test]
    fn test_progress_state_replaces_outdated_states() {
        let descriptor: Arc<dyn ComponentDescriptor> =
            Arc::new(ViewComponentDescriptor::new("ScrollView"));
        let props = descriptor.clone_props(None, &RawProps::new()).unwrap();
        let family = ShadowNodeFamily::new(3, 1, Arc::new(EventEmitter::detached(3)), descriptor);
        let initial = State::initial(&family, json!({ "offset": 0 }));
        let scroll = Arc::new(ShadowNode::new(family.clone(), props, Some(initial.clone()), vec![]));
        let root = node(1, vec![node(2, vec![]), scroll]);

        assert!(root.progress_state(None).is_none());

        let newer = initial.successor(json!({ "offset": 40 }));
        family.state_coordinator().set_most_recent(&newer);

        let progressed = root.progress_state(None).unwrap();
        assert!(Arc::ptr_eq(&progressed.children()[0], &root.children()[0]));
        let state = progressed.children()[1].state().unwrap();
        assert_eq!(state.revision(), 2);
        assert_eq!(state.data(), &json!({ "offset": 40 }));

        // Shared subtrees are trusted to be current.
        assert!(root.progress_state(Some(&root)).is_none());
    }
}
