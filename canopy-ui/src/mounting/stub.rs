use std::collections::BTreeMap;

use canopy_types::{LayoutMetrics, SurfaceId, Tag};
use thiserror::Error;

use super::{HostViewLayer, ShadowView, ShadowViewMutation};
use crate::shadow::{ComponentName, ShadowNode, SharedProps, SharedState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StubViewError {
    #[error("view {0} already exists")]
    AlreadyExists(Tag),

    #[error("view {0} does not exist")]
    NotFound(Tag),

    #[error("view {tag} is still attached to {parent}")]
    StillAttached { tag: Tag, parent: Tag },

    #[error("view {tag} is already attached to {parent}")]
    AlreadyAttached { tag: Tag, parent: Tag },

    #[error("cannot insert {tag} into {parent} at {index}: parent has {len} children")]
    InvalidIndex {
        parent: Tag,
        tag: Tag,
        index: usize,
        len: usize,
    },

    #[error("expected {expected} at index {index} of {parent}, found {found:?}")]
    ChildMismatch {
        parent: Tag,
        index: usize,
        expected: Tag,
        found: Option<Tag>,
    },

    #[error("view {tag} is not a child of {parent}")]
    WrongParent { tag: Tag, parent: Tag },
}

/// One mounted view in a [`StubViewTree`].
#[derive(Debug, Clone)]
pub struct StubView {
    pub tag: Tag,
    pub component_name: ComponentName,
    pub props: SharedProps,
    pub state: Option<SharedState>,
    pub layout_metrics: LayoutMetrics,
    pub parent: Option<Tag>,
    pub children: Vec<Tag>,
}

impl StubView {
    fn from_view(view: &ShadowView) -> Self {
        Self {
            tag: view.tag,
            component_name: view.component_name.clone(),
            props: view.props.clone(),
            state: view.state.clone(),
            layout_metrics: view.layout_metrics,
            parent: None,
            children: Vec::new(),
        }
    }

    fn refresh(&mut self, view: &ShadowView) {
        self.component_name = view.component_name.clone();
        self.props = view.props.clone();
        self.state = view.state.clone();
        self.layout_metrics = view.layout_metrics;
    }
}

impl PartialEq for StubView {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.component_name == other.component_name
            && self.layout_metrics == other.layout_metrics
            && self.parent == other.parent
            && self.children == other.children
            && self.props.props_eq(other.props.as_ref())
            && match (&self.state, &other.state) {
                (Some(a), Some(b)) => a.revision() == b.revision() && a.data() == b.data(),
                (None, None) => true,
                _ => false,
            }
    }
}

/// In-memory host that checks every mutation against what is mounted.
///
/// Useful as a reference host: two stub trees compare equal when they hold
/// the same views with the same props, states, frames and hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct StubViewTree {
    root_tag: Tag,
    views: BTreeMap<Tag, StubView>,
}

impl StubViewTree {
    /// A host that has mounted only the root view.
    pub fn new(root: &ShadowView) -> Self {
        let mut views = BTreeMap::new();
        views.insert(root.tag, StubView::from_view(root));
        Self {
            root_tag: root.tag,
            views,
        }
    }

    /// A host that has mounted exactly the tree under `root`.
    pub fn from_shadow_tree(root: &ShadowNode) -> Self {
        let mut tree = Self::new(&ShadowView::new(root));
        tree.mount_children(root);
        tree
    }

    fn mount_children(&mut self, node: &ShadowNode) {
        for child in node.children() {
            let mut view = StubView::from_view(&ShadowView::new(child));
            view.parent = Some(node.tag());
            self.views.insert(child.tag(), view);
            if let Some(parent) = self.views.get_mut(&node.tag()) {
                parent.children.push(child.tag());
            }
            self.mount_children(child);
        }
    }

    pub fn root_tag(&self) -> Tag {
        self.root_tag
    }

    pub fn root(&self) -> Option<&StubView> {
        self.views.get(&self.root_tag)
    }

    pub fn get(&self, tag: Tag) -> Option<&StubView> {
        self.views.get(&tag)
    }

    pub fn children_of(&self, tag: Tag) -> &[Tag] {
        self.views
            .get(&tag)
            .map_or(&[][..], |view| view.children.as_slice())
    }

    /// Number of mounted views, including the root.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn apply(&mut self, mutations: &[ShadowViewMutation]) -> Result<(), StubViewError> {
        for mutation in mutations {
            self.apply_one(mutation)?;
        }
        Ok(())
    }

    fn view_mut(&mut self, tag: Tag) -> Result<&mut StubView, StubViewError> {
        self.views.get_mut(&tag).ok_or(StubViewError::NotFound(tag))
    }

    fn apply_one(&mut self, mutation: &ShadowViewMutation) -> Result<(), StubViewError> {
        match mutation {
            ShadowViewMutation::Create { new } => {
                if self.views.contains_key(&new.tag) {
                    return Err(StubViewError::AlreadyExists(new.tag));
                }
                self.views.insert(new.tag, StubView::from_view(new));
            }
            ShadowViewMutation::Delete { old } => {
                let view = self.views.get(&old.tag).ok_or(StubViewError::NotFound(old.tag))?;
                if let Some(parent) = view.parent {
                    return Err(StubViewError::StillAttached {
                        tag: old.tag,
                        parent,
                    });
                }
                self.views.remove(&old.tag);
            }
            ShadowViewMutation::Insert { parent, new, index } => {
                let child = self.view_mut(new.tag)?;
                if let Some(current) = child.parent {
                    return Err(StubViewError::AlreadyAttached {
                        tag: new.tag,
                        parent: current,
                    });
                }
                let parent_view = self.view_mut(parent.tag)?;
                if *index > parent_view.children.len() {
                    return Err(StubViewError::InvalidIndex {
                        parent: parent.tag,
                        tag: new.tag,
                        index: *index,
                        len: parent_view.children.len(),
                    });
                }
                parent_view.children.insert(*index, new.tag);
                let child = self.view_mut(new.tag)?;
                child.parent = Some(parent.tag);
                child.refresh(new);
            }
            ShadowViewMutation::Remove { parent, old, index } => {
                let parent_view = self.view_mut(parent.tag)?;
                let found = parent_view.children.get(*index).copied();
                if found != Some(old.tag) {
                    return Err(StubViewError::ChildMismatch {
                        parent: parent.tag,
                        index: *index,
                        expected: old.tag,
                        found,
                    });
                }
                parent_view.children.remove(*index);
                self.view_mut(old.tag)?.parent = None;
            }
            ShadowViewMutation::Update { parent, new, .. } => {
                let view = self.view_mut(new.tag)?;
                if let Some(parent) = parent {
                    if view.parent != Some(parent.tag) {
                        return Err(StubViewError::WrongParent {
                            tag: new.tag,
                            parent: parent.tag,
                        });
                    }
                }
                view.refresh(new);
            }
        }
        Ok(())
    }
}

impl HostViewLayer for StubViewTree {
    type Error = StubViewError;

    fn apply_mutations(
        &mut self,
        _surface_id: SurfaceId,
        mutations: &[ShadowViewMutation],
    ) -> Result<(), StubViewError> {
        self.apply(mutations)
    }
}
