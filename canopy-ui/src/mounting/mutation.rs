use std::fmt;

use canopy_types::Tag;

use super::ShadowView;

pub type ShadowViewMutationList = Vec<ShadowViewMutation>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Delete,
    Insert,
    Remove,
    Update,
}

/// One instruction for the host view layer.
///
/// Indices on `Insert` refer to the parent's children after the insert;
/// indices on `Remove` refer to them before the remove.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadowViewMutation {
    Create {
        new: ShadowView,
    },
    Delete {
        old: ShadowView,
    },
    Insert {
        parent: ShadowView,
        new: ShadowView,
        index: usize,
    },
    Remove {
        parent: ShadowView,
        old: ShadowView,
        index: usize,
    },
    /// `parent` is `None` for the surface root.
    Update {
        parent: Option<ShadowView>,
        old: ShadowView,
        new: ShadowView,
        index: usize,
    },
}

impl ShadowViewMutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            ShadowViewMutation::Create { .. } => MutationKind::Create,
            ShadowViewMutation::Delete { .. } => MutationKind::Delete,
            ShadowViewMutation::Insert { .. } => MutationKind::Insert,
            ShadowViewMutation::Remove { .. } => MutationKind::Remove,
            ShadowViewMutation::Update { .. } => MutationKind::Update,
        }
    }

    /// Tag of the view the mutation is about.
    pub fn tag(&self) -> Tag {
        match self {
            ShadowViewMutation::Create { new }
            | ShadowViewMutation::Insert { new, .. }
            | ShadowViewMutation::Update { new, .. } => new.tag,
            ShadowViewMutation::Delete { old } | ShadowViewMutation::Remove { old, .. } => old.tag,
        }
    }

    pub fn parent_tag(&self) -> Option<Tag> {
        match self {
            ShadowViewMutation::Insert { parent, .. } | ShadowViewMutation::Remove { parent, .. } => {
                Some(parent.tag)
            }
            ShadowViewMutation::Update { parent, .. } => parent.as_ref().map(|parent| parent.tag),
            ShadowViewMutation::Create { .. } | ShadowViewMutation::Delete { .. } => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ShadowViewMutation::Insert { index, .. }
            | ShadowViewMutation::Remove { index, .. }
            | ShadowViewMutation::Update { index, .. } => Some(*index),
            ShadowViewMutation::Create { .. } | ShadowViewMutation::Delete { .. } => None,
        }
    }
}

impl fmt::Display for ShadowViewMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowViewMutation::Create { new } => write!(f, "Create [{}] {}", new.tag, new.component_name),
            ShadowViewMutation::Delete { old } => write!(f, "Delete [{}] {}", old.tag, old.component_name),
            ShadowViewMutation::Insert { parent, new, index } => {
                write!(f, "Insert [{}] into [{}] @{}", new.tag, parent.tag, index)
            }
            ShadowViewMutation::Remove { parent, old, index } => {
                write!(f, "Remove [{}] from [{}] @{}", old.tag, parent.tag, index)
            }
            ShadowViewMutation::Update { parent, new, index, .. } => match parent {
                Some(parent) => write!(f, "Update [{}] in [{}] @{}", new.tag, parent.tag, index),
                None => write!(f, "Update [{}] (root)", new.tag),
            },
        }
    }
}
