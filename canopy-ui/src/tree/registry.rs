use std::collections::HashMap;
use std::sync::Arc;

use canopy_types::SurfaceId;
use parking_lot::RwLock;

use super::ShadowTree;

/// Running shadow trees by surface.
///
/// Callbacks run without the registry lock held, so they may commit or
/// touch the registry themselves.
#[derive(Default)]
pub struct ShadowTreeRegistry {
    trees: RwLock<HashMap<SurfaceId, Arc<ShadowTree>>>,
}

impl ShadowTreeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a tree for the same surface is already registered.
    pub fn add(&self, tree: Arc<ShadowTree>) -> bool {
        let mut trees = self.trees.write();
        if trees.contains_key(&tree.surface_id()) {
            return false;
        }
        trees.insert(tree.surface_id(), tree);
        true
    }

    pub fn remove(&self, surface_id: SurfaceId) -> Option<Arc<ShadowTree>> {
        self.trees.write().remove(&surface_id)
    }

    pub fn get(&self, surface_id: SurfaceId) -> Option<Arc<ShadowTree>> {
        self.trees.read().get(&surface_id).cloned()
    }

    /// Runs `visitor` on the tree of `surface_id`, if registered.
    pub fn visit<R>(&self, surface_id: SurfaceId, visitor: impl FnOnce(&ShadowTree) -> R) -> Option<R> {
        let tree = self.get(surface_id)?;
        Some(visitor(&tree))
    }

    /// Runs `visitor` on every tree in surface id order; returning false stops early.
    pub fn enumerate(&self, mut visitor: impl FnMut(&ShadowTree) -> bool) {
        let mut trees: Vec<_> = self.trees.read().values().cloned().collect();
        trees.sort_by_key(|tree| tree.surface_id());
        for tree in trees {
            if !visitor(&tree) {
                break;
            }
        }
    }

    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self.trees.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.trees.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventEmitter;
    use crate::layout::StackLayout;
    use crate::scheduler::SchedulerConfig;
    use crate::tree::RootShadowNode;
    use canopy_types::{LayoutConstraints, LayoutContext};

    fn tree(surface_id: SurfaceId) -> Arc<ShadowTree> {
        let root = RootShadowNode::for_surface(
            surface_id,
            LayoutConstraints::default(),
            LayoutContext::default(),
            Arc::new(EventEmitter::detached(surface_id)),
        );
        Arc::new(ShadowTree::new(
            root,
            Arc::new(StackLayout),
            None,
            &SchedulerConfig::default(),
        ))
    }

    #[test]
    fn test_rejects_second_tree_for_surface() {
        let registry = ShadowTreeRegistry::new();
        assert!(registry.add(tree(1)));
        assert!(!registry.add(tree(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_enumerate_sorted_and_stops_early() {
        let registry = ShadowTreeRegistry::new();
        for id in [31, 11, 21] {
            registry.add(tree(id));
        }

        let mut seen = Vec::new();
        registry.enumerate(|tree| {
            seen.push(tree.surface_id());
            seen.len() < 2
        });
        assert_eq!(seen, vec![11, 21]);
        assert_eq!(registry.surface_ids(), vec![11, 21, 31]);
    }

    #[test]
    fn test_visit_and_remove() {
        let registry = ShadowTreeRegistry::new();
        registry.add(tree(7));

        assert_eq!(registry.visit(7, |tree| tree.current_revision().number()), Some(0));
        assert!(registry.remove(7).is_some());
        assert!(registry.visit(7, |_| ()).is_none());
        assert!(registry.is_empty());
    }
}
