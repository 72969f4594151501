use super::{CommitOptions, RootShadowNode, ShadowTree};
use crate::error::BoxError;
use crate::ui_manager::UiManager;

/// Extension point run on every commit of every surface, in registration order.
///
/// `shadow_tree_will_commit` may rewrite the new root but must not touch
/// state visible outside the commit. An error aborts the commit.
pub trait UiManagerCommitHook: Send + Sync {
    fn commit_hook_was_registered(&self, _ui_manager: &UiManager) {}

    fn commit_hook_was_unregistered(&self, _ui_manager: &UiManager) {}

    fn shadow_tree_will_commit(
        &self,
        shadow_tree: &ShadowTree,
        old_root: &RootShadowNode,
        new_root: RootShadowNode,
        options: &CommitOptions,
    ) -> Result<RootShadowNode, BoxError>;
}
