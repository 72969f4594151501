mod hooks;
mod registry;
mod revision;
mod root;
mod shadow_tree;

pub use hooks::UiManagerCommitHook;
pub use registry::ShadowTreeRegistry;
pub use revision::{RevisionNumber, ShadowTreeRevision};
pub use root::{ROOT_COMPONENT_NAME, RootComponentDescriptor, RootProps, RootShadowNode};
pub use shadow_tree::{ShadowTree, ShadowTreeDelegate};

/// Where a commit originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitSource {
    #[default]
    Unknown,
    /// A new tree shape from the producer side.
    Render,
    StateUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    /// Replace outdated states in the new tree with the newest committed ones.
    pub enable_state_reconciliation: bool,
    /// Ask the delegate to mount right away instead of on the next beat.
    pub mount_synchronously: bool,
    pub source: CommitSource,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            enable_state_reconciliation: false,
            mount_synchronously: true,
            source: CommitSource::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Succeeded,
    /// The transaction returned no new root; nothing was published.
    NoOp,
}
