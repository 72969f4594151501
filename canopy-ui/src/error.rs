use canopy_types::{SurfaceId, Tag};
use thiserror::Error;

/// Failure raised by caller-supplied code: transactions, commit hooks, state callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid layout constraints: {0}")]
    InvalidConstraints(String),

    #[error("layout of node {tag} failed: {message}")]
    Engine { tag: Tag, message: String },
}

/// Why a commit did not publish a new revision.
///
/// The shadow tree stays at its last successfully committed revision in
/// every case.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("commit transaction failed: {0}")]
    Transaction(#[source] BoxError),

    #[error("commit hook rejected the tree: {0}")]
    CommitHook(#[source] BoxError),

    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("surface {surface_id}: commit still stale after {attempts} attempts")]
    RetryLimitExceeded { surface_id: SurfaceId, attempts: usize },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("surface {0} is not running")]
    SurfaceNotFound(SurfaceId),

    #[error("surface {0} is already running")]
    SurfaceAlreadyRunning(SurfaceId),

    #[error("no component descriptor registered for '{0}'")]
    UnknownComponent(String),

    #[error("invalid props for '{component}': {message}")]
    InvalidProps { component: String, message: String },

    #[error(transparent)]
    Commit(#[from] CommitError),
}
