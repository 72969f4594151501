use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use canopy_types::SurfaceId;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{CommitOptions, CommitStatus, RootShadowNode, ShadowTreeRevision};
use crate::error::{BoxError, CommitError};
use crate::layout::LayoutEngine;
use crate::mounting::{MountingCoordinator, TransactionTelemetry};
use crate::scheduler::SchedulerConfig;

/// Receives every commit of the trees it is attached to.
pub trait ShadowTreeDelegate: Send + Sync {
    /// Last chance to rewrite the new root before layout and publication.
    fn shadow_tree_will_commit(
        &self,
        shadow_tree: &ShadowTree,
        old_root: &RootShadowNode,
        new_root: RootShadowNode,
        options: &CommitOptions,
    ) -> Result<RootShadowNode, BoxError>;

    /// Called after a revision was published, outside every tree lock.
    fn shadow_tree_did_finish_transaction(
        &self,
        mounting_coordinator: &Arc<MountingCoordinator>,
        mount_synchronously: bool,
    );
}

enum Attempt {
    Finished(CommitStatus),
    Stale,
}

/// The sequence of committed revisions of one surface.
///
/// Commits are optimistic: the transaction, state reconciliation, hooks and
/// layout all run without a lock against a snapshot of the current
/// revision. Only the final check-and-swap is serialized; if another commit
/// got there first, the whole attempt reruns against the newer revision.
pub struct ShadowTree {
    surface_id: SurfaceId,
    current: ArcSwap<ShadowTreeRevision>,
    commit_lock: Mutex<()>,
    mounting_coordinator: Arc<MountingCoordinator>,
    layout_engine: Arc<dyn LayoutEngine>,
    delegate: Option<Weak<dyn ShadowTreeDelegate>>,
    max_commit_attempts: usize,
}

impl ShadowTree {
    pub fn new(
        root: RootShadowNode,
        layout_engine: Arc<dyn LayoutEngine>,
        delegate: Option<Weak<dyn ShadowTreeDelegate>>,
        config: &SchedulerConfig,
    ) -> Self {
        let surface_id = root.surface_id();
        let revision = Arc::new(ShadowTreeRevision::new(
            Arc::new(root),
            ShadowTreeRevision::INITIAL,
            TransactionTelemetry::new(),
        ));
        let mounting_coordinator = Arc::new(MountingCoordinator::new(
            revision.clone(),
            config.telemetry_interval(),
        ));

        Self {
            surface_id,
            current: ArcSwap::new(revision),
            commit_lock: Mutex::new(()),
            mounting_coordinator,
            layout_engine,
            delegate,
            max_commit_attempts: config.max_commit_attempts().max(1),
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// The latest committed revision. Never blocks.
    pub fn current_revision(&self) -> Arc<ShadowTreeRevision> {
        self.current.load_full()
    }

    pub fn mounting_coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.mounting_coordinator
    }

    pub fn layout_engine(&self) -> &Arc<dyn LayoutEngine> {
        &self.layout_engine
    }

    fn delegate(&self) -> Option<Arc<dyn ShadowTreeDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    /// Publishes the root produced by `transaction` as the next revision.
    ///
    /// `transaction` gets the current root and returns the new one, or
    /// `None` to abort without publishing. It reruns whenever a concurrent
    /// commit invalidated the root it was given, up to the configured
    /// attempt limit. Transaction, hook and layout failures leave the tree
    /// at its previous revision.
    pub fn commit<F>(
        &self,
        mut transaction: F,
        options: &CommitOptions,
    ) -> Result<CommitStatus, CommitError>
    where
        F: FnMut(&RootShadowNode) -> Result<Option<RootShadowNode>, BoxError>,
    {
        for attempt in 1..=self.max_commit_attempts {
            match self.try_commit(&mut transaction, options, attempt)? {
                Attempt::Finished(status) => return Ok(status),
                Attempt::Stale => {
                    debug!(surface_id = self.surface_id, attempt, "commit base revision is stale, retrying");
                }
            }
        }

        warn!(
            surface_id = self.surface_id,
            attempts = self.max_commit_attempts,
            "commit abandoned after repeated stale attempts"
        );
        Err(CommitError::RetryLimitExceeded {
            surface_id: self.surface_id,
            attempts: self.max_commit_attempts,
        })
    }

    /// Commits a root without children, so the host removes every view.
    pub fn commit_empty_tree(&self, options: &CommitOptions) -> Result<CommitStatus, CommitError> {
        self.commit(|old_root| Ok(Some(old_root.with_children(Vec::new()))), options)
    }

    fn try_commit<F>(
        &self,
        transaction: &mut F,
        options: &CommitOptions,
        attempt: usize,
    ) -> Result<Attempt, CommitError>
    where
        F: FnMut(&RootShadowNode) -> Result<Option<RootShadowNode>, BoxError>,
    {
        let mut telemetry = TransactionTelemetry::new();
        telemetry.will_commit();

        let base = self.current_revision();
        let old_root = base.root();

        let Some(mut new_root) = transaction(old_root).map_err(CommitError::Transaction)? else {
            debug!(surface_id = self.surface_id, "commit transaction was a no-op");
            return Ok(Attempt::Finished(CommitStatus::NoOp));
        };
        assert!(
            new_root.node().same_family(old_root.node()),
            "surface {}: transaction returned the root of another tree",
            self.surface_id
        );

        if options.enable_state_reconciliation {
            if let Some(progressed) = new_root.progress_state(old_root) {
                new_root = progressed;
            }
        }

        if let Some(delegate) = self.delegate() {
            new_root = delegate
                .shadow_tree_will_commit(self, old_root, new_root, options)
                .map_err(CommitError::CommitHook)?;
            assert!(
                new_root.node().same_family(old_root.node()),
                "surface {}: commit hook returned the root of another tree",
                self.surface_id
            );
        }

        telemetry.will_layout();
        let mut affected = Vec::new();
        new_root.layout_if_needed(self.layout_engine.as_ref(), Some(&mut affected))?;
        telemetry.did_layout(affected.len());

        let revision = {
            let _guard = self.commit_lock.lock();
            if self.current.load().number() != base.number() {
                return Ok(Attempt::Stale);
            }

            new_root.node().record_committed_states(Some(old_root.node()));
            telemetry.did_commit();
            let revision = Arc::new(ShadowTreeRevision::new(
                Arc::new(new_root),
                base.number() + 1,
                telemetry,
            ));
            self.current.store(revision.clone());
            self.mounting_coordinator.push(revision.clone());
            revision
        };

        debug!(
            surface_id = self.surface_id,
            revision = revision.number(),
            attempt,
            affected_layout_nodes = affected.len(),
            "commit published"
        );

        if let Some(delegate) = self.delegate() {
            delegate.shadow_tree_did_finish_transaction(
                &self.mounting_coordinator,
                options.mount_synchronously,
            );
        }

        Ok(Attempt::Finished(CommitStatus::Succeeded))
    }
}

impl fmt::Debug for ShadowTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowTree")
            .field("surface_id", &self.surface_id)
            .field("revision", &self.current.load().number())
            .finish_non_exhaustive()
    }
}
