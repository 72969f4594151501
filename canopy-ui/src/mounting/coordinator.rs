use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use canopy_types::{DisplayMode, SurfaceId};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use super::{
    HostViewLayer, MountingTransaction, SurfaceTelemetry, calculate_shadow_view_mutations,
};
use crate::tree::{RevisionNumber, ShadowTreeRevision};

#[derive(Debug)]
struct Pending {
    revisions: VecDeque<Arc<ShadowTreeRevision>>,
    display_mode: DisplayMode,
}

impl Pending {
    fn deliverable(&self) -> bool {
        self.display_mode.is_visible() && !self.revisions.is_empty()
    }
}

/// Hands committed revisions of one surface to the host, in commit order
/// and exactly once.
///
/// Commits only enqueue revisions. The diff against the last delivered
/// revision is computed when the host pulls, outside the queue lock, so
/// committing threads never wait on diffing and the host never waits on a
/// commit.
#[derive(Debug)]
pub struct MountingCoordinator {
    surface_id: SurfaceId,
    pending: Mutex<Pending>,
    signal: Condvar,
    /// Held for the whole of a pull; readers of `base` never take it.
    pulling: Mutex<()>,
    base: ArcSwap<ShadowTreeRevision>,
    telemetry: Mutex<SurfaceTelemetry>,
}

impl MountingCoordinator {
    pub fn new(base: Arc<ShadowTreeRevision>, telemetry_interval: Duration) -> Self {
        Self {
            surface_id: base.root().surface_id(),
            pending: Mutex::new(Pending {
                revisions: VecDeque::new(),
                display_mode: DisplayMode::Visible,
            }),
            signal: Condvar::new(),
            pulling: Mutex::new(()),
            base: ArcSwap::new(base),
            telemetry: Mutex::new(SurfaceTelemetry::new(telemetry_interval)),
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub(crate) fn push(&self, revision: Arc<ShadowTreeRevision>) {
        let mut pending = self.pending.lock();
        trace!(
            surface_id = self.surface_id,
            revision = revision.number(),
            queued = pending.revisions.len() + 1,
            "revision queued for mounting"
        );
        pending.revisions.push_back(revision);
        if pending.display_mode.is_visible() {
            self.signal.notify_all();
        }
    }

    /// Takes the oldest undelivered revision as a transaction.
    ///
    /// Returns `None` when nothing is queued, when the surface is not
    /// visible, or when another thread is pulling at the same moment.
    pub fn pull_transaction(&self) -> Option<MountingTransaction> {
        let _pulling = self.pulling.try_lock()?;
        let revision = {
            let mut pending = self.pending.lock();
            if !pending.display_mode.is_visible() {
                return None;
            }
            pending.revisions.pop_front()?
        };
        Some(self.transaction_to(revision))
    }

    /// Like [`pull_transaction`](Self::pull_transaction), but folds every
    /// queued revision into one transaction that ends at the newest one.
    pub fn pull_coalesced_transaction(&self) -> Option<MountingTransaction> {
        let _pulling = self.pulling.try_lock()?;
        let revision = {
            let mut pending = self.pending.lock();
            if !pending.display_mode.is_visible() {
                return None;
            }
            let newest = pending.revisions.pop_back()?;
            let skipped = pending.revisions.len();
            pending.revisions.clear();
            if skipped > 0 {
                debug!(surface_id = self.surface_id, skipped, revision = newest.number(), "coalescing revisions");
            }
            newest
        };
        Some(self.transaction_to(revision))
    }

    /// Diffs `revision` against the delivered base and makes it the new base.
    /// Callers hold `pulling`.
    fn transaction_to(&self, revision: Arc<ShadowTreeRevision>) -> MountingTransaction {
        let base = self.base.load_full();
        let mut telemetry = *revision.telemetry();
        telemetry.will_diff();
        let mutations =
            calculate_shadow_view_mutations(base.root().node(), revision.root().node());
        telemetry.did_diff();

        trace!(
            surface_id = self.surface_id,
            from = base.number(),
            to = revision.number(),
            mutations = mutations.len(),
            "transaction pulled"
        );

        let number = revision.number();
        self.base.store(revision);
        MountingTransaction::new(self.surface_id, number, mutations, telemetry)
    }

    /// Blocks until a transaction can be pulled or `timeout` passes.
    pub fn wait_for_transaction(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        while !pending.deliverable() {
            if self.signal.wait_until(&mut pending, deadline).timed_out() {
                return pending.deliverable();
            }
        }
        true
    }

    pub fn has_pending_transactions(&self) -> bool {
        !self.pending.lock().revisions.is_empty()
    }

    pub fn pending_transactions(&self) -> usize {
        self.pending.lock().revisions.len()
    }

    /// The last revision handed to the host.
    pub fn base_revision(&self) -> Arc<ShadowTreeRevision> {
        self.base.load_full()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.pending.lock().display_mode
    }

    /// Returns whether the mode changed. Queued revisions are kept.
    pub fn set_display_mode(&self, display_mode: DisplayMode) -> bool {
        let mut pending = self.pending.lock();
        if pending.display_mode == display_mode {
            return false;
        }
        debug!(
            surface_id = self.surface_id,
            from = pending.display_mode.as_str(),
            to = display_mode.as_str(),
            queued = pending.revisions.len(),
            "display mode changed"
        );
        pending.display_mode = display_mode;
        if pending.deliverable() {
            self.signal.notify_all();
        }
        true
    }

    /// Records a mounted transaction in the surface telemetry.
    pub fn did_mount(&self, transaction: &MountingTransaction) {
        let mut telemetry = self.telemetry.lock();
        telemetry.record(
            transaction.number(),
            transaction.mutations().len(),
            transaction.telemetry(),
        );
        telemetry.maybe_emit(self.surface_id);
    }

    pub fn mounted_transactions(&self) -> u64 {
        self.telemetry.lock().lifetime_transactions()
    }

    /// Pulls one transaction and applies it to `host`.
    ///
    /// Returns the revision the host is now at, or `None` if nothing was
    /// pulled. The transaction counts as delivered even if `host` fails.
    pub fn mount_into<H>(&self, host: &mut H) -> Result<Option<RevisionNumber>, H::Error>
    where
        H: HostViewLayer + ?Sized,
    {
        self.mount(self.pull_transaction(), host)
    }

    /// [`mount_into`](Self::mount_into) with every queued revision folded
    /// into one transaction.
    pub fn mount_coalesced_into<H>(&self, host: &mut H) -> Result<Option<RevisionNumber>, H::Error>
    where
        H: HostViewLayer + ?Sized,
    {
        self.mount(self.pull_coalesced_transaction(), host)
    }

    fn mount<H>(
        &self,
        transaction: Option<MountingTransaction>,
        host: &mut H,
    ) -> Result<Option<RevisionNumber>, H::Error>
    where
        H: HostViewLayer + ?Sized,
    {
        let Some(mut transaction) = transaction else {
            return Ok(None);
        };
        transaction.telemetry_mut().will_mount();
        host.apply_mutations(self.surface_id, transaction.mutations())?;
        transaction.telemetry_mut().did_mount();
        self.did_mount(&transaction);
        Ok(Some(transaction.number()))
    }
}
