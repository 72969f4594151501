use std::sync::Arc;

use super::root::RootShadowNode;
use crate::mounting::TransactionTelemetry;

pub type RevisionNumber = u64;

/// Immutable snapshot of a shadow tree after one commit.
#[derive(Debug, Clone)]
pub struct ShadowTreeRevision {
    root: Arc<RootShadowNode>,
    number: RevisionNumber,
    telemetry: TransactionTelemetry,
}

impl ShadowTreeRevision {
    /// Number of the revision a shadow tree starts with, before any commit.
    pub const INITIAL: RevisionNumber = 0;

    pub fn new(
        root: Arc<RootShadowNode>,
        number: RevisionNumber,
        telemetry: TransactionTelemetry,
    ) -> Self {
        Self {
            root,
            number,
            telemetry,
        }
    }

    pub fn root(&self) -> &Arc<RootShadowNode> {
        &self.root
    }

    pub fn number(&self) -> RevisionNumber {
        self.number
    }

    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }
}
