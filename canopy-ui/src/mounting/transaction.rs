use canopy_types::SurfaceId;

use super::{ShadowViewMutation, ShadowViewMutationList, TransactionTelemetry};
use crate::tree::RevisionNumber;

/// Mutations that bring the host from one delivered revision to the next.
#[derive(Debug, Clone)]
pub struct MountingTransaction {
    surface_id: SurfaceId,
    number: RevisionNumber,
    mutations: ShadowViewMutationList,
    telemetry: TransactionTelemetry,
}

impl MountingTransaction {
    pub fn new(
        surface_id: SurfaceId,
        number: RevisionNumber,
        mutations: ShadowViewMutationList,
        telemetry: TransactionTelemetry,
    ) -> Self {
        Self {
            surface_id,
            number,
            mutations,
            telemetry,
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Revision number this transaction brings the host to.
    pub fn number(&self) -> RevisionNumber {
        self.number
    }

    pub fn mutations(&self) -> &[ShadowViewMutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> ShadowViewMutationList {
        self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut TransactionTelemetry {
        &mut self.telemetry
    }
}
