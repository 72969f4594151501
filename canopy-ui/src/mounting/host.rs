use canopy_types::SurfaceId;

use super::ShadowViewMutation;

/// A view layer that can apply mutation lists, e.g. a platform renderer.
pub trait HostViewLayer {
    type Error;

    /// Applies `mutations` in order.
    fn apply_mutations(
        &mut self,
        surface_id: SurfaceId,
        mutations: &[ShadowViewMutation],
    ) -> Result<(), Self::Error>;
}
