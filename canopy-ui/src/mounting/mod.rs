mod coordinator;
mod differ;
mod host;
mod mutation;
mod stub;
mod telemetry;
mod transaction;
mod view;

pub use coordinator::MountingCoordinator;
pub use differ::calculate_shadow_view_mutations;
pub use host::HostViewLayer;
pub use mutation::{MutationKind, ShadowViewMutation, ShadowViewMutationList};
pub use stub::{StubView, StubViewError, StubViewTree};
pub use telemetry::{SurfaceTelemetry, TransactionTelemetry};
pub use transaction::MountingTransaction;
pub use view::ShadowView;
