mod context;
mod descriptor;
mod element;
mod family;
mod node;
mod props;
mod state;
mod traits;

pub use context::ContextContainer;
pub use descriptor::{ComponentDescriptor, ComponentDescriptorRegistry, ViewComponentDescriptor};
pub use element::Element;
pub use family::ShadowNodeFamily;
pub use node::{ShadowNode, ShadowNodeFragment, ShadowNodePtr};
pub use props::{ComponentHandle, ComponentName, DynamicProps, Props, RawProps, SharedProps};
pub use state::{SharedState, State, StateCoordinator, StateData, StateUpdate};
pub use traits::ShadowNodeTraits;
