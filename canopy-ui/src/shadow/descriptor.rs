use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::props::{ComponentHandle, ComponentName, DynamicProps, RawProps, SharedProps};
use super::state::StateData;
use super::traits::ShadowNodeTraits;
use crate::error::BoxError;

/// Knows how to build props and initial state for one component type.
///
/// One descriptor instance is shared by every node of its component type.
pub trait ComponentDescriptor: Send + Sync + 'static {
    fn component_name(&self) -> &ComponentName;

    fn component_handle(&self) -> ComponentHandle {
        ComponentHandle::from_name(self.component_name())
    }

    fn traits(&self) -> ShadowNodeTraits {
        ShadowNodeTraits::VIEW_KIND
    }

    /// Parses `raw` on top of `base` (or on top of defaults when `base` is `None`).
    fn clone_props(&self, base: Option<&SharedProps>, raw: &RawProps)
    -> Result<SharedProps, BoxError>;

    fn initial_state_data(&self, _props: &SharedProps) -> Option<StateData> {
        None
    }
}

/// Descriptor for components whose props are kept as plain JSON.
#[derive(Debug, Clone)]
pub struct ViewComponentDescriptor {
    name: ComponentName,
    handle: ComponentHandle,
    traits: ShadowNodeTraits,
    initial_state: Option<StateData>,
}

impl ViewComponentDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: ComponentName::from(name),
            handle: ComponentHandle::from_name(name),
            traits: ShadowNodeTraits::VIEW_KIND,
            initial_state: None,
        }
    }

    pub fn with_traits(mut self, traits: ShadowNodeTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Every node of this component starts with a state holding `data`.
    pub fn with_initial_state(mut self, data: StateData) -> Self {
        self.initial_state = Some(data);
        self
    }
}

impl ComponentDescriptor for ViewComponentDescriptor {
    fn component_name(&self) -> &ComponentName {
        &self.name
    }

    fn component_handle(&self) -> ComponentHandle {
        self.handle
    }

    fn traits(&self) -> ShadowNodeTraits {
        self.traits
    }

    fn clone_props(
        &self,
        base: Option<&SharedProps>,
        raw: &RawProps,
    ) -> Result<SharedProps, BoxError> {
        let props = DynamicProps::merged(self.handle, base.map(|props| props.as_ref()), raw);
        Ok(Arc::new(props))
    }

    fn initial_state_data(&self, _props: &SharedProps) -> Option<StateData> {
        self.initial_state.clone()
    }
}

/// Component name to descriptor map, passed explicitly to the scheduler.
#[derive(Default)]
pub struct ComponentDescriptorRegistry {
    descriptors: RwLock<HashMap<ComponentName, Arc<dyn ComponentDescriptor>>>,
}

impl ComponentDescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with plain descriptors for `View`, `Text` and `RawText`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(ViewComponentDescriptor::new("View"));
        registry.register(ViewComponentDescriptor::new("Text"));
        registry.register(
            ViewComponentDescriptor::new("RawText")
                .with_traits(ShadowNodeTraits::RAW_TEXT | ShadowNodeTraits::LEAF_YOGA_NODE),
        );
        registry
    }

    /// Adds or replaces the descriptor for its component name.
    pub fn register<D: ComponentDescriptor>(&self, descriptor: D) {
        self.register_shared(Arc::new(descriptor));
    }

    pub fn register_shared(&self, descriptor: Arc<dyn ComponentDescriptor>) {
        let name = descriptor.component_name().clone();
        self.descriptors.write().insert(name, descriptor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ComponentDescriptor>> {
        self.descriptors.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_lookup() {
        let registry = ComponentDescriptorRegistry::with_defaults();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("View"));
        assert!(registry.get("Image").is_none());

        let raw_text = registry.get("RawText").unwrap();
        assert!(raw_text.traits().contains(ShadowNodeTraits::RAW_TEXT));
    }

    #[test]
    fn test_register_replaces_existing() {
        let registry = ComponentDescriptorRegistry::with_defaults();
        registry.register(ViewComponentDescriptor::new("View").with_initial_state(json!(1)));
        assert_eq!(registry.len(), 3);

        let view = registry.get("View").unwrap();
        let props = view.clone_props(None, &RawProps::new()).unwrap();
        assert_eq!(view.initial_state_data(&props), Some(json!(1)));
    }

    #[test]
    fn test_clone_props_merges_base() {
        let descriptor = ViewComponentDescriptor::new("View");
        let mut raw = RawProps::new();
        raw.insert("width".into(), json!(10));
        let base = descriptor.clone_props(None, &raw).unwrap();

        let mut raw = RawProps::new();
        raw.insert("height".into(), json!(4));
        let props = descriptor.clone_props(Some(&base), &raw).unwrap();

        assert_eq!(props.field("width"), Some(&json!(10)));
        assert_eq!(props.field("height"), Some(&json!(4)));
        assert_eq!(props.component_handle(), descriptor.component_handle());
    }
}
