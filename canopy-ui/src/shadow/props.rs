use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use smartstring::{LazyCompact, SmartString};

use crate::layout::LayoutStyle;

pub type ComponentName = SmartString<LazyCompact>;

/// Raw, unparsed props as they arrive from the producer side.
pub type RawProps = serde_json::Map<String, Value>;

pub type SharedProps = Arc<dyn Props>;

/// Stable identifier of a component type, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(pub u64);

impl ComponentHandle {
    /// FNV-1a over the component name.
    pub fn from_name(name: &str) -> Self {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in name.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        Self(hash)
    }
}

/// Capability every component's props payload exposes to the core.
///
/// The differ and the layout engine only ever see props through this trait,
/// so concrete components never need to be known here.
pub trait Props: fmt::Debug + Send + Sync + 'static {
    fn component_handle(&self) -> ComponentHandle;

    /// Value equality against props of any component type.
    fn props_eq(&self, other: &dyn Props) -> bool;

    fn field(&self, name: &str) -> Option<&Value>;

    fn layout_style(&self) -> LayoutStyle {
        LayoutStyle::from_fields(|name| self.field(name))
    }

    fn as_any(&self) -> &dyn Any;
}

/// Props backed by a JSON object; the default payload for descriptor-registered components.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicProps {
    handle: ComponentHandle,
    values: RawProps,
}

impl DynamicProps {
    pub fn new(handle: ComponentHandle, values: RawProps) -> Self {
        Self { handle, values }
    }

    pub fn empty(handle: ComponentHandle) -> Self {
        Self::new(handle, RawProps::new())
    }

    /// Applies `raw` on top of `base`. A `null` value resets the field.
    pub fn merged(handle: ComponentHandle, base: Option<&dyn Props>, raw: &RawProps) -> Self {
        let mut values = base
            .and_then(|props| props.as_any().downcast_ref::<DynamicProps>())
            .map(|props| props.values.clone())
            .unwrap_or_default();

        for (key, value) in raw {
            if value.is_null() {
                values.remove(key);
            } else {
                values.insert(key.clone(), value.clone());
            }
        }

        Self { handle, values }
    }

    pub fn values(&self) -> &RawProps {
        &self.values
    }
}

impl Props for DynamicProps {
    fn component_handle(&self) -> ComponentHandle {
        self.handle
    }

    fn props_eq(&self, other: &dyn Props) -> bool {
        other
            .as_any()
            .downcast_ref::<DynamicProps>()
            .is_some_and(|other| self == other)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
