use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Typed bag of shared services handed to the scheduler at construction.
#[derive(Default)]
pub struct ContextContainer {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ContextContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&self, value: T) {
        self.insert_shared(Arc::new(value));
    }

    pub fn insert_shared<T: Any + Send + Sync>(&self, value: Arc<T>) {
        self.entries.write().insert(TypeId::of::<T>(), value);
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let entry = self.entries.read().get(&TypeId::of::<T>())?.clone();
        entry.downcast::<T>().ok()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let entry = self.entries.write().remove(&TypeId::of::<T>())?;
        entry.downcast::<T>().ok()
    }
}

impl std::fmt::Debug for ContextContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextContainer")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}
