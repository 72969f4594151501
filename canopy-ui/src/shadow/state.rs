use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use super::family::ShadowNodeFamily;
use crate::error::BoxError;

pub type StateData = Value;

pub type SharedState = Arc<State>;

/// Auxiliary per-family data that can change without a props commit.
#[derive(Debug)]
pub struct State {
    revision: u64,
    data: StateData,
    family: Weak<ShadowNodeFamily>,
}

impl State {
    /// First state of a family.
    pub fn initial(family: &Arc<ShadowNodeFamily>, data: StateData) -> SharedState {
        Arc::new(Self {
            revision: 1,
            data,
            family: Arc::downgrade(family),
        })
    }

    /// A state for the same family that supersedes both `self` and the
    /// family's most recently committed state.
    pub fn successor(&self, data: StateData) -> SharedState {
        let newest = self
            .most_recent_state()
            .map_or(self.revision, |state| state.revision.max(self.revision));
        Arc::new(Self {
            revision: newest + 1,
            data,
            family: self.family.clone(),
        })
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn data(&self) -> &StateData {
        &self.data
    }

    pub fn family(&self) -> Option<Arc<ShadowNodeFamily>> {
        self.family.upgrade()
    }

    pub fn most_recent_state(&self) -> Option<SharedState> {
        self.family().and_then(|family| family.most_recent_state())
    }
}

/// Tracks which state of a family was committed last.
#[derive(Default)]
pub struct StateCoordinator {
    most_recent: Mutex<Option<SharedState>>,
}

impl StateCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn most_recent(&self) -> Option<SharedState> {
        self.most_recent.lock().clone()
    }

    /// Records `state` unless a newer revision is already recorded.
    pub fn set_most_recent(&self, state: &SharedState) {
        let mut slot = self.most_recent.lock();
        match slot.as_ref() {
            Some(current) if current.revision >= state.revision => {}
            _ => *slot = Some(state.clone()),
        }
    }

    /// The committed state that should replace `state`, if `state` is outdated.
    pub fn newer_than(&self, state: &State) -> Option<SharedState> {
        self.most_recent
            .lock()
            .as_ref()
            .filter(|recent| recent.revision > state.revision)
            .cloned()
    }
}

impl fmt::Debug for StateCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let revision = self.most_recent.lock().as_ref().map(|state| state.revision);
        f.debug_struct("StateCoordinator")
            .field("most_recent_revision", &revision)
            .finish()
    }
}

type StateCallback = dyn Fn(&StateData) -> Result<Option<StateData>, BoxError> + Send + Sync;

/// A request to replace the state of one family.
///
/// The callback maps the current data to the new data; returning `None`
/// turns the commit into a no-op. It may run more than once when the commit
/// has to be retried against a newer revision.
pub struct StateUpdate {
    family: Arc<ShadowNodeFamily>,
    callback: Box<StateCallback>,
}

impl StateUpdate {
    pub fn new<F>(family: Arc<ShadowNodeFamily>, callback: F) -> Self
    where
        F: Fn(&StateData) -> Result<Option<StateData>, BoxError> + Send + Sync + 'static,
    {
        Self {
            family,
            callback: Box::new(callback),
        }
    }

    /// Update that unconditionally replaces the data.
    pub fn replace(family: Arc<ShadowNodeFamily>, data: StateData) -> Self {
        Self::new(family, move |_| Ok(Some(data.clone())))
    }

    pub fn family(&self) -> &Arc<ShadowNodeFamily> {
        &self.family
    }

    pub fn apply(&self, current: &StateData) -> Result<Option<StateData>, BoxError> {
        (self.callback)(current)
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpdate")
            .field("tag", &self.family.tag())
            .finish_non_exhaustive()
    }
}
