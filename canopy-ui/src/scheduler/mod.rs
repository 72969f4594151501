//! Entry point that wires the UI manager, surfaces and the host delegate together.

mod config;

pub use config::{DEFAULT_MAX_COMMIT_ATTEMPTS, DEFAULT_TELEMETRY_INTERVAL, SchedulerConfig};

use std::sync::Arc;

use canopy_types::{DisplayMode, LayoutConstraints, LayoutContext, SurfaceId};
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::events::RawEvent;
use crate::layout::{LayoutEngine, StackLayout};
use crate::mounting::MountingCoordinator;
use crate::shadow::{ComponentDescriptorRegistry, ContextContainer, Element, StateUpdate};
use crate::tree::{CommitOptions, CommitSource, CommitStatus, ShadowTreeRevision};
use crate::ui_manager::{UiManager, UiManagerDelegate};

/// Host side of a scheduler. Told whenever a visible surface has a
/// transaction ready to pull.
pub trait SchedulerDelegate: Send + Sync {
    fn scheduler_did_finish_transaction(&self, mounting_coordinator: &Arc<MountingCoordinator>);
}

/// Everything a scheduler is built from.
pub struct SchedulerToolbox {
    pub component_registry: Arc<ComponentDescriptorRegistry>,
    pub context_container: Arc<ContextContainer>,
    pub layout_engine: Arc<dyn LayoutEngine>,
    pub delegate: Option<Arc<dyn SchedulerDelegate>>,
}

impl Default for SchedulerToolbox {
    fn default() -> Self {
        Self {
            component_registry: Arc::new(ComponentDescriptorRegistry::with_defaults()),
            context_container: Arc::new(ContextContainer::new()),
            layout_engine: Arc::new(StackLayout),
            delegate: None,
        }
    }
}

struct DelegateForwarder {
    delegate: Arc<dyn SchedulerDelegate>,
}

impl UiManagerDelegate for DelegateForwarder {
    fn ui_manager_did_finish_transaction(
        &self,
        mounting_coordinator: &Arc<MountingCoordinator>,
        _mount_synchronously: bool,
    ) {
        if !mounting_coordinator.display_mode().is_visible() {
            return;
        }
        self.delegate
            .scheduler_did_finish_transaction(mounting_coordinator);
    }
}

pub struct Scheduler {
    ui_manager: Arc<UiManager>,
    delegate: Option<Arc<dyn SchedulerDelegate>>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(toolbox: SchedulerToolbox, config: SchedulerConfig) -> Self {
        let ui_manager = UiManager::new(
            toolbox.component_registry,
            toolbox.context_container,
            toolbox.layout_engine,
            config.clone(),
        );
        if let Some(delegate) = &toolbox.delegate {
            ui_manager.set_delegate(Some(Arc::new(DelegateForwarder {
                delegate: delegate.clone(),
            })));
        }
        info!(
            max_commit_attempts = config.max_commit_attempts(),
            state_reconciliation = config.state_reconciliation_enabled(),
            "scheduler created"
        );
        Self {
            ui_manager,
            delegate: toolbox.delegate,
            config,
        }
    }

    pub fn ui_manager(&self) -> &Arc<UiManager> {
        &self.ui_manager
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn start_surface(
        &self,
        surface_id: SurfaceId,
        constraints: LayoutConstraints,
        context: LayoutContext,
    ) -> Result<Arc<MountingCoordinator>, SchedulerError> {
        let tree = self
            .ui_manager
            .start_surface(surface_id, constraints, context)?;
        Ok(tree.mounting_coordinator().clone())
    }

    /// Tears the surface down. The returned coordinator still holds the
    /// transaction that deletes every view.
    pub fn stop_surface(
        &self,
        surface_id: SurfaceId,
    ) -> Result<Arc<MountingCoordinator>, SchedulerError> {
        let tree = self.ui_manager.stop_surface(surface_id)?;
        Ok(tree.mounting_coordinator().clone())
    }

    pub fn constrain_surface_layout(
        &self,
        surface_id: SurfaceId,
        constraints: LayoutConstraints,
        context: LayoutContext,
    ) -> Result<CommitStatus, SchedulerError> {
        self.ui_manager
            .constrain_surface_layout(surface_id, constraints, context)
    }

    /// Switching back to [`DisplayMode::Visible`] with queued revisions
    /// notifies the delegate so delivery resumes.
    pub fn set_display_mode(
        &self,
        surface_id: SurfaceId,
        display_mode: DisplayMode,
    ) -> Result<(), SchedulerError> {
        let coordinator = self.mounting_coordinator(surface_id)?;
        if !coordinator.set_display_mode(display_mode) {
            return Ok(());
        }
        if display_mode.is_visible() && coordinator.has_pending_transactions() {
            debug!(
                surface_id,
                queued = coordinator.pending_transactions(),
                "resuming delivery"
            );
            if let Some(delegate) = &self.delegate {
                delegate.scheduler_did_finish_transaction(&coordinator);
            }
        }
        Ok(())
    }

    /// Commits `elements` as the surface's new content, reusing every node
    /// of the current revision that did not change.
    pub fn render(
        &self,
        surface_id: SurfaceId,
        elements: &[Element],
    ) -> Result<CommitStatus, SchedulerError> {
        let current = self.current_revision(surface_id)?;
        let children = Element::build_all(
            elements,
            &self.ui_manager,
            surface_id,
            Some(current.root().node()),
        )?;
        let options = CommitOptions {
            enable_state_reconciliation: self.config.state_reconciliation_enabled(),
            source: CommitSource::Render,
            ..CommitOptions::default()
        };
        self.ui_manager
            .complete_surface(surface_id, children, &options)
    }

    pub fn update_state(&self, update: &StateUpdate) -> Result<CommitStatus, SchedulerError> {
        self.ui_manager.update_state(update)
    }

    pub fn current_revision(
        &self,
        surface_id: SurfaceId,
    ) -> Result<Arc<ShadowTreeRevision>, SchedulerError> {
        self.ui_manager
            .shadow_tree_registry()
            .visit(surface_id, |tree| tree.current_revision())
            .ok_or(SchedulerError::SurfaceNotFound(surface_id))
    }

    pub fn mounting_coordinator(
        &self,
        surface_id: SurfaceId,
    ) -> Result<Arc<MountingCoordinator>, SchedulerError> {
        self.ui_manager
            .shadow_tree_registry()
            .visit(surface_id, |tree| tree.mounting_coordinator().clone())
            .ok_or(SchedulerError::SurfaceNotFound(surface_id))
    }

    pub fn running_surfaces(&self) -> Vec<SurfaceId> {
        self.ui_manager.shadow_tree_registry().surface_ids()
    }

    /// Takes every event the host raised since the last call, oldest first.
    pub fn drain_events(&self) -> Vec<RawEvent> {
        self.ui_manager.event_dispatcher().drain()
    }
}
