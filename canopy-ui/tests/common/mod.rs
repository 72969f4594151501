#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use canopy_ui::scheduler::SchedulerToolbox;
use canopy_ui::{
    ComponentHandle, DynamicProps, EventEmitter, LayoutConstraints, LayoutContext,
    MountingCoordinator, RootShadowNode, Scheduler, SchedulerConfig, SchedulerDelegate,
    ShadowNode, ShadowNodeFamily, ShadowNodePtr, ShadowViewMutation, Size, SurfaceId,
    Tag, ViewComponentDescriptor,
};
use serde_json::{Value, json};

pub const SURFACE: SurfaceId = 1;

pub fn screen() -> LayoutConstraints {
    LayoutConstraints::exact(Size::new(100.0, 200.0))
}

pub fn scheduler() -> Scheduler {
    scheduler_with(SchedulerToolbox::default(), SchedulerConfig::default())
}

pub fn scheduler_with(toolbox: SchedulerToolbox, config: SchedulerConfig) -> Scheduler {
    let scheduler = Scheduler::new(toolbox, config);
    scheduler
        .start_surface(SURFACE, screen(), LayoutContext::default())
        .unwrap();
    scheduler
}

/// Root children of the surface's current revision.
pub fn committed_children(scheduler: &Scheduler) -> Vec<ShadowNodePtr> {
    scheduler
        .current_revision(SURFACE)
        .unwrap()
        .root()
        .children()
        .to_vec()
}

/// Empty, unlaid root with the same shape `start_surface` produces.
pub fn root() -> RootShadowNode {
    RootShadowNode::for_surface(
        SURFACE,
        screen(),
        LayoutContext::default(),
        Arc::new(EventEmitter::detached(SURFACE)),
    )
}

pub fn node(component: &str, tag: Tag, props: Value, children: Vec<ShadowNodePtr>) -> ShadowNodePtr {
    let family = ShadowNodeFamily::new(
        tag,
        SURFACE,
        Arc::new(EventEmitter::detached(tag)),
        Arc::new(ViewComponentDescriptor::new(component)),
    );
    let Value::Object(values) = props else {
        panic!("props must be an object");
    };
    let props = Arc::new(DynamicProps::new(ComponentHandle::from_name(component), values));
    Arc::new(ShadowNode::new(family, props, None, children))
}

pub fn view(tag: Tag, children: Vec<ShadowNodePtr>) -> ShadowNodePtr {
    node("View", tag, json!({}), children)
}

pub fn text(tag: Tag, content: &str) -> ShadowNodePtr {
    node("Text", tag, json!({ "text": content }), Vec::new())
}

/// Same family, new props.
pub fn retext(node: &ShadowNode, content: &str) -> ShadowNodePtr {
    let Value::Object(values) = json!({ "text": content }) else {
        unreachable!();
    };
    let props = Arc::new(DynamicProps::new(node.component_handle(), values));
    Arc::new(node.clone_with(canopy_ui::ShadowNodeFragment::new().props(props)))
}

pub fn describe(mutations: &[ShadowViewMutation]) -> Vec<String> {
    mutations.iter().map(ToString::to_string).collect()
}

/// Counts the notifications a host would get.
#[derive(Default)]
pub struct CountingDelegate {
    notified: AtomicUsize,
}

impl CountingDelegate {
    pub fn count(&self) -> usize {
        self.notified.load(Ordering::SeqCst)
    }
}

impl SchedulerDelegate for CountingDelegate {
    fn scheduler_did_finish_transaction(&self, _mounting_coordinator: &Arc<MountingCoordinator>) {
        self.notified.fetch_add(1, Ordering::SeqCst);
    }
}
