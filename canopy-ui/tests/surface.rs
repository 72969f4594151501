//! Surfaces driven through the scheduler: rendering, hooks, state, delivery.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use canopy_ui::{
    BoxError, CommitError, CommitOptions, CommitStatus, DisplayMode, Element, LayoutConstraints,
    LayoutContext, RootShadowNode, Scheduler, SchedulerConfig, SchedulerDelegate, SchedulerError,
    SchedulerToolbox, ShadowNodeTraits, ShadowTree, ShadowView, Size, StateUpdate, StubViewTree,
    UiManager, UiManagerCommitHook, ViewComponentDescriptor,
};
use common::{CountingDelegate, SURFACE, committed_children, describe, scheduler, scheduler_with, screen};
use serde_json::json;

fn scroll_scheduler() -> Scheduler {
    let toolbox = SchedulerToolbox::default();
    toolbox
        .component_registry
        .register(ViewComponentDescriptor::new("ScrollView").with_initial_state(json!({ "offset": 0 })));
    scheduler_with(toolbox, SchedulerConfig::default())
}

/// Re-rendering the same description reuses unchanged nodes, and the host
/// only hears about what changed.
#[test]
fn test_render_reuses_unchanged_nodes() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let content = |test_id: &str| {
        vec![
            Element::view(2).child(Element::text(3, "a")),
            Element::view(4).prop("testID", test_id),
        ]
    };

    scheduler.render(SURFACE, &content("before")).unwrap();
    coordinator.pull_transaction().unwrap();
    let first = committed_children(&scheduler);

    scheduler.render(SURFACE, &content("after")).unwrap();
    let second = committed_children(&scheduler);

    assert!(Arc::ptr_eq(&first[0], &second[0]));
    assert!(second[1].same_family(&first[1]));
    let transaction = coordinator.pull_transaction().unwrap();
    assert_eq!(describe(transaction.mutations()), vec!["Update [4] in [1] @1"]);
}

#[test]
fn test_render_of_identical_tree_publishes_empty_transaction() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let content = [Element::text(10, "Hi")];

    scheduler.render(SURFACE, &content).unwrap();
    coordinator.pull_transaction().unwrap();
    scheduler.render(SURFACE, &content).unwrap();

    let transaction = coordinator.pull_transaction().unwrap();
    assert_eq!(transaction.number(), 2);
    assert!(transaction.is_empty());
}

#[test]
fn test_render_sibling_then_text_change() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();

    scheduler.render(SURFACE, &[Element::text(10, "Hi")]).unwrap();
    coordinator.pull_transaction().unwrap();
    let hi = committed_children(&scheduler)[0].clone();

    scheduler
        .render(SURFACE, &[Element::text(10, "Hi"), Element::text(11, "Bye")])
        .unwrap();
    let transaction = coordinator.pull_transaction().unwrap();
    assert_eq!(
        describe(transaction.mutations()),
        vec!["Create [11] Text", "Insert [11] into [1] @1"]
    );
    assert!(Arc::ptr_eq(&hi, &committed_children(&scheduler)[0]));

    scheduler
        .render(SURFACE, &[Element::text(10, "Hello"), Element::text(11, "Bye")])
        .unwrap();
    let transaction = coordinator.pull_transaction().unwrap();
    assert_eq!(describe(transaction.mutations()), vec!["Update [10] in [1] @0"]);
}

#[test]
fn test_unknown_component_is_rejected() {
    let scheduler = scheduler();

    let error = scheduler
        .render(SURFACE, &[Element::new("Slider", 2)])
        .unwrap_err();

    assert!(matches!(error, SchedulerError::UnknownComponent(name) if name == "Slider"));
    assert_eq!(scheduler.current_revision(SURFACE).unwrap().number(), 0);
}

#[test]
fn test_surface_lifecycle() {
    let scheduler = scheduler();
    assert!(matches!(
        scheduler.start_surface(SURFACE, screen(), LayoutContext::default()),
        Err(SchedulerError::SurfaceAlreadyRunning(SURFACE))
    ));

    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let mut host = StubViewTree::new(&ShadowView::new(coordinator.base_revision().root().node()));
    scheduler
        .render(SURFACE, &[Element::view(2).child(Element::text(3, "a")), Element::view(4)])
        .unwrap();
    coordinator.mount_into(&mut host).unwrap();
    assert_eq!(host.len(), 4);

    let stopped = scheduler.stop_surface(SURFACE).unwrap();
    assert_eq!(stopped.mount_into(&mut host).unwrap(), Some(2));
    assert_eq!(host.len(), 1);
    assert!(host.children_of(SURFACE).is_empty());

    assert!(scheduler.running_surfaces().is_empty());
    assert!(matches!(
        scheduler.render(SURFACE, &[Element::view(2)]),
        Err(SchedulerError::SurfaceNotFound(SURFACE))
    ));
    scheduler
        .start_surface(SURFACE, screen(), LayoutContext::default())
        .unwrap();
    assert_eq!(scheduler.running_surfaces(), vec![SURFACE]);
}

#[test]
fn test_constrain_surface_layout() {
    let scheduler = scheduler();
    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();

    let unchanged = scheduler
        .constrain_surface_layout(SURFACE, screen(), LayoutContext::default())
        .unwrap();
    assert_eq!(unchanged, CommitStatus::NoOp);

    let resized = scheduler
        .constrain_surface_layout(
            SURFACE,
            LayoutConstraints::exact(Size::new(320.0, 480.0)),
            LayoutContext::default(),
        )
        .unwrap();
    assert_eq!(resized, CommitStatus::Succeeded);
    let revision = scheduler.current_revision(SURFACE).unwrap();
    assert_eq!(revision.number(), 2);
    assert_eq!(revision.root().node().layout_metrics().frame.size, Size::new(320.0, 480.0));
}

struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl UiManagerCommitHook for Recorder {
    fn commit_hook_was_registered(&self, _ui_manager: &UiManager) {
        self.log.lock().unwrap().push(format!("registered {}", self.name));
    }

    fn commit_hook_was_unregistered(&self, _ui_manager: &UiManager) {
        self.log.lock().unwrap().push(format!("unregistered {}", self.name));
    }

    fn shadow_tree_will_commit(
        &self,
        _shadow_tree: &ShadowTree,
        _old_root: &RootShadowNode,
        new_root: RootShadowNode,
        _options: &CommitOptions,
    ) -> Result<RootShadowNode, BoxError> {
        self.log.lock().unwrap().push(self.name.to_string());
        Ok(new_root)
    }
}

/// Appends a view to every committed root.
struct Badge;

impl UiManagerCommitHook for Badge {
    fn shadow_tree_will_commit(
        &self,
        _shadow_tree: &ShadowTree,
        _old_root: &RootShadowNode,
        new_root: RootShadowNode,
        _options: &CommitOptions,
    ) -> Result<RootShadowNode, BoxError> {
        let mut children = new_root.children().to_vec();
        children.push(common::view(99, Vec::new()));
        Ok(new_root.with_children(children))
    }
}

struct Veto;

impl UiManagerCommitHook for Veto {
    fn shadow_tree_will_commit(
        &self,
        _shadow_tree: &ShadowTree,
        _old_root: &RootShadowNode,
        _new_root: RootShadowNode,
        _options: &CommitOptions,
    ) -> Result<RootShadowNode, BoxError> {
        Err("tree rejected".into())
    }
}

#[test]
fn test_commit_hooks_run_in_registration_order() {
    let scheduler = scheduler();
    let ui_manager = scheduler.ui_manager();
    let log = Arc::new(Mutex::new(Vec::new()));
    let first: Arc<dyn UiManagerCommitHook> = Arc::new(Recorder { name: "first", log: log.clone() });
    let second: Arc<dyn UiManagerCommitHook> = Arc::new(Recorder { name: "second", log: log.clone() });

    ui_manager.register_commit_hook(first.clone());
    ui_manager.register_commit_hook(second.clone());
    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();
    ui_manager.unregister_commit_hook(&first);
    scheduler.render(SURFACE, &[Element::view(3)]).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["registered first", "registered second", "first", "second", "unregistered first", "second"]
    );
    assert_eq!(ui_manager.commit_hook_count(), 1);
}

#[test]
fn test_commit_hook_can_rewrite_tree() {
    let scheduler = scheduler();
    scheduler.ui_manager().register_commit_hook(Arc::new(Badge));

    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();

    let tags: Vec<_> = committed_children(&scheduler).iter().map(|child| child.tag()).collect();
    assert_eq!(tags, vec![2, 99]);
}

#[test]
fn test_commit_hook_error_aborts_commit() {
    let scheduler = scheduler();
    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();
    scheduler.ui_manager().register_commit_hook(Arc::new(Veto));

    let error = scheduler.render(SURFACE, &[Element::view(3)]).unwrap_err();

    assert!(matches!(error, SchedulerError::Commit(CommitError::CommitHook(_))));
    assert_eq!(scheduler.current_revision(SURFACE).unwrap().number(), 1);
    assert_eq!(committed_children(&scheduler)[0].tag(), 2);
}

#[test]
#[should_panic(expected = "registered twice")]
fn test_double_hook_registration_panics() {
    let scheduler = scheduler();
    let hook: Arc<dyn UiManagerCommitHook> = Arc::new(Badge);

    scheduler.ui_manager().register_commit_hook(hook.clone());
    scheduler.ui_manager().register_commit_hook(hook);
}

#[test]
#[should_panic(expected = "never registered")]
fn test_unregistering_unknown_hook_panics() {
    let scheduler = scheduler();
    let hook: Arc<dyn UiManagerCommitHook> = Arc::new(Badge);

    scheduler.ui_manager().unregister_commit_hook(&hook);
}

#[test]
fn test_state_update_commits_successor() {
    let scheduler = scroll_scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    scheduler.render(SURFACE, &[Element::new("ScrollView", 5)]).unwrap();
    coordinator.pull_transaction().unwrap();
    let rendered = committed_children(&scheduler)[0].clone();
    assert_eq!(rendered.state().unwrap().revision(), 1);

    let update = StateUpdate::new(rendered.family().clone(), |data| {
        let offset = data["offset"].as_i64().unwrap_or(0);
        Ok(Some(json!({ "offset": offset + 30 })))
    });
    assert_eq!(scheduler.update_state(&update).unwrap(), CommitStatus::Succeeded);

    let updated = scheduler
        .ui_manager()
        .newest_clone_of_shadow_node(&rendered)
        .unwrap();
    let state = updated.state().unwrap();
    assert_eq!(state.revision(), 2);
    assert_eq!(state.data(), &json!({ "offset": 30 }));
    assert!(updated.traits().contains(ShadowNodeTraits::CLONED_BY_NATIVE_STATE_UPDATE));
    assert_eq!(rendered.family().most_recent_state().unwrap().revision(), 2);

    let transaction = coordinator.pull_transaction().unwrap();
    assert_eq!(describe(transaction.mutations()), vec!["Update [5] in [1] @0"]);
}

#[test]
fn test_declined_or_failed_state_update_publishes_nothing() {
    let scheduler = scroll_scheduler();
    scheduler.render(SURFACE, &[Element::new("ScrollView", 5)]).unwrap();
    let family = committed_children(&scheduler)[0].family().clone();

    let declined = StateUpdate::new(family.clone(), |_| Ok(None));
    assert_eq!(scheduler.update_state(&declined).unwrap(), CommitStatus::NoOp);

    let failing = StateUpdate::new(family, |_| Err("bad state".into()));
    let error = scheduler.update_state(&failing).unwrap_err();
    assert!(matches!(error, SchedulerError::Commit(CommitError::Transaction(_))));

    assert_eq!(scheduler.current_revision(SURFACE).unwrap().number(), 1);
}

/// A tree built before a state update does not roll the state back when
/// reconciliation is on.
#[test]
fn test_state_reconciliation_progresses_stale_trees() {
    let scheduler = scroll_scheduler();
    scheduler.render(SURFACE, &[Element::new("ScrollView", 5)]).unwrap();
    let stale = committed_children(&scheduler);
    let update = StateUpdate::replace(stale[0].family().clone(), json!({ "offset": 12 }));
    scheduler.update_state(&update).unwrap();

    let reconciled = CommitOptions {
        enable_state_reconciliation: true,
        ..CommitOptions::default()
    };
    scheduler
        .ui_manager()
        .complete_surface(SURFACE, stale.clone(), &reconciled)
        .unwrap();
    let state = committed_children(&scheduler)[0].state().cloned().unwrap();
    assert_eq!(state.revision(), 2);
    assert_eq!(state.data(), &json!({ "offset": 12 }));

    scheduler
        .ui_manager()
        .complete_surface(SURFACE, stale, &CommitOptions::default())
        .unwrap();
    assert_eq!(committed_children(&scheduler)[0].state().unwrap().revision(), 1);
}

fn delegated_scheduler() -> (Scheduler, Arc<CountingDelegate>) {
    let delegate = Arc::new(CountingDelegate::default());
    let toolbox = SchedulerToolbox {
        delegate: Some(delegate.clone() as Arc<dyn SchedulerDelegate>),
        ..SchedulerToolbox::default()
    };
    (scheduler_with(toolbox, SchedulerConfig::default()), delegate)
}

/// Commits keep going while a surface is hidden; delivery resumes in order
/// once it is visible again.
#[test]
fn test_hidden_surface_defers_delivery() {
    let (scheduler, delegate) = delegated_scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();

    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();
    assert_eq!(delegate.count(), 1);
    coordinator.pull_transaction().unwrap();

    scheduler.set_display_mode(SURFACE, DisplayMode::Hidden).unwrap();
    scheduler
        .render(SURFACE, &[Element::view(2), Element::view(3)])
        .unwrap();
    scheduler
        .render(SURFACE, &[Element::view(2), Element::view(3), Element::view(4)])
        .unwrap();

    assert_eq!(delegate.count(), 1);
    assert!(coordinator.pull_transaction().is_none());
    assert!(coordinator.has_pending_transactions());
    assert!(!coordinator.wait_for_transaction(Duration::from_millis(10)));

    scheduler.set_display_mode(SURFACE, DisplayMode::Visible).unwrap();
    assert_eq!(delegate.count(), 2);
    assert_eq!(coordinator.pull_transaction().unwrap().number(), 2);
    assert_eq!(coordinator.pull_transaction().unwrap().number(), 3);
    assert!(coordinator.pull_transaction().is_none());
}

#[test]
fn test_coalesced_pull_skips_to_newest() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let mut host = StubViewTree::new(&ShadowView::new(coordinator.base_revision().root().node()));

    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();
    scheduler.render(SURFACE, &[Element::view(3), Element::view(2)]).unwrap();
    scheduler.render(SURFACE, &[Element::view(3)]).unwrap();
    assert_eq!(coordinator.pending_transactions(), 3);

    let transaction = coordinator.pull_coalesced_transaction().unwrap();
    assert_eq!(transaction.number(), 3);
    assert!(transaction.mutations().iter().all(|mutation| mutation.tag() != 2));
    host.apply(transaction.mutations()).unwrap();

    assert!(!coordinator.has_pending_transactions());
    assert_eq!(coordinator.base_revision().number(), 3);
    let current = scheduler.current_revision(SURFACE).unwrap();
    assert_eq!(host, StubViewTree::from_shadow_tree(current.root().node()));
}

#[test]
fn test_mount_into_follows_every_revision() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let mut host = StubViewTree::new(&ShadowView::new(coordinator.base_revision().root().node()));

    scheduler
        .render(SURFACE, &[Element::view(2).child(Element::text(3, "a")), Element::view(4)])
        .unwrap();
    scheduler
        .render(SURFACE, &[Element::view(4), Element::view(2).child(Element::text(5, "b"))])
        .unwrap();

    let mut mounted = Vec::new();
    while let Some(revision) = coordinator.mount_into(&mut host).unwrap() {
        mounted.push(revision);
    }

    assert_eq!(mounted, vec![1, 2]);
    assert_eq!(coordinator.mounted_transactions(), 2);
    let current = scheduler.current_revision(SURFACE).unwrap();
    assert_eq!(host, StubViewTree::from_shadow_tree(current.root().node()));
}

/// Coalesced mounting delivers the newest revision as one recorded transaction.
#[test]
fn test_mount_coalesced_into_records_one_transaction() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let mut host = StubViewTree::new(&ShadowView::new(coordinator.base_revision().root().node()));

    scheduler.render(SURFACE, &[Element::view(2)]).unwrap();
    scheduler.render(SURFACE, &[Element::view(2), Element::text(3, "x")]).unwrap();
    scheduler.render(SURFACE, &[Element::text(3, "y")]).unwrap();

    assert_eq!(coordinator.mount_coalesced_into(&mut host).unwrap(), Some(3));
    assert_eq!(coordinator.mount_coalesced_into(&mut host).unwrap(), None);
    assert_eq!(coordinator.mounted_transactions(), 1);
    let current = scheduler.current_revision(SURFACE).unwrap();
    assert_eq!(host, StubViewTree::from_shadow_tree(current.root().node()));
}

/// Reading the delivered revision from another thread never makes a pull
/// come back empty.
#[test]
fn test_pull_ignores_concurrent_base_readers() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let base = coordinator.base_revision();
                assert!(base.number() <= 50);
            }
        });

        for round in 1..=50u64 {
            let content = [Element::text(2, &round.to_string())];
            scheduler.render(SURFACE, &content).unwrap();
            let transaction = coordinator.pull_transaction().unwrap();
            assert_eq!(transaction.number(), round);
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(coordinator.base_revision().number(), 50);
}

#[test]
fn test_wait_for_transaction_wakes_on_commit() {
    let scheduler = scheduler();
    let coordinator = scheduler.mounting_coordinator(SURFACE).unwrap();

    thread::scope(|scope| {
        let waiter = scope.spawn(|| coordinator.wait_for_transaction(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(20));
        scheduler.render(SURFACE, &[Element::view(2)]).unwrap();
        assert!(waiter.join().unwrap());
    });
    assert!(coordinator.pull_transaction().is_some());
}

#[test]
fn test_events_reach_the_dispatcher_in_order() {
    let scheduler = scheduler();
    scheduler
        .render(SURFACE, &[Element::view(2), Element::view(3)])
        .unwrap();
    let children = committed_children(&scheduler);

    assert!(children[1].event_emitter().dispatch("press", json!({ "x": 4 })));
    assert!(children[0].event_emitter().dispatch("scroll", json!(null)));

    let events = scheduler.drain_events();
    let seen: Vec<_> = events
        .iter()
        .map(|event| (event.tag(), event.name.as_str()))
        .collect();
    assert_eq!(seen, vec![(3, "press"), (2, "scroll")]);
    assert_eq!(events[0].payload, json!({ "x": 4 }));
    assert!(scheduler.drain_events().is_empty());
}

#[test]
fn test_concurrent_state_updates_are_all_applied() {
    let scheduler = scroll_scheduler();
    scheduler.render(SURFACE, &[Element::new("ScrollView", 5)]).unwrap();
    let family = committed_children(&scheduler)[0].family().clone();
    let applied = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    let update = StateUpdate::new(family.clone(), |data| {
                        Ok(Some(json!({ "offset": data["offset"].as_i64().unwrap_or(0) + 1 })))
                    });
                    scheduler.update_state(&update).unwrap();
                    applied.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(applied.load(Ordering::SeqCst), 100);
    let state = committed_children(&scheduler)[0].state().cloned().unwrap();
    assert_eq!(state.data(), &json!({ "offset": 100 }));
    assert_eq!(scheduler.current_revision(SURFACE).unwrap().number(), 101);
}
