use std::collections::HashSet;

use canopy_types::Tag;
use smallvec::SmallVec;
use tracing::trace;

use super::{ShadowView, ShadowViewMutation, ShadowViewMutationList};
use crate::shadow::{ShadowNode, ShadowNodePtr};

/// Insertion-ordered tag map for one level of children. Removed entries
/// leave a tombstone so iteration order stays stable.
struct TagMap {
    entries: SmallVec<[(Tag, Option<usize>); 16]>,
}

impl TagMap {
    fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    fn insert(&mut self, tag: Tag, index: usize) {
        self.entries.push((tag, Some(index)));
    }

    fn contains(&self, tag: Tag) -> bool {
        self.entries
            .iter()
            .any(|(entry, index)| *entry == tag && index.is_some())
    }

    fn remove(&mut self, tag: Tag) -> Option<usize> {
        self.entries
            .iter_mut()
            .find(|(entry, index)| *entry == tag && index.is_some())
            .and_then(|(_, index)| index.take())
    }

    fn live(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().filter_map(|(_, index)| *index)
    }
}

/// Mutations of one level, bucketed so they can be emitted in an order the
/// host can apply in a single pass.
///
/// Every level feeds two streams: teardown (updates, removes, deletes) and
/// construction (creates, inserts). The whole teardown stream is emitted
/// before any construction, so a node recreated under another parent is
/// deleted before its replacement exists.
#[derive(Default)]
struct OrderedMutations {
    destructive_downward: ShadowViewMutationList,
    updates: ShadowViewMutationList,
    removes: ShadowViewMutationList,
    deletes: ShadowViewMutationList,
    creates: ShadowViewMutationList,
    downward: ShadowViewMutationList,
    inserts: ShadowViewMutationList,
}

impl OrderedMutations {
    /// Teardown gets subtree teardown, updates, removes (highest index
    /// first) and deletes. Construction gets creates, subtree construction
    /// and inserts (lowest index first).
    fn flush_into(self, streams: &mut Streams<'_>) {
        streams.teardown.extend(self.destructive_downward);
        streams.teardown.extend(self.updates);
        streams.teardown.extend(self.removes.into_iter().rev());
        streams.teardown.extend(self.deletes);
        streams.construction.extend(self.creates);
        streams.construction.extend(self.downward);
        streams.construction.extend(self.inserts);
    }

    /// Recursion target for the levels below this one.
    fn below(&mut self) -> Streams<'_> {
        Streams {
            teardown: &mut self.destructive_downward,
            construction: &mut self.downward,
        }
    }

    fn update_if_changed(
        &mut self,
        parent: &ShadowView,
        old_view: ShadowView,
        new_view: &ShadowView,
        index: usize,
    ) {
        if old_view != *new_view {
            self.updates.push(ShadowViewMutation::Update {
                parent: Some(parent.clone()),
                old: old_view,
                new: new_view.clone(),
                index,
            });
        }
    }

    /// Diffs the children of a matched pair unless the nodes are identical.
    fn update_subtrees(&mut self, old: &ShadowNode, new: &ShadowNode, new_view: &ShadowView) {
        if std::ptr::eq(old, new) {
            return;
        }
        diff_children(&mut self.below(), new_view, old.children(), new.children());
    }
}

struct Streams<'a> {
    teardown: &'a mut ShadowViewMutationList,
    construction: &'a mut ShadowViewMutationList,
}

fn assert_unique_tags(parent: &ShadowView, children: &[ShadowNodePtr]) {
    if children.len() < 2 {
        return;
    }
    let mut seen = HashSet::with_capacity(children.len());
    for child in children {
        assert!(
            seen.insert(child.tag()),
            "tag {} appears twice among the children of {}",
            child.tag(),
            parent.tag
        );
    }
}

fn diff_children(
    streams: &mut Streams<'_>,
    parent: &ShadowView,
    old_children: &[ShadowNodePtr],
    new_children: &[ShadowNodePtr],
) {
    if old_children.is_empty() && new_children.is_empty() {
        return;
    }
    assert_unique_tags(parent, new_children);

    let mut ordered = OrderedMutations::default();

    // Matching prefix.
    let mut index = 0;
    while index < old_children.len() && index < new_children.len() {
        let old_child = &old_children[index];
        let new_child = &new_children[index];
        if old_child.tag() != new_child.tag() {
            break;
        }

        let new_view = ShadowView::new(new_child);
        ordered.update_if_changed(parent, ShadowView::new(old_child), &new_view, index);
        ordered.update_subtrees(old_child, new_child, &new_view);
        index += 1;
    }

    if index == new_children.len() {
        // Everything left in the old list goes away.
        for (old_index, old_child) in old_children.iter().enumerate().skip(index) {
            let old_view = ShadowView::new(old_child);
            ordered.removes.push(ShadowViewMutation::Remove {
                parent: parent.clone(),
                old: old_view.clone(),
                index: old_index,
            });
            diff_children(&mut ordered.below(), &old_view, old_child.children(), &[]);
            ordered.deletes.push(ShadowViewMutation::Delete { old: old_view });
        }
    } else if index == old_children.len() {
        // Everything left in the new list is new.
        for (new_index, new_child) in new_children.iter().enumerate().skip(index) {
            let new_view = ShadowView::new(new_child);
            ordered.inserts.push(ShadowViewMutation::Insert {
                parent: parent.clone(),
                new: new_view.clone(),
                index: new_index,
            });
            diff_children(&mut ordered.below(), &new_view, &[], new_child.children());
            ordered.creates.push(ShadowViewMutation::Create { new: new_view });
        }
    } else {
        diff_remaining(&mut ordered, parent, old_children, new_children, index);
    }

    ordered.flush_into(streams);
}

/// Walks both lists from the first mismatch, matching by tag.
fn diff_remaining(
    ordered: &mut OrderedMutations,
    parent: &ShadowView,
    old_children: &[ShadowNodePtr],
    new_children: &[ShadowNodePtr],
    start: usize,
) {
    let mut new_remaining = TagMap::new();
    for (new_index, new_child) in new_children.iter().enumerate().skip(start) {
        new_remaining.insert(new_child.tag(), new_index);
    }
    let mut new_inserted = TagMap::new();
    let mut deletion_candidates: SmallVec<[usize; 8]> = SmallVec::new();

    let mut old_index = start;
    let mut new_index = start;
    while old_index < old_children.len() || new_index < new_children.len() {
        let old_child = old_children.get(old_index);
        let new_child = new_children.get(new_index);

        if let (Some(old_child), Some(new_child)) = (old_child, new_child) {
            if old_child.tag() == new_child.tag() {
                let new_view = ShadowView::new(new_child);
                ordered.update_if_changed(parent, ShadowView::new(old_child), &new_view, new_index);
                ordered.update_subtrees(old_child, new_child, &new_view);
                old_index += 1;
                new_index += 1;
                continue;
            }
        }

        if let Some(old_child) = old_child {
            if let Some(inserted_index) = new_inserted.remove(old_child.tag()) {
                // Already inserted at its new position; take it out of the old one.
                let moved = &new_children[inserted_index];
                let new_view = ShadowView::new(moved);
                trace!(tag = old_child.tag(), from = old_index, to = inserted_index, "child moved");
                ordered.removes.push(ShadowViewMutation::Remove {
                    parent: parent.clone(),
                    old: ShadowView::new(old_child),
                    index: old_index,
                });
                ordered.update_if_changed(parent, ShadowView::new(old_child), &new_view, inserted_index);
                ordered.update_subtrees(old_child, moved, &new_view);
                old_index += 1;
                continue;
            }

            if !new_remaining.contains(old_child.tag()) {
                ordered.removes.push(ShadowViewMutation::Remove {
                    parent: parent.clone(),
                    old: ShadowView::new(old_child),
                    index: old_index,
                });
                deletion_candidates.push(old_index);
                old_index += 1;
                continue;
            }
        }

        // The old child reappears later in the new list, or the old list is
        // exhausted: insert the new child now and match the old one later.
        let Some(new_child) = new_child else {
            unreachable!("old child {old_index} of {} is still pending with no new children left", parent.tag);
        };
        ordered.inserts.push(ShadowViewMutation::Insert {
            parent: parent.clone(),
            new: ShadowView::new(new_child),
            index: new_index,
        });
        new_inserted.insert(new_child.tag(), new_index);
        new_index += 1;
    }

    for old_index in deletion_candidates {
        let old_child = &old_children[old_index];
        let old_view = ShadowView::new(old_child);
        diff_children(&mut ordered.below(), &old_view, old_child.children(), &[]);
        ordered.deletes.push(ShadowViewMutation::Delete { old: old_view });
    }

    for new_index in new_inserted.live() {
        let new_child = &new_children[new_index];
        let new_view = ShadowView::new(new_child);
        diff_children(&mut ordered.below(), &new_view, &[], new_child.children());
        ordered.creates.push(ShadowViewMutation::Create { new: new_view });
    }
}

/// Mutations that turn a host mirroring `old_root` into one mirroring `new_root`.
///
/// Nodes are matched by tag within each parent; identical subtrees are
/// skipped without being visited. A node that changes parents is deleted
/// and created again. Both roots must belong to the same family.
///
/// # Panics
///
/// Panics if the roots belong to different families or if a tag appears
/// twice among one parent's children.
pub fn calculate_shadow_view_mutations(
    old_root: &ShadowNode,
    new_root: &ShadowNode,
) -> ShadowViewMutationList {
    assert!(
        old_root.same_family(new_root),
        "root shadow nodes {} and {} belong to different families",
        old_root.tag(),
        new_root.tag()
    );

    let mut mutations = ShadowViewMutationList::new();
    if std::ptr::eq(old_root, new_root) {
        return mutations;
    }

    let old_view = ShadowView::new(old_root);
    let new_view = ShadowView::new(new_root);
    if old_view != new_view {
        mutations.push(ShadowViewMutation::Update {
            parent: None,
            old: old_view,
            new: new_view.clone(),
            index: 0,
        });
    }

    let mut construction = ShadowViewMutationList::new();
    diff_children(
        &mut Streams {
            teardown: &mut mutations,
            construction: &mut construction,
        },
        &new_view,
        old_root.children(),
        new_root.children(),
    );
    mutations.extend(construction);
    mutations
}
