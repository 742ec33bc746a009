/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Splitter: refines one query subtree into two and redistributes its
//! pending tasks, keeping the reference-cache reference count in step.
//!
//! This is the only module allowed to call [`Cache::lock_cache`] — every
//! other call into the cache layer is the task consumer's responsibility.

use tracing::{debug, info};

use crate::cache::Cache;
use crate::priority::{priority_of, Metric};
use crate::registry::{LockState, Registry};
use crate::task::{ReferenceBinding, Task};
use crate::tree::{QuerySubtree, ReferenceNode};

// ── Eligibility scan ──────────────────────────────────────────────────────────

/// Find the slot eligible for splitting: `Free`, non-leaf, non-empty task
/// queue. Among eligible slots, the one with the greatest `count()`; ties
/// break to the lowest index.
fn find_eligible_slot<Q, R>(registry: &Registry<Q, R>) -> Option<usize>
where
    Q: QuerySubtree,
    R: ReferenceNode,
{
    let mut best: Option<(usize, usize)> = None; // (slot, count)
    for (index, subtree, lock) in registry.iter_slots() {
        if lock != LockState::Free || subtree.is_leaf() || registry.tasks(index).is_empty() {
            continue;
        }
        let count = subtree.count();
        match best {
            // Strict `>` keeps the lowest index on a count tie, since slots
            // are scanned in increasing index order.
            Some((_, best_count)) if count > best_count => best = Some((index, count)),
            None => best = Some((index, count)),
            _ => {}
        }
    }
    best.map(|(slot, _)| slot)
}

// ── Split and redistribute ────────────────────────────────────────────────────

/// Run the splitter against `registry` if a slot is eligible. Best-effort:
/// if nothing is eligible, this is a no-op.
///
/// `metric` is used to recompute priorities for every redistributed task —
/// the splitter caches no metric state of its own, matching the priority-key
/// computation it calls into.
pub fn try_split<Q, R, M, C>(
    registry: &mut Registry<Q, R>,
    remaining_tasks: &mut usize,
    metric: &M,
    cache: &C,
) where
    Q: QuerySubtree,
    R: ReferenceNode<Bound = Q::Bound>,
    M: Metric<Q::Bound, R::Bound>,
    C: Cache,
{
    let Some(k) = find_eligible_slot(registry) else {
        debug!("split requested but no eligible slot found");
        return;
    };

    let parent = registry.subtree(k).clone();
    let left = parent.left();
    let right = parent.right();

    // Append the new slot *before* mutating slot k, so its index equals the
    // pre-append registry length.
    let k_new = registry.append(right);
    registry.set_subtree(k, left);

    info!(slot = k, new_slot = k_new, "splitting query subtree");

    // Drain every pending task from the parent slot. Order does not matter:
    // priorities are recomputed per the new pairing.
    let mut drained = Vec::with_capacity(registry.tasks(k).len());
    while let Some(task) = registry.tasks_mut(k).pop_top() {
        drained.push(task);
    }

    let left_handle = registry.subtree(k).clone();
    let right_handle = registry.subtree(k_new).clone();

    for task in drained {
        let Task {
            query_subtree: _,
            reference,
            priority: _,
        } = task;
        let ReferenceBinding {
            table,
            node,
            cache_id,
        } = reference;

        if node.is_leaf() {
            // Leaf reference: (L, N) -> slot k, (R, N) -> slot k_new.
            let left_priority = priority_of(metric, &left_handle, &node);
            let left_task = Task::new(
                left_handle.clone(),
                ReferenceBinding::new(table.clone(), node.clone(), cache_id),
                left_priority,
            );
            registry.tasks_mut(k).push(left_task);

            let right_priority = priority_of(metric, &right_handle, &node);
            let right_task = Task::new(
                right_handle.clone(),
                ReferenceBinding::new(table, node, cache_id),
                right_priority,
            );
            registry.tasks_mut(k_new).push(right_task);

            cache.lock_cache(cache_id, 1);
            // One task drained, two pushed: net +1.
            *remaining_tasks += 1;
        } else {
            // Internal reference: expand into both children, producing four
            // tasks: (L, N.left), (L, N.right), (R, N.left), (R, N.right).
            let ref_left = node.left();
            let ref_right = node.right();

            let pairs = [
                (left_handle.clone(), ref_left.clone(), k),
                (left_handle.clone(), ref_right.clone(), k),
                (right_handle.clone(), ref_left, k_new),
                (right_handle.clone(), ref_right, k_new),
            ];

            for (query, reference_node, slot) in pairs {
                let priority = priority_of(metric, &query, &reference_node);
                let task = Task::new(
                    query,
                    ReferenceBinding::new(table.clone(), reference_node, cache_id),
                    priority,
                );
                registry.tasks_mut(slot).push(task);
            }

            cache.lock_cache(cache_id, 3);
            // One task drained, four pushed: net +3.
            *remaining_tasks += 3;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheId;
    use crate::priority::tests::{Interval1D, OneDimMetric};
    use std::cell::RefCell;

    #[derive(Debug, Clone)]
    struct Node {
        bound: Interval1D,
        count: usize,
        leaf: bool,
    }

    impl QuerySubtree for Node {
        type Bound = Interval1D;
        fn is_leaf(&self) -> bool {
            self.leaf
        }
        fn count(&self) -> usize {
            self.count
        }
        fn left(&self) -> Self {
            Node {
                bound: Interval1D {
                    lo: self.bound.lo,
                    hi: (self.bound.lo + self.bound.hi) / 2.0,
                },
                count: self.count / 2,
                leaf: true,
            }
        }
        fn right(&self) -> Self {
            Node {
                bound: Interval1D {
                    lo: (self.bound.lo + self.bound.hi) / 2.0,
                    hi: self.bound.hi,
                },
                count: self.count - self.count / 2,
                leaf: true,
            }
        }
        fn bound(&self) -> &Interval1D {
            &self.bound
        }
    }

    impl ReferenceNode for Node {
        type Bound = Interval1D;
        fn is_leaf(&self) -> bool {
            self.leaf
        }
        fn left(&self) -> Self {
            QuerySubtree::left(self)
        }
        fn right(&self) -> Self {
            QuerySubtree::right(self)
        }
        fn bound(&self) -> &Interval1D {
            &self.bound
        }
    }

    #[derive(Default)]
    struct RecordingCache {
        calls: RefCell<Vec<(CacheId, u32)>>,
    }
    impl Cache for RecordingCache {
        fn lock_cache(&self, cache_id: CacheId, count: u32) {
            self.calls.borrow_mut().push((cache_id, count));
        }
    }

    fn parent_node() -> Node {
        Node {
            bound: Interval1D { lo: 0.0, hi: 4.0 },
            count: 4,
            leaf: false,
        }
    }

    #[test]
    fn leaf_reference_split_produces_two_tasks_and_locks_once() {
        let metric = OneDimMetric;
        let cache = RecordingCache::default();
        let mut registry: Registry<Node, Node> = Registry::new();
        let k = registry.append(parent_node());

        let ref_node = Node {
            bound: Interval1D { lo: 10.0, hi: 11.0 },
            count: 1,
            leaf: true,
        };
        let cache_id = CacheId(42);
        let priority = priority_of(&metric, registry.subtree(k), &ref_node);
        registry.tasks_mut(k).push(Task::new(
            registry.subtree(k).clone(),
            ReferenceBinding::new("t", ref_node, cache_id),
            priority,
        ));

        let mut remaining = 1usize;
        registry.set_lock_state(k, LockState::Free);
        try_split(&mut registry, &mut remaining, &metric, &cache);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tasks(k).len(), 1);
        assert_eq!(registry.tasks(1).len(), 1);
        assert_eq!(remaining, 2); // 1 drained -> 2 pushed, net +1
        assert_eq!(cache.calls.borrow().as_slice(), &[(cache_id, 1)]);
    }

    #[test]
    fn internal_reference_split_produces_four_tasks_and_locks_thrice() {
        let metric = OneDimMetric;
        let cache = RecordingCache::default();
        let mut registry: Registry<Node, Node> = Registry::new();
        let k = registry.append(parent_node());

        let ref_node = Node {
            bound: Interval1D { lo: 10.0, hi: 14.0 },
            count: 4,
            leaf: false,
        };
        let cache_id = CacheId(7);
        let priority = priority_of(&metric, registry.subtree(k), &ref_node);
        registry.tasks_mut(k).push(Task::new(
            registry.subtree(k).clone(),
            ReferenceBinding::new("t", ref_node, cache_id),
            priority,
        ));

        let mut remaining = 1usize;
        try_split(&mut registry, &mut remaining, &metric, &cache);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tasks(k).len(), 2);
        assert_eq!(registry.tasks(1).len(), 2);
        assert_eq!(remaining, 4); // 1 drained -> 4 pushed, net +3
        assert_eq!(cache.calls.borrow().as_slice(), &[(cache_id, 3)]);
    }

    #[test]
    fn no_eligible_slot_is_a_no_op() {
        let metric = OneDimMetric;
        let cache = RecordingCache::default();
        // All leaves: nothing eligible.
        let mut registry: Registry<Node, Node> = Registry::new();
        registry.append(Node {
            bound: Interval1D { lo: 0.0, hi: 1.0 },
            count: 1,
            leaf: true,
        });
        let mut remaining = 0usize;
        try_split(&mut registry, &mut remaining, &metric, &cache);
        assert_eq!(registry.len(), 1);
        assert_eq!(remaining, 0);
        assert!(cache.calls.borrow().is_empty());
    }

    #[test]
    fn leaf_is_never_chosen_for_splitting() {
        let metric = OneDimMetric;
        let cache = RecordingCache::default();
        let mut registry: Registry<Node, Node> = Registry::new();
        let leaf = registry.append(Node {
            bound: Interval1D { lo: 0.0, hi: 1.0 },
            count: 5,
            leaf: true,
        });
        let ref_node = Node {
            bound: Interval1D { lo: 10.0, hi: 11.0 },
            count: 1,
            leaf: true,
        };
        let priority = priority_of(&metric, registry.subtree(leaf), &ref_node);
        registry.tasks_mut(leaf).push(Task::new(
            registry.subtree(leaf).clone(),
            ReferenceBinding::new("t", ref_node, CacheId(1)),
            priority,
        ));
        let mut remaining = 1usize;
        try_split(&mut registry, &mut remaining, &metric, &cache);
        assert_eq!(registry.len(), 1, "a leaf slot must never be split");
        assert_eq!(remaining, 1);
    }

    #[test]
    fn greatest_count_wins_ties_broken_by_lowest_index() {
        let metric = OneDimMetric;
        let cache = RecordingCache::default();
        let mut registry: Registry<Node, Node> = Registry::new();

        // Slot 0: count 2, non-leaf, with a pending task.
        let s0 = registry.append(Node {
            bound: Interval1D { lo: 0.0, hi: 2.0 },
            count: 2,
            leaf: false,
        });
        // Slot 1: count 8, non-leaf, with a pending task -> should win.
        let s1 = registry.append(Node {
            bound: Interval1D { lo: 2.0, hi: 4.0 },
            count: 8,
            leaf: false,
        });

        for slot in [s0, s1] {
            let ref_node = Node {
                bound: Interval1D { lo: 20.0, hi: 21.0 },
                count: 1,
                leaf: true,
            };
            let priority = priority_of(&metric, registry.subtree(slot), &ref_node);
            registry.tasks_mut(slot).push(Task::new(
                registry.subtree(slot).clone(),
                ReferenceBinding::new("t", ref_node, CacheId(slot as u64)),
                priority,
            ));
        }

        let mut remaining = 2usize;
        try_split(&mut registry, &mut remaining, &metric, &cache);

        // Slot 1 (greater count) was split, appending slot 2; slot 0 is
        // untouched and still has its single task.
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.tasks(s0).len(), 1);
        assert_eq!(registry.tasks(s1).len(), 1);
        assert_eq!(registry.tasks(2).len(), 1);
    }
}
