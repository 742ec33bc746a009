/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-process scheduling core for a distributed dual-tree traversal engine.
//!
//! A dual-tree algorithm pairs a local query tree against a reference tree
//! and works through `(query subtree, reference subtree)` pairs in
//! best-first order, splitting the query side as it goes deeper. This crate
//! is the scheduling core that keeps that work ordered: given a query table
//! and a cache collaborator, [`DualTreeQueue`] maintains one priority queue
//! per query subtree, refines subtrees on demand, and keeps the external
//! cache's reference counts in step with the tasks that depend on them.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── tree        – consumed TREE / QUERY_TABLE interfaces
//! ├── cache        – consumed CACHE interface
//! ├── priority     – priority key computation
//! ├── task         – Task / ReferenceBinding data model
//! ├── queue        – per-subtree priority queue
//! ├── registry     – query-subtree registry
//! ├── splitter     – query-subtree refinement
//! └── error        – QueueError
//! ```
//!
//! The queue is a single-threaded, cooperative data structure (no internal
//! concurrency primitives) — see the crate-level tests and `tests/` for the
//! invariants and scenarios this implementation is held to.

pub mod cache;
pub mod error;
pub mod priority;
pub mod queue;
pub mod registry;
pub mod splitter;
pub mod task;
pub mod tree;

pub use cache::{Cache, CacheId, TableId};
pub use error::QueueError;
pub use priority::{priority_of, DistanceInterval, Metric};
pub use queue::TaskQueue;
pub use registry::{LockState, Registry};
pub use task::{ReferenceBinding, Task};
pub use tree::{QuerySubtree, QueryTable, ReferenceNode};

use tracing::{debug, instrument, trace};

// ── DualTreeQueue ─────────────────────────────────────────────────────────────

/// The scheduling core: owns the query-subtree registry and drives
/// splits, but holds no metric state of its own — every operation that
/// needs distances takes a `&M: Metric` argument.
pub struct DualTreeQueue<Q, R, C>
where
    Q: QuerySubtree,
    R: ReferenceNode<Bound = Q::Bound>,
    C: Cache,
{
    registry: Registry<Q, R>,
    remaining_tasks: usize,
    split_requested: bool,
    cache: C,
}

impl<Q, R, C> DualTreeQueue<Q, R, C>
where
    Q: QuerySubtree,
    R: ReferenceNode<Bound = Q::Bound>,
    C: Cache,
{
    /// Populate the registry from `query_table`'s frontier subtrees at
    /// `max_query_subtree_size`, all slots free, counters zeroed.
    #[instrument(skip_all, fields(max_query_subtree_size))]
    pub fn init<T>(query_table: &T, max_query_subtree_size: usize, cache: C) -> Self
    where
        T: QueryTable<Subtree = Q>,
    {
        let mut registry = Registry::new();
        for subtree in query_table.frontier_nodes(max_query_subtree_size) {
            registry.append(subtree);
        }
        debug!(slots = registry.len(), "initialized dual-tree queue");
        Self {
            registry,
            remaining_tasks: 0,
            split_requested: false,
            cache,
        }
    }

    /// Enqueue `reference` onto `slot`'s queue. No lock check — pushing is
    /// permitted while the slot is held.
    #[instrument(skip_all, fields(slot))]
    pub fn push<M>(
        &mut self,
        metric: &M,
        slot: usize,
        reference: ReferenceBinding<R>,
    ) -> Result<(), QueueError>
    where
        M: Metric<Q::Bound, R::Bound>,
    {
        if !self.registry.in_range(slot) {
            return Err(QueueError::InvalidSlot(slot));
        }
        let priority = priority_of(metric, self.registry.subtree(slot), &reference.node);
        let task = Task::new(self.registry.subtree(slot).clone(), reference, priority);
        self.registry.tasks_mut(slot).push(task);
        self.remaining_tasks += 1;
        trace!(remaining = self.remaining_tasks, "pushed task");
        Ok(())
    }

    /// Pop the top task from `slot`, if any. Returns `Ok(None)` for an empty
    /// or held slot — that is a normal signal, not an error. On success,
    /// sets `locks[slot] = held` iff `lock_on_take`.
    #[instrument(skip_all, fields(slot, lock_on_take))]
    pub fn dequeue<M>(
        &mut self,
        metric: &M,
        slot: usize,
        lock_on_take: bool,
    ) -> Result<Option<(Task<Q, R>, usize)>, QueueError>
    where
        M: Metric<Q::Bound, R::Bound>,
    {
        let _ = metric; // priorities are fixed at push/split time, not recomputed here.
        if !self.registry.in_range(slot) {
            return Err(QueueError::InvalidSlot(slot));
        }
        if self.registry.lock_state(slot) == LockState::Held {
            return Ok(None);
        }
        let Some(task) = self.registry.tasks_mut(slot).pop_top() else {
            return Ok(None);
        };
        if lock_on_take {
            self.registry.set_lock_state(slot, LockState::Held);
        }
        self.remaining_tasks -= 1;
        trace!(remaining = self.remaining_tasks, "dequeued task");
        Ok(Some((task, slot)))
    }

    /// Free `slot`'s lock. If a split was requested, run the splitter against
    /// the now-eligible slots, then clear the request regardless of outcome.
    #[instrument(skip_all, fields(slot))]
    pub fn unlock<M>(&mut self, metric: &M, slot: usize) -> Result<(), QueueError>
    where
        M: Metric<Q::Bound, R::Bound>,
    {
        if !self.registry.in_range(slot) {
            return Err(QueueError::InvalidSlot(slot));
        }
        if self.registry.lock_state(slot) == LockState::Free {
            return Err(QueueError::UnlockOfFreeSlot(slot));
        }
        self.registry.set_lock_state(slot, LockState::Free);
        if self.split_requested {
            splitter::try_split(
                &mut self.registry,
                &mut self.remaining_tasks,
                metric,
                &self.cache,
            );
            self.split_requested = false;
        }
        Ok(())
    }

    /// Request that the next `unlock` attempt a split. Idempotent.
    pub fn request_split(&mut self) {
        self.split_requested = true;
    }

    /// Number of registry slots. Never decreases.
    pub fn size(&self) -> usize {
        self.registry.len()
    }

    /// Whether there is no pending task anywhere in the registry.
    pub fn is_empty(&self) -> bool {
        self.remaining_tasks == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
