/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core task data structures for the dual-tree task queue.
//!
//! ```text
//! (query subtree, reference binding) ──priority_of()──► Task ──dequeue()──► consumer
//! ```
//!
//! A [`Task`] is immutable once built: its priority is fixed at construction
//! time (by [`crate::priority::priority_of`]) and never recomputed in place.
//! A split that changes the pairing produces brand new `Task`s rather than
//! mutating existing ones.

use crate::cache::{CacheId, TableId};
use crate::tree::{QuerySubtree, ReferenceNode};

// ── ReferenceBinding ──────────────────────────────────────────────────────────

/// Identifies a reference subtree resident in the external cache.
///
/// Immutable triple `(table, node, cache_id)` — `cache_id` is the opaque
/// slot identifier used for reference counting against [`crate::Cache`].
#[derive(Debug, Clone)]
pub struct ReferenceBinding<R: ReferenceNode> {
    pub table: TableId,
    pub node: R,
    pub cache_id: CacheId,
}

impl<R: ReferenceNode> ReferenceBinding<R> {
    pub fn new(table: impl Into<TableId>, node: R, cache_id: CacheId) -> Self {
        Self {
            table: table.into(),
            node,
            cache_id,
        }
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// An immutable (query-subtree, reference-binding) pairing with a fixed
/// priority.
///
/// Higher priority (less negative) sorts earlier — see
/// [`crate::priority::priority_of`].
#[derive(Debug, Clone)]
pub struct Task<Q: QuerySubtree, R: ReferenceNode> {
    pub query_subtree: Q,
    pub reference: ReferenceBinding<R>,
    pub priority: f64,
}

impl<Q: QuerySubtree, R: ReferenceNode> Task<Q, R> {
    pub fn new(query_subtree: Q, reference: ReferenceBinding<R>, priority: f64) -> Self {
        Self {
            query_subtree,
            reference,
            priority,
        }
    }
}
