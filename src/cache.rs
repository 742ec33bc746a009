/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The narrow contract against the external reference-table cache.
//!
//! The queue never releases a cache reference — that is the task consumer's
//! job once it has finished processing a dequeued task. The only
//! outbound call the queue ever makes is [`Cache::lock_cache`], and it makes
//! it exactly once per task produced by a split (see [`crate::splitter`]).

/// Opaque identifier for a reference-subtree slot held by the external
/// cache.
///
/// Wrapped rather than a bare `u64` so a cache id can never be mistaken for
/// a registry slot index or a raw count at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheId(pub u64);

/// Identifies the reference table a [`crate::ReferenceBinding`] was drawn
/// from.
///
/// Kept as an owned `String` rather than an enum: the set of tables in play
/// is determined by the external exchange layer, not by this crate.
pub type TableId = String;

/// External cache collaborator.
///
/// Implementations must be safe to call from inside queue operations;
/// the queue itself performs no locking around the call.
pub trait Cache {
    /// Add `count` to the reference count of the cache slot identified by
    /// `cache_id`.
    ///
    /// The queue calls this only during a split to keep the cache's
    /// reference count in step with the number of live in-queue tasks that
    /// refer to `cache_id`. The initial lock for a task created by
    /// [`crate::DualTreeQueue::push`] is the caller's responsibility — the
    /// queue never locks on an ordinary push.
    fn lock_cache(&self, cache_id: CacheId, count: u32);
}
