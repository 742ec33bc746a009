/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the dual-tree task queue.
//!
//! The queue's error surface is deliberately small: out-of-range slot indices
//! and double-unlocks are programmer bugs, not queue-state corruption, so
//! every fallible operation returns a typed [`QueueError`] instead of
//! panicking or aborting. An empty or held slot on `dequeue`, and a split
//! request with no eligible target on `unlock`, are *not* errors — see
//! [`crate::DualTreeQueue::dequeue`] and [`crate::DualTreeQueue::unlock`].

use thiserror::Error;

// ── Queue errors ──────────────────────────────────────────────────────────────

/// Precondition violations surfaced by [`crate::DualTreeQueue`].
///
/// Both variants are checked *before* any state mutation, so a call that
/// returns `Err` never leaves the queue in a partially-updated state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// A slot index passed to `push`, `dequeue`, or `unlock` is not a valid
    /// registry index (`slot >= size()`).
    #[error("slot {0} is out of range")]
    InvalidSlot(usize),

    /// `unlock` was called on a slot whose lock is already `Free`.
    #[error("slot {0} is already unlocked")]
    UnlockOfFreeSlot(usize),
}
