#![forbid(unsafe_code)]

//! Deterministic timer queue.
//!
//! The engine never reads a clock on its own. The service owns a virtual
//! `now` that only moves when the host calls `advance` or `tick`, and every
//! delayed step (next-tick open, settle, auto-close, exit destroy) is a
//! [`Timer`] in this queue.
//!
//! # Invariants
//!
//! - Timers fire in `(due, insertion order)` order.
//! - `now` never moves backwards.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use mlayer_core::LayerId;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// CREATED → OPENING.
    Open,
    /// OPENING → VISIBLE.
    Settle,
    /// Cancel trigger from `autoClose`.
    AutoClose,
    /// CLOSING → DESTROYED.
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub due: Duration,
    pub layer: LayerId,
    pub kind: TimerKind,
    seq: u64,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<Timer>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward. Earlier instants are ignored.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Schedule `kind` for `layer` after `delay`.
    pub fn schedule(&mut self, layer: LayerId, kind: TimerKind, delay: Duration) {
        let timer = Timer {
            due: self.now + delay,
            layer,
            kind,
            seq: self.seq,
        };
        self.seq += 1;
        tracing::trace!(layer = %layer, ?kind, due_ms = timer.due.as_millis() as u64, "timer scheduled");
        self.queue.push(Reverse(timer));
    }

    /// Pop the earliest timer if it is due.
    pub fn pop_due(&mut self) -> Option<Timer> {
        match self.queue.peek() {
            Some(Reverse(timer)) if timer.due <= self.now => self.queue.pop().map(|r| r.0),
            _ => None,
        }
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(timer)| timer.due)
    }

    /// Drop every pending timer for `layer`.
    pub fn cancel_layer(&mut self, layer: LayerId) {
        self.queue.retain(|Reverse(timer)| timer.layer != layer);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
