//! Action buffering and flush timing.
//!
//! Actions are recorded locally the moment they happen and shipped to the
//! service later, in one ordered batch. Only one batch may be in flight:
//! [`PendingActions::begin_flush`] refuses while a flush is outstanding,
//! and [`PendingActions::finish_flush`] is the only way back to idle.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::model::ActionKind;

/// Whether a batch is currently on its way to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,

    /// A batch of this many actions (the buffer's first `batch_len`) is in flight.
    Flushing { batch_len: usize },
}

/// The ordered buffer of not-yet-synced actions.
#[derive(Debug, Clone)]
pub struct PendingActions {
    actions: Vec<ActionKind>,
    state: FlushState,
}

impl PendingActions {
    pub fn new(actions: Vec<ActionKind>) -> Self {
        Self {
            actions,
            state: FlushState::Idle,
        }
    }

    pub fn push(&mut self, action: ActionKind) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[ActionKind] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn is_flushing(&self) -> bool {
        matches!(self.state, FlushState::Flushing { .. })
    }

    /// Snapshots the buffer for sending and marks it in flight.
    ///
    /// Returns `None` when a flush is already outstanding or there is
    /// nothing to send.
    pub fn begin_flush(&mut self) -> Option<Vec<ActionKind>> {
        if let FlushState::Flushing { batch_len } = self.state {
            debug!(batch_len, "flush already in flight, skipping");
            return None;
        }
        if self.actions.is_empty() {
            return None;
        }
        self.state = FlushState::Flushing {
            batch_len: self.actions.len(),
        };
        Some(self.actions.clone())
    }

    /// Ends the in-flight flush.
    ///
    /// On success the sent prefix is dropped; anything recorded while the
    /// batch was in flight stays. On failure the buffer is left as is.
    /// Returns how many actions were removed.
    pub fn finish_flush(&mut self, succeeded: bool) -> usize {
        let FlushState::Flushing { batch_len } = self.state else {
            return 0;
        };
        self.state = FlushState::Idle;
        if !succeeded {
            return 0;
        }
        let removed = batch_len.min(self.actions.len());
        self.actions.drain(..removed);
        removed
    }

    /// Replaces the contents with `actions`. Ignored while a flush is in flight.
    pub fn reset(&mut self, actions: Vec<ActionKind>) {
        if self.is_flushing() {
            return;
        }
        self.actions = actions;
    }
}

/// Fires at a fixed interval.
#[derive(Debug, Clone)]
pub struct FlushScheduler {
    interval: SignedDuration,
    last: Option<Timestamp>,
}

/// How often buffered actions are flushed.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(15);

impl FlushScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: SignedDuration::try_from(interval).unwrap_or(SignedDuration::MAX),
            last: None,
        }
    }

    /// Starts counting from `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.last = Some(now);
    }

    /// Stops the timer; [`Self::due`] never fires until restarted.
    pub fn stop(&mut self) {
        self.last = None;
    }

    /// Returns true (and re-arms) when a full interval has passed since the last fire.
    pub fn due(&mut self, now: Timestamp) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        if now.duration_since(last) >= self.interval {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

/// Blocks new actions while the previous one is still being shown.
#[derive(Debug, Clone)]
pub struct ActionLock {
    hold: SignedDuration,
    until: Option<Timestamp>,
}

/// How long one action keeps the lock: the action animation's display time.
pub const DEFAULT_ACTION_LOCK: Duration = Duration::from_millis(3000);

impl ActionLock {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold: SignedDuration::try_from(hold).unwrap_or(SignedDuration::MAX),
            until: None,
        }
    }

    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Takes the lock at `now`. Returns false if it is still held.
    pub fn try_acquire(&mut self, now: Timestamp) -> bool {
        if self.is_locked(now) {
            return false;
        }
        self.until = now.checked_add(self.hold).ok();
        true
    }
}
