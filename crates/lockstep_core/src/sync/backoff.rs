//! # Polling Backoff
//!
//! Pause between polls of shared state. Never yields, never sleeps: the
//! waiting thread keeps its core and wakes within a handful of cycles.

use crate::config::BackoffPolicy;

/// Upper bound on `max_shift`. 2^10 spin hints is already well past the
/// point where a missing participant, not contention, is the problem.
pub const MAX_SHIFT_LIMIT: u32 = 10;

/// Bounded exponential pause for spin loops.
///
/// Each call to [`Backoff::snooze`] issues `2^step` spin hints, with `step`
/// growing by one per call until it reaches `max_shift`.
///
/// ```rust
/// use lockstep_core::{Backoff, BackoffPolicy};
///
/// let mut backoff = Backoff::new(BackoffPolicy::Exponential { max_shift: 4 });
/// for _ in 0..8 {
///     backoff.snooze();
/// }
/// assert_eq!(backoff.step(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct Backoff {
    step: u32,
    max_shift: u32,
}

impl Backoff {
    /// Creates a backoff following the given policy.
    #[inline]
    #[must_use]
    pub fn new(policy: BackoffPolicy) -> Self {
        let max_shift = match policy {
            BackoffPolicy::Spin => 0,
            BackoffPolicy::Exponential { max_shift } => max_shift.min(MAX_SHIFT_LIMIT),
        };
        Self { step: 0, max_shift }
    }

    /// Current exponent.
    #[inline]
    #[must_use]
    pub const fn step(&self) -> u32 {
        self.step
    }

    /// Pauses for the current step, then grows the next pause.
    #[inline]
    pub fn snooze(&mut self) {
        for _ in 0..(1u32 << self.step) {
            std::hint::spin_loop();
        }
        if self.step < self.max_shift {
            self.step += 1;
        }
    }

    /// Restarts from the shortest pause.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}
