//! # Busy-Wait Reusable Barrier
//!
//! Rendezvous point for a fixed set of N simulation workers. Every worker
//! calls [`SpinBarrier::wait`] once per step; nobody leaves until all N have
//! arrived, and the barrier reopens itself for the next step.
//!
//! ## Round Lifecycle
//!
//! ```text
//!   OPEN ──────────► COUNTING ──────────► DRAINING ──────────► RELEASE/RESET
//!   spin until       arrivals -= 1        spin until           departures += 1
//!   round_open       last arriver         arrivals == 0        last departer resets
//!                    closes the gate                           {N, 0, open}
//!                                                              spin until
//!                                                              departures == 0
//! ```
//!
//! Two drain phases are required for reuse. With a single counter, a thread
//! released from round R could re-enter and decrement for round R+1 while a
//! slower thread is still polling round R's counter. The departure drain makes
//! every participant witness the reset before any of them can return, so
//! rounds never overlap.
//!
//! ## Memory Ordering
//!
//! Arrivals decrement with `AcqRel`; the drain loop loads with `Acquire`, so
//! every write a thread made before `wait()` is visible to every thread after
//! `wait()` returns. The reset stores `arrivals_remaining` before releasing
//! `departures_seen`, so a thread that sees the departure counter at zero
//! also sees the fresh arrival count.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::config::{BackoffPolicy, BarrierConfig};
use crate::error::{SyncError, SyncResult};
use crate::sync::Backoff;

/// Spin phase a waiting thread can be stuck in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitPhase {
    /// Waiting for the previous round to finish draining.
    Open,
    /// Waiting for the remaining participants to arrive.
    Draining,
    /// Waiting for the last participant to depart and reset.
    Departing,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Draining => "draining",
            Self::Departing => "departing",
        })
    }
}

/// Snapshot of the barrier's shared counters.
///
/// Only meaningful when no thread is inside `wait()`; taken concurrently it
/// is three independent loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierState {
    /// Participants yet to arrive this round.
    pub arrivals_remaining: usize,
    /// Participants that have left the drain phase this round.
    pub departures_seen: usize,
    /// Whether the barrier accepts arrivals.
    pub open: bool,
}

impl BarrierState {
    /// State of an idle barrier for `participants` threads.
    #[inline]
    #[must_use]
    pub const fn idle(participants: usize) -> Self {
        Self {
            arrivals_remaining: participants,
            departures_seen: 0,
            open: true,
        }
    }
}

/// Reusable busy-wait barrier.
///
/// ## Usage
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use lockstep_core::SpinBarrier;
///
/// let barrier = Arc::new(SpinBarrier::new(4));
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let barrier = Arc::clone(&barrier);
///         thread::spawn(move || {
///             for _step in 0..10 {
///                 // compute_step();
///                 barrier.wait();
///             }
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
/// assert_eq!(barrier.rounds_completed(), 10);
/// ```
///
/// ## Contract
///
/// Exactly `participants()` threads call `wait()` exactly once per round.
/// Anything else spins forever; `wait()` has no error channel and no timeout.
/// [`SpinBarrier::try_wait`] is the bounded variant for callers that want one.
pub struct SpinBarrier {
    /// Fixed at construction.
    participants: usize,

    arrivals_remaining: AtomicUsize,
    departures_seen: AtomicUsize,
    round_open: AtomicBool,

    /// Rounds fully drained and reset.
    rounds_completed: AtomicU64,

    backoff: BackoffPolicy,
    spin_limit: Option<u64>,
    poisoned: AtomicBool,
}

impl SpinBarrier {
    /// Creates a barrier for `participants` threads with default backoff.
    ///
    /// # Panics
    ///
    /// Panics if `participants` is zero.
    #[must_use]
    pub fn new(participants: usize) -> Self {
        assert!(participants > 0, "Participant count must be greater than zero");
        Self::build(participants, BackoffPolicy::default(), None)
    }

    /// Creates a barrier for `participants` threads with default backoff.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParticipantCount` if `participants` is zero.
    pub fn try_new(participants: usize) -> SyncResult<Self> {
        if participants == 0 {
            return Err(SyncError::InvalidParticipantCount(participants));
        }
        Ok(Self::build(participants, BackoffPolicy::default(), None))
    }

    /// Creates a barrier from a validated config.
    ///
    /// # Errors
    ///
    /// Returns whatever [`BarrierConfig::validate`] reports.
    pub fn from_config(config: &BarrierConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self::build(config.participants, config.backoff, config.spin_limit))
    }

    fn build(participants: usize, backoff: BackoffPolicy, spin_limit: Option<u64>) -> Self {
        tracing::debug!(participants, ?backoff, ?spin_limit, "spin barrier created");
        Self {
            participants,
            arrivals_remaining: AtomicUsize::new(participants),
            departures_seen: AtomicUsize::new(0),
            round_open: AtomicBool::new(true),
            rounds_completed: AtomicU64::new(0),
            backoff,
            spin_limit,
            poisoned: AtomicBool::new(false),
        }
    }

    /// Number of threads that must arrive each round.
    #[inline]
    #[must_use]
    pub const fn participants(&self) -> usize {
        self.participants
    }

    /// Number of rounds completed so far.
    #[inline]
    #[must_use]
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Acquire)
    }

    /// Whether a bounded wait has given up on this barrier.
    #[inline]
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    /// Snapshot of the shared counters.
    #[must_use]
    pub fn state(&self) -> BarrierState {
        BarrierState {
            arrivals_remaining: self.arrivals_remaining.load(Ordering::Acquire),
            departures_seen: self.departures_seen.load(Ordering::Acquire),
            open: self.round_open.load(Ordering::Acquire),
        }
    }

    /// Blocks, by spinning, until all participants have called `wait()` for
    /// this round.
    pub fn wait(&self) {
        let mut backoff = Backoff::new(self.backoff);

        spin_until(&mut backoff, || self.round_open.load(Ordering::Acquire));
        self.arrive();

        spin_until(&mut backoff, || {
            self.arrivals_remaining.load(Ordering::Acquire) == 0
        });
        self.depart();

        spin_until(&mut backoff, || {
            self.departures_seen.load(Ordering::Acquire) == 0
        });
    }

    /// Like [`SpinBarrier::wait`], but gives up once the configured spin
    /// limit is exhausted.
    ///
    /// Giving up poisons the barrier: its counters are left mid-round and the
    /// other participants can no longer complete it. They notice through their
    /// own `try_wait` calls; plain `wait` callers keep spinning.
    ///
    /// # Errors
    ///
    /// - `SpinLimitExceeded` if this call ran out of polls.
    /// - `Poisoned` if the barrier was poisoned before or during this call.
    pub fn try_wait(&self) -> SyncResult<()> {
        if self.is_poisoned() {
            return Err(SyncError::Poisoned);
        }

        let mut spin = BoundedSpin {
            barrier: self,
            backoff: Backoff::new(self.backoff),
            polls: 0,
        };

        spin.until(WaitPhase::Open, || self.round_open.load(Ordering::Acquire))?;
        self.arrive();

        spin.until(WaitPhase::Draining, || {
            self.arrivals_remaining.load(Ordering::Acquire) == 0
        })?;
        self.depart();

        spin.until(WaitPhase::Departing, || {
            self.departures_seen.load(Ordering::Acquire) == 0
        })
    }

    /// Counting phase. The last arriver closes the gate.
    #[inline]
    fn arrive(&self) {
        let before = self.arrivals_remaining.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(
            before > 0,
            "more than {} threads arrived in one round",
            self.participants
        );
        if before == 1 {
            self.round_open.store(false, Ordering::Release);
        }
    }

    /// Departure phase. The last departer resets the round.
    #[inline]
    fn depart(&self) {
        let before = self.departures_seen.fetch_add(1, Ordering::AcqRel);
        debug_assert!(
            before < self.participants,
            "more than {} threads departed from one round",
            self.participants
        );
        if before == self.participants - 1 {
            self.arrivals_remaining
                .store(self.participants, Ordering::Release);
            self.departures_seen.store(0, Ordering::Release);
            self.round_open.store(true, Ordering::Release);
            self.rounds_completed.fetch_add(1, Ordering::Release);
        }
    }
}

impl fmt::Debug for SpinBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinBarrier")
            .field("participants", &self.participants)
            .field("state", &self.state())
            .field("rounds_completed", &self.rounds_completed())
            .field("poisoned", &self.is_poisoned())
            .finish_non_exhaustive()
    }
}

/// Polls `ready` until it returns `true`.
#[inline]
fn spin_until(backoff: &mut Backoff, ready: impl Fn() -> bool) {
    backoff.reset();
    while !ready() {
        backoff.snooze();
    }
}

/// Poll accounting for `try_wait`, shared across its three phases.
struct BoundedSpin<'a> {
    barrier: &'a SpinBarrier,
    backoff: Backoff,
    polls: u64,
}

impl BoundedSpin<'_> {
    fn until(&mut self, phase: WaitPhase, ready: impl Fn() -> bool) -> SyncResult<()> {
        self.backoff.reset();
        while !ready() {
            if self.barrier.is_poisoned() {
                return Err(SyncError::Poisoned);
            }
            self.polls += 1;
            if let Some(limit) = self.barrier.spin_limit {
                if self.polls > limit {
                    self.barrier.poisoned.store(true, Ordering::Release);
                    tracing::warn!(
                        participants = self.barrier.participants,
                        %phase,
                        polls = self.polls,
                        "spin limit exceeded, barrier poisoned"
                    );
                    return Err(SyncError::SpinLimitExceeded {
                        phase,
                        polls: self.polls,
                    });
                }
            }
            self.backoff.snooze();
        }
        Ok(())
    }
}
