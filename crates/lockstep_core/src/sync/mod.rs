//! # Synchronization Primitives for Lockstep Simulation
//!
//! No kernel. No yielding. No sleeping.
//!
//! ## The Problem
//!
//! ```text
//! Worker 1:  step N ──┐                ┌── step N+1
//! Worker 2:  step N ──┼── rendezvous ──┼── step N+1
//! Worker 3:  step N ──┘                └── step N+1
//!
//! With a Condvar barrier: futex wake-up → tens of microseconds per step
//! With a spin barrier:    cache-line ping → sub-microsecond per step
//! ```
//!
//! Steps are short and workers arrive within microseconds of each other, so
//! burning a core while waiting is cheaper than being rescheduled.
//!
//! ## Contents
//!
//! - [`SpinBarrier`]: reusable two-phase rendezvous
//! - [`RawSpinLock`] / [`SpinLock`]: busy-wait mutual exclusion
//! - [`Backoff`]: bounded pause between polls
//! - [`Rendezvous`]: the construct-with-N / `wait()` seam

mod backoff;
mod barrier;
mod rendezvous;
mod spinlock;

pub use backoff::{Backoff, MAX_SHIFT_LIMIT};
pub use barrier::{BarrierState, SpinBarrier, WaitPhase};
pub use rendezvous::Rendezvous;
pub use spinlock::{RawSpinLock, SpinLock, SpinLockGuard};
