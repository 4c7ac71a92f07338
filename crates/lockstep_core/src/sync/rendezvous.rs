//! # Rendezvous Contract
//!
//! The whole surface a simulation host needs from a step barrier: a fixed
//! participant count and a `wait()` called once per thread per round. Host
//! code written against [`Rendezvous`] can switch between the busy-wait
//! barrier here and a blocking one chosen by its own build configuration.

use crate::sync::SpinBarrier;

/// Per-step rendezvous for a fixed group of threads.
pub trait Rendezvous: Send + Sync {
    /// Number of threads that must call [`Rendezvous::wait`] each round.
    fn participants(&self) -> usize;

    /// Returns once every participant has called `wait()` for this round.
    fn wait(&self);
}

impl Rendezvous for SpinBarrier {
    #[inline]
    fn participants(&self) -> usize {
        SpinBarrier::participants(self)
    }

    #[inline]
    fn wait(&self) {
        SpinBarrier::wait(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Generic host loop: each worker bumps a shared counter once per step.
    fn run_steps<R: Rendezvous>(barrier: &R, steps: usize) -> usize {
        let total = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..barrier.participants() {
                s.spawn(|| {
                    for _ in 0..steps {
                        total.fetch_add(1, Ordering::Relaxed);
                        barrier.wait();
                    }
                });
            }
        });
        total.into_inner()
    }

    #[test]
    fn test_generic_host_loop() {
        let barrier = SpinBarrier::new(3);
        assert_eq!(run_steps(&barrier, 50), 150);
        assert_eq!(barrier.rounds_completed(), 50);
    }
}
