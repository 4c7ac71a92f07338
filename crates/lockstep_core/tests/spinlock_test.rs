//! Integration tests for spinlock mutual exclusion.

use lockstep_core::{RawSpinLock, SpinBarrier, SpinLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const INCREMENTS: u64 = 100_000;

#[test]
fn test_no_lost_updates() {
    let counter = Arc::new(SpinLock::new(0_u64));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..INCREMENTS {
                    *counter.lock() += 1;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*counter.lock(), THREADS as u64 * INCREMENTS);
}

#[test]
fn test_raw_lock_excludes() {
    // Non-atomic read-modify-write on a shared cell, guarded only by the flag.
    let lock = Arc::new(RawSpinLock::new());
    let value = Arc::new(AtomicUsize::new(0));
    let inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let value = Arc::clone(&value);
            let inside = Arc::clone(&inside);
            thread::spawn(move || {
                for _ in 0..50_000 {
                    lock.lock();
                    assert_eq!(inside.fetch_add(1, Ordering::Relaxed), 0);
                    let v = value.load(Ordering::Relaxed);
                    value.store(v + 1, Ordering::Relaxed);
                    inside.fetch_sub(1, Ordering::Relaxed);
                    lock.unlock();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(value.load(Ordering::Relaxed), 4 * 50_000);
    assert!(!lock.is_locked());
}

#[test]
fn test_lock_inside_simulation_step() {
    // Workers accumulate into a shared total each step, then rendezvous.
    const STEPS: u64 = 200;
    let total = Arc::new(SpinLock::new(0_u64));
    let barrier = Arc::new(SpinBarrier::new(4));

    let handles: Vec<_> = (0..4_u64)
        .map(|id| {
            let total = Arc::clone(&total);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                for step in 1..=STEPS {
                    *total.lock() += id + 1;
                    barrier.wait();
                    // Every worker's contribution for this step is in.
                    assert!(*total.lock() >= step * 10);
                    barrier.wait();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*total.lock(), STEPS * 10);
}
