//! # Spinlock
//!
//! Mutual exclusion by pure busy-waiting. No kernel involvement, no
//! ownership tracking, no reentrancy, no fairness.
//!
//! ## Safety Note
//!
//! [`SpinLock`] hands out `&mut T` through an `UnsafeCell`. Exclusive access
//! is guaranteed by [`RawSpinLock`]: a guard exists only while the flag is held.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// Bare lock flag with `lock()` / `unlock()`.
///
/// Two observable states, free and held. Nothing records which thread holds
/// it, so any thread may call `unlock()`. A holder that never unlocks
/// deadlocks every other caller.
#[derive(Debug, Default)]
pub struct RawSpinLock {
    locked: AtomicBool,
}

impl RawSpinLock {
    /// Creates an unlocked lock.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until the lock is claimed by this caller.
    #[inline]
    pub fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Poll with plain loads so waiters don't bounce the cache line.
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    /// Single claim attempt. Returns `true` if the lock is now held.
    #[inline]
    #[must_use]
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock.
    #[inline]
    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Whether the lock is currently held. Racy; for diagnostics only.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// A value protected by a [`RawSpinLock`].
///
/// ## Usage
///
/// ```rust
/// use lockstep_core::SpinLock;
///
/// let counter = SpinLock::new(0_u64);
/// {
///     let mut guard = counter.lock();
///     *guard += 1;
/// } // unlocked here
/// assert_eq!(counter.into_inner(), 1);
/// ```
#[derive(Default)]
pub struct SpinLock<T> {
    raw: RawSpinLock,
    value: UnsafeCell<T>,
}

// SAFETY: the value is only reachable through a guard, and guards are
// mutually exclusive. Moving the lock moves the value, hence `T: Send`.
unsafe impl<T: Send> Send for SpinLock<T> {}
// SAFETY: see above; sharing the lock only ever shares exclusive access.
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Wraps `value` in an unlocked lock.
    #[inline]
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            raw: RawSpinLock::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Spins until the lock is held, then returns a guard.
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.raw.lock();
        SpinLockGuard {
            lock: self,
            _marker: PhantomData,
        }
    }

    /// Single claim attempt.
    #[inline]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        // Must stay lazy: every guard unlocks on drop.
        self.raw.try_lock().then(|| SpinLockGuard {
            lock: self,
            _marker: PhantomData,
        })
    }

    /// Whether a guard is currently alive. Racy; for diagnostics only.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Mutable access without locking; `&mut self` already proves exclusivity.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Consumes the lock and returns the value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("SpinLock");
        match self.try_lock() {
            Some(guard) => d.field("value", &*guard),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.finish()
    }
}

/// Exclusive access to the value of a [`SpinLock`]. Unlocks on drop.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
    /// Sharing a guard shares `&T`, so it is only `Sync` when `T` is.
    _marker: PhantomData<&'a mut T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: the guard holds the lock
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the guard holds the lock
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.raw.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_lock_unlock() {
        let lock = RawSpinLock::new();
        assert!(!lock.is_locked());

        lock.lock();
        assert!(lock.is_locked());
        assert!(!lock.try_lock());

        lock.unlock();
        assert!(!lock.is_locked());
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = SpinLock::new(5_u32);
        {
            let mut guard = lock.lock();
            *guard += 1;
            assert!(lock.is_locked());
            assert!(lock.try_lock().is_none());
        }
        assert!(!lock.is_locked());
        assert_eq!(*lock.lock(), 6);
    }

    #[test]
    fn test_get_mut_and_into_inner() {
        let mut lock = SpinLock::new(vec![1, 2]);
        lock.get_mut().push(3);
        assert_eq!(lock.into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn test_debug_shows_locked() {
        let lock = SpinLock::new(7);
        assert_eq!(format!("{lock:?}"), "SpinLock { value: 7 }");

        let _guard = lock.lock();
        assert_eq!(format!("{lock:?}"), "SpinLock { value: <locked> }");
    }
}
