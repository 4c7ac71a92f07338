//! # LOCKSTEP Core
//!
//! Busy-wait synchronization for tightly-coupled parallel simulation:
//! - N pinned workers, one shared time step
//! - Rendezvous after every step
//! - No OS blocking latency
//!
//! ## Architecture Rules
//!
//! 1. **Never block** - Waiting threads poll atomics, they never park
//! 2. **No hot-path allocation or logging** - `wait()` touches only atomics
//! 3. **No silent simplification** - The barrier keeps both drain phases
//!
//! ## Example
//!
//! ```rust,ignore
//! use lockstep_core::{BarrierConfig, SpinBarrier};
//!
//! let config = BarrierConfig::from_toml_file("config/barrier.toml")?;
//! let barrier = SpinBarrier::from_config(&config)?;
//!
//! // On each of the N worker threads:
//! loop {
//!     compute_step();
//!     barrier.wait();
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod sync;

pub use config::{BackoffPolicy, BarrierConfig};
pub use error::{SyncError, SyncResult};
pub use sync::{
    Backoff, BarrierState, RawSpinLock, Rendezvous, SpinBarrier, SpinLock, SpinLockGuard,
    WaitPhase,
};
