//! gpool - a fixed-capacity pool of leasable worker threads.
//!
//! Callers lease a [`Worker`], hand it any number of closures and release it
//! when done. A [`Group`] leases several workers at once, runs one function
//! on all of them and waits for every run to finish. The pool never runs more
//! than `capacity` leases at a time: `acquire` blocks until a worker is free.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use gpool::Pool;
//!
//! let pool = Pool::new(4)?;
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let group = pool.acquire_group(4)?;
//! let h = hits.clone();
//! group.exec(move || {
//!     h.fetch_add(1, Ordering::SeqCst);
//! })?;
//! group.wait_and_release();
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 4);
//! pool.close();
//! # Ok::<(), gpool::PoolError>(())
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod logging;
pub mod pool;

// Re-exports for convenience
pub use config::Config;
pub use pool::{Group, Pool, PoolError, PoolResult, Stats, Worker};
