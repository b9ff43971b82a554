//! This module provides the line storage engine: the [`LineEngine`] trait, which is the seam the
//! [`PoolServer`] and [`FileLoader`] are written against, and [`LinePool`], its in-memory,
//! mutex guarded implementation.
//!
//! [`PoolServer`]: ../struct.PoolServer.html
//! [`FileLoader`]: ../struct.FileLoader.html
use serde::{Deserialize, Serialize};

use crate::Result;

/// A trait for the basic functionality of a destructive line store.
///
/// Every operation is atomic with respect to every other operation on the same store.
pub trait LineEngine: Clone + Send + 'static {
    /// Appends a `batch` of lines to the store.
    ///
    /// Returns the number of lines actually appended, which is less than `batch.len()` only
    /// when the store has a capacity limit and the batch did not fit.
    fn load(&self, batch: Vec<String>) -> usize;

    /// Removes up to `n` distinct, uniformly chosen lines from the store and returns them.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidArgument` if `n` is negative. The store is left untouched.
    fn sample(&self, n: i64) -> Result<Vec<String>>;

    /// Returns a consistent snapshot of the store counters
    fn stats(&self) -> PoolStats;

    /// Drops every line, keeping the lifetime counters. Returns the number of lines dropped.
    fn clear(&self) -> usize;

    /// Drops every line and zeroes the lifetime counters. Returns the number of lines dropped.
    fn reset(&self) -> usize;
}

/// A point-in-time snapshot of a [`LineEngine`]'s counters.
///
/// As long as only loads and samples happen, `current_lines == total_loaded - total_sampled`.
/// Lines dropped by a clear are accounted for in `total_cleared`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// lines currently held
    pub current_lines: usize,
    /// lines appended since creation (or the last reset)
    pub total_loaded: u64,
    /// lines removed by sampling since creation (or the last reset)
    pub total_sampled: u64,
    /// lines dropped by clears since creation (or the last reset)
    pub total_cleared: u64,
}

mod pool;

pub use self::pool::LinePool;
