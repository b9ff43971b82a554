use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};

use super::{LineEngine, PoolStats};
use crate::error::{PoolError, Result};

/// The primary struct for working with a line pool.
///
/// A `LinePool` is a cheap handle to a shared, mutex guarded vector of lines plus its lifetime
/// counters. Cloning it hands out another handle to the same pool, which is how every worker
/// thread of a [`PoolServer`] gets access to it.
///
/// Each operation holds the lock for its whole read-modify-write sequence, so the effect of
/// concurrent calls is always that of some serial ordering of them.
///
/// [`PoolServer`]: ../struct.PoolServer.html
#[derive(Clone)]
pub struct LinePool {
    state: Arc<Mutex<PoolState>>,

    // maximum number of lines the pool may hold, `None` for unbounded
    max_lines: Option<usize>,
}

struct PoolState {
    // live lines. Order carries no meaning, sampling reorders them
    lines: Vec<String>,

    total_loaded: u64,
    total_sampled: u64,
    total_cleared: u64,

    // kept under the same lock as `lines` so each draw sees the current live length
    rng: StdRng,
}

impl LinePool {
    /// creates an empty, unbounded pool
    pub fn new() -> Self {
        Self::build(None, StdRng::from_entropy())
    }

    /// creates an empty pool that will never hold more than `max_lines` lines.
    /// Loads that do not fit are truncated, see [`LineEngine::load`]
    pub fn with_capacity_limit(max_lines: usize) -> Self {
        Self::build(Some(max_lines), StdRng::from_entropy())
    }

    /// replaces the pool's random number generator with one seeded by `seed`, making the
    /// sequence of sampled lines reproducible for a given sequence of operations
    pub fn with_rng_seed(self, seed: u64) -> Self {
        self.lock().rng = StdRng::seed_from_u64(seed);
        self
    }

    /// the capacity limit this pool was created with
    pub fn capacity_limit(&self) -> Option<usize> {
        self.max_lines
    }

    fn build(max_lines: Option<usize>, rng: StdRng) -> Self {
        LinePool {
            state: Arc::new(Mutex::new(PoolState {
                lines: Vec::new(),
                total_loaded: 0,
                total_sampled: 0,
                total_cleared: 0,
                rng,
            })),
            max_lines,
        }
    }

    // every critical section leaves the state consistent, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LinePool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LinePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("LinePool")
            .field("max_lines", &self.max_lines)
            .field("stats", &stats)
            .finish()
    }
}

impl LineEngine for LinePool {
    /// appends as much of `batch` as the capacity limit allows, in one atomic step
    #[instrument(skip(self, batch), fields(offered = batch.len()))]
    fn load(&self, mut batch: Vec<String>) -> usize {
        let mut state = self.lock();
        let accepted = match self.max_lines {
            Some(max) => max.saturating_sub(state.lines.len()).min(batch.len()),
            None => batch.len(),
        };
        batch.truncate(accepted);
        state.lines.extend(batch);
        state.total_loaded += accepted as u64;
        debug!(accepted, current_lines = state.lines.len());
        accepted
    }

    /// draws `min(n, len)` lines by swap-and-pop: pick a uniform index in the live range, swap
    /// it with the last live line and pop it. O(k) for k sampled lines
    #[instrument(skip(self))]
    fn sample(&self, n: i64) -> Result<Vec<String>> {
        let n = usize::try_from(n)
            .map_err(|_| PoolError::InvalidArgument(format!("n must be >= 0, got {}", n)))?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut guard = self.lock();
        let state = &mut *guard;
        let k = n.min(state.lines.len());
        let mut sampled = Vec::with_capacity(k);
        for _ in 0..k {
            let i = state.rng.gen_range(0..state.lines.len());
            sampled.push(state.lines.swap_remove(i));
        }
        state.total_sampled += k as u64;
        info!("Sampled {} lines. Remaining cache size: {}", k, state.lines.len());
        Ok(sampled)
    }

    fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            current_lines: state.lines.len(),
            total_loaded: state.total_loaded,
            total_sampled: state.total_sampled,
            total_cleared: state.total_cleared,
        }
    }

    fn clear(&self) -> usize {
        let mut state = self.lock();
        let cleared = state.lines.len();
        state.lines.clear();
        state.total_cleared += cleared as u64;
        info!("Cleared {} lines from cache", cleared);
        cleared
    }

    fn reset(&self) -> usize {
        let mut state = self.lock();
        let cleared = state.lines.len();
        state.lines.clear();
        state.total_loaded = 0;
        state.total_sampled = 0;
        state.total_cleared = 0;
        info!("Reset cache, {} lines dropped", cleared);
        cleared
    }
}
