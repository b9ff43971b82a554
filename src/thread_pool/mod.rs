//! Thread pools used by the [`PoolServer`] to serve connections.
//!
//! Three implementations are provided, selectable at server start-up:
//! - [`NaiveThreadPool`] starts a new thread for every job
//! - [`SharedQueueThreadPool`] runs jobs on a fixed set of threads fed by a crossbeam channel
//! - [`RayonThreadPool`] runs jobs on a rayon work stealing pool
//!
//! [`PoolServer`]: ../struct.PoolServer.html
use crate::Result;

/// The functionality shared by every thread pool implementation
pub trait ThreadPool: Send + 'static {
    /// creates a new thread pool holding (at most) `threads` threads.
    ///
    /// # Errors
    /// returns an error if any of the threads could not be created
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// runs `job` on one of the pool's threads.
    ///
    /// A job that panics does not take the pool down with it.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}

mod naive;
mod rayon_pool;
mod shared_queue;

pub use self::naive::NaiveThreadPool;
pub use self::rayon_pool::RayonThreadPool;
pub use self::shared_queue::SharedQueueThreadPool;
