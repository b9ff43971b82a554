//! Safety limits shared by the loader, the pool and the server.
//!
//! Every limit has a default and can be overridden through an environment variable.
//! The server executable additionally lets command line options override both.
use std::env;
use std::str::FromStr;

use crate::error::{PoolError, Result};

/// default maximum size, in MiB, of a file that can be loaded
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 500;
/// default maximum number of lines the pool may hold
pub const DEFAULT_MAX_LINES: usize = 10_000_000;
/// default maximum number of lines a single sample request may ask for
pub const DEFAULT_MAX_SAMPLE_SIZE: u64 = 1_000_000;
/// default number of lines appended to the pool per lock acquisition while loading a file
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// The limits a server enforces around its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// files bigger than this (in MiB) are rejected before they are read
    pub max_file_size_mb: u64,
    /// capacity of the pool, loads are truncated once it is reached
    pub max_lines: usize,
    /// sample requests for more lines than this are rejected
    pub max_sample_size: u64,
    /// lines read from a file before they are appended to the pool in one step
    pub chunk_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            max_lines: DEFAULT_MAX_LINES,
            max_sample_size: DEFAULT_MAX_SAMPLE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Limits {
    /// builds the default limits, overridden by the `MAX_FILE_SIZE_MB`, `MAX_CACHE_LINES`,
    /// `MAX_SAMPLE_SIZE` and `LOAD_CHUNK_SIZE` environment variables when they are set
    ///
    /// # Errors
    /// returns [`PoolError::Parsing`] if a variable is set but does not hold a valid number
    pub fn from_env() -> Result<Limits> {
        let defaults = Limits::default();
        let limits = Limits {
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", defaults.max_file_size_mb)?,
            max_lines: env_or("MAX_CACHE_LINES", defaults.max_lines)?,
            max_sample_size: env_or("MAX_SAMPLE_SIZE", defaults.max_sample_size)?,
            chunk_size: env_or("LOAD_CHUNK_SIZE", defaults.chunk_size)?,
        };
        limits.validate()
    }

    /// checks that the limits are usable. A zero chunk size would never make progress
    pub fn validate(self) -> Result<Limits> {
        if self.chunk_size == 0 {
            return Err(PoolError::Parsing("chunk size must be greater than 0".to_string()));
        }
        Ok(self)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| {
            PoolError::Parsing(format!("could not parse {}={:?} into a number", key, value))
        }),
        Err(_) => Ok(default),
    }
}
