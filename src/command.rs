use serde::{Deserialize, Serialize};

use crate::engine::PoolStats;

/// These are the request "commands" that can be made to a line pool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// read a file on the server host and append its lines to the pool
    Load {
        /// path of the text file, as seen by the server
        filepath: String,
    },
    /// remove and return `n` random lines from the pool
    Sample {
        /// the number of lines requested. Negative values are rejected
        n: i64,
    },
    /// get a snapshot of the pool counters
    Stats,
    /// drop every line in the pool, keeping the lifetime counters
    Clear,
    /// drop every line in the pool and zero the lifetime counters
    Reset,
    /// liveness check
    Health,
}

/// The successful payloads returned for each [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// reply to [`Request::Load`]
    Loaded {
        /// lines appended from the file
        lines_read: usize,
        /// lines held by the pool after the load
        total_lines_in_cache: usize,
    },
    /// reply to [`Request::Sample`]
    Sampled {
        /// the sampled lines, each one removed from the pool
        lines: Vec<String>,
        /// number of sampled lines
        count: usize,
        /// lines left in the pool after sampling
        remaining_in_cache: usize,
    },
    /// reply to [`Request::Stats`]
    Stats(PoolStats),
    /// reply to [`Request::Clear`]
    Cleared {
        /// lines dropped from the pool
        cleared: usize,
    },
    /// reply to [`Request::Reset`]
    Reset {
        /// always `true`
        reset: bool,
        /// lines dropped from the pool
        cleared: usize,
    },
    /// reply to [`Request::Health`]
    Healthy {
        /// always "healthy"
        status: String,
    },
}

/// The category of a failed request, mirroring the status codes of an HTTP front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// the file to load does not exist (404)
    NotFound,
    /// the file to load is not readable (403)
    PermissionDenied,
    /// the request was rejected before touching the pool (400)
    InvalidArgument,
    /// anything else (500)
    Internal,
}

/// The response Types that can be returned for any [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// this variant is returned when a request was successful
    Ok(Reply),
    /// this variant is returned if an Error occurs while processing the request
    Err {
        /// category of the error
        kind: ErrorKind,
        /// human readable description
        message: String,
    },
}
