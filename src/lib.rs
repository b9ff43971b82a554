#![deny(missing_docs)]
//! A multithreaded, in-memory line store that ingests text files and serves random,
//! non-repeating samples of their lines.
//!
//! This crate provides the [`LinePool`] implementation itself, as well as a
//! [`linepool-client`] and [`linepool-server`] executable that can be used to interact with it.
//! Requests are sent between the client and server using synchronous networking over a
//! custom protocol.
//!
//! ## Supported Operations
//! The pool supports the following operations:
//!
//! - `LOAD` a file: every line of it is appended to the pool
//! - `SAMPLE` n lines: up to `n` distinct lines are chosen uniformly at random, removed from the
//! pool and returned. A sampled line can never be returned again
//! - `STATS`: the current pool size, and the number of lines ever loaded and sampled
//! - `CLEAR` the pool, keeping its lifetime counters
//! - `RESET` the pool and its counters
//!
//! See the [`LineEngine`] trait and the [`Request`] and [`Response`] types for more information
//! on the structure of these operations.
//!
//! ## LinePool
//! [`LinePool`] is the implementor of the [`LineEngine`] trait and the brains of this entire
//! operation. A single mutex guards its lines and counters, so each operation is atomic with
//! respect to every other and the number of lines held always equals the number loaded minus
//! the number sampled (and cleared). Sampling uses swap-and-pop, so it runs in time proportional
//! to the number of lines sampled, not to the size of the pool.
//!
//! Nothing is persisted: the pool's contents are gone once the process exits.
//!
//! ## Loading files
//! The [`FileLoader`] checks a file's existence and size against the configured [`Limits`]
//! before reading it, then appends its lines to the pool in chunks.
//!
//! ## Client / Server
//! Client and server logic is contained in the [`PoolClient`] and [`PoolServer`] structs. They
//! are responsible for the networking portion of this application, and handle the
//! serialization of data to/from the custom protocol.
//!
//! ## Custom Protocol
//! A [`Request`] is encoded to a JSON string and sent over a `TcpStream`. If the server was
//! able to service it, an `Ok` [`Response`] holding a [`Reply`] is returned. If an error
//! occurred, an `Err` response is returned, containing an [`ErrorKind`] and a description of
//! the error.
//!
//! [`linepool-server`]: ./linepool-server.rs
//! [`linepool-client`]: ./linepool-client.rs

pub use client::PoolClient;
pub use command::{ErrorKind, Reply, Request, Response};
pub use config::Limits;
pub use engine::{LineEngine, LinePool, PoolStats};
pub use error::{PoolError, Result};
pub use loader::{split_lines, FileLoader, SplitLines};
pub use server::{PoolServer, Router};
pub use thread_pool::{NaiveThreadPool, RayonThreadPool, SharedQueueThreadPool, ThreadPool};

mod client;
mod command;
pub mod config;
mod engine;
mod error;
mod loader;
mod server;
pub mod thread_pool;
