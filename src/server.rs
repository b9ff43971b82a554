use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::path::Path;

use serde_json::Deserializer;
use tracing::{debug, error, info, warn};

use crate::command::{Reply, Request, Response};
use crate::config::Limits;
use crate::engine::LineEngine;
use crate::error::{PoolError, Result};
use crate::loader::FileLoader;
use crate::thread_pool::ThreadPool;

/// A TCP socket server over a [`LineEngine`].
/// It listens for incoming [`Request`]s on a [`SocketAddr`](https://doc.rust-lang.org/std/net/enum.SocketAddr.html),
/// and serves every connection on a thread from its [`ThreadPool`].
///
/// Each connection receives a handle to the engine through a [`Router`].
///
/// # Example
/// Create and run a new server listening on "127.0.0.1:4000", with 4 threads running on a Rayon
/// Thread Pool
/// ```rust
/// use linepool::{LinePool, Limits, PoolServer};
/// use linepool::thread_pool::{RayonThreadPool, ThreadPool};
/// # fn main() -> linepool::Result<()> {
/// let limits = Limits::default();
/// let pool = RayonThreadPool::new(4)?;
/// let engine = LinePool::with_capacity_limit(limits.max_lines);
/// let server = PoolServer::new(engine, pool, limits);
/// //server.run("127.0.0.1:4000")?;
/// # Ok(())
/// # }
/// ```
pub struct PoolServer<E: LineEngine, P: ThreadPool> {
    router: Router<E>,
    /// a pool of threads that will serve connections
    pool: P,
}

impl<E: LineEngine, P: ThreadPool> PoolServer<E, P> {
    /// Create a new `PoolServer` over the given engine and thread pool, enforcing `limits`
    pub fn new(engine: E, pool: P, limits: Limits) -> Self {
        PoolServer {
            router: Router::new(engine, limits),
            pool,
        }
    }

    /// starts a server listening on the given address.
    /// Each connection that comes in gets serviced on its own thread from the ThreadPool
    ///
    /// # Errors
    /// returns [`PoolError::Io`] if the address could not be bound
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve_listener(listener)
    }

    /// serves connections accepted on an already bound `listener`. Never returns unless the
    /// local address of the listener cannot be read
    pub fn serve_listener(self, listener: TcpListener) -> Result<()> {
        info!("Listening on {}", listener.local_addr()?);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = self.router.clone();
                    self.pool.spawn(move || {
                        if let Err(e) = serve(router, stream) {
                            error!("Error on serving client: {}", e);
                        }
                    });
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }
        Ok(())
    }
}

/// Maps [`Request`]s onto operations of a [`LineEngine`] and turns their results into
/// [`Response`]s.
///
/// All validation that can fail (empty paths, file checks, sample size limits) happens before
/// the engine is mutated.
#[derive(Debug, Clone)]
pub struct Router<E: LineEngine> {
    engine: E,
    loader: FileLoader,
    max_sample_size: u64,
}

impl<E: LineEngine> Router<E> {
    /// creates a router over `engine` that enforces `limits`
    pub fn new(engine: E, limits: Limits) -> Self {
        Router {
            engine,
            loader: FileLoader::new(limits),
            max_sample_size: limits.max_sample_size,
        }
    }

    /// executes `req` against the engine
    pub fn handle(&self, req: Request) -> Response {
        let result = match req {
            Request::Load { filepath } => self.load(&filepath),
            Request::Sample { n } => self.sample(n),
            Request::Stats => Ok(Reply::Stats(self.engine.stats())),
            Request::Clear => Ok(Reply::Cleared {
                cleared: self.engine.clear(),
            }),
            Request::Reset => Ok(Reply::Reset {
                reset: true,
                cleared: self.engine.reset(),
            }),
            Request::Health => Ok(Reply::Healthy {
                status: "healthy".to_string(),
            }),
        };

        match result {
            Ok(reply) => Response::Ok(reply),
            Err(e) => {
                match &e {
                    PoolError::Io(_) | PoolError::StringErr(_) => error!("{}", e),
                    _ => warn!("request rejected: {}", e),
                }
                Response::Err {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    fn load(&self, filepath: &str) -> Result<Reply> {
        if filepath.trim().is_empty() {
            return Err(PoolError::InvalidArgument(
                "filepath cannot be empty".to_string(),
            ));
        }
        let lines_read = self.loader.load_file(&self.engine, Path::new(filepath))?;
        Ok(Reply::Loaded {
            lines_read,
            total_lines_in_cache: self.engine.stats().current_lines,
        })
    }

    fn sample(&self, n: i64) -> Result<Reply> {
        if n > 0 && n as u64 > self.max_sample_size {
            return Err(PoolError::SampleTooLarge {
                requested: n,
                limit: self.max_sample_size,
            });
        }
        let lines = self.engine.sample(n)?;
        Ok(Reply::Sampled {
            count: lines.len(),
            lines,
            remaining_in_cache: self.engine.stats().current_lines,
        })
    }
}

/// Listens for and processes [`Request`]s coming over the given `tcp` stream.
/// This function will: deserialize each request, execute it through the router,
/// and finally write a [`Response`] back to the client on the `tcp` stream
fn serve<E: LineEngine>(router: Router<E>, tcp: TcpStream) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    let stream_reader = BufReader::new(&tcp);
    let mut stream_writer = BufWriter::new(&tcp);
    let req_reader = Deserializer::from_reader(stream_reader).into_iter::<Request>();

    for req in req_reader {
        let req = req?;
        debug!("Receive request from {}: {:?}", peer_addr, req);

        let resp = router.handle(req);
        serde_json::to_writer(&mut stream_writer, &resp)?;
        stream_writer.flush()?;
        debug!("Response sent to {}: {:?}", peer_addr, resp);
    }
    Ok(())
}
