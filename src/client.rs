use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::Deserializer;

use crate::command::{Reply, Request, Response};
use crate::engine::PoolStats;
use crate::{PoolError, Result};

/// `PoolClient` contains the functionality for communication with a [`PoolServer`].
///
/// A single connection can carry any number of requests.
///
/// [`PoolServer`]: ./struct.PoolServer.html
pub struct PoolClient {
    reader: Deserializer<IoRead<BufReader<TcpStream>>>,
    writer: BufWriter<TcpStream>,
}

impl PoolClient {
    /// creates a client and establishes a socket connection to the server at the given `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;

        Ok(PoolClient {
            reader: Deserializer::from_reader(BufReader::new(tcp_reader)),
            writer: BufWriter::new(tcp_writer),
        })
    }

    /// asks the server to load the file at `filepath` (a path on the server's host)
    /// # Returns
    /// `Reply::Loaded` holding the number of lines read and the resulting pool size
    /// # Errors
    /// `PoolError::Server` with `ErrorKind::NotFound` or `ErrorKind::PermissionDenied` if the
    /// file could not be opened, `ErrorKind::InvalidArgument` if it was rejected
    pub fn load(&mut self, filepath: String) -> Result<Reply> {
        self.send(Request::Load { filepath })
    }

    /// removes `n` random lines from the server's pool and returns them
    /// # Returns
    /// `Reply::Sampled` holding the lines, their count, and the remaining pool size
    /// # Errors
    /// `PoolError::InvalidArgument` if `n` is negative; the request is not sent
    pub fn sample(&mut self, n: i64) -> Result<Reply> {
        if n < 0 {
            return Err(PoolError::InvalidArgument("n must be >= 0".to_string()));
        }
        self.send(Request::Sample { n })
    }

    /// gets a snapshot of the server's pool counters
    pub fn stats(&mut self) -> Result<PoolStats> {
        match self.send(Request::Stats)? {
            Reply::Stats(stats) => Ok(stats),
            other => Err(unexpected(other)),
        }
    }

    /// drops every line held by the server, keeping its lifetime counters
    pub fn clear(&mut self) -> Result<Reply> {
        self.send(Request::Clear)
    }

    /// drops every line held by the server and zeroes its lifetime counters
    pub fn reset(&mut self) -> Result<Reply> {
        self.send(Request::Reset)
    }

    /// checks that the server is up
    pub fn health(&mut self) -> Result<Reply> {
        self.send(Request::Health)
    }

    /// writes `req` to the server and waits for its response
    fn send(&mut self, req: Request) -> Result<Reply> {
        serde_json::to_writer(&mut self.writer, &req)?;
        self.writer.flush()?;

        match Response::deserialize(&mut self.reader)? {
            Response::Ok(reply) => Ok(reply),
            Response::Err { kind, message } => Err(PoolError::Server { kind, message }),
        }
    }
}

fn unexpected(reply: Reply) -> PoolError {
    PoolError::StringErr(format!("unexpected reply from server: {:?}", reply))
}
