//! Reads text files from disk and feeds their lines into a [`LineEngine`] in chunks.
//!
//! All file checks (existence, permissions, size) happen before the first line is read, and the
//! file is read outside of the engine's lock. Each chunk is appended atomically, so a concurrent
//! sample may observe the file partially loaded, but never a partially appended chunk.
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::mem;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::config::Limits;
use crate::engine::LineEngine;
use crate::error::{PoolError, Result};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Loads files into a [`LineEngine`], enforcing the file size limit and chunking the appends
#[derive(Debug, Clone, Copy)]
pub struct FileLoader {
    limits: Limits,
}

impl FileLoader {
    /// creates a loader that enforces the given `limits`
    pub fn new(limits: Limits) -> Self {
        FileLoader { limits }
    }

    /// reads the file at `path` and appends every line of it to `engine`.
    ///
    /// Lines are split on `\n`, and a trailing `\r` is stripped. Blank and whitespace only lines
    /// are kept. Invalid UTF-8 is replaced with `U+FFFD`.
    ///
    /// If the engine reaches its capacity part way through the file, loading stops and the
    /// number of lines appended so far is returned.
    ///
    /// # Errors
    /// - [`PoolError::NotFound`] / [`PoolError::PermissionDenied`] if the file cannot be opened
    /// - [`PoolError::InvalidArgument`] if `path` is not a regular file
    /// - [`PoolError::FileTooLarge`] if the file exceeds the size limit. Nothing is appended
    /// - [`PoolError::CapacityExceeded`] if the engine was already full
    /// - [`PoolError::Io`] if reading fails. Chunks appended before the failure stay appended
    #[instrument(skip(self, engine))]
    pub fn load_file<E: LineEngine>(&self, engine: &E, path: &Path) -> Result<usize> {
        let metadata = fs::metadata(path).map_err(|e| open_error(e, path))?;
        if !metadata.is_file() {
            return Err(PoolError::InvalidArgument(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let size_mb = metadata.len() as f64 / BYTES_PER_MB;
        if size_mb > self.limits.max_file_size_mb as f64 {
            return Err(PoolError::FileTooLarge {
                size_mb,
                limit_mb: self.limits.max_file_size_mb,
            });
        }

        let file = File::open(path).map_err(|e| open_error(e, path))?;
        let appended = self.load_reader(engine, BufReader::new(file))?;

        info!(
            "Loaded {} lines. Cache: {}",
            appended,
            engine.stats().current_lines
        );
        Ok(appended)
    }

    /// appends every line read from `reader` to `engine`, `chunk_size` lines at a time.
    /// Returns the number of lines appended
    pub fn load_reader<E: LineEngine, R: BufRead>(&self, engine: &E, reader: R) -> Result<usize> {
        let chunk_size = self.limits.chunk_size.max(1);
        let mut appended = 0;
        let mut batch = Vec::new();

        for line in split_lines(reader) {
            batch.push(line?);
            if batch.len() >= chunk_size && !flush(engine, &mut batch, &mut appended)? {
                return Ok(appended);
            }
        }
        if !batch.is_empty() {
            flush(engine, &mut batch, &mut appended)?;
        }
        Ok(appended)
    }
}

/// appends `batch` to `engine`, leaving `batch` empty.
/// Returns `Ok(false)` when the engine could not take the whole batch
fn flush<E: LineEngine>(engine: &E, batch: &mut Vec<String>, appended: &mut usize) -> Result<bool> {
    let offered = batch.len();
    let accepted = engine.load(mem::take(batch));
    *appended += accepted;
    debug!(offered, accepted, "flushed chunk");

    if accepted == offered {
        return Ok(true);
    }
    let current = engine.stats().current_lines;
    if *appended == 0 {
        return Err(PoolError::CapacityExceeded(current));
    }
    warn!(
        "Cache limit reached after {} lines, {} lines dropped from the chunk",
        appended,
        offered - accepted
    );
    Ok(false)
}

/// maps the io errors of opening a file into their [`PoolError`] counterparts
fn open_error(e: io::Error, path: &Path) -> PoolError {
    match e.kind() {
        io::ErrorKind::NotFound => PoolError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => PoolError::PermissionDenied(path.to_path_buf()),
        _ => PoolError::Io(e),
    }
}

/// Returns an iterator over the lines of `reader`.
///
/// Unlike [`BufRead::lines`], invalid UTF-8 does not end the iteration; it is decoded lossily.
pub fn split_lines<R: BufRead>(reader: R) -> SplitLines<R> {
    SplitLines {
        reader,
        buf: Vec::new(),
    }
}

/// Iterator returned by [`split_lines`]
#[derive(Debug)]
pub struct SplitLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for SplitLines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
