//! The byte pipe the client talks through.

use std::{future::Future, path::Path};

use crate::error::Result;

/// How many bytes a single receive asks for when the caller has no better idea.
pub const DEFAULT_RECEIVE_SIZE: usize = 4096;

/// A half-duplex, request/response byte pipe to the printer.
///
/// [`crate::Connection`] is the real implementation; tests script replies
/// through an in-memory one.
pub trait Transport {
    /// Write all of `data`.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<()>>;

    /// Stream the raw contents of the file at `path`, returning the number
    /// of bytes written.
    fn send_file(&mut self, path: &Path) -> impl Future<Output = Result<u64>>;

    /// Perform a single read of at most `max_bytes`. When `long_timeout` is
    /// set the extended timeout applies instead of the steady-state one.
    ///
    /// An empty result means the printer closed the connection.
    fn receive(&mut self, long_timeout: bool, max_bytes: usize) -> impl Future<Output = Result<Vec<u8>>>;

    /// Release the underlying resources.
    fn close(self) -> impl Future<Output = Result<()>>;
}
