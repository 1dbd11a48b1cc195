//! Common type definitions shared by the engine and the worker pipeline.
//!
//! - [`Processing`]: which direction a pipeline runs
//! - [`Task`]: one chunk on its way into the executor
//! - [`TaskResult`]: one processed chunk on its way to the writer
//! - [`Progress`]: byte-count observer supplied by the caller

use std::fmt::{Display, Formatter};

use crate::error::Error;

/// Direction of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processing {
    Encryption,
    Decryption,
}

impl Processing {
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encryption => "Encrypting...",
            Self::Decryption => "Decrypting...",
        }
    }
}

impl Display for Processing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A unit of work for the executor.
pub struct Task {
    /// Plaintext (encryption) or sealed frame body (decryption).
    pub data: Vec<u8>,

    /// Position in the stream; drives the chunk nonce and the write order.
    pub index: u64,

    /// Whether this is the final chunk of the stream.
    pub last: bool,
}

/// Result of processing a [`Task`].
pub struct TaskResult {
    /// The processed data (empty if an error occurred).
    pub data: Vec<u8>,

    /// Failure for this chunk, `None` on success.
    pub error: Option<Error>,

    pub index: u64,

    /// Plaintext bytes this chunk accounts for. Used for progress and the
    /// size check on decryption.
    pub size: usize,

    pub last: bool,
}

impl TaskResult {
    #[inline]
    pub fn ok(task: &Task, data: Vec<u8>, size: usize) -> Self {
        Self { data, error: None, index: task.index, size, last: task.last }
    }

    #[inline]
    pub fn err(task: &Task, error: Error) -> Self {
        Self { data: Vec::new(), error: Some(error), index: task.index, size: 0, last: task.last }
    }
}

/// Observer for plaintext bytes processed.
///
/// Called from the engine's writer as chunks are committed in order, so
/// `advance` never runs concurrently with itself for one operation.
pub trait Progress: Send + Sync {
    /// Total plaintext bytes expected.
    fn start(&self, _total: u64) {}

    fn advance(&self, bytes: u64);

    /// The operation completed and its output was published.
    fn finish(&self) {}
}
