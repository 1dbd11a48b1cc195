//! Streaming chunk engine.
//!
//! ```text
//! reader (async) -> bounded channel -> executor (rayon, blocking thread)
//!                -> bounded channel -> writer (async, reorders)
//! ```
//!
//! Bounded channels keep memory proportional to the core count rather than
//! the file size. Chunks are sealed independently (each has its own nonce and
//! associated data), so they can be processed in any order and written back
//! in sequence.

use std::thread;

use flume::bounded;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Processing, Progress};
use crate::worker::executor::Executor;
use crate::worker::pipeline::Pipeline;
use crate::worker::reader::Reader;
use crate::worker::writer::{Writer, Written};

pub mod buffer;
pub mod executor;
pub mod pipeline;
pub mod reader;
pub mod writer;

/// Totals for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Bytes consumed from the input stream.
    pub bytes_read: u64,

    /// Chunks written to the output.
    pub chunks: u64,

    /// Plaintext bytes accounted for by the written chunks.
    pub plaintext: u64,

    /// Whether the final chunk reached the output.
    pub finished: bool,
}

pub struct Worker {
    pipeline: Pipeline,
    mode: Processing,
    chunk_size: usize,
    tag_len: usize,
    concurrency: usize,
}

impl Worker {
    pub fn new(pipeline: Pipeline, mode: Processing, chunk_size: usize, tag_len: usize) -> Self {
        let concurrency = thread::available_parallelism().map_or(4, |p| p.get());
        Self { pipeline, mode, chunk_size, tag_len, concurrency }
    }

    /// Runs `input` through the pipeline into `output`.
    ///
    /// Errors are reported with the reader's taking precedence: a reader that
    /// stopped because the writer hung up reports success, leaving the
    /// writer's error as the cause.
    pub async fn process<R, W>(self, input: R, output: W, cancel: &CancellationToken, progress: Option<&dyn Progress>) -> Result<Summary>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let capacity = self.concurrency * 2;
        let (task_sender, task_receiver) = bounded(capacity);
        let (result_sender, result_receiver) = bounded(capacity);

        let reader = Reader::new(self.mode, self.chunk_size, self.tag_len)?;
        let mut writer = Writer::new(self.mode);

        debug!(mode = ?self.mode, concurrency = self.concurrency, chunk_size = self.chunk_size, "starting worker");

        let executor = Executor::new(self.pipeline);
        let executing = tokio::task::spawn_blocking(move || executor.process(&task_receiver, &result_sender));

        let reading = async move {
            // The sender is dropped when reading ends, which closes the
            // executor's input.
            let sender = task_sender;
            reader.read_all(input, &sender, cancel).await
        };

        let (read_result, write_result, executed) = tokio::join!(reading, writer.write_all(output, result_receiver, cancel, progress), executing);

        executed.map_err(|e| Error::Internal(format!("executor task failed: {e}")))?;

        let bytes_read = read_result?;
        let Written { chunks, plaintext, finished } = write_result?;

        Ok(Summary { bytes_read, chunks, plaintext, finished })
    }
}
