//! Ordered output stage.
//!
//! Results arrive from the executor in completion order. The writer puts
//! them back in sequence, frames them (encryption) or writes the recovered
//! plaintext (decryption), and reports progress in plaintext bytes. The first
//! failed result aborts the run as soon as it arrives.

use flume::Receiver;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::header::FrameHeader;
use crate::types::{Processing, Progress, TaskResult};
use crate::worker::buffer::Buffer;

/// What reached the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Written {
    pub chunks: u64,

    /// Plaintext bytes accounted for by the written chunks.
    pub plaintext: u64,

    /// Whether the final chunk was written.
    pub finished: bool,
}

pub struct Writer {
    mode: Processing,
    buffer: Buffer,
    written: Written,
}

impl Writer {
    #[inline]
    pub fn new(mode: Processing) -> Self {
        Self { mode, buffer: Buffer::new(0), written: Written::default() }
    }

    pub async fn write_all<W: AsyncWrite + Unpin>(&mut self, output: W, receiver: Receiver<TaskResult>, cancel: &CancellationToken, progress: Option<&dyn Progress>) -> Result<Written> {
        let mut writer = BufWriter::new(output);

        while let Ok(mut result) = receiver.recv_async().await {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if let Some(error) = result.error.take() {
                return Err(error);
            }

            let ready = self.buffer.add(result);
            self.write_batch(&mut writer, ready, progress).await?;
        }

        if self.buffer.pending() > 0 {
            return Err(Error::Internal(format!("chunk {} never arrived", self.buffer.next_index())));
        }

        writer.flush().await.map_err(Error::io_with("failed to flush output"))?;
        Ok(self.written)
    }

    async fn write_batch<W: AsyncWrite + Unpin>(&mut self, writer: &mut W, results: Vec<TaskResult>, progress: Option<&dyn Progress>) -> Result<()> {
        for mut result in results {
            if self.written.finished {
                return Err(Error::Internal(format!("chunk {} follows the final chunk", result.index)));
            }

            if self.mode == Processing::Encryption {
                let header = FrameHeader::new(result.last, result.data.len())?;
                writer.write_all(&header.encode()).await.map_err(Error::io_with("failed to write frame header"))?;
            }

            let written = writer.write_all(&result.data).await;
            if self.mode == Processing::Decryption {
                result.data.zeroize();
            }
            written.map_err(Error::io_with("failed to write chunk"))?;

            self.written.chunks += 1;
            self.written.plaintext += result.size as u64;
            self.written.finished = result.last;

            if let Some(progress) = progress {
                progress.advance(result.size as u64);
            }
        }

        Ok(())
    }
}
