//! Input stage of the chunk pipeline.
//!
//! ## Encryption (fixed chunking)
//!
//! The source is cut into `chunk_size` pieces. Every piece is filled
//! completely before it is sent, and the reader looks one chunk ahead so the
//! final chunk can be flagged. An empty source produces one empty final
//! chunk.
//!
//! ## Decryption (framed)
//!
//! Frames are parsed one at a time and checked against the header before
//! they reach the executor. Anything structurally wrong with the stream
//! (unknown flag, bad length, EOF before the final frame, bytes after it)
//! is reported as [`Error::AuthenticationFailed`].

use std::io::ErrorKind;

use flume::Sender;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::config::FRAME_HEADER_SIZE;
use crate::error::{Error, Result};
use crate::header::FrameHeader;
use crate::types::{Processing, Task};

pub struct Reader {
    mode: Processing,
    chunk_size: usize,
    tag_len: usize,
}

impl Reader {
    pub fn new(mode: Processing, chunk_size: usize, tag_len: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Internal("chunk size must be non-zero".into()));
        }

        Ok(Self { mode, chunk_size, tag_len })
    }

    /// Feeds every chunk of `input` into `sender`.
    ///
    /// Returns the number of bytes consumed from `input`. If the downstream
    /// side hangs up early the reader stops quietly; the writer reports why.
    pub async fn read_all<R: AsyncRead + Unpin>(&self, input: R, sender: &Sender<Task>, cancel: &CancellationToken) -> Result<u64> {
        let mut reader = BufReader::new(input);

        match self.mode {
            Processing::Encryption => self.read_fixed_chunks(&mut reader, sender, cancel).await,
            Processing::Decryption => self.read_frames(&mut reader, sender, cancel).await,
        }
    }

    async fn read_fixed_chunks<R: AsyncRead + Unpin>(&self, reader: &mut R, sender: &Sender<Task>, cancel: &CancellationToken) -> Result<u64> {
        let mut consumed = 0u64;
        let mut index = 0u64;
        let mut current = self.fill_chunk(reader).await?;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            consumed += current.len() as u64;

            // An empty look-ahead means `current` is the tail of the source.
            let next = if current.len() < self.chunk_size { Vec::new() } else { self.fill_chunk(reader).await? };
            let last = next.is_empty();

            if sender.send_async(Task { data: current, index, last }).await.is_err() {
                return Ok(consumed);
            }

            if last {
                return Ok(consumed);
            }

            current = next;
            index += 1;
        }
    }

    /// Reads until `chunk_size` bytes are collected or the source ends.
    async fn fill_chunk<R: AsyncRead + Unpin>(&self, reader: &mut R) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut filled = 0;

        while filled < buffer.len() {
            let bytes_read = reader.read(&mut buffer[filled..]).await.map_err(Error::io_with("failed to read source"))?;
            if bytes_read == 0 {
                break;
            }
            filled += bytes_read;
        }

        buffer.truncate(filled);
        Ok(buffer)
    }

    async fn read_frames<R: AsyncRead + Unpin>(&self, reader: &mut R, sender: &Sender<Task>, cancel: &CancellationToken) -> Result<u64> {
        let mut consumed = 0u64;
        let mut index = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let mut prefix = [0u8; FRAME_HEADER_SIZE];
            read_frame_bytes(reader, &mut prefix).await?;

            let frame = FrameHeader::decode(prefix)?;
            let len = frame.check_len(self.chunk_size, self.tag_len)?;

            let mut data = vec![0u8; len];
            read_frame_bytes(reader, &mut data).await?;
            consumed += (FRAME_HEADER_SIZE + len) as u64;

            if sender.send_async(Task { data, index, last: frame.last }).await.is_err() {
                return Ok(consumed);
            }

            if frame.last {
                break;
            }

            index += 1;
        }

        let mut probe = [0u8; 1];
        let trailing = reader.read(&mut probe).await.map_err(Error::io_with("failed to read container"))?;
        if trailing != 0 {
            return Err(Error::AuthenticationFailed);
        }

        Ok(consumed)
    }
}

/// A frame cut short by EOF is a truncated stream, not an I/O fault.
async fn read_frame_bytes<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::AuthenticationFailed),
        Err(e) => Err(Error::io("failed to read container", e)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use flume::unbounded;

    use super::*;
    use crate::config::{MIN_CHUNK_SIZE, TAG_SIZE};

    fn frame(last: bool, body: &[u8]) -> Vec<u8> {
        let mut out = FrameHeader::new(last, body.len()).unwrap().encode().to_vec();
        out.extend_from_slice(body);
        out
    }

    async fn read(reader: &Reader, input: Vec<u8>) -> (Result<u64>, Vec<Task>) {
        let (tx, rx) = unbounded();
        let result = reader.read_all(Cursor::new(input), &tx, &CancellationToken::new()).await;
        drop(tx);
        (result, rx.drain().collect())
    }

    #[tokio::test]
    async fn test_read_fixed_chunks() {
        let chunk_size = MIN_CHUNK_SIZE;
        let reader = Reader::new(Processing::Encryption, chunk_size, TAG_SIZE).unwrap();

        let (result, tasks) = read(&reader, vec![1u8; chunk_size + 100]).await;

        assert_eq!(result.unwrap(), (chunk_size + 100) as u64);
        assert_eq!(tasks.len(), 2);
        assert_eq!((tasks[0].index, tasks[0].data.len(), tasks[0].last), (0, chunk_size, false));
        assert_eq!((tasks[1].index, tasks[1].data.len(), tasks[1].last), (1, 100, true));
    }

    #[tokio::test]
    async fn test_exact_multiple_marks_last_full_chunk() {
        let chunk_size = MIN_CHUNK_SIZE;
        let reader = Reader::new(Processing::Encryption, chunk_size, TAG_SIZE).unwrap();

        let (_, tasks) = read(&reader, vec![7u8; chunk_size * 2]).await;

        assert_eq!(tasks.len(), 2);
        assert!(!tasks[0].last);
        assert!(tasks[1].last);
        assert_eq!(tasks[1].data.len(), chunk_size);
    }

    #[tokio::test]
    async fn test_empty_source_yields_one_final_chunk() {
        let reader = Reader::new(Processing::Encryption, MIN_CHUNK_SIZE, TAG_SIZE).unwrap();

        let (result, tasks) = read(&reader, Vec::new()).await;

        assert_eq!(result.unwrap(), 0);
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].data.is_empty());
        assert!(tasks[0].last);
    }

    #[tokio::test]
    async fn test_read_frames() {
        let chunk_size = 8;
        let reader = Reader::new(Processing::Decryption, chunk_size, TAG_SIZE).unwrap();

        let mut input = frame(false, &[1u8; 8 + TAG_SIZE]);
        input.extend(frame(true, &[2u8; 3 + TAG_SIZE]));

        let (result, tasks) = read(&reader, input).await;

        assert!(result.is_ok());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].data, vec![1u8; 8 + TAG_SIZE]);
        assert!(tasks[1].last);
    }

    #[tokio::test]
    async fn test_missing_final_frame() {
        let reader = Reader::new(Processing::Decryption, 8, TAG_SIZE).unwrap();
        let (result, _) = read(&reader, frame(false, &[1u8; 8 + TAG_SIZE])).await;
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_trailing_bytes_after_final_frame() {
        let reader = Reader::new(Processing::Decryption, 8, TAG_SIZE).unwrap();

        let mut input = frame(true, &[1u8; TAG_SIZE]);
        input.push(0);

        let (result, _) = read(&reader, input).await;
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_bad_frame_length() {
        let reader = Reader::new(Processing::Decryption, 8, TAG_SIZE).unwrap();
        let (result, _) = read(&reader, frame(false, &[1u8; 4])).await;
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let reader = Reader::new(Processing::Encryption, MIN_CHUNK_SIZE, TAG_SIZE).unwrap();
        let (tx, _rx) = unbounded();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = reader.read_all(Cursor::new(vec![0u8; 10]), &tx, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
