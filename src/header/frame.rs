//! Chunk framing.
//!
//! Each chunk travels as `flag u8 | length u32 BE | ciphertext || tag`. The
//! flag marks the final chunk; the length lets the reader pull one frame at a
//! time without knowing the plaintext size in advance.
//!
//! A frame is bound to its place in the stream through its nonce (base nonce
//! XOR index) and its associated data (header digest, index, final flag), so
//! reordering, truncation, splicing between containers and flag flips all
//! surface as authentication failures.

use crate::config::{FRAME_HEADER_SIZE, HEADER_DIGEST_SIZE};
use crate::error::{Error, Result};

const FLAG_MORE: u8 = 0;
const FLAG_FINAL: u8 = 1;

/// Size of the per-chunk associated data: digest + index + final flag.
pub const ASSOCIATED_DATA_SIZE: usize = HEADER_DIGEST_SIZE + 8 + 1;

/// The fixed-size prefix of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub last: bool,
    pub len: u32,
}

impl FrameHeader {
    pub fn new(last: bool, len: usize) -> Result<Self> {
        let len = u32::try_from(len).map_err(|_| Error::Internal(format!("frame of {len} bytes exceeds the format limit")))?;
        Ok(Self { last, len })
    }

    pub fn encode(self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = if self.last { FLAG_FINAL } else { FLAG_MORE };
        bytes[1..].copy_from_slice(&self.len.to_be_bytes());
        bytes
    }

    /// Parses a frame prefix. An unknown flag is treated like any other
    /// stream corruption.
    pub fn decode(bytes: [u8; FRAME_HEADER_SIZE]) -> Result<Self> {
        let last = match bytes[0] {
            FLAG_MORE => false,
            FLAG_FINAL => true,
            _ => return Err(Error::AuthenticationFailed),
        };

        let len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        Ok(Self { last, len })
    }

    /// Checks the sealed length against what the header allows.
    ///
    /// Non-final frames are always full; the final frame carries at least the
    /// tag and at most a full chunk.
    pub fn check_len(self, chunk_size: usize, tag_len: usize) -> Result<usize> {
        let len = self.len as usize;
        let full = chunk_size + tag_len;

        let ok = if self.last { (tag_len..=full).contains(&len) } else { len == full };
        if ok { Ok(len) } else { Err(Error::AuthenticationFailed) }
    }
}

/// Per-container inputs for chunk nonce and associated-data derivation.
#[derive(Debug, Clone)]
pub struct FrameContext {
    base_nonce: Vec<u8>,
    digest: [u8; HEADER_DIGEST_SIZE],
}

impl FrameContext {
    pub fn new(base_nonce: Vec<u8>, header_bytes: &[u8]) -> Self {
        Self { base_nonce, digest: *blake3::hash(header_bytes).as_bytes() }
    }

    /// Base nonce with its trailing 8 bytes XOR-ed with `index` (big-endian).
    pub fn nonce(&self, index: u64) -> Vec<u8> {
        let mut nonce = self.base_nonce.clone();
        let offset = nonce.len().saturating_sub(8);

        for (byte, mask) in nonce[offset..].iter_mut().zip(index.to_be_bytes()) {
            *byte ^= mask;
        }

        nonce
    }

    pub fn associated_data(&self, index: u64, last: bool) -> [u8; ASSOCIATED_DATA_SIZE] {
        let mut aad = [0u8; ASSOCIATED_DATA_SIZE];
        aad[..HEADER_DIGEST_SIZE].copy_from_slice(&self.digest);
        aad[HEADER_DIGEST_SIZE..HEADER_DIGEST_SIZE + 8].copy_from_slice(&index.to_be_bytes());
        aad[ASSOCIATED_DATA_SIZE - 1] = u8::from(last);
        aad
    }
}
