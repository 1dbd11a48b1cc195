//! # Container Codec
//!
//! A container is a self-describing header followed by a stream of frames:
//!
//! ```text
//! magic u32 | version u16 | len u32 | Parameters | len u32 | Metadata | frames...
//! ```
//!
//! The header carries everything needed to open the container except the
//! password. Its exact bytes are hashed into every frame's associated data,
//! so the header is authenticated by the first chunk that decrypts.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::cipher::Algorithm;
use crate::cipher::derive::{Kdf, KdfParams};
use crate::config::{CURRENT_VERSION, MAGIC_BYTES, MAX_FILENAME_LENGTH, MAX_SECTION_SIZE, PRELUDE_SIZE};
use crate::error::{Error, Result};

pub mod frame;
pub mod metadata;
pub mod parameter;

pub use self::frame::{FrameContext, FrameHeader};
pub use self::metadata::Metadata;
pub use self::parameter::Parameters;

const LENGTH_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    algorithm: Algorithm,
    kdf: Kdf,
    parameters: Parameters,
    metadata: Metadata,
}

impl Header {
    pub fn new(parameters: Parameters, metadata: Metadata) -> Result<Self> {
        let (algorithm, kdf) = parameters.validate()?;
        Ok(Self { algorithm, kdf, parameters, metadata })
    }

    /// Serializes the full header (prelude and both sections).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let parameters = wincode::serialize(&self.parameters).map_err(|e| Error::Internal(format!("failed to encode parameters: {e}")))?;
        let metadata = wincode::serialize(&self.metadata).map_err(|e| Error::Internal(format!("failed to encode metadata: {e}")))?;

        let mut out = Vec::with_capacity(PRELUDE_SIZE + parameters.len() + LENGTH_SIZE + metadata.len());
        out.extend_from_slice(&MAGIC_BYTES.to_be_bytes());
        out.extend_from_slice(&CURRENT_VERSION.to_be_bytes());

        for section in [&parameters, &metadata] {
            if section.len() > MAX_SECTION_SIZE {
                return Err(Error::Internal(format!("header section of {} bytes exceeds {MAX_SECTION_SIZE}", section.len())));
            }
            out.extend_from_slice(&(section.len() as u32).to_be_bytes());
            out.extend_from_slice(section);
        }

        Ok(out)
    }

    /// Parses a header from the start of `bytes`.
    ///
    /// Returns the header and its encoded length, i.e. the offset of the
    /// first frame.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = Cursor { bytes, pos: 0 };

        let prelude: [u8; PRELUDE_SIZE] = cursor.take(PRELUDE_SIZE)?.try_into().map_err(|_| truncated())?;
        let parameters_len = parse_prelude(&prelude)?;
        let parameters = cursor.take(parameters_len)?;

        let metadata_len = section_len(cursor.take(LENGTH_SIZE)?.try_into().map_err(|_| truncated())?)?;
        let metadata = cursor.take(metadata_len)?;

        Ok((Self::from_sections(parameters, metadata)?, cursor.pos))
    }

    /// Reads a header from the start of a stream.
    ///
    /// Returns the header and its raw bytes, which feed the per-frame
    /// associated data. The reader is left positioned at the first frame.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(Self, Vec<u8>)> {
        let mut raw = vec![0u8; PRELUDE_SIZE];
        read_exact(reader, &mut raw).await?;

        let prelude: [u8; PRELUDE_SIZE] = raw[..].try_into().map_err(|_| truncated())?;
        let parameters_len = parse_prelude(&prelude)?;
        let parameters = read_section(reader, &mut raw, parameters_len).await?;

        let mut len = [0u8; LENGTH_SIZE];
        read_exact(reader, &mut len).await?;
        raw.extend_from_slice(&len);

        let metadata = read_section(reader, &mut raw, section_len(len)?).await?;

        Ok((Self::from_sections(&parameters, &metadata)?, raw))
    }

    fn from_sections(parameters: &[u8], metadata: &[u8]) -> Result<Self> {
        let parameters: Parameters = wincode::deserialize(parameters).map_err(|e| Error::invalid_format(format!("malformed parameters: {e}")))?;
        let metadata: Metadata = wincode::deserialize(metadata).map_err(|e| Error::invalid_format(format!("malformed metadata: {e}")))?;

        if metadata.name().len() > MAX_FILENAME_LENGTH {
            return Err(Error::invalid_format("stored file name too long"));
        }

        Self::new(parameters, metadata)
    }

    #[inline]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[inline]
    pub const fn kdf(&self) -> Kdf {
        self.kdf
    }

    pub const fn kdf_params(&self) -> KdfParams {
        self.parameters.kdf_params()
    }

    #[inline]
    pub const fn chunk_size(&self) -> usize {
        self.parameters.chunk_size()
    }

    pub fn salt(&self) -> &[u8] {
        &self.parameters.salt
    }

    pub fn nonce(&self) -> &[u8] {
        &self.parameters.nonce
    }

    pub fn file_name(&self) -> &str {
        self.metadata.name()
    }

    pub const fn file_size(&self) -> u64 {
        self.metadata.size()
    }
}

fn truncated() -> Error {
    Error::invalid_format("truncated header")
}

/// Checks magic and version, returning the length of the first section.
fn parse_prelude(prelude: &[u8; PRELUDE_SIZE]) -> Result<usize> {
    let magic = u32::from_be_bytes([prelude[0], prelude[1], prelude[2], prelude[3]]);
    if magic != MAGIC_BYTES {
        return Err(Error::invalid_format("not a sealbyte container"));
    }

    let version = u16::from_be_bytes([prelude[4], prelude[5]]);
    if version != CURRENT_VERSION {
        return Err(Error::invalid_format(format!("unsupported container version {version}")));
    }

    section_len([prelude[6], prelude[7], prelude[8], prelude[9]])
}

fn section_len(bytes: [u8; LENGTH_SIZE]) -> Result<usize> {
    let len = u32::from_be_bytes(bytes) as usize;
    if len == 0 || len > MAX_SECTION_SIZE {
        return Err(Error::invalid_format(format!("header section length {len} out of range")));
    }

    Ok(len)
}

async fn read_exact<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(truncated()),
        Err(e) => Err(Error::io("failed to read container header", e)),
    }
}

async fn read_section<R: AsyncRead + Unpin>(reader: &mut R, raw: &mut Vec<u8>, len: usize) -> Result<Vec<u8>> {
    let mut section = vec![0u8; len];
    read_exact(reader, &mut section).await?;
    raw.extend_from_slice(&section);
    Ok(section)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.bytes.len()).ok_or_else(truncated)?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ARGON_SALT_LEN, CHUNK_SIZE, XNONCE_SIZE};

    fn header() -> Header {
        let kdf = KdfParams { iterations: 2, memory_kib: 1024, parallelism: 1 };
        let parameters = Parameters::new(Algorithm::XChaCha20Poly1305, Kdf::Argon2id, &kdf, CHUNK_SIZE, vec![9; ARGON_SALT_LEN], vec![8; XNONCE_SIZE]).unwrap();
        Header::new(parameters, Metadata::new("notes.txt", 1234)).unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let original = header();
        let mut bytes = original.encode().unwrap();
        let header_len = bytes.len();
        bytes.extend_from_slice(b"frames follow");

        let (decoded, len) = Header::decode(&bytes).unwrap();

        assert_eq!(len, header_len);
        assert_eq!(decoded, original);
        assert_eq!(decoded.algorithm(), Algorithm::XChaCha20Poly1305);
        assert_eq!(decoded.kdf_params().iterations, 2);
        assert_eq!(decoded.file_name(), "notes.txt");
        assert_eq!(decoded.file_size(), 1234);
        assert_eq!(decoded.salt(), &[9; ARGON_SALT_LEN]);
    }

    #[tokio::test]
    async fn test_read_from_stream() {
        let original = header();
        let encoded = original.encode().unwrap();
        let mut stream = encoded.clone();
        stream.extend_from_slice(&[1, 2, 3]);

        let mut reader = &stream[..];
        let (decoded, raw) = Header::read_from(&mut reader).await.unwrap();

        assert_eq!(decoded, original);
        assert_eq!(raw, encoded);
        assert_eq!(reader, &[1, 2, 3]);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = header().encode().unwrap();
        bytes[0] ^= 0xFF;
        assert!(matches!(Header::decode(&bytes), Err(Error::InvalidContainerFormat(_))));
    }

    #[test]
    fn test_future_version() {
        let mut bytes = header().encode().unwrap();
        bytes[5] = 2;
        assert!(matches!(Header::decode(&bytes), Err(Error::InvalidContainerFormat(_))));
    }

    #[test]
    fn test_short_input() {
        assert!(matches!(Header::decode(&[]), Err(Error::InvalidContainerFormat(_))));
        assert!(matches!(Header::decode(b"SEAL"), Err(Error::InvalidContainerFormat(_))));

        let bytes = header().encode().unwrap();
        assert!(matches!(Header::decode(&bytes[..bytes.len() - 1]), Err(Error::InvalidContainerFormat(_))));
    }

    #[test]
    fn test_oversized_section() {
        let mut bytes = header().encode().unwrap();
        bytes[6..10].copy_from_slice(&((MAX_SECTION_SIZE as u32) + 1).to_be_bytes());
        assert!(matches!(Header::decode(&bytes), Err(Error::InvalidContainerFormat(_))));
    }

    #[test]
    fn test_unknown_algorithm_id() {
        let mut bytes = header().encode().unwrap();
        // First byte of the parameter section is the cipher id.
        bytes[PRELUDE_SIZE] = 0x7F;
        assert!(matches!(Header::decode(&bytes), Err(Error::UnsupportedAlgorithm(_))));
    }

    #[tokio::test]
    async fn test_truncated_stream() {
        let bytes = header().encode().unwrap();
        let mut reader = &bytes[..PRELUDE_SIZE + 3];
        assert!(matches!(Header::read_from(&mut reader).await, Err(Error::InvalidContainerFormat(_))));
    }
}
