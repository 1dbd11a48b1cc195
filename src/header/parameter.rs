//! Cryptographic parameter section of the container header.
//!
//! Everything needed to re-derive the key and open the chunk stream travels
//! here: algorithm and KDF identifiers, the Argon2id work factors, the chunk
//! size, the KDF salt and the base nonce. Validation happens before any key
//! derivation, so a foreign or hostile header never costs a KDF run.

use wincode::{SchemaRead, SchemaWrite};

use crate::cipher::Algorithm;
use crate::cipher::derive::{Kdf, KdfParams};
use crate::config::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::error::{Error, Result};

/// Serialized parameter block.
#[derive(Debug, Clone, PartialEq, Eq, SchemaRead, SchemaWrite)]
pub struct Parameters {
    /// Cipher identifier (see [`Algorithm::id`]).
    pub algorithm: u8,
    /// Key derivation function identifier (see [`Kdf::id`]).
    pub kdf: u8,
    /// Argon2id memory cost in KiB.
    pub kdf_memory: u32,
    /// Argon2id time cost.
    pub kdf_time: u32,
    /// Argon2id lanes.
    pub kdf_parallelism: u32,
    /// Plaintext bytes per chunk.
    pub chunk_size: u32,
    pub salt: Vec<u8>,
    /// Base nonce; each chunk's nonce is derived from it and the chunk index.
    pub nonce: Vec<u8>,
}

impl Parameters {
    pub fn new(algorithm: Algorithm, kdf: Kdf, params: &KdfParams, chunk_size: usize, salt: Vec<u8>, nonce: Vec<u8>) -> Result<Self> {
        let chunk_size = u32::try_from(chunk_size).map_err(|_| Error::InvalidConfig(format!("chunk size {chunk_size} does not fit the container format")))?;

        Ok(Self {
            algorithm: algorithm.id(),
            kdf: kdf.id(),
            kdf_memory: params.memory_kib,
            kdf_time: params.iterations,
            kdf_parallelism: params.parallelism,
            chunk_size,
            salt,
            nonce,
        })
    }

    /// Resolves identifiers and checks every field against accepted bounds.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedAlgorithm`] for an unknown cipher or KDF id
    /// - [`Error::InvalidContainerFormat`] for any out-of-range field
    pub fn validate(&self) -> Result<(Algorithm, Kdf)> {
        let algorithm = Algorithm::try_from(self.algorithm)?;
        let kdf = Kdf::try_from(self.kdf)?;

        if self.salt.len() != kdf.salt_len() {
            return Err(Error::invalid_format(format!("salt must be {} bytes, got {}", kdf.salt_len(), self.salt.len())));
        }

        if self.nonce.len() != algorithm.nonce_len() {
            return Err(Error::invalid_format(format!("{algorithm} nonce must be {} bytes, got {}", algorithm.nonce_len(), self.nonce.len())));
        }

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size()) {
            return Err(Error::invalid_format(format!("chunk size {} out of range", self.chunk_size)));
        }

        self.kdf_params().validate().map_err(Error::InvalidContainerFormat)?;

        Ok((algorithm, kdf))
    }

    pub const fn kdf_params(&self) -> KdfParams {
        KdfParams { iterations: self.kdf_time, memory_kib: self.kdf_memory, parallelism: self.kdf_parallelism }
    }

    #[inline]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size as usize
    }
}
