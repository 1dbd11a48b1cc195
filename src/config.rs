//! Global Configuration Constants
//!
//! Format identifiers, cryptographic sizes and default work factors used
//! throughout SealByte, plus the tunable [`EngineConfig`].
//!
//! Every value that affects how a container must be read back (algorithm,
//! KDF work factors, chunk size) is written into the container header, so
//! changing a default here never breaks containers produced earlier.

use crate::cipher::derive::KdfParams;
use crate::error::{Error, Result};

/// Recommended file extension for containers.
///
/// Used by the command-line front end for default naming only. The engine
/// recognizes containers by their magic/version prelude, never by name.
pub const FILE_EXTENSION: &str = ".encrypted";

/// Suffix appended to a decrypted file when no usable name is available.
pub const DECRYPTED_SUFFIX: &str = ".decrypted";

// === Container Format ===

/// Magic marker at offset 0 of every container ("SEAL").
pub const MAGIC_BYTES: u32 = 0x5345_414C;

/// Current container format version.
pub const CURRENT_VERSION: u16 = 0x0001;

/// Size of the fixed prelude: magic (4) + version (2) + first section length (4).
pub const PRELUDE_SIZE: usize = 10;

/// Upper bound for a single encoded header section.
///
/// Parameters and metadata are a few hundred bytes at most; anything larger
/// is a foreign or corrupted file.
pub const MAX_SECTION_SIZE: usize = 4096;

/// Size of a frame header: flag (1) + ciphertext length (4).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Maximum filename length that can be stored in metadata.
pub const MAX_FILENAME_LENGTH: usize = 256;

// === Algorithm Identifiers ===

/// Identifier for AES-256-GCM.
pub const ALGORITHM_AES_256_GCM: u8 = 0x01;

/// Identifier for ChaCha20-Poly1305 (IETF, 96-bit nonce).
pub const ALGORITHM_CHACHA20_POLY1305: u8 = 0x02;

/// Identifier for XChaCha20-Poly1305 (192-bit nonce).
pub const ALGORITHM_XCHACHA20_POLY1305: u8 = 0x03;

/// Identifier for the Argon2id (v1.3) key derivation function.
pub const KDF_ARGON2ID: u8 = 0x01;

// === Cryptographic Sizes ===

/// Size of every supported cipher key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of the AES-GCM and ChaCha20-Poly1305 nonce (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of the XChaCha20-Poly1305 nonce (192 bits).
pub const XNONCE_SIZE: usize = 24;

/// Size of the authentication tag for all supported AEADs (128 bits).
pub const TAG_SIZE: usize = 16;

/// Length of the Argon2id salt in bytes.
pub const ARGON_SALT_LEN: usize = 16;

/// Size of the header digest bound into every chunk's associated data.
pub const HEADER_DIGEST_SIZE: usize = 32;

// === Argon2id Defaults ===
// Conservative interactive settings. They are only defaults: the values
// actually used are stored per container.

/// Default Argon2 time cost (passes over memory).
pub const ARGON_TIME: u32 = 3;

/// Default Argon2 memory cost in KiB (64 MiB).
pub const ARGON_MEMORY: u32 = 64 * 1024;

/// Default Argon2 parallelism (lanes).
pub const ARGON_THREADS: u32 = 4;

/// Largest accepted Argon2 memory cost in KiB (4 GiB).
///
/// Bounds the memory a crafted header can make the decryptor allocate.
pub const MAX_ARGON_MEMORY: u32 = 4 * 1024 * 1024;

/// Largest accepted Argon2 time cost.
pub const MAX_ARGON_TIME: u32 = 64;

/// Largest accepted Argon2 parallelism.
pub const MAX_ARGON_THREADS: u32 = 64;

// === Chunking ===

/// Default plaintext chunk size (256 KiB).
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Smallest accepted chunk size.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest accepted chunk size; also bounds per-frame memory on decryption.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Minimum password length enforced by the interactive prompt.
///
/// The engine itself only rejects empty passwords.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Tunable engine settings.
///
/// `Default` yields the constants above. Only `kdf` and `chunk_size` reach the
/// container; `overwrite` is a local publishing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Argon2id work factors used for new containers.
    pub kdf: KdfParams,

    /// Plaintext bytes per chunk for new containers.
    pub chunk_size: usize,

    /// Replace an existing file at the final output path.
    pub overwrite: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { kdf: KdfParams::default(), chunk_size: CHUNK_SIZE, overwrite: false }
    }
}

impl EngineConfig {
    /// Checks work factors and chunk size against the accepted bounds.
    pub fn validate(&self) -> Result<()> {
        self.kdf.validate().map_err(Error::InvalidConfig)?;

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(Error::InvalidConfig(format!("chunk size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE} bytes, got {}", self.chunk_size)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_chunk_size_bounds() {
        let mut config = EngineConfig { chunk_size: MIN_CHUNK_SIZE - 1, ..EngineConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.chunk_size = MAX_CHUNK_SIZE + 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.chunk_size = MIN_CHUNK_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_kdf_rejected() {
        let config = EngineConfig { kdf: KdfParams { iterations: 0, ..KdfParams::default() }, ..EngineConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
