//! # Cipher Backend Abstraction
//!
//! Uniform chunk-level authenticated encryption over a closed set of AEAD
//! algorithms.
//!
//! ## Architecture
//!
//! - **Algorithm Layer**: [`Algorithm`] is the closed tag stored in every
//!   container. Adding a variant forces every `match` below to be extended.
//! - **Implementation Layer**: one wrapper per algorithm ([`AesGcm`],
//!   [`ChaCha20Poly1305`], [`XChaCha20Poly1305`]).
//! - **Abstraction Layer**: the [`CipherBackend`] trait and the [`Cipher`]
//!   enum that dispatches to the selected wrapper.
//!
//! Nonces are supplied by the caller. The container codec derives a distinct
//! nonce per chunk from a random base nonce, so backends never generate
//! their own. Decryption fails closed with [`Error::AuthenticationFailed`]
//! and returns no plaintext on a tag mismatch.

use std::fmt::Debug;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::config::{ALGORITHM_AES_256_GCM, ALGORITHM_CHACHA20_POLY1305, ALGORITHM_XCHACHA20_POLY1305, KEY_SIZE, NONCE_SIZE, TAG_SIZE, XNONCE_SIZE};
use crate::error::{Error, Result};
use crate::secret::SecretBytes;

mod aes_gcm;
mod chacha20poly1305;
pub mod derive;

pub use self::aes_gcm::AesGcm;
pub use self::chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};

/// Supported AEAD constructions.
///
/// The string forms are used on the command line and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Algorithm {
    /// AES-256 in Galois/Counter Mode. Hardware accelerated on most CPUs.
    #[strum(serialize = "aes-256-gcm")]
    Aes256Gcm,

    /// ChaCha20 stream cipher with a Poly1305 authenticator (RFC 8439).
    #[strum(serialize = "chacha20-poly1305")]
    ChaCha20Poly1305,

    /// ChaCha20-Poly1305 with an extended 192-bit nonce.
    #[strum(serialize = "xchacha20-poly1305")]
    XChaCha20Poly1305,
}

impl Algorithm {
    /// Identifier written into the container header.
    pub const fn id(self) -> u8 {
        match self {
            Self::Aes256Gcm => ALGORITHM_AES_256_GCM,
            Self::ChaCha20Poly1305 => ALGORITHM_CHACHA20_POLY1305,
            Self::XChaCha20Poly1305 => ALGORITHM_XCHACHA20_POLY1305,
        }
    }

    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes256Gcm | Self::ChaCha20Poly1305 | Self::XChaCha20Poly1305 => KEY_SIZE,
        }
    }

    pub const fn nonce_len(self) -> usize {
        match self {
            Self::Aes256Gcm | Self::ChaCha20Poly1305 => NONCE_SIZE,
            Self::XChaCha20Poly1305 => XNONCE_SIZE,
        }
    }

    pub const fn tag_len(self) -> usize {
        match self {
            Self::Aes256Gcm | Self::ChaCha20Poly1305 | Self::XChaCha20Poly1305 => TAG_SIZE,
        }
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            ALGORITHM_AES_256_GCM => Ok(Self::Aes256Gcm),
            ALGORITHM_CHACHA20_POLY1305 => Ok(Self::ChaCha20Poly1305),
            ALGORITHM_XCHACHA20_POLY1305 => Ok(Self::XChaCha20Poly1305),
            other => Err(Error::UnsupportedAlgorithm(format!("cipher id {other:#04x}"))),
        }
    }
}

/// Chunk-level AEAD capability shared by every backend.
pub trait CipherBackend: Send + Sync {
    /// The algorithm this backend implements.
    fn algorithm(&self) -> Algorithm;

    /// Encrypts one chunk, returning `ciphertext || tag`.
    ///
    /// An empty plaintext is valid and yields a bare tag.
    fn encrypt_chunk(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Verifies and decrypts `ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// [`Error::AuthenticationFailed`] on any tag mismatch; nothing is
    /// returned in that case.
    fn decrypt_chunk(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    fn key_length(&self) -> usize {
        self.algorithm().key_len()
    }

    fn nonce_length(&self) -> usize {
        self.algorithm().nonce_len()
    }

    fn tag_length(&self) -> usize {
        self.algorithm().tag_len()
    }
}

/// Rejects nonces of the wrong size before they reach `from_slice`, which
/// would panic.
pub(crate) fn check_nonce(algorithm: Algorithm, nonce: &[u8]) -> Result<()> {
    if nonce.len() == algorithm.nonce_len() {
        Ok(())
    } else {
        Err(Error::Internal(format!("{algorithm} nonce must be {} bytes, got {}", algorithm.nonce_len(), nonce.len())))
    }
}

/// The backend selected for one container.
pub enum Cipher {
    Aes256Gcm(AesGcm),
    ChaCha20Poly1305(ChaCha20Poly1305),
    XChaCha20Poly1305(XChaCha20Poly1305),
}

impl Cipher {
    /// Builds the backend for `algorithm` keyed with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the key length does not match the
    /// algorithm; derived keys are always sized from the algorithm.
    pub fn new(algorithm: Algorithm, key: &SecretBytes) -> Result<Self> {
        if key.len() != algorithm.key_len() {
            return Err(Error::Internal(format!("{algorithm} key must be {} bytes, got {}", algorithm.key_len(), key.len())));
        }

        let key = key.expose_secret();
        Ok(match algorithm {
            Algorithm::Aes256Gcm => Self::Aes256Gcm(AesGcm::new(key)?),
            Algorithm::ChaCha20Poly1305 => Self::ChaCha20Poly1305(ChaCha20Poly1305::new(key)?),
            Algorithm::XChaCha20Poly1305 => Self::XChaCha20Poly1305(XChaCha20Poly1305::new(key)?),
        })
    }

    fn backend(&self) -> &dyn CipherBackend {
        match self {
            Self::Aes256Gcm(inner) => inner,
            Self::ChaCha20Poly1305(inner) => inner,
            Self::XChaCha20Poly1305(inner) => inner,
        }
    }
}

impl CipherBackend for Cipher {
    #[inline]
    fn algorithm(&self) -> Algorithm {
        self.backend().algorithm()
    }

    #[inline]
    fn encrypt_chunk(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.backend().encrypt_chunk(nonce, aad, plaintext)
    }

    #[inline]
    fn decrypt_chunk(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.backend().decrypt_chunk(nonce, aad, ciphertext)
    }
}

impl Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Cipher").field(&self.algorithm()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    fn key() -> SecretBytes {
        SecretBytes::from_vec((0..32).collect())
    }

    #[test]
    fn test_algorithm_id_roundtrip() {
        for algorithm in Algorithm::iter() {
            assert_eq!(Algorithm::try_from(algorithm.id()).unwrap(), algorithm);
        }
    }

    #[test]
    fn test_unknown_algorithm_id() {
        let err = Algorithm::try_from(0x7F).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
        assert!(Algorithm::try_from(0x00).is_err());
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::Aes256Gcm.to_string(), "aes-256-gcm");
        assert_eq!(Algorithm::from_str("ChaCha20-Poly1305").unwrap(), Algorithm::ChaCha20Poly1305);
        assert_eq!(Algorithm::from_str("xchacha20-poly1305").unwrap(), Algorithm::XChaCha20Poly1305);
        assert!(Algorithm::from_str("rot13").is_err());
    }

    #[test]
    fn test_every_backend_roundtrips_with_aad() {
        for algorithm in Algorithm::iter() {
            let cipher = Cipher::new(algorithm, &key()).unwrap();
            let nonce = vec![7u8; algorithm.nonce_len()];

            let sealed = cipher.encrypt_chunk(&nonce, b"header", b"chunk payload").unwrap();
            assert_eq!(sealed.len(), b"chunk payload".len() + cipher.tag_length());
            assert_eq!(cipher.decrypt_chunk(&nonce, b"header", &sealed).unwrap(), b"chunk payload");
        }
    }

    #[test]
    fn test_empty_chunk_is_bare_tag() {
        for algorithm in Algorithm::iter() {
            let cipher = Cipher::new(algorithm, &key()).unwrap();
            let nonce = vec![0u8; algorithm.nonce_len()];

            let sealed = cipher.encrypt_chunk(&nonce, b"", b"").unwrap();
            assert_eq!(sealed.len(), algorithm.tag_len());
            assert!(cipher.decrypt_chunk(&nonce, b"", &sealed).unwrap().is_empty());
        }
    }

    #[test]
    fn test_aad_mismatch_fails_closed() {
        for algorithm in Algorithm::iter() {
            let cipher = Cipher::new(algorithm, &key()).unwrap();
            let nonce = vec![1u8; algorithm.nonce_len()];
            let sealed = cipher.encrypt_chunk(&nonce, b"chunk 0", b"data").unwrap();

            let err = cipher.decrypt_chunk(&nonce, b"chunk 1", &sealed).unwrap_err();
            assert!(matches!(err, Error::AuthenticationFailed));
        }
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let nonce = [2u8; NONCE_SIZE];
        let sealed = Cipher::new(Algorithm::Aes256Gcm, &key()).unwrap().encrypt_chunk(&nonce, b"", b"data").unwrap();

        let other = Cipher::new(Algorithm::Aes256Gcm, &SecretBytes::from_vec(vec![9u8; 32])).unwrap();
        assert!(matches!(other.decrypt_chunk(&nonce, b"", &sealed), Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_key_length_checked() {
        let short = SecretBytes::from_vec(vec![0u8; 16]);
        assert!(matches!(Cipher::new(Algorithm::ChaCha20Poly1305, &short), Err(Error::Internal(_))));
    }

    #[test]
    fn test_nonce_length_checked() {
        let cipher = Cipher::new(Algorithm::XChaCha20Poly1305, &key()).unwrap();
        assert!(matches!(cipher.encrypt_chunk(&[0u8; NONCE_SIZE], b"", b"data"), Err(Error::Internal(_))));
    }
}
