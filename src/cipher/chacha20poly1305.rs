//! ChaCha20-Poly1305 and XChaCha20-Poly1305 backends.
//!
//! - **Key Size**: 256 bits (32 bytes) for both
//! - **Nonce Size**: 96 bits for ChaCha20, 192 bits for XChaCha20
//! - **Tag Size**: 128 bits (16 bytes), appended to the ciphertext
//!
//! The nonce is derived per chunk by the container codec and passed in; it
//! is not stored alongside each chunk.

use ::chacha20poly1305::aead::{Aead, KeyInit, Payload};
use ::chacha20poly1305::{Nonce, XNonce};

use crate::cipher::{Algorithm, CipherBackend, check_nonce};
use crate::error::{Error, Result};

/// ChaCha20-Poly1305 (RFC 8439) with a 96-bit nonce.
pub struct ChaCha20Poly1305 {
    inner: ::chacha20poly1305::ChaCha20Poly1305,
}

impl ChaCha20Poly1305 {
    #[inline]
    pub fn new(key: &[u8]) -> Result<Self> {
        let inner = ::chacha20poly1305::ChaCha20Poly1305::new_from_slice(key).map_err(|_| Error::Internal("invalid chacha20-poly1305 key length".into()))?;
        Ok(Self { inner })
    }
}

impl CipherBackend for ChaCha20Poly1305 {
    #[inline]
    fn algorithm(&self) -> Algorithm {
        Algorithm::ChaCha20Poly1305
    }

    #[inline]
    fn encrypt_chunk(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        check_nonce(Algorithm::ChaCha20Poly1305, nonce)?;
        self.inner.encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad }).map_err(|e| Error::Internal(format!("chacha20-poly1305 encryption failed: {e}")))
    }

    #[inline]
    fn decrypt_chunk(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        check_nonce(Algorithm::ChaCha20Poly1305, nonce)?;
        self.inner.decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad }).map_err(|_| Error::AuthenticationFailed)
    }
}

/// XChaCha20-Poly1305 with an extended 192-bit nonce.
pub struct XChaCha20Poly1305 {
    inner: ::chacha20poly1305::XChaCha20Poly1305,
}

impl XChaCha20Poly1305 {
    #[inline]
    pub fn new(key: &[u8]) -> Result<Self> {
        // XChaCha20 uses the same key setup as ChaCha20.
        let inner = ::chacha20poly1305::XChaCha20Poly1305::new_from_slice(key).map_err(|_| Error::Internal("invalid xchacha20-poly1305 key length".into()))?;
        Ok(Self { inner })
    }
}

impl CipherBackend for XChaCha20Poly1305 {
    #[inline]
    fn algorithm(&self) -> Algorithm {
        Algorithm::XChaCha20Poly1305
    }

    #[inline]
    fn encrypt_chunk(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        check_nonce(Algorithm::XChaCha20Poly1305, nonce)?;
        self.inner.encrypt(XNonce::from_slice(nonce), Payload { msg: plaintext, aad }).map_err(|e| Error::Internal(format!("xchacha20-poly1305 encryption failed: {e}")))
    }

    #[inline]
    fn decrypt_chunk(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        check_nonce(Algorithm::XChaCha20Poly1305, nonce)?;
        self.inner.decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad }).map_err(|_| Error::AuthenticationFailed)
    }
}
