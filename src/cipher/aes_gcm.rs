use ::aes_gcm::aead::{Aead, KeyInit, Payload};
use ::aes_gcm::{Aes256Gcm, Nonce};

use crate::cipher::{Algorithm, CipherBackend, check_nonce};
use crate::error::{Error, Result};

pub struct AesGcm {
    inner: Aes256Gcm,
}

impl AesGcm {
    #[inline]
    pub fn new(key: &[u8]) -> Result<Self> {
        let inner = Aes256Gcm::new_from_slice(key).map_err(|_| Error::Internal("invalid aes-256-gcm key length".into()))?;
        Ok(Self { inner })
    }
}

impl CipherBackend for AesGcm {
    #[inline]
    fn algorithm(&self) -> Algorithm {
        Algorithm::Aes256Gcm
    }

    #[inline]
    fn encrypt_chunk(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        check_nonce(Algorithm::Aes256Gcm, nonce)?;
        self.inner.encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad }).map_err(|e| Error::Internal(format!("aes-256-gcm encryption failed: {e}")))
    }

    #[inline]
    fn decrypt_chunk(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        check_nonce(Algorithm::Aes256Gcm, nonce)?;
        self.inner.decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad }).map_err(|_| Error::AuthenticationFailed)
    }
}
