//! # Key Derivation with Argon2id
//!
//! Turns a password and a per-container random salt into the cipher key.
//! Argon2id is memory-hard, so each guess costs an attacker the configured
//! amount of memory as well as time.
//!
//! ## Parameters
//!
//! - **Memory**: KiB of memory per derivation
//! - **Time**: number of passes over memory
//! - **Parallelism**: number of lanes
//!
//! All three travel in the container header together with the salt, so a
//! container is always re-derived with the factors it was sealed with.

use argon2::Algorithm::Argon2id;
use argon2::Version::V0x13;
use argon2::{Argon2, Params};
use chacha20poly1305::aead::OsRng;
use chacha20poly1305::aead::rand_core::RngCore;

use crate::config::{ARGON_MEMORY, ARGON_SALT_LEN, ARGON_THREADS, ARGON_TIME, KDF_ARGON2ID, MAX_ARGON_MEMORY, MAX_ARGON_THREADS, MAX_ARGON_TIME};
use crate::error::{Error, Result};
use crate::secret::{Password, SecretBytes};

/// Key derivation functions a container may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kdf {
    Argon2id,
}

impl Kdf {
    pub const fn id(self) -> u8 {
        match self {
            Self::Argon2id => KDF_ARGON2ID,
        }
    }

    pub const fn salt_len(self) -> usize {
        match self {
            Self::Argon2id => ARGON_SALT_LEN,
        }
    }
}

impl TryFrom<u8> for Kdf {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            KDF_ARGON2ID => Ok(Self::Argon2id),
            other => Err(Error::UnsupportedAlgorithm(format!("kdf id {other:#04x}"))),
        }
    }
}

/// Argon2id work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Time cost (passes over memory).
    pub iterations: u32,

    /// Memory cost in KiB.
    pub memory_kib: u32,

    /// Number of lanes.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { iterations: ARGON_TIME, memory_kib: ARGON_MEMORY, parallelism: ARGON_THREADS }
    }
}

impl KdfParams {
    /// Checks the factors against Argon2's own minimums and the upper bounds
    /// this engine is willing to honor from a container header.
    ///
    /// Returns a human-readable reason on failure; callers pick the error
    /// variant (configuration vs. container format).
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.iterations > MAX_ARGON_TIME {
            return Err(format!("kdf iterations must be at most {MAX_ARGON_TIME}, got {}", self.iterations));
        }

        if self.memory_kib > MAX_ARGON_MEMORY {
            return Err(format!("kdf memory must be at most {MAX_ARGON_MEMORY} KiB, got {}", self.memory_kib));
        }

        if self.parallelism > MAX_ARGON_THREADS {
            return Err(format!("kdf parallelism must be at most {MAX_ARGON_THREADS}, got {}", self.parallelism));
        }

        self.argon2_params(0).map(|_| ())
    }

    fn argon2_params(&self, output_len: usize) -> std::result::Result<Params, String> {
        let output_len = (output_len > 0).then_some(output_len);
        Params::new(self.memory_kib, self.iterations, self.parallelism, output_len).map_err(|e| format!("invalid argon2 parameter: {e}"))
    }
}

/// Password-based key derivation.
pub struct Derive {
    kdf: Kdf,
    params: KdfParams,
}

impl Derive {
    pub const fn new(kdf: Kdf, params: KdfParams) -> Self {
        Self { kdf, params }
    }

    /// Derives `key_len` bytes from `password` and `salt`.
    ///
    /// The password is consumed and wiped when this returns, whether or not
    /// derivation succeeded.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyPassword`] for an empty password
    /// - [`Error::InvalidConfig`] if the salt length or work factors do not
    ///   fit the KDF
    pub fn derive_key(&self, password: Password, salt: &[u8], key_len: usize) -> Result<SecretBytes> {
        if password.is_empty() {
            return Err(Error::EmptyPassword);
        }

        if salt.len() != self.kdf.salt_len() {
            return Err(Error::InvalidConfig(format!("salt must be {} bytes, got {}", self.kdf.salt_len(), salt.len())));
        }

        match self.kdf {
            Kdf::Argon2id => {
                let params = self.params.argon2_params(key_len).map_err(Error::InvalidConfig)?;
                let argon2 = Argon2::new(Argon2id, V0x13, params);

                let mut key = SecretBytes::zeroed(key_len);
                argon2.hash_password_into(password.expose_secret(), salt, key.expose_secret_mut()).map_err(|e| Error::Internal(format!("key derivation failed: {e}")))?;

                Ok(key)
            }
        }
    }
}

/// Fills a fixed-size array from the operating system's CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| Error::Internal(format!("rng failed: {e}")))?;
    Ok(bytes)
}

/// Fills a buffer of runtime length from the operating system's CSPRNG.
pub fn random_vec(len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| Error::Internal(format!("rng failed: {e}")))?;
    Ok(bytes)
}
