//! Scoped secrets.
//!
//! [`Password`] is handed to the engine by value and consumed by exactly one
//! key derivation; [`SecretBytes`] holds the derived key for the lifetime of
//! one pipeline call. Both wipe their memory on drop and never print their
//! contents.

use std::fmt::{Debug, Formatter, Result};

use secrecy::{ExposeSecret, SecretBox, SecretString};

/// A user-supplied password.
pub struct Password {
    inner: SecretString,
}

impl Password {
    pub fn new(password: &str) -> Self {
        Self { inner: SecretString::from(password.to_owned()) }
    }

    pub fn from_string(password: String) -> Self {
        Self { inner: SecretString::from(password) }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }

    pub(crate) fn expose_secret(&self) -> &[u8] {
        self.inner.expose_secret().as_bytes()
    }
}

impl From<SecretString> for Password {
    fn from(secret: SecretString) -> Self {
        Self { inner: secret }
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Heap-allocated key material, zeroized on drop.
pub struct SecretBytes {
    inner: SecretBox<Vec<u8>>,
}

impl SecretBytes {
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { inner: SecretBox::new(Box::new(data)) }
    }

    /// Allocates `len` zero bytes to be filled in place.
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![0u8; len])
    }

    pub fn expose_secret(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    pub(crate) fn expose_secret_mut(&mut self) -> &mut [u8] {
        secrecy::ExposeSecretMut::expose_secret_mut(&mut self.inner)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.expose_secret().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expose_secret().is_empty()
    }
}

impl Debug for SecretBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "SecretBytes([... {} bytes ...])", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let password = Password::new("hunter22");
        assert!(!format!("{password:?}").contains("hunter22"));
        assert!(!password.is_empty());
        assert!(Password::new("").is_empty());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = SecretBytes::from_vec(vec![0xAB; 32]);
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "SecretBytes([... 32 bytes ...])");
        assert!(!rendered.contains("ab"));
    }

    #[test]
    fn test_zeroed_can_be_filled() {
        let mut key = SecretBytes::zeroed(4);
        key.expose_secret_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(key.expose_secret(), &[1, 2, 3, 4]);
    }
}
