//! # Engine Facade
//!
//! The single entry point for callers: one [`Engine`] per configuration,
//! any number of concurrent operations on it.
//!
//! ```no_run
//! # async fn run() -> sealbyte::Result<()> {
//! use std::path::Path;
//!
//! use sealbyte::{Algorithm, Destination, Engine, EngineConfig, Password};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let sealed = engine.encrypt(Path::new("notes.txt"), Password::new("correct-password"), Algorithm::Aes256Gcm, &Destination::dir("/tmp")).await?;
//! let opened = engine.decrypt(&sealed, Password::new("correct-password"), &Destination::dir("/restore")).await?;
//! # let _ = opened;
//! # Ok(())
//! # }
//! ```

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cipher::Algorithm;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::file::Destination;
use crate::processor::Processor;
use crate::secret::Password;
use crate::types::Progress;

/// Per-operation controls: cancellation and progress reporting.
///
/// `Control::default()` never cancels and reports nothing.
#[derive(Clone, Default)]
pub struct Control {
    cancel: CancellationToken,
    progress: Option<Arc<dyn Progress>>,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancelling `token` stops the operation at the next chunk boundary and
    /// removes any partial output.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    #[inline]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[inline]
    pub fn progress(&self) -> Option<&dyn Progress> {
        self.progress.as_deref()
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
    }

    pub(crate) fn start(&self, total: u64) {
        if let Some(progress) = &self.progress {
            progress.start(total);
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(progress) = &self.progress {
            progress.finish();
        }
    }
}

impl Debug for Control {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control").field("cancelled", &self.cancel.is_cancelled()).field("progress", &self.progress.is_some()).finish()
    }
}

/// Password-based file encryption engine.
#[derive(Debug)]
pub struct Engine {
    processor: Processor,
    config: EngineConfig,
}

impl Engine {
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the work factors or chunk size are out of
    /// bounds.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { processor: Processor::new(config), config })
    }

    #[inline]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Encrypts `source` into a new container under `destination`.
    ///
    /// Returns the path of the published container.
    pub async fn encrypt(&self, source: &Path, password: Password, algorithm: Algorithm, destination: &Destination) -> Result<PathBuf> {
        self.encrypt_with(source, password, algorithm, destination, &Control::default()).await
    }

    /// Decrypts the container at `source` under `destination`.
    ///
    /// The algorithm and work factors are read from the container; the
    /// file name extension is not consulted.
    pub async fn decrypt(&self, source: &Path, password: Password, destination: &Destination) -> Result<PathBuf> {
        self.decrypt_with(source, password, destination, &Control::default()).await
    }

    #[tracing::instrument(name = "encrypt", skip_all, fields(source = %source.display(), %algorithm))]
    pub async fn encrypt_with(&self, source: &Path, password: Password, algorithm: Algorithm, destination: &Destination, control: &Control) -> Result<PathBuf> {
        if password.is_empty() {
            return Err(Error::EmptyPassword);
        }

        self.processor.encrypt(source, password, algorithm, destination, control).await
    }

    #[tracing::instrument(name = "decrypt", skip_all, fields(source = %source.display()))]
    pub async fn decrypt_with(&self, source: &Path, password: Password, destination: &Destination, control: &Control) -> Result<PathBuf> {
        if password.is_empty() {
            return Err(Error::EmptyPassword);
        }

        self.processor.decrypt(source, password, destination, control).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::derive::KdfParams;

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig { chunk_size: 1, ..EngineConfig::default() };
        assert!(matches!(Engine::new(config), Err(Error::InvalidConfig(_))));

        let config = EngineConfig { kdf: KdfParams { parallelism: 0, ..KdfParams::default() }, ..EngineConfig::default() };
        assert!(matches!(Engine::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_control_cancellation() {
        let token = CancellationToken::new();
        let control = Control::new().with_cancel(token.clone());

        assert!(control.check().is_ok());
        token.cancel();
        assert!(matches!(control.check(), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_password_rejected_before_io() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let err = engine.encrypt(Path::new("/does/not/exist"), Password::new(""), Algorithm::Aes256Gcm, &Destination::dir("/nowhere")).await.unwrap_err();
        assert!(matches!(err, Error::EmptyPassword));

        let err = engine.decrypt(Path::new("/does/not/exist"), Password::new(""), &Destination::dir("/nowhere")).await.unwrap_err();
        assert!(matches!(err, Error::EmptyPassword));
    }
}
