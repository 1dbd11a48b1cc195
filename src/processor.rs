//! Encryption and decryption pipelines.
//!
//! Both follow the same shape: open the source, resolve and check the
//! destination, derive the key off the async executor, stream chunks through
//! the worker into a staged file, then publish. Nothing is visible at the
//! destination until the last step succeeds.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::cipher::derive::{Derive, Kdf, KdfParams, random_bytes, random_vec};
use crate::cipher::{Algorithm, Cipher};
use crate::config::{ARGON_SALT_LEN, EngineConfig};
use crate::engine::Control;
use crate::error::{Error, Result};
use crate::file::{Destination, Source, StagedFile, decrypted_name, encrypted_name, is_plain_file_name};
use crate::header::{FrameContext, Header, Metadata, Parameters};
use crate::secret::{Password, SecretBytes};
use crate::types::Processing;
use crate::worker::Worker;
use crate::worker::pipeline::Pipeline;

#[derive(Debug)]
pub struct Processor {
    config: EngineConfig,
}

impl Processor {
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub async fn encrypt(&self, source: &Path, password: Password, algorithm: Algorithm, destination: &Destination, control: &Control) -> Result<PathBuf> {
        control.check()?;

        let mut source = Source::open(source).await?;
        let target = destination.resolve(&encrypted_name(&source.file_name()))?;
        destination.prepare(&target, source.path(), self.config.overwrite).await?;

        let size = source.size();
        let salt: [u8; ARGON_SALT_LEN] = random_bytes()?;
        let nonce = random_vec(algorithm.nonce_len())?;

        let parameters = Parameters::new(algorithm, Kdf::Argon2id, &self.config.kdf, self.config.chunk_size, salt.to_vec(), nonce.clone())?;
        let header = Header::new(parameters, Metadata::new(source.file_name(), size))?;
        let header_bytes = header.encode()?;

        info!(source = %source.path().display(), target = %target.display(), %algorithm, size, "encrypting");

        let mut staged = StagedFile::create(&target)?;

        let key = derive_key(password, Kdf::Argon2id, self.config.kdf, salt.to_vec(), algorithm).await?;
        control.check()?;

        let cipher = Cipher::new(algorithm, &key)?;
        drop(key);

        staged.file_mut().write_all(&header_bytes).await.map_err(Error::io_with("failed to write container header"))?;

        let pipeline = Pipeline::new(cipher, FrameContext::new(nonce, &header_bytes), Processing::Encryption);
        let worker = Worker::new(pipeline, Processing::Encryption, self.config.chunk_size, algorithm.tag_len());

        control.start(size);
        let summary = worker.process(source.file_mut(), staged.file_mut(), control.cancel_token(), control.progress()).await?;

        if summary.bytes_read != size {
            return Err(Error::io(
                format!("source changed during encryption: {}", source.path().display()),
                std::io::Error::other(format!("expected {size} bytes, read {}", summary.bytes_read)),
            ));
        }

        control.check()?;
        let published = staged.commit(self.config.overwrite).await?;
        control.finish();

        info!(target = %published.display(), chunks = summary.chunks, "encryption complete");
        Ok(published)
    }

    pub async fn decrypt(&self, source: &Path, password: Password, destination: &Destination, control: &Control) -> Result<PathBuf> {
        control.check()?;

        let mut source = Source::open(source).await?;
        let (header, header_bytes) = Header::read_from(source.file_mut()).await?;

        let stored = header.file_name();
        if !stored.is_empty() && !is_plain_file_name(stored) {
            warn!(name = stored, "ignoring unusable file name stored in container");
        }

        let target = destination.resolve(&decrypted_name(stored, source.path()))?;
        destination.prepare(&target, source.path(), self.config.overwrite).await?;

        let algorithm = header.algorithm();
        info!(source = %source.path().display(), target = %target.display(), %algorithm, size = header.file_size(), "decrypting");

        let mut staged = StagedFile::create(&target)?;

        let key = derive_key(password, header.kdf(), header.kdf_params(), header.salt().to_vec(), algorithm).await?;
        control.check()?;

        let cipher = Cipher::new(algorithm, &key)?;
        drop(key);

        let pipeline = Pipeline::new(cipher, FrameContext::new(header.nonce().to_vec(), &header_bytes), Processing::Decryption);
        let worker = Worker::new(pipeline, Processing::Decryption, header.chunk_size(), algorithm.tag_len());

        control.start(header.file_size());
        let summary = worker.process(source.file_mut(), staged.file_mut(), control.cancel_token(), control.progress()).await?;

        // A valid final frame with the wrong total means frames were
        // removed or replaced wholesale.
        if !summary.finished || summary.plaintext != header.file_size() {
            debug!(expected = header.file_size(), actual = summary.plaintext, "plaintext size mismatch");
            return Err(Error::AuthenticationFailed);
        }

        control.check()?;
        let published = staged.commit(self.config.overwrite).await?;
        control.finish();

        info!(target = %published.display(), chunks = summary.chunks, "decryption complete");
        Ok(published)
    }
}

/// Runs the KDF on the blocking pool. The password is moved in and wiped
/// there.
async fn derive_key(password: Password, kdf: Kdf, params: KdfParams, salt: Vec<u8>, algorithm: Algorithm) -> Result<SecretBytes> {
    debug!(?kdf, iterations = params.iterations, memory_kib = params.memory_kib, parallelism = params.parallelism, "deriving key");

    let derive = Derive::new(kdf, params);
    tokio::task::spawn_blocking(move || derive.derive_key(password, &salt, algorithm.key_len())).await.map_err(|e| Error::Internal(format!("key derivation task failed: {e}")))?
}
