//! SealByte - password-based file encryption with self-describing,
//! chunk-authenticated containers.
//!
//! - AES-256-GCM, ChaCha20-Poly1305 and XChaCha20-Poly1305 AEADs
//! - Argon2id key derivation with per-container salt and work factors
//! - Streaming, parallel chunk processing with constant memory
//! - Atomic publish: partial output is never visible
//!
//! Start with [`Engine`].

pub mod cipher;
pub mod config;
pub mod engine;
pub mod error;
pub mod file;
pub mod header;
pub mod processor;
pub mod secret;
pub mod types;
pub mod worker;

pub use tokio_util::sync::CancellationToken;

pub use crate::cipher::Algorithm;
pub use crate::cipher::derive::KdfParams;
pub use crate::config::EngineConfig;
pub use crate::engine::{Control, Engine};
pub use crate::error::{Category, Error, ErrorKind, Result};
pub use crate::file::Destination;
pub use crate::secret::Password;
pub use crate::types::Progress;
