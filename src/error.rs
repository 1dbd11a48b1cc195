//! Typed engine errors.
//!
//! Every failure surfaces as one [`Error`] variant with a stable
//! [`ErrorKind`]. Callers that only need to decide what to tell a user can
//! branch on [`Category`]: anything that went wrong while opening a container
//! collapses into [`Category::Decryption`], so a wrong password and a
//! tampered file look the same from the outside.
//!
//! Messages never include password or key material.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Broad grouping of error kinds, suitable for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Category {
    /// The caller supplied something unusable (path, password, settings).
    Input,

    /// The container could not be opened: malformed, unsupported, wrong
    /// password or tampered.
    Decryption,

    /// Reading, writing or renaming on the filesystem failed.
    Io,

    /// The operation was cancelled by the caller.
    Cancelled,

    /// An invariant inside the engine did not hold.
    Internal,
}

/// Fine-grained, stable condition tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    SourceNotFound,
    DestinationNotWritable,
    DestinationExists,
    EmptyPassword,
    InvalidConfig,
    InvalidContainerFormat,
    UnsupportedAlgorithm,
    AuthenticationFailed,
    Io,
    Cancelled,
    Internal,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("destination not writable: {}", path.display())]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid container format: {0}")]
    InvalidContainerFormat(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Wrong password, tampering and corruption of the chunk stream are
    /// indistinguishable and deliberately carry no detail.
    #[error("decryption failed")]
    AuthenticationFailed,

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wraps an I/O error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Returns a closure suitable for `map_err` on I/O results.
    pub fn io_with(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidContainerFormat(reason.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound(_) => ErrorKind::SourceNotFound,
            Self::DestinationNotWritable { .. } => ErrorKind::DestinationNotWritable,
            Self::DestinationExists(_) => ErrorKind::DestinationExists,
            Self::EmptyPassword => ErrorKind::EmptyPassword,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::InvalidContainerFormat(_) => ErrorKind::InvalidContainerFormat,
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub const fn category(&self) -> Category {
        self.kind().category()
    }
}

impl ErrorKind {
    pub const fn category(self) -> Category {
        match self {
            Self::SourceNotFound | Self::DestinationNotWritable | Self::DestinationExists | Self::EmptyPassword | Self::InvalidConfig => Category::Input,
            Self::InvalidContainerFormat | Self::UnsupportedAlgorithm | Self::AuthenticationFailed => Category::Decryption,
            Self::Io => Category::Io,
            Self::Cancelled => Category::Cancelled,
            Self::Internal => Category::Internal,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
