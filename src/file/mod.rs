//! File-system boundary of the engine.
//!
//! - [`Source`]: an opened regular input file and its size
//! - [`Destination`]: where output goes, given as an explicit directory and
//!   an optional explicit file name
//! - [`staging::StagedFile`]: temporary output that only becomes visible
//!   under its final name once it is complete

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::{DECRYPTED_SUFFIX, FILE_EXTENSION};
use crate::error::{Error, Result};

pub mod staging;

pub use self::staging::StagedFile;

/// An opened input file.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    file: fs::File,
    size: u64,
}

impl Source {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// - [`Error::SourceNotFound`] if nothing exists at `path` or it is not a
    ///   regular file
    /// - [`Error::Io`] for any other failure (e.g. permissions)
    pub async fn open(path: &Path) -> Result<Self> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::SourceNotFound(path.to_path_buf())),
            Err(e) => return Err(Error::io(format!("failed to inspect {}", path.display()), e)),
        };

        if !metadata.is_file() {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }

        let file = fs::File::open(path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::SourceNotFound(path.to_path_buf()),
            _ => Error::io(format!("failed to open {}", path.display()), e),
        })?;

        Ok(Self { path: path.to_path_buf(), file, size: metadata.len() })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// The final path component, lossily converted to UTF-8.
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }

    pub fn file_mut(&mut self) -> &mut fs::File {
        &mut self.file
    }
}

/// Output location for one operation.
///
/// The engine never guesses a directory: the caller always names one. The
/// file name is optional; when absent a default is derived per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    dir: PathBuf,
    file_name: Option<String>,
}

impl Destination {
    pub fn dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), file_name: None }
    }

    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    #[inline]
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Final output path: the explicit name if one was given, `default_name`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the explicit name is not a plain file name.
    pub fn resolve(&self, default_name: &str) -> Result<PathBuf> {
        let name = match &self.file_name {
            Some(name) if is_plain_file_name(name) => name.as_str(),
            Some(name) => return Err(Error::InvalidConfig(format!("destination file name must be a plain file name, got {name:?}"))),
            None => default_name,
        };

        Ok(self.dir.join(name))
    }

    /// Confirms the directory exists and `target` may be claimed.
    ///
    /// # Errors
    ///
    /// - [`Error::DestinationNotWritable`] if the directory is missing or is
    ///   not a directory
    /// - [`Error::DestinationExists`] if `target` exists and `overwrite` is off
    /// - [`Error::InvalidConfig`] if `target` is the `source` file itself
    pub async fn prepare(&self, target: &Path, source: &Path, overwrite: bool) -> Result<()> {
        let metadata = fs::metadata(&self.dir).await.map_err(|source| Error::DestinationNotWritable { path: self.dir.clone(), source })?;

        if !metadata.is_dir() {
            return Err(Error::DestinationNotWritable { path: self.dir.clone(), source: io::Error::other("not a directory") });
        }

        let exists = fs::try_exists(target).await.map_err(Error::io_with(format!("failed to inspect {}", target.display())))?;
        if exists && !overwrite {
            return Err(Error::DestinationExists(target.to_path_buf()));
        }

        if exists && same_file(target, source).await? {
            return Err(Error::InvalidConfig(format!("destination is the input file: {}", target.display())));
        }

        Ok(())
    }
}

async fn same_file(a: &Path, b: &Path) -> Result<bool> {
    let a = fs::canonicalize(a).await.map_err(Error::io_with(format!("failed to resolve {}", a.display())))?;
    let b = fs::canonicalize(b).await.map_err(Error::io_with(format!("failed to resolve {}", b.display())))?;
    Ok(a == b)
}

/// Whether `name` names a file directly inside a directory: non-empty, no
/// separators and no `.`/`..` components.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// Default name for a new container: `<source name>.encrypted`.
pub fn encrypted_name(source_name: &str) -> String {
    format!("{source_name}{FILE_EXTENSION}")
}

/// Default name for decrypted output.
///
/// Prefers the name stored in the container. Falls back to the container's
/// own name with the container extension removed, or with a suffix added
/// when it does not carry the extension.
pub fn decrypted_name(stored: &str, container: &Path) -> String {
    if is_plain_file_name(stored) {
        return stored.to_owned();
    }

    let container_name = container.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();

    match container_name.strip_suffix(FILE_EXTENSION) {
        Some(stem) if is_plain_file_name(stem) => stem.to_owned(),
        _ => format!("{container_name}{DECRYPTED_SUFFIX}"),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("report.pdf"));
        assert!(is_plain_file_name(".hidden"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../etc/passwd"));
        assert!(!is_plain_file_name("dir/file"));
        assert!(!is_plain_file_name("dir\\file"));
        assert!(!is_plain_file_name("/abs"));
    }

    #[test]
    fn test_encrypted_name() {
        assert_eq!(encrypted_name("document.txt"), "document.txt.encrypted");
    }

    #[test]
    fn test_decrypted_name_prefers_stored() {
        assert_eq!(decrypted_name("document.txt", Path::new("/tmp/blob.bin")), "document.txt");
    }

    #[test]
    fn test_decrypted_name_fallbacks() {
        assert_eq!(decrypted_name("", Path::new("/tmp/document.txt.encrypted")), "document.txt");
        assert_eq!(decrypted_name("../../evil", Path::new("/tmp/document.txt.encrypted")), "document.txt");
        assert_eq!(decrypted_name("", Path::new("/tmp/blob.bin")), "blob.bin.decrypted");
        assert_eq!(decrypted_name("", Path::new("/tmp/.encrypted")), ".encrypted.decrypted");
    }

    #[test]
    fn test_destination_resolve() {
        let dest = Destination::dir("/out");
        assert_eq!(dest.resolve("a.txt").unwrap(), PathBuf::from("/out/a.txt"));

        let named = Destination::dir("/out").with_file_name("b.txt");
        assert_eq!(named.resolve("a.txt").unwrap(), PathBuf::from("/out/b.txt"));

        let bad = Destination::dir("/out").with_file_name("../b.txt");
        assert!(matches!(bad.resolve("a.txt"), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_open_source_errors() {
        let dir = tempdir().unwrap();

        let missing = Source::open(&dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(missing, Error::SourceNotFound(_)));

        let directory = Source::open(dir.path()).await.unwrap_err();
        assert!(matches!(directory, Error::SourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_open_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"hello").unwrap();

        let source = Source::open(&path).await.unwrap();
        assert_eq!(source.size(), 5);
        assert_eq!(source.file_name(), "plain.txt");
    }

    #[tokio::test]
    async fn test_prepare_destination() {
        let dir = tempdir().unwrap();
        let dest = Destination::dir(dir.path());
        let target = dir.path().join("out.bin");
        let source = dir.path().join("in.bin");
        std::fs::write(&source, b"input").unwrap();

        assert!(dest.prepare(&target, &source, false).await.is_ok());

        std::fs::write(&target, b"taken").unwrap();
        assert!(matches!(dest.prepare(&target, &source, false).await, Err(Error::DestinationExists(_))));
        assert!(dest.prepare(&target, &source, true).await.is_ok());

        let missing = Destination::dir(dir.path().join("nope"));
        assert!(matches!(missing.prepare(&target, &source, false).await, Err(Error::DestinationNotWritable { .. })));
    }

    #[tokio::test]
    async fn test_prepare_refuses_source_as_target() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("doc.txt");
        std::fs::write(&source, b"plaintext").unwrap();

        // Same file reached through a different spelling of the path.
        let dest = Destination::dir(dir.path().join(".")).with_file_name("doc.txt");
        let target = dest.resolve("unused").unwrap();

        assert!(matches!(dest.prepare(&target, &source, false).await, Err(Error::DestinationExists(_))));
        assert!(matches!(dest.prepare(&target, &source, true).await, Err(Error::InvalidConfig(_))));
    }
}
