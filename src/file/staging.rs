//! Temporary output with atomic publish.
//!
//! Output is written to a hidden temporary file created next to the final
//! path, so publishing is a same-directory rename. The temporary file is
//! owner-only and is removed on drop unless it was committed, which covers
//! failure, cancellation and panics alike.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Longest slice of the target name carried into the temporary name.
///
/// The temporary name adds a leading dot, a separator, six random characters
/// and `.tmp`, and must still fit a 255-byte file name.
const MAX_PREFIX_NAME: usize = 128;

#[derive(Debug)]
pub struct StagedFile {
    file: File,
    temp: TempPath,
    target: PathBuf,
}

impl StagedFile {
    /// Creates the temporary file for `target` in `target`'s directory.
    ///
    /// # Errors
    ///
    /// [`Error::DestinationNotWritable`] if the file cannot be created.
    pub fn create(target: &Path) -> Result<Self> {
        let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let staged = Builder::new()
            .prefix(&format!(".{}.", truncate_name(&name, MAX_PREFIX_NAME)))
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|source| Error::DestinationNotWritable { path: dir.to_path_buf(), source })?;

        let (file, temp) = staged.into_parts();
        debug!(temp = %temp.display(), target = %target.display(), "staged output");

        Ok(Self { file: File::from_std(file), temp, target: target.to_path_buf() })
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Flushes, syncs and renames the temporary file onto the target.
    ///
    /// Without `overwrite` an existing target is never replaced, even one
    /// that appeared while the output was being written.
    ///
    /// # Errors
    ///
    /// - [`Error::DestinationExists`] if the target exists and `overwrite` is off
    /// - [`Error::Io`] if flushing, syncing or renaming fails
    pub async fn commit(self, overwrite: bool) -> Result<PathBuf> {
        let Self { mut file, temp, target } = self;

        file.flush().await.map_err(Error::io_with("failed to flush output"))?;
        file.sync_all().await.map_err(Error::io_with("failed to sync output"))?;
        drop(file);

        let persisted = if overwrite { temp.persist(&target) } else { temp.persist_noclobber(&target) };

        match persisted {
            Ok(()) => Ok(target),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Err(Error::DestinationExists(target)),
            Err(e) => Err(Error::io(format!("failed to publish {}", target.display()), e.error)),
        }
    }
}

fn truncate_name(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }

    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
