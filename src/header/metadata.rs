use tracing::warn;
use wincode::{SchemaRead, SchemaWrite};

use crate::config::MAX_FILENAME_LENGTH;

/// Original file name and plaintext length.
///
/// The name is advisory: decryption only restores it when it is a plain file
/// name. The size is binding: the decrypted total must equal it.
#[derive(Debug, Clone, PartialEq, Eq, SchemaRead, SchemaWrite)]
pub struct Metadata {
    name: String,
    size: u64,
}

impl Metadata {
    /// Names longer than [`MAX_FILENAME_LENGTH`] bytes are not stored.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        let mut name = name.into();
        if name.len() > MAX_FILENAME_LENGTH {
            warn!(length = name.len(), "file name too long to store, omitting it from metadata");
            name.clear();
        }

        Self { name, size }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_keeps_short_names() {
        let metadata = Metadata::new("report.pdf", 42);
        assert_eq!(metadata.name(), "report.pdf");
        assert_eq!(metadata.size(), 42);
    }

    #[test]
    fn test_metadata_drops_long_names() {
        let metadata = Metadata::new("a".repeat(MAX_FILENAME_LENGTH + 1), 1);
        assert_eq!(metadata.name(), "");

        let metadata = Metadata::new("a".repeat(MAX_FILENAME_LENGTH), 1);
        assert_eq!(metadata.name().len(), MAX_FILENAME_LENGTH);
    }
}
