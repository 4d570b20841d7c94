//! Filesystem-backed document storage.

use std::fs;
use std::path::PathBuf;

use crate::boundaries::{BoundaryError, BoundaryResult, FileStorage};
use crate::domain::requirements::DocumentCategory;
use crate::domain::types::Reference;

/// Stores documents under `<root>/<reference>/<category>/<filename>` and
/// serves them from a configured public base URL.
///
/// Pathing every object by reference keeps documents locatable by a human
/// operator even if the in-app record of an upload is lost.
pub struct LocalFileStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    /// Keeps the final path component only and drops characters that could
    /// escape the storage directory.
    fn sanitize_filename(filename: &str) -> String {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename)
            .trim();
        let cleaned: String = name
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
            .collect();
        if cleaned.trim_matches(['.', ' ']).is_empty() {
            "document".to_string()
        } else {
            cleaned
        }
    }
}

impl FileStorage for LocalFileStorage {
    fn put_file(
        &self,
        reference: &Reference,
        category: DocumentCategory,
        bytes: &[u8],
        filename: &str,
    ) -> BoundaryResult<String> {
        let filename = Self::sanitize_filename(filename);
        let dir = self.root.join(reference.as_str()).join(category.key());
        fs::create_dir_all(&dir)
            .map_err(|e| BoundaryError::Storage(format!("create {}: {e}", dir.display())))?;

        let path = dir.join(&filename);
        fs::write(&path, bytes)
            .map_err(|e| BoundaryError::Storage(format!("write {}: {e}", path.display())))?;

        Ok(format!(
            "{}/{}/{}/{}",
            self.public_url.trim_end_matches('/'),
            reference,
            category.key(),
            filename
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_bytes_under_reference_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "https://files.example.com");
        let reference = Reference::new("TX-ABCDEFGH").unwrap();

        let url = storage
            .put_file(&reference, DocumentCategory::Bank, b"pdf", "statement.pdf")
            .unwrap();

        assert_eq!(
            url,
            "https://files.example.com/TX-ABCDEFGH/bank/statement.pdf"
        );
        let stored = dir.path().join("TX-ABCDEFGH").join("bank").join("statement.pdf");
        assert_eq!(fs::read(stored).unwrap(), b"pdf");
    }

    #[test]
    fn filenames_cannot_escape_the_storage_root() {
        assert_eq!(
            LocalFileStorage::sanitize_filename("../../etc/passwd"),
            "passwd"
        );
        assert_eq!(LocalFileStorage::sanitize_filename("a/b\\c.pdf"), "c.pdf");
        assert_eq!(LocalFileStorage::sanitize_filename("..."), "document");
    }
}
