//! Post-payment document upload coordination.

use log::warn;
use uuid::Uuid;

use crate::boundaries::FileStorage;
use crate::domain::draft::UploadedFileRecord;
use crate::domain::requirements::DocumentCategory;
use crate::domain::types::{FileName, Reference};

/// A file the storage boundary accepted, with the URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub local_id: Uuid,
    pub category: DocumentCategory,
    pub file_name: FileName,
    pub url: String,
}

/// A file that could not be stored, with the reason for the operator notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub local_id: Uuid,
    pub category: DocumentCategory,
    pub file_name: FileName,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub succeeded: Vec<StoredDocument>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn merge(&mut self, other: UploadReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

/// Sends every buffered file to the storage boundary, tagged with the
/// submission reference.
///
/// Files are sent independently; one failure never aborts the batch. A file
/// that already has a remote URL is reported as succeeded without a second
/// upload, and a file whose payload was lost across a reload fails with a
/// re-attachment notice. Retries are the orchestrator's concern, not this
/// coordinator's.
pub fn upload_documents<S>(
    storage: &S,
    reference: &Reference,
    files: &[UploadedFileRecord],
) -> UploadReport
where
    S: FileStorage + ?Sized,
{
    let mut report = UploadReport::default();

    for file in files {
        if let Some(url) = &file.remote_url {
            report.succeeded.push(StoredDocument {
                local_id: file.local_id,
                category: file.category,
                file_name: file.display_name.clone(),
                url: url.clone(),
            });
            continue;
        }

        let Some(payload) = &file.payload else {
            warn!(
                "submission {reference}: file {} has no payload, needs re-attachment",
                file.display_name
            );
            report.failed.push(FailedUpload {
                local_id: file.local_id,
                category: file.category,
                file_name: file.display_name.clone(),
                reason: "the file content was lost and must be attached again".to_string(),
            });
            continue;
        };

        match storage.put_file(reference, file.category, payload, file.display_name.as_str()) {
            Ok(url) => report.succeeded.push(StoredDocument {
                local_id: file.local_id,
                category: file.category,
                file_name: file.display_name.clone(),
                url,
            }),
            Err(e) => {
                warn!(
                    "submission {reference}: upload of {} failed: {e}",
                    file.display_name
                );
                report.failed.push(FailedUpload {
                    local_id: file.local_id,
                    category: file.category,
                    file_name: file.display_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::boundaries::{BoundaryError, BoundaryResult};

    /// Storage fake failing for file names listed in `fail_names`.
    struct FlakyStorage {
        fail_names: Vec<String>,
        stored: Mutex<Vec<String>>,
    }

    impl FlakyStorage {
        fn failing_on(names: &[&str]) -> Self {
            Self {
                fail_names: names.iter().map(|n| n.to_string()).collect(),
                stored: Mutex::new(Vec::new()),
            }
        }
    }

    impl FileStorage for FlakyStorage {
        fn put_file(
            &self,
            reference: &Reference,
            category: DocumentCategory,
            _bytes: &[u8],
            filename: &str,
        ) -> BoundaryResult<String> {
            if self.fail_names.iter().any(|n| n == filename) {
                return Err(BoundaryError::Storage("storage unavailable".to_string()));
            }
            let url = format!("https://files.example.com/{reference}/{}/{filename}", category.key());
            self.stored.lock().unwrap().push(url.clone());
            Ok(url)
        }
    }

    fn file(name: &str, category: DocumentCategory) -> UploadedFileRecord {
        UploadedFileRecord::buffered(FileName::new(name).unwrap(), category, vec![1, 2, 3])
    }

    #[test]
    fn one_failure_does_not_abort_the_batch() {
        let storage = FlakyStorage::failing_on(&["b.pdf"]);
        let reference = Reference::new("TX-ABCDEFGH").unwrap();
        let files = vec![
            file("a.pdf", DocumentCategory::Bank),
            file("b.pdf", DocumentCategory::Salary),
            file("c.pdf", DocumentCategory::Insurance),
        ];

        let report = upload_documents(&storage, &reference, &files);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file_name.as_str(), "b.pdf");
        assert_eq!(storage.stored.lock().unwrap().len(), 2);
    }

    #[test]
    fn stored_files_are_not_uploaded_twice() {
        let storage = FlakyStorage::failing_on(&[]);
        let reference = Reference::new("TX-ABCDEFGH").unwrap();
        let mut already = file("a.pdf", DocumentCategory::Bank);
        already.payload = None;
        already.remote_url = Some("https://files.example.com/existing".to_string());

        let report = upload_documents(&storage, &reference, &[already]);
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.succeeded[0].url, "https://files.example.com/existing");
        assert!(storage.stored.lock().unwrap().is_empty());
    }

    #[test]
    fn lost_payloads_fail_with_a_reattachment_notice() {
        let storage = FlakyStorage::failing_on(&[]);
        let reference = Reference::new("TX-ABCDEFGH").unwrap();
        let mut lost = file("a.pdf", DocumentCategory::Bank);
        lost.payload = None;

        let report = upload_documents(&storage, &reference, &[lost]);
        assert_eq!(report.succeeded.len(), 0);
        assert!(report.failed[0].reason.contains("attached again"));
    }
}
