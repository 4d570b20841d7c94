//! Persisted record of a document stored at the storage boundary.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::requirements::DocumentCategory;
use crate::domain::types::FileName;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmissionDocument {
    pub id: i32,
    pub submission_id: i32,
    pub category: DocumentCategory,
    pub file_name: FileName,
    pub url: String,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewSubmissionDocument {
    pub submission_id: i32,
    pub category: DocumentCategory,
    pub file_name: FileName,
    pub url: String,
    pub created_at: NaiveDateTime,
}
