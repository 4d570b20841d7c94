//! The resumable, client-scoped draft of an in-progress submission.
use std::collections::HashSet;
use std::fmt::Display;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::profile::{Profile, ServiceOptions};
use crate::domain::requirements::DocumentCategory;
use crate::domain::types::{DraftId, FileName, Reference};

/// Ordered wizard steps.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    #[default]
    Situation,
    Financials,
    Property,
    Documents,
    Options,
    Payment,
    Completed,
}

impl FormStep {
    pub const ORDERED: [FormStep; 7] = [
        FormStep::Situation,
        FormStep::Financials,
        FormStep::Property,
        FormStep::Documents,
        FormStep::Options,
        FormStep::Payment,
        FormStep::Completed,
    ];

    /// Zero-based position in the wizard.
    pub fn index(self) -> usize {
        Self::ORDERED.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Option<FormStep> {
        Self::ORDERED.get(self.index() + 1).copied()
    }
}

impl Display for FormStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormStep::Situation => "situation",
            FormStep::Financials => "financials",
            FormStep::Property => "property",
            FormStep::Documents => "documents",
            FormStep::Options => "options",
            FormStep::Payment => "payment",
            FormStep::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

/// A file buffered for upload.
///
/// The raw payload lives in memory only and never serializes into the
/// durable draft; a reloaded draft can describe what was attached but cannot
/// resurrect the bytes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadedFileRecord {
    pub local_id: Uuid,
    pub display_name: FileName,
    pub size_bytes: u64,
    pub category: DocumentCategory,
    #[serde(skip)]
    pub payload: Option<Vec<u8>>,
    pub remote_url: Option<String>,
}

impl UploadedFileRecord {
    pub fn buffered(display_name: FileName, category: DocumentCategory, payload: Vec<u8>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            display_name,
            size_bytes: payload.len() as u64,
            category,
            payload: Some(payload),
            remote_url: None,
        }
    }

    /// Already persisted at the storage boundary.
    pub fn is_stored(&self) -> bool {
        self.remote_url.is_some()
    }

    /// Lost its payload (e.g. across a reload) and was never stored.
    pub fn needs_reattachment(&self) -> bool {
        self.payload.is_none() && self.remote_url.is_none()
    }
}

/// The single durable record describing one form instance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DraftState {
    pub draft_id: DraftId,
    pub current_step: FormStep,
    pub profile: Profile,
    pub options: ServiceOptions,
    pub active_category: Option<DocumentCategory>,
    pub reference: Option<Reference>,
    pub files: Vec<UploadedFileRecord>,
    pub certified: bool,
    pub saved_at: NaiveDateTime,
}

impl DraftState {
    pub fn new(draft_id: DraftId) -> Self {
        Self {
            draft_id,
            current_step: FormStep::default(),
            profile: Profile::default(),
            options: ServiceOptions::default(),
            active_category: None,
            reference: None,
            files: Vec::new(),
            certified: false,
            saved_at: Utc::now().naive_utc(),
        }
    }

    /// Categories covered by an attached or already stored file.
    pub fn covered_categories(&self) -> HashSet<DocumentCategory> {
        self.files
            .iter()
            .filter(|f| !f.needs_reattachment())
            .map(|f| f.category)
            .collect()
    }

    /// Files whose bytes were lost and which were never stored; the client
    /// must prompt for re-attachment instead of silently dropping them.
    pub fn files_needing_reattachment(&self) -> Vec<&UploadedFileRecord> {
        self.files
            .iter()
            .filter(|f| f.needs_reattachment())
            .collect()
    }

    pub fn touch(&mut self) {
        self.saved_at = Utc::now().naive_utc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffered_file(category: DocumentCategory) -> UploadedFileRecord {
        UploadedFileRecord::buffered(
            FileName::new("statement.pdf").unwrap(),
            category,
            vec![1, 2, 3],
        )
    }

    #[test]
    fn steps_are_ordered_and_terminate() {
        let mut step = FormStep::Situation;
        let mut visited = vec![step];
        while let Some(next) = step.next() {
            step = next;
            visited.push(step);
        }
        assert_eq!(visited, FormStep::ORDERED);
        assert_eq!(FormStep::Completed.next(), None);
    }

    #[test]
    fn payload_does_not_survive_serialization() {
        let mut draft = DraftState::new(DraftId::new());
        draft.files.push(buffered_file(DocumentCategory::Bank));

        let json = serde_json::to_string(&draft).unwrap();
        assert!(!json.contains("payload\":[1,2,3]"));

        let reloaded: DraftState = serde_json::from_str(&json).unwrap();
        let file = &reloaded.files[0];
        assert_eq!(file.size_bytes, 3);
        assert!(file.payload.is_none());
        assert!(file.needs_reattachment());
        assert_eq!(reloaded.files_needing_reattachment().len(), 1);
    }

    #[test]
    fn stored_files_never_need_reattachment() {
        let mut file = buffered_file(DocumentCategory::Salary);
        file.payload = None;
        file.remote_url = Some("https://files.example.com/TX-ABCDEFGH/salary.pdf".to_string());
        assert!(!file.needs_reattachment());
    }

    #[test]
    fn covered_categories_skip_lost_files() {
        let mut draft = DraftState::new(DraftId::new());
        draft.files.push(buffered_file(DocumentCategory::Bank));
        let mut lost = buffered_file(DocumentCategory::Salary);
        lost.payload = None;
        draft.files.push(lost);

        let covered = draft.covered_categories();
        assert!(covered.contains(&DocumentCategory::Bank));
        assert!(!covered.contains(&DocumentCategory::Salary));
    }
}
