//! Payload shapes for the draft wizard endpoints.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::draft::{FormStep, UploadedFileRecord};
use crate::domain::pricing::Quote;
use crate::domain::profile::{Profile, ServiceOptions};
use crate::domain::requirements::{DocumentCategory, DocumentRequirement};
use crate::dto::submission::CompletionResponse;
use crate::services::intake::DraftOverview;
use crate::services::orchestrator::{ResumedSession, SagaPhase, SubmitOutcome};

#[derive(Debug, Serialize)]
pub struct FileMetadataResponse {
    pub local_id: Uuid,
    pub display_name: String,
    pub size_bytes: u64,
    pub category: DocumentCategory,
    /// Stored at the storage boundary, no payload needed anymore.
    pub stored: bool,
    /// The bytes were lost across a reload and must be attached again.
    pub needs_reattachment: bool,
}

impl From<&UploadedFileRecord> for FileMetadataResponse {
    fn from(file: &UploadedFileRecord) -> Self {
        Self {
            local_id: file.local_id,
            display_name: file.display_name.to_string(),
            size_bytes: file.size_bytes,
            category: file.category,
            stored: file.is_stored(),
            needs_reattachment: file.needs_reattachment(),
        }
    }
}

/// The full wizard state with its derived projections.
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft_id: String,
    pub current_step: FormStep,
    pub profile: Profile,
    pub options: ServiceOptions,
    pub active_category: Option<DocumentCategory>,
    pub reference: Option<String>,
    pub certified: bool,
    pub files: Vec<FileMetadataResponse>,
    pub requirements: Vec<DocumentRequirement>,
    pub missing_required: Vec<DocumentCategory>,
    pub quote: Quote,
}

impl From<DraftOverview> for DraftResponse {
    fn from(overview: DraftOverview) -> Self {
        let draft = overview.draft;
        Self {
            draft_id: draft.draft_id.to_string(),
            current_step: draft.current_step,
            active_category: draft.active_category,
            reference: draft.reference.as_ref().map(|r| r.to_string()),
            certified: draft.certified,
            files: draft.files.iter().map(Into::into).collect(),
            profile: draft.profile,
            options: draft.options,
            requirements: overview.requirements,
            missing_required: overview.missing_required,
            quote: overview.quote,
        }
    }
}

/// Response of `Draft → Saved`: what the payment step needs.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub reference: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
    pub payment_url: String,
    pub phase: SagaPhase,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            reference: outcome.reference.to_string(),
            total_cents: outcome.total_cents,
            tax_cents: outcome.tax_cents,
            currency: outcome.currency,
            payment_url: outcome.payment_url,
            phase: outcome.phase,
        }
    }
}

/// Resume response: the re-derived phase plus whatever state fits it.
#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub phase: SagaPhase,
    pub draft: Option<DraftResponse>,
    pub completion: Option<CompletionResponse>,
}

impl From<ResumedSession> for ResumeResponse {
    fn from(session: ResumedSession) -> Self {
        Self {
            phase: session.phase,
            draft: session.overview.map(Into::into),
            completion: session.outcome.map(Into::into),
        }
    }
}
