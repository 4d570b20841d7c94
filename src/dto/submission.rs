//! Payload shapes for the submission and administrative endpoints.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::document::SubmissionDocument;
use crate::domain::profile::{Profile, ServiceOptions};
use crate::domain::requirements::DocumentCategory;
use crate::domain::status_event::StatusEvent;
use crate::domain::submission::Submission;
use crate::services::admin::{StatusUpdateOutcome, SubmissionDetail};
use crate::services::orchestrator::{FinalizeOutcome, SagaPhase};

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub reference: String,
    pub status: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub followup_required: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&Submission> for SubmissionResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            reference: submission.reference.to_string(),
            status: submission.status.to_string(),
            total_cents: submission.total_cents,
            tax_cents: submission.tax_cents,
            currency: submission.currency.clone(),
            transaction_id: submission.transaction_id.clone(),
            followup_required: submission.followup_required,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusEventResponse {
    pub old_status: String,
    pub new_status: String,
    pub actor: String,
    pub notified: bool,
    pub created_at: NaiveDateTime,
}

impl From<&StatusEvent> for StatusEventResponse {
    fn from(event: &StatusEvent) -> Self {
        Self {
            old_status: event.old_status.to_string(),
            new_status: event.new_status.to_string(),
            actor: event.actor.clone(),
            notified: event.notified,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub category: DocumentCategory,
    pub file_name: String,
    pub url: String,
    pub created_at: NaiveDateTime,
}

impl From<&SubmissionDocument> for DocumentResponse {
    fn from(document: &SubmissionDocument) -> Self {
        Self {
            category: document.category,
            file_name: document.file_name.to_string(),
            url: document.url.clone(),
            created_at: document.created_at,
        }
    }
}

/// The tracking view: submission, snapshot, audit trail and documents.
#[derive(Debug, Serialize)]
pub struct SubmissionDetailResponse {
    #[serde(flatten)]
    pub submission: SubmissionResponse,
    pub profile: Profile,
    pub options: ServiceOptions,
    pub history: Vec<StatusEventResponse>,
    pub documents: Vec<DocumentResponse>,
}

impl From<SubmissionDetail> for SubmissionDetailResponse {
    fn from(detail: SubmissionDetail) -> Self {
        Self {
            submission: (&detail.submission).into(),
            profile: detail.submission.profile.clone(),
            options: detail.submission.options.clone(),
            history: detail.history.iter().map(Into::into).collect(),
            documents: detail.documents.iter().map(Into::into).collect(),
        }
    }
}

/// The completion view: reference, paid amount and the document outcome.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub reference: String,
    pub total_cents: i64,
    pub currency: String,
    pub documents: Vec<DocumentResponse>,
    /// Files support must chase manually; shown as a notice to the user.
    pub failed_files: Vec<String>,
    pub followup_required: bool,
    pub phase: SagaPhase,
}

impl From<FinalizeOutcome> for CompletionResponse {
    fn from(outcome: FinalizeOutcome) -> Self {
        Self {
            reference: outcome.reference.to_string(),
            total_cents: outcome.total_cents,
            currency: outcome.currency,
            documents: outcome.documents.iter().map(Into::into).collect(),
            failed_files: outcome.failed_files,
            followup_required: outcome.followup_required,
            phase: outcome.phase,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub reference: String,
    pub status: String,
    pub notified: bool,
}

impl From<StatusUpdateOutcome> for StatusUpdateResponse {
    fn from(outcome: StatusUpdateOutcome) -> Self {
        Self {
            reference: outcome.submission.reference.to_string(),
            status: outcome.submission.status.to_string(),
            notified: outcome.notified,
        }
    }
}
