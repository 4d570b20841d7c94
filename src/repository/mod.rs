use crate::db::DbPool;
use crate::domain::document::{NewSubmissionDocument, SubmissionDocument};
use crate::domain::draft::DraftState;
use crate::domain::status_event::{NewStatusEvent, StatusEvent};
use crate::domain::submission::{NewSubmission, Submission, SubmissionStatus};
use crate::domain::types::{DraftId, Reference};
use crate::repository::errors::RepositoryResult;

pub mod document;
pub mod draft;
pub mod errors;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod status_event;
pub mod submission;

#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Clone)]
pub struct SubmissionListQuery {
    pub status: Option<SubmissionStatus>,
    pub pagination: Option<Pagination>,
}

impl SubmissionListQuery {
    pub fn new() -> Self {
        Self {
            status: None,
            pagination: None,
        }
    }

    pub fn status(mut self, status: SubmissionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

impl Default for SubmissionListQuery {
    fn default() -> Self {
        Self::new()
    }
}

pub trait SubmissionReader {
    fn get_submission_by_reference(
        &self,
        reference: &Reference,
    ) -> RepositoryResult<Option<Submission>>;
    fn get_submission_by_draft(&self, draft_id: &DraftId) -> RepositoryResult<Option<Submission>>;
    fn list_submissions(
        &self,
        query: SubmissionListQuery,
    ) -> RepositoryResult<(usize, Vec<Submission>)>;
}

pub trait SubmissionWriter {
    /// Creates a submission, assigning a fresh unique reference.
    ///
    /// Idempotent per draft: a replay for an already-persisted draft returns
    /// the existing record instead of inserting a duplicate.
    fn create_submission(&self, new_submission: &NewSubmission) -> RepositoryResult<Submission>;
    fn update_submission_status(
        &self,
        reference: &Reference,
        status: &SubmissionStatus,
    ) -> RepositoryResult<Submission>;
    /// Records the payment transaction id alongside the `Paid` status.
    fn record_payment(
        &self,
        reference: &Reference,
        transaction_id: &str,
    ) -> RepositoryResult<Submission>;
    fn set_followup_required(&self, reference: &Reference) -> RepositoryResult<()>;
}

pub trait StatusEventReader {
    fn list_status_events(&self, submission_id: i32) -> RepositoryResult<Vec<StatusEvent>>;
}

pub trait StatusEventWriter {
    fn append_status_event(&self, event: &NewStatusEvent) -> RepositoryResult<StatusEvent>;
}

pub trait DocumentReader {
    fn list_documents(&self, submission_id: i32) -> RepositoryResult<Vec<SubmissionDocument>>;
}

pub trait DocumentWriter {
    fn add_document(&self, document: &NewSubmissionDocument)
    -> RepositoryResult<SubmissionDocument>;
}

/// Client-scoped durable store for in-progress drafts.
///
/// `save_draft` must never surface an error: on storage unavailability the
/// record degrades to process memory and the failure is logged.
pub trait DraftStore {
    fn save_draft(&self, draft: &DraftState);
    fn load_draft(&self, draft_id: &DraftId) -> Option<DraftState>;
    fn clear_draft(&self, draft_id: &DraftId);
}

/// Diesel-backed implementation of the repository traits.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}
