//! Mock implementations for isolating services in downstream tests.

use mockall::mock;

use crate::boundaries::{
    BoundaryResult, FileStorage, Notifier, PaymentGateway, PaymentRequest, PaymentSession,
};
use crate::domain::document::{NewSubmissionDocument, SubmissionDocument};
use crate::domain::draft::DraftState;
use crate::domain::requirements::DocumentCategory;
use crate::domain::status_event::{NewStatusEvent, StatusEvent};
use crate::domain::submission::{NewSubmission, Submission, SubmissionStatus};
use crate::domain::types::{DraftId, Reference};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    DocumentReader, DocumentWriter, DraftStore, StatusEventReader, StatusEventWriter,
    SubmissionListQuery, SubmissionReader, SubmissionWriter,
};

mock! {
    pub Repository {}

    impl SubmissionReader for Repository {
        fn get_submission_by_reference(
            &self,
            reference: &Reference,
        ) -> RepositoryResult<Option<Submission>>;
        fn get_submission_by_draft(
            &self,
            draft_id: &DraftId,
        ) -> RepositoryResult<Option<Submission>>;
        fn list_submissions(
            &self,
            query: SubmissionListQuery,
        ) -> RepositoryResult<(usize, Vec<Submission>)>;
    }

    impl SubmissionWriter for Repository {
        fn create_submission(&self, new_submission: &NewSubmission) -> RepositoryResult<Submission>;
        fn update_submission_status(
            &self,
            reference: &Reference,
            status: &SubmissionStatus,
        ) -> RepositoryResult<Submission>;
        fn record_payment(
            &self,
            reference: &Reference,
            transaction_id: &str,
        ) -> RepositoryResult<Submission>;
        fn set_followup_required(&self, reference: &Reference) -> RepositoryResult<()>;
    }

    impl StatusEventReader for Repository {
        fn list_status_events(&self, submission_id: i32) -> RepositoryResult<Vec<StatusEvent>>;
    }

    impl StatusEventWriter for Repository {
        fn append_status_event(&self, event: &NewStatusEvent) -> RepositoryResult<StatusEvent>;
    }

    impl DocumentReader for Repository {
        fn list_documents(&self, submission_id: i32) -> RepositoryResult<Vec<SubmissionDocument>>;
    }

    impl DocumentWriter for Repository {
        fn add_document(
            &self,
            document: &NewSubmissionDocument,
        ) -> RepositoryResult<SubmissionDocument>;
    }
}

mock! {
    pub Drafts {}

    impl DraftStore for Drafts {
        fn save_draft(&self, draft: &DraftState);
        fn load_draft(&self, draft_id: &DraftId) -> Option<DraftState>;
        fn clear_draft(&self, draft_id: &DraftId);
    }
}

mock! {
    pub Payments {}

    impl PaymentGateway for Payments {
        fn create_payment_session<'a>(
            &self,
            request: &PaymentRequest<'a>,
        ) -> BoundaryResult<PaymentSession>;
    }
}

mock! {
    pub Storage {}

    impl FileStorage for Storage {
        fn put_file(
            &self,
            reference: &Reference,
            category: DocumentCategory,
            bytes: &[u8],
            filename: &str,
        ) -> BoundaryResult<String>;
    }
}

mock! {
    pub Notifications {}

    impl Notifier for Notifications {
        fn send_summary(&self, reference: &Reference) -> BoundaryResult<()>;
        fn send_status_change(
            &self,
            reference: &Reference,
            old_status: &SubmissionStatus,
            new_status: &SubmissionStatus,
        ) -> BoundaryResult<()>;
    }
}
