use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use steura::boundaries::{
    BoundaryError, BoundaryResult, FileStorage, Notifier, PaymentGateway, PaymentRequest,
    PaymentSession,
};
use steura::domain::profile::{
    AdultIndex, ClientCategory, DeliveryMethod, EmploymentStatus, FlaggedAmount, ProfileUpdate,
    ServiceOptions, TransportMode, Workplace,
};
use steura::domain::requirements::DocumentCategory;
use steura::domain::submission::SubmissionStatus;
use steura::domain::types::{CantonCode, DraftId, EmployerName, FileName, Reference};
use steura::repository::draft::DieselDraftStore;
use steura::repository::{
    DieselRepository, DraftStore, StatusEventReader, SubmissionListQuery, SubmissionReader,
};
use steura::services::orchestrator::{self, SagaPhase, SingleFlight};
use steura::services::{ServiceError, intake};

mod common;

struct FakePayments {
    fail: AtomicBool,
}

impl FakePayments {
    fn working() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }

    fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
        }
    }
}

impl PaymentGateway for FakePayments {
    fn create_payment_session(&self, request: &PaymentRequest) -> BoundaryResult<PaymentSession> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BoundaryError::Payment("gateway unreachable".to_string()));
        }
        Ok(PaymentSession {
            url: format!("https://pay.example.com/{}", request.reference),
        })
    }
}

/// Storage fake failing a configurable number of times per file name.
struct FakeStorage {
    fail_remaining: Mutex<HashMap<String, usize>>,
    puts: AtomicUsize,
}

impl FakeStorage {
    fn working() -> Self {
        Self {
            fail_remaining: Mutex::new(HashMap::new()),
            puts: AtomicUsize::new(0),
        }
    }

    fn failing_times(name: &str, times: usize) -> Self {
        let storage = Self::working();
        storage
            .fail_remaining
            .lock()
            .unwrap()
            .insert(name.to_string(), times);
        storage
    }
}

impl FileStorage for FakeStorage {
    fn put_file(
        &self,
        reference: &Reference,
        category: DocumentCategory,
        _bytes: &[u8],
        filename: &str,
    ) -> BoundaryResult<String> {
        let mut failures = self.fail_remaining.lock().unwrap();
        if let Some(remaining) = failures.get_mut(filename) {
            if *remaining > 0 {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return Err(BoundaryError::Storage("storage unavailable".to_string()));
            }
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://files.example.com/{reference}/{}/{filename}",
            category.key()
        ))
    }
}

struct FakeNotifier {
    fail_summaries_remaining: AtomicUsize,
    summaries: AtomicUsize,
}

impl FakeNotifier {
    fn working() -> Self {
        Self {
            fail_summaries_remaining: AtomicUsize::new(0),
            summaries: AtomicUsize::new(0),
        }
    }

    fn failing_summaries(times: usize) -> Self {
        let notifier = Self::working();
        notifier
            .fail_summaries_remaining
            .store(times, Ordering::SeqCst);
        notifier
    }
}

impl Notifier for FakeNotifier {
    fn send_summary(&self, _reference: &Reference) -> BoundaryResult<()> {
        let remaining = self.fail_summaries_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_summaries_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(BoundaryError::Notification("mailer down".to_string()));
        }
        self.summaries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn send_status_change(
        &self,
        _reference: &Reference,
        _old_status: &SubmissionStatus,
        _new_status: &SubmissionStatus,
    ) -> BoundaryResult<()> {
        Ok(())
    }
}

fn workplace() -> Workplace {
    Workplace {
        adult: AdultIndex::First,
        employer: EmployerName::new("Acme AG").unwrap(),
        transport: TransportMode::Train,
        distance_km: 12,
        yearly_days: 220,
        reimbursement: None,
    }
}

fn situation() -> ProfileUpdate {
    ProfileUpdate::Situation {
        canton: CantonCode::new("ZH").unwrap(),
        category: ClientCategory::Private,
        employment: EmploymentStatus::Employed,
        partner_employment: None,
        children_count: 0,
        childcare: FlaggedAmount::default(),
    }
}

/// A draft ready for submission, with the three required files buffered.
fn prepared_draft(store: &DieselDraftStore) -> DraftId {
    let draft_id = intake::start_draft(store).draft.draft_id;
    intake::apply_update(store, &draft_id, situation()).unwrap();
    intake::apply_update(store, &draft_id, ProfileUpdate::AddWorkplace(workplace())).unwrap();
    for (name, category) in [
        ("bank.pdf", DocumentCategory::Bank),
        ("insurance.pdf", DocumentCategory::Insurance),
        ("salary.pdf", DocumentCategory::Salary),
    ] {
        intake::attach_file(
            store,
            &draft_id,
            FileName::new(name).unwrap(),
            category,
            vec![1, 2, 3],
        )
        .unwrap();
    }
    intake::certify(store, &draft_id, true).unwrap();
    draft_id
}

#[test]
fn test_submit_is_idempotent_per_draft() {
    let test_db = common::TestDb::new("test_submit_is_idempotent_per_draft.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let payments = FakePayments::working();
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let first = orchestrator::submit(&repo, &store, &payments, &single_flight, &draft_id).unwrap();
    let second = orchestrator::submit(&repo, &store, &payments, &single_flight, &draft_id).unwrap();

    assert_eq!(first.reference, second.reference);
    assert_eq!(first.phase, SagaPhase::AwaitingPayment);
    assert!(first.payment_url.contains(first.reference.as_str()));

    let (total, _) = repo.list_submissions(SubmissionListQuery::new()).unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_uncertified_draft_cannot_submit() {
    let test_db = common::TestDb::new("test_uncertified_draft_cannot_submit.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let payments = FakePayments::working();
    let single_flight = SingleFlight::default();

    let draft_id = prepared_draft(&store);
    intake::certify(&store, &draft_id, false).unwrap();

    let result = orchestrator::submit(&repo, &store, &payments, &single_flight, &draft_id);
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    let (total, _) = repo.list_submissions(SubmissionListQuery::new()).unwrap();
    assert_eq!(total, 0);
}

#[test]
fn test_payment_session_failure_leaves_submission_saved_and_retryable() {
    let test_db =
        common::TestDb::new("test_payment_session_failure_leaves_submission_saved.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let result = orchestrator::submit(
        &repo,
        &store,
        &FakePayments::failing(),
        &single_flight,
        &draft_id,
    );
    assert!(matches!(result, Err(ServiceError::Payment(_))));

    // The submission exists and stays Saved; the reference is already on the
    // draft, so the retry reuses it instead of creating a second record.
    let reference = store.load_draft(&draft_id).unwrap().reference.unwrap();
    let submission = repo.get_submission_by_reference(&reference).unwrap().unwrap();
    assert_eq!(submission.status, SubmissionStatus::Saved);

    let retried = orchestrator::submit(
        &repo,
        &store,
        &FakePayments::working(),
        &single_flight,
        &draft_id,
    )
    .unwrap();
    assert_eq!(retried.reference, reference);
    let (total, _) = repo.list_submissions(SubmissionListQuery::new()).unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_confirmation_after_reload_completes_without_second_record() {
    let test_db =
        common::TestDb::new("test_confirmation_after_reload_completes.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let storage = FakeStorage::working();
    let notifier = FakeNotifier::working();
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let submitted =
        orchestrator::submit(&repo, &store, &FakePayments::working(), &single_flight, &draft_id)
            .unwrap();

    // The user closed and reopened the app: the durable draft still resumes
    // at the payment step.
    let resumed = orchestrator::resume(&repo, &store, &storage, &notifier, &draft_id).unwrap();
    assert_eq!(resumed.phase, SagaPhase::Saved);

    // Then the confirmation signal arrives.
    let outcome = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_777",
    )
    .unwrap();
    assert_eq!(outcome.phase, SagaPhase::Completed);

    let (total, _) = repo.list_submissions(SubmissionListQuery::new()).unwrap();
    assert_eq!(total, 1);
    let submission = repo
        .get_submission_by_reference(&submitted.reference)
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Completed);
    assert_eq!(submission.transaction_id.as_deref(), Some("tr_777"));

    // The draft is cleared; a later resume replays the recorded outcome.
    assert!(store.load_draft(&draft_id).is_none());
    let resumed = orchestrator::resume(&repo, &store, &storage, &notifier, &draft_id).unwrap();
    assert_eq!(resumed.phase, SagaPhase::Completed);
    assert_eq!(resumed.outcome.unwrap().documents.len(), 3);
}

#[test]
fn test_one_failed_upload_does_not_block_completion() {
    let test_db = common::TestDb::new("test_one_failed_upload_does_not_block_completion.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    // salary.pdf fails on every attempt, including the bounded retry.
    let storage = FakeStorage::failing_times("salary.pdf", usize::MAX);
    let notifier = FakeNotifier::working();
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let submitted =
        orchestrator::submit(&repo, &store, &FakePayments::working(), &single_flight, &draft_id)
            .unwrap();
    let outcome = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_1",
    )
    .unwrap();

    assert_eq!(outcome.phase, SagaPhase::Completed);
    assert!(outcome.followup_required);
    assert_eq!(outcome.failed_files, vec!["salary.pdf".to_string()]);
    assert_eq!(outcome.documents.len(), 2);

    let submission = repo
        .get_submission_by_reference(&submitted.reference)
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Completed);
    assert!(submission.followup_required);

    // The history records the lifecycle transitions and nothing per file.
    let events = repo.list_status_events(submission.id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].new_status, SubmissionStatus::Paid);
    assert_eq!(events[1].new_status, SubmissionStatus::Completed);
}

#[test]
fn test_bounded_retry_recovers_a_transient_upload_failure() {
    let test_db = common::TestDb::new("test_bounded_retry_recovers_transient_failure.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let storage = FakeStorage::failing_times("salary.pdf", 1);
    let notifier = FakeNotifier::working();
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let submitted =
        orchestrator::submit(&repo, &store, &FakePayments::working(), &single_flight, &draft_id)
            .unwrap();
    let outcome = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_1",
    )
    .unwrap();

    assert!(!outcome.followup_required);
    assert!(outcome.failed_files.is_empty());
    assert_eq!(outcome.documents.len(), 3);
}

#[test]
fn test_finalization_failure_keeps_record_paid_and_is_retryable() {
    let test_db = common::TestDb::new("test_finalization_failure_keeps_record_paid.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let storage = FakeStorage::working();
    let notifier = FakeNotifier::failing_summaries(1);
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let submitted =
        orchestrator::submit(&repo, &store, &FakePayments::working(), &single_flight, &draft_id)
            .unwrap();
    let result = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_9",
    );
    assert!(matches!(result, Err(ServiceError::Finalization(_))));

    // Paid is never lost: the record waits for a finalization retry.
    let submission = repo
        .get_submission_by_reference(&submitted.reference)
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Paid);
    let uploads_before_retry = storage.puts.load(Ordering::SeqCst);
    assert_eq!(uploads_before_retry, 3);

    // The replayed confirmation finishes the job without re-uploading or
    // re-recording anything.
    let outcome = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_9",
    )
    .unwrap();
    assert_eq!(outcome.phase, SagaPhase::Completed);
    assert_eq!(outcome.documents.len(), 3);
    assert_eq!(storage.puts.load(Ordering::SeqCst), uploads_before_retry);
    assert_eq!(notifier.summaries.load(Ordering::SeqCst), 1);

    let events = repo.list_status_events(submission.id).unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_replayed_confirmation_on_completed_record_is_a_no_op() {
    let test_db = common::TestDb::new("test_replayed_confirmation_is_a_no_op.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let storage = FakeStorage::working();
    let notifier = FakeNotifier::working();
    let single_flight = SingleFlight::default();
    let draft_id = prepared_draft(&store);

    let submitted =
        orchestrator::submit(&repo, &store, &FakePayments::working(), &single_flight, &draft_id)
            .unwrap();
    orchestrator::confirm_payment(&repo, &store, &storage, &notifier, &submitted.reference, "tr_1")
        .unwrap();
    let replay = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_1",
    )
    .unwrap();

    assert_eq!(replay.phase, SagaPhase::Completed);
    assert_eq!(notifier.summaries.load(Ordering::SeqCst), 1);
    assert_eq!(storage.puts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_confirmation_for_unknown_reference_is_not_found() {
    let test_db = common::TestDb::new("test_confirmation_for_unknown_reference.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());

    let result = orchestrator::confirm_payment(
        &repo,
        &store,
        &FakeStorage::working(),
        &FakeNotifier::working(),
        &Reference::new("TX-AAAAAAAA").unwrap(),
        "tr_1",
    );
    assert!(matches!(result, Err(ServiceError::NotFound)));
}

#[test]
fn test_resume_restores_step_and_flags_lost_payloads() {
    let test_db = common::TestDb::new("test_resume_restores_step_and_flags_payloads.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let storage = FakeStorage::working();
    let notifier = FakeNotifier::working();
    let draft_id = prepared_draft(&store);

    // Restart: only the durable draft survives, and it cannot carry payloads.
    let store = DieselDraftStore::new(test_db.pool().clone());
    let resumed = orchestrator::resume(&repo, &store, &storage, &notifier, &draft_id).unwrap();
    assert_eq!(resumed.phase, SagaPhase::Draft);
    let overview = resumed.overview.unwrap();
    assert_eq!(overview.draft.files_needing_reattachment().len(), 3);
    assert_eq!(overview.draft.files.len(), 3);
}

#[test]
fn test_postal_delivery_completes_with_tracking_event() {
    let test_db = common::TestDb::new("test_postal_delivery_completes.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let store = DieselDraftStore::new(test_db.pool().clone());
    let storage = FakeStorage::working();
    let notifier = FakeNotifier::working();
    let single_flight = SingleFlight::default();

    // Postal delivery: no uploads at all, the documents gate is waived.
    let draft_id = intake::start_draft(&store).draft.draft_id;
    intake::apply_update(&store, &draft_id, situation()).unwrap();
    intake::apply_update(&store, &draft_id, ProfileUpdate::AddWorkplace(workplace())).unwrap();
    intake::update_options(
        &store,
        &draft_id,
        ServiceOptions {
            delivery: DeliveryMethod::Postal,
            ..ServiceOptions::default()
        },
    )
    .unwrap();
    intake::certify(&store, &draft_id, true).unwrap();

    let submitted =
        orchestrator::submit(&repo, &store, &FakePayments::working(), &single_flight, &draft_id)
            .unwrap();
    let outcome = orchestrator::confirm_payment(
        &repo,
        &store,
        &storage,
        &notifier,
        &submitted.reference,
        "tr_post",
    )
    .unwrap();
    assert_eq!(outcome.phase, SagaPhase::Completed);
    assert!(outcome.documents.is_empty());

    let submission = repo
        .get_submission_by_reference(&submitted.reference)
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Completed);

    // The audit trail notes the outstanding paper documents.
    let events = repo.list_status_events(submission.id).unwrap();
    let last = events.last().unwrap();
    assert_eq!(
        last.new_status,
        SubmissionStatus::Other("Awaiting postal documents".to_string())
    );
    assert_eq!(last.actor, "system");
}
