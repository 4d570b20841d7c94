use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use steura::boundaries::{BoundaryError, BoundaryResult, Notifier};
use steura::domain::profile::{Profile, ServiceOptions};
use steura::domain::submission::{NewSubmission, SubmissionStatus};
use steura::domain::types::{DraftId, Reference};
use steura::repository::{
    DieselRepository, StatusEventReader, SubmissionReader, SubmissionWriter,
};
use steura::services::{ServiceError, admin};

mod common;

struct FakeNotifier {
    fail: AtomicBool,
    status_changes: AtomicUsize,
}

impl FakeNotifier {
    fn working() -> Self {
        Self {
            fail: AtomicBool::new(false),
            status_changes: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        let notifier = Self::working();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }
}

impl Notifier for FakeNotifier {
    fn send_summary(&self, _reference: &Reference) -> BoundaryResult<()> {
        Ok(())
    }

    fn send_status_change(
        &self,
        _reference: &Reference,
        _old_status: &SubmissionStatus,
        _new_status: &SubmissionStatus,
    ) -> BoundaryResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BoundaryError::Notification("mailer down".to_string()));
        }
        self.status_changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn saved_submission(repo: &DieselRepository) -> Reference {
    repo.create_submission(&NewSubmission {
        draft_id: DraftId::new(),
        profile: Profile::default(),
        options: ServiceOptions::default(),
        total_cents: 9_000,
        tax_cents: 674,
        currency: "CHF".to_string(),
    })
    .unwrap()
    .reference
}

#[test]
fn test_status_update_appends_history_and_notifies() {
    let test_db = common::TestDb::new("test_status_update_appends_history.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let notifier = FakeNotifier::working();
    let reference = saved_submission(&repo);

    let outcome = admin::update_request_status(
        &repo,
        &notifier,
        &reference,
        SubmissionStatus::Other("InReview".to_string()),
        SubmissionStatus::Saved,
        "anna@steura.ch",
        true,
    )
    .unwrap();

    assert!(outcome.notified);
    assert_eq!(notifier.status_changes.load(Ordering::SeqCst), 1);

    let detail = admin::get_submission(&repo, &reference).unwrap();
    assert_eq!(
        detail.submission.status,
        SubmissionStatus::Other("InReview".to_string())
    );
    assert_eq!(detail.history.len(), 1);
    assert_eq!(detail.history[0].actor, "anna@steura.ch");
    assert!(detail.history[0].notified);
}

#[test]
fn test_stale_expectation_is_a_conflict_without_history() {
    let test_db = common::TestDb::new("test_stale_expectation_is_a_conflict.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let notifier = FakeNotifier::working();
    let reference = saved_submission(&repo);

    let result = admin::update_request_status(
        &repo,
        &notifier,
        &reference,
        SubmissionStatus::Completed,
        SubmissionStatus::Paid,
        "anna@steura.ch",
        true,
    );
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(notifier.status_changes.load(Ordering::SeqCst), 0);

    let submission = repo.get_submission_by_reference(&reference).unwrap().unwrap();
    assert_eq!(submission.status, SubmissionStatus::Saved);
    let events = repo.list_status_events(submission.id).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_notification_failure_keeps_the_status_change() {
    let test_db = common::TestDb::new("test_notification_failure_keeps_change.db");
    let repo = DieselRepository::new(test_db.pool().clone());
    let notifier = FakeNotifier::failing();
    let reference = saved_submission(&repo);

    let outcome = admin::update_request_status(
        &repo,
        &notifier,
        &reference,
        SubmissionStatus::Other("InReview".to_string()),
        SubmissionStatus::Saved,
        "anna@steura.ch",
        true,
    )
    .unwrap();

    assert!(!outcome.notified);
    let detail = admin::get_submission(&repo, &reference).unwrap();
    assert_eq!(
        detail.submission.status,
        SubmissionStatus::Other("InReview".to_string())
    );
    assert_eq!(detail.history.len(), 1);
    assert!(!detail.history[0].notified);
}

#[test]
fn test_unknown_reference_is_not_found() {
    let test_db = common::TestDb::new("test_admin_unknown_reference.db");
    let repo = DieselRepository::new(test_db.pool().clone());

    let result = admin::get_submission(&repo, &Reference::new("TX-AAAAAAAA").unwrap());
    assert!(matches!(result, Err(ServiceError::NotFound)));
}
