//! Administrative surface: the status-update entry point and the read views
//! over submissions and their history.

use chrono::Utc;
use log::{error, info};

use crate::boundaries::Notifier;
use crate::domain::document::SubmissionDocument;
use crate::domain::status_event::{NewStatusEvent, StatusEvent};
use crate::domain::submission::{Submission, SubmissionStatus};
use crate::domain::types::Reference;
use crate::repository::{
    DocumentReader, StatusEventReader, StatusEventWriter, SubmissionListQuery, SubmissionReader,
    SubmissionWriter,
};
use crate::services::{ServiceError, ServiceResult};

/// A submission with its audit trail and stored documents.
#[derive(Debug, Clone)]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub history: Vec<StatusEvent>,
    pub documents: Vec<SubmissionDocument>,
}

/// Result of a status update, reporting whether the notification went out.
#[derive(Debug, Clone)]
pub struct StatusUpdateOutcome {
    pub submission: Submission,
    pub notified: bool,
}

/// Lists submissions for the administrative read view.
pub fn list_submissions<R>(
    repo: &R,
    query: SubmissionListQuery,
) -> ServiceResult<(usize, Vec<Submission>)>
where
    R: SubmissionReader + ?Sized,
{
    repo.list_submissions(query).map_err(ServiceError::from)
}

/// Loads one submission with history and documents.
pub fn get_submission<R>(repo: &R, reference: &Reference) -> ServiceResult<SubmissionDetail>
where
    R: SubmissionReader + StatusEventReader + DocumentReader + ?Sized,
{
    let submission = repo
        .get_submission_by_reference(reference)?
        .ok_or(ServiceError::NotFound)?;
    let history = repo.list_status_events(submission.id)?;
    let documents = repo.list_documents(submission.id)?;

    Ok(SubmissionDetail {
        submission,
        history,
        documents,
    })
}

/// Updates a submission's status on behalf of an operator.
///
/// Compare-and-set against the status the operator saw: a stale expectation
/// is a conflict and appends no history. The status-change notification is
/// best-effort; a dispatch failure keeps the new status and is recorded as
/// `notified: false` in the history row.
pub fn update_request_status<R, N>(
    repo: &R,
    notifier: &N,
    reference: &Reference,
    new_status: SubmissionStatus,
    expected_old: SubmissionStatus,
    actor: &str,
    notify: bool,
) -> ServiceResult<StatusUpdateOutcome>
where
    R: SubmissionReader + SubmissionWriter + StatusEventWriter + ?Sized,
    N: Notifier + ?Sized,
{
    let current = repo
        .get_submission_by_reference(reference)?
        .ok_or(ServiceError::NotFound)?;

    if current.status != expected_old {
        return Err(ServiceError::Conflict(format!(
            "submission {reference} is in status {}, not {expected_old}",
            current.status
        )));
    }
    if current.status == new_status {
        return Err(ServiceError::Conflict(format!(
            "submission {reference} is already in status {new_status}"
        )));
    }

    let updated = repo.update_submission_status(reference, &new_status)?;

    let notified = if notify {
        match notifier.send_status_change(reference, &expected_old, &new_status) {
            Ok(()) => true,
            Err(e) => {
                error!("submission {reference}: status-change notification failed: {e}");
                false
            }
        }
    } else {
        false
    };

    repo.append_status_event(&NewStatusEvent {
        submission_id: updated.id,
        old_status: expected_old,
        new_status: new_status.clone(),
        actor: actor.to_string(),
        notified,
        created_at: Utc::now().naive_utc(),
    })?;

    info!("submission {reference}: status set to {new_status} by {actor}");

    Ok(StatusUpdateOutcome {
        submission: updated,
        notified,
    })
}
