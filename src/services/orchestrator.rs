//! The submission saga.
//!
//! Drives a draft through `Draft → Saved → AwaitingPayment → Paid →
//! Finalizing → Completed` across an interruptible client and an external
//! payment confirmation. Every transition is idempotent and keyed on the
//! submission reference, so any step can be replayed after a crash or reload
//! without duplicating the submission or losing a paid one.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use crate::boundaries::{FileStorage, Notifier, PaymentGateway, PaymentRequest};
use crate::domain::document::{NewSubmissionDocument, SubmissionDocument};
use crate::domain::draft::{DraftState, FormStep, UploadedFileRecord};
use crate::domain::pricing;
use crate::domain::profile::DeliveryMethod;
use crate::domain::status_event::{ACTOR_SYSTEM, NewStatusEvent};
use crate::domain::submission::{NewSubmission, Submission, SubmissionStatus};
use crate::domain::types::{DraftId, Reference};
use crate::repository::{
    DocumentReader, DocumentWriter, DraftStore, StatusEventWriter, SubmissionReader,
    SubmissionWriter,
};
use crate::services::intake::{self, DraftOverview};
use crate::services::uploads;
use crate::services::{ServiceError, ServiceResult};

/// Bounded silent retries for persisting the submission.
const PERSISTENCE_ATTEMPTS: usize = 3;

/// Client-facing phase of the saga, re-derived from durable state on resume.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SagaPhase {
    Draft,
    Saved,
    AwaitingPayment,
    Paid,
    Finalizing,
    Completed,
    Failed(String),
}

/// In-process guard ensuring at most one `Draft → Saved` call is in flight
/// per draft.
#[derive(Default)]
pub struct SingleFlight {
    in_flight: Mutex<HashSet<DraftId>>,
}

impl SingleFlight {
    /// Claims the draft, returning `None` while another call holds it.
    pub fn acquire(&self, draft_id: DraftId) -> Option<SingleFlightGuard<'_>> {
        if self.in_flight.lock().unwrap().insert(draft_id) {
            Some(SingleFlightGuard {
                registry: self,
                draft_id,
            })
        } else {
            None
        }
    }
}

pub struct SingleFlightGuard<'a> {
    registry: &'a SingleFlight,
    draft_id: DraftId,
}

impl Drop for SingleFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .in_flight
            .lock()
            .unwrap()
            .remove(&self.draft_id);
    }
}

/// Result of `Draft → Saved`: the payment step data.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub reference: Reference,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
    pub payment_url: String,
    pub phase: SagaPhase,
}

/// Result of finalization, also returned for replays on a completed record.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub reference: Reference,
    pub total_cents: i64,
    pub currency: String,
    pub documents: Vec<SubmissionDocument>,
    /// Display names the user must hand to support; empty on full success.
    pub failed_files: Vec<String>,
    pub followup_required: bool,
    pub phase: SagaPhase,
}

/// A session re-derived from the durable stores after a reload.
#[derive(Debug, Clone)]
pub struct ResumedSession {
    pub phase: SagaPhase,
    pub overview: Option<DraftOverview>,
    pub outcome: Option<FinalizeOutcome>,
}

fn validate_ready_for_payment(draft: &DraftState) -> ServiceResult<()> {
    for step in [FormStep::Situation, FormStep::Documents, FormStep::Options] {
        intake::advancement_gate(draft, step)?;
    }
    Ok(())
}

/// `Draft → Saved → AwaitingPayment`: persists the submission at most once
/// per draft and opens a payment session.
///
/// A draft that already carries a reference skips creation entirely; a
/// payment session failure leaves the record `Saved` and the call retryable.
pub fn submit<R, S, P>(
    repo: &R,
    store: &S,
    payments: &P,
    single_flight: &SingleFlight,
    draft_id: &DraftId,
) -> ServiceResult<SubmitOutcome>
where
    R: SubmissionReader + SubmissionWriter + ?Sized,
    S: DraftStore + ?Sized,
    P: PaymentGateway + ?Sized,
{
    let _guard = single_flight.acquire(*draft_id).ok_or_else(|| {
        ServiceError::Conflict("a submission for this draft is already in flight".to_string())
    })?;

    let mut draft = store.load_draft(draft_id).ok_or(ServiceError::NotFound)?;

    let submission = match &draft.reference {
        // Resumed session: the submission exists, never create a second one.
        Some(reference) => repo
            .get_submission_by_reference(reference)?
            .ok_or_else(|| {
                ServiceError::Unexpected(format!(
                    "draft {draft_id} references missing submission {reference}"
                ))
            })?,
        None => {
            validate_ready_for_payment(&draft)?;
            let quote = pricing::quote(&draft.profile, &draft.options);
            let new_submission = NewSubmission {
                draft_id: *draft_id,
                profile: draft.profile.clone(),
                options: draft.options.clone(),
                total_cents: quote.total_cents,
                tax_cents: quote.tax_cents,
                currency: quote.currency,
            };

            let mut created = None;
            let mut last_error = None;
            for attempt in 1..=PERSISTENCE_ATTEMPTS {
                match repo.create_submission(&new_submission) {
                    Ok(submission) => {
                        created = Some(submission);
                        break;
                    }
                    Err(e) => {
                        warn!("draft {draft_id}: save attempt {attempt} failed: {e}");
                        last_error = Some(e);
                    }
                }
            }
            let submission = created.ok_or_else(|| {
                ServiceError::Persistence(
                    last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "submission save failed".to_string()),
                )
            })?;

            info!(
                "draft {draft_id}: submission {} created",
                submission.reference
            );
            draft.reference = Some(submission.reference.clone());
            draft.current_step = FormStep::Payment;
            draft.touch();
            store.save_draft(&draft);
            submission
        }
    };

    let session = payments.create_payment_session(&PaymentRequest {
        reference: &submission.reference,
        amount_cents: submission.total_cents,
        currency: &submission.currency,
        customer_contact: draft.options.contact_email.as_ref(),
    })?;

    Ok(SubmitOutcome {
        reference: submission.reference,
        total_cents: submission.total_cents,
        tax_cents: submission.tax_cents,
        currency: submission.currency,
        payment_url: session.url,
        phase: SagaPhase::AwaitingPayment,
    })
}

/// `Saved → Paid`, driven by the payment-confirmation signal, then runs
/// finalization. Replayed confirmations re-enter finalization instead of
/// recording the payment twice.
pub fn confirm_payment<R, S, F, N>(
    repo: &R,
    store: &S,
    storage: &F,
    notifier: &N,
    reference: &Reference,
    transaction_id: &str,
) -> ServiceResult<FinalizeOutcome>
where
    R: SubmissionReader + SubmissionWriter + StatusEventWriter + DocumentReader + DocumentWriter + ?Sized,
    S: DraftStore + ?Sized,
    F: FileStorage + ?Sized,
    N: Notifier + ?Sized,
{
    let submission = repo
        .get_submission_by_reference(reference)?
        .ok_or(ServiceError::NotFound)?;

    match &submission.status {
        SubmissionStatus::Saved => {
            let paid = repo.record_payment(reference, transaction_id)?;
            repo.append_status_event(&NewStatusEvent {
                submission_id: paid.id,
                old_status: SubmissionStatus::Saved,
                new_status: SubmissionStatus::Paid,
                actor: ACTOR_SYSTEM.to_string(),
                notified: false,
                created_at: Utc::now().naive_utc(),
            })?;
            info!("submission {reference}: payment confirmed ({transaction_id})");
            finalize(repo, store, storage, notifier, reference)
        }
        SubmissionStatus::Paid => finalize(repo, store, storage, notifier, reference),
        SubmissionStatus::Completed => completed_outcome(repo, &submission),
        SubmissionStatus::Other(status) => Err(ServiceError::Conflict(format!(
            "submission {reference} is in status {status}"
        ))),
    }
}

/// `Paid → Finalizing → Completed`: best-effort document uploads, the
/// summary notification, the status transition and the draft cleanup.
///
/// Safe to invoke any number of times for the same reference: stored
/// documents are not uploaded twice and a completed record replays its
/// recorded outcome. Only the summary dispatch is a hard gate; upload
/// failures mark the record for follow-up instead of blocking completion.
pub fn finalize<R, S, F, N>(
    repo: &R,
    store: &S,
    storage: &F,
    notifier: &N,
    reference: &Reference,
) -> ServiceResult<FinalizeOutcome>
where
    R: SubmissionReader + SubmissionWriter + StatusEventWriter + DocumentReader + DocumentWriter + ?Sized,
    S: DraftStore + ?Sized,
    F: FileStorage + ?Sized,
    N: Notifier + ?Sized,
{
    let submission = repo
        .get_submission_by_reference(reference)?
        .ok_or(ServiceError::NotFound)?;

    match &submission.status {
        SubmissionStatus::Paid => {}
        SubmissionStatus::Completed => return completed_outcome(repo, &submission),
        SubmissionStatus::Saved => {
            return Err(ServiceError::Conflict(format!(
                "submission {reference} has no confirmed payment"
            )));
        }
        SubmissionStatus::Other(status) => {
            return Err(ServiceError::Conflict(format!(
                "submission {reference} is in status {status}"
            )));
        }
    }

    // Reconcile the buffered files with documents recorded by an earlier,
    // interrupted finalization attempt.
    let existing = repo.list_documents(submission.id)?;
    let mut draft = store.load_draft(&submission.draft_id);
    let mut files: Vec<UploadedFileRecord> =
        draft.as_ref().map(|d| d.files.clone()).unwrap_or_default();
    for file in &mut files {
        if file.remote_url.is_none()
            && let Some(doc) = existing
                .iter()
                .find(|doc| doc.category == file.category && doc.file_name == file.display_name)
        {
            file.remote_url = Some(doc.url.clone());
        }
    }

    let mut report = uploads::upload_documents(storage, reference, &files);

    // One bounded automatic retry for files that still have their bytes.
    if !report.failed.is_empty() {
        let retry_files: Vec<UploadedFileRecord> = files
            .iter()
            .filter(|f| {
                f.payload.is_some() && report.failed.iter().any(|fail| fail.local_id == f.local_id)
            })
            .cloned()
            .collect();
        if !retry_files.is_empty() {
            let retry = uploads::upload_documents(storage, reference, &retry_files);
            for stored in &retry.succeeded {
                report.failed.retain(|f| f.local_id != stored.local_id);
            }
            report.succeeded.extend(retry.succeeded);
        }
    }

    for stored in &report.succeeded {
        if existing.iter().any(|doc| doc.url == stored.url) {
            continue;
        }
        let record = NewSubmissionDocument {
            submission_id: submission.id,
            category: stored.category,
            file_name: stored.file_name.clone(),
            url: stored.url.clone(),
            created_at: Utc::now().naive_utc(),
        };
        if let Err(e) = repo.add_document(&record) {
            // The file sits in storage tagged with the reference; losing the
            // row is recoverable by an operator.
            warn!("submission {reference}: recording document {} failed: {e}", stored.url);
        }
    }

    // Remember remote URLs so a later retry skips finished uploads even if
    // the document rows were lost.
    if let Some(draft) = draft.as_mut() {
        for file in draft.files.iter_mut() {
            if let Some(stored) = report.succeeded.iter().find(|s| s.local_id == file.local_id) {
                file.remote_url = Some(stored.url.clone());
                file.payload = None;
            }
        }
        draft.touch();
        store.save_draft(draft);
    }

    let followup_required = !report.failed.is_empty();
    if followup_required {
        let names: Vec<&str> = report.failed.iter().map(|f| f.file_name.as_str()).collect();
        warn!(
            "submission {reference}: {} upload(s) need manual follow-up: {}",
            report.failed.len(),
            names.join(", ")
        );
        repo.set_followup_required(reference)
            .map_err(|e| ServiceError::Finalization(e.to_string()))?;
    }

    // The summary is the one hard finalization gate: while it cannot be
    // dispatched the record stays `Paid` and the call remains retryable.
    notifier
        .send_summary(reference)
        .map_err(|e| ServiceError::Finalization(e.to_string()))?;

    repo.update_submission_status(reference, &SubmissionStatus::Completed)?;
    repo.append_status_event(&NewStatusEvent {
        submission_id: submission.id,
        old_status: SubmissionStatus::Paid,
        new_status: SubmissionStatus::Completed,
        actor: ACTOR_SYSTEM.to_string(),
        notified: true,
        created_at: Utc::now().naive_utc(),
    })?;

    if submission.options.delivery == DeliveryMethod::Postal {
        // The record completes now; the paper trail tracks the postal batch.
        repo.append_status_event(&NewStatusEvent {
            submission_id: submission.id,
            old_status: SubmissionStatus::Completed,
            new_status: SubmissionStatus::Other("Awaiting postal documents".to_string()),
            actor: ACTOR_SYSTEM.to_string(),
            notified: false,
            created_at: Utc::now().naive_utc(),
        })?;
    }

    store.clear_draft(&submission.draft_id);
    info!("submission {reference}: completed");

    Ok(FinalizeOutcome {
        reference: submission.reference.clone(),
        total_cents: submission.total_cents,
        currency: submission.currency.clone(),
        documents: repo.list_documents(submission.id)?,
        failed_files: report
            .failed
            .iter()
            .map(|f| f.file_name.to_string())
            .collect(),
        followup_required,
        phase: SagaPhase::Completed,
    })
}

fn completed_outcome<R>(repo: &R, submission: &Submission) -> ServiceResult<FinalizeOutcome>
where
    R: DocumentReader + ?Sized,
{
    Ok(FinalizeOutcome {
        reference: submission.reference.clone(),
        total_cents: submission.total_cents,
        currency: submission.currency.clone(),
        documents: repo.list_documents(submission.id)?,
        failed_files: Vec::new(),
        followup_required: submission.followup_required,
        phase: SagaPhase::Completed,
    })
}

/// Re-derives the saga phase from the durable stores after a reload.
///
/// There is no lock to reconcile with a racing payment confirmation; the
/// durable record decides. A confirmed payment whose finalization never
/// completed is re-attempted here with the same reference.
pub fn resume<R, S, F, N>(
    repo: &R,
    store: &S,
    storage: &F,
    notifier: &N,
    draft_id: &DraftId,
) -> ServiceResult<ResumedSession>
where
    R: SubmissionReader + SubmissionWriter + StatusEventWriter + DocumentReader + DocumentWriter + ?Sized,
    S: DraftStore + ?Sized,
    F: FileStorage + ?Sized,
    N: Notifier + ?Sized,
{
    let Some(draft) = store.load_draft(draft_id) else {
        // The draft is cleared on completion; the submission may outlive it.
        return match repo.get_submission_by_draft(draft_id)? {
            Some(submission) => match submission.status {
                SubmissionStatus::Saved => Ok(ResumedSession {
                    phase: SagaPhase::Saved,
                    overview: None,
                    outcome: None,
                }),
                SubmissionStatus::Paid => {
                    finalize(repo, store, storage, notifier, &submission.reference).map(|outcome| {
                        ResumedSession {
                            phase: outcome.phase.clone(),
                            overview: None,
                            outcome: Some(outcome),
                        }
                    })
                }
                _ => completed_outcome(repo, &submission).map(|outcome| ResumedSession {
                    phase: SagaPhase::Completed,
                    overview: None,
                    outcome: Some(outcome),
                }),
            },
            None => Err(ServiceError::NotFound),
        };
    };

    let Some(reference) = draft.reference.clone() else {
        return Ok(ResumedSession {
            phase: SagaPhase::Draft,
            overview: Some(intake::load_draft(store, draft_id)?),
            outcome: None,
        });
    };

    let submission = repo
        .get_submission_by_reference(&reference)?
        .ok_or_else(|| {
            ServiceError::Unexpected(format!(
                "draft {draft_id} references missing submission {reference}"
            ))
        })?;

    match submission.status {
        // Saved with no observed confirmation: re-show the payment step.
        SubmissionStatus::Saved => Ok(ResumedSession {
            phase: SagaPhase::Saved,
            overview: Some(intake::load_draft(store, draft_id)?),
            outcome: None,
        }),
        SubmissionStatus::Paid => {
            match finalize(repo, store, storage, notifier, &reference) {
                Ok(outcome) => Ok(ResumedSession {
                    phase: outcome.phase.clone(),
                    overview: None,
                    outcome: Some(outcome),
                }),
                Err(e) => {
                    warn!("submission {reference}: finalization on resume failed: {e}");
                    Ok(ResumedSession {
                        phase: SagaPhase::Failed(e.to_string()),
                        overview: Some(intake::load_draft(store, draft_id)?),
                        outcome: None,
                    })
                }
            }
        }
        SubmissionStatus::Completed | SubmissionStatus::Other(_) => {
            store.clear_draft(draft_id);
            completed_outcome(repo, &submission).map(|outcome| ResumedSession {
                phase: SagaPhase::Completed,
                overview: None,
                outcome: Some(outcome),
            })
        }
    }
}
