//! Server-side submission record, created when a draft reaches the payment
//! step.
use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::profile::{Profile, ServiceOptions};
use crate::domain::types::{DraftId, Reference};

/// Persisted lifecycle status. `Saved → Paid → Completed` is driven by the
/// orchestrator; operators may set free-form follow-up statuses afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubmissionStatus {
    Saved,
    Paid,
    Completed,
    Other(String),
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Saved => write!(f, "Saved"),
            SubmissionStatus::Paid => write!(f, "Paid"),
            SubmissionStatus::Completed => write!(f, "Completed"),
            SubmissionStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for SubmissionStatus {
    fn from(s: &str) -> Self {
        match s {
            "Saved" => SubmissionStatus::Saved,
            "Paid" => SubmissionStatus::Paid,
            "Completed" => SubmissionStatus::Completed,
            _ => SubmissionStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for SubmissionStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: i32,
    pub reference: Reference,
    pub draft_id: DraftId,
    pub profile: Profile,
    pub options: ServiceOptions,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
    pub status: SubmissionStatus,
    pub transaction_id: Option<String>,
    /// Set when post-payment side effects exhausted their retries and a
    /// human operator must follow up.
    pub followup_required: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Payload for creating a submission. The reference is assigned by the
/// persistence layer; creation is idempotent per draft id.
#[derive(Clone, Debug, Deserialize)]
pub struct NewSubmission {
    pub draft_id: DraftId,
    pub profile: Profile,
    pub options: ServiceOptions,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
}
