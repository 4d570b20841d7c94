//! Append-only status history used for audit and user-facing tracking.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::submission::SubmissionStatus;

/// Actor recorded with a status change.
pub const ACTOR_SYSTEM: &str = "system";
pub const ACTOR_CUSTOMER: &str = "customer";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusEvent {
    pub id: i32,
    pub submission_id: i32,
    pub old_status: SubmissionStatus,
    pub new_status: SubmissionStatus,
    pub actor: String,
    /// Whether a status-change notification went out for this transition.
    pub notified: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewStatusEvent {
    pub submission_id: i32,
    pub old_status: SubmissionStatus,
    pub new_status: SubmissionStatus,
    pub actor: String,
    pub notified: bool,
    pub created_at: NaiveDateTime,
}
