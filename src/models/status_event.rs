use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::status_event::{
    NewStatusEvent as DomainNewStatusEvent, StatusEvent as DomainStatusEvent,
};
use crate::domain::submission::SubmissionStatus;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::status_events)]
/// Diesel model for [`crate::domain::status_event::StatusEvent`].
pub struct StatusEvent {
    pub id: i32,
    pub submission_id: i32,
    pub old_status: String,
    pub new_status: String,
    pub actor: String,
    pub notified: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::status_events)]
/// Insertable form of [`StatusEvent`].
pub struct NewStatusEvent {
    pub submission_id: i32,
    pub old_status: String,
    pub new_status: String,
    pub actor: String,
    pub notified: bool,
    pub created_at: NaiveDateTime,
}

impl From<StatusEvent> for DomainStatusEvent {
    fn from(row: StatusEvent) -> Self {
        Self {
            id: row.id,
            submission_id: row.submission_id,
            old_status: SubmissionStatus::from(row.old_status),
            new_status: SubmissionStatus::from(row.new_status),
            actor: row.actor,
            notified: row.notified,
            created_at: row.created_at,
        }
    }
}

impl From<&DomainNewStatusEvent> for NewStatusEvent {
    fn from(event: &DomainNewStatusEvent) -> Self {
        Self {
            submission_id: event.submission_id,
            old_status: event.old_status.to_string(),
            new_status: event.new_status.to_string(),
            actor: event.actor.clone(),
            notified: event.notified,
            created_at: event.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn status_event_round_trips_between_model_and_domain() {
        let domain = DomainNewStatusEvent {
            submission_id: 3,
            old_status: SubmissionStatus::Saved,
            new_status: SubmissionStatus::Paid,
            actor: "system".to_string(),
            notified: true,
            created_at: Utc::now().naive_utc(),
        };
        let row: NewStatusEvent = (&domain).into();
        assert_eq!(row.old_status, "Saved");
        assert_eq!(row.new_status, "Paid");

        let stored = StatusEvent {
            id: 1,
            submission_id: row.submission_id,
            old_status: row.old_status,
            new_status: row.new_status,
            actor: row.actor,
            notified: row.notified,
            created_at: row.created_at,
        };
        let back: DomainStatusEvent = stored.into();
        assert_eq!(back.old_status, SubmissionStatus::Saved);
        assert_eq!(back.new_status, SubmissionStatus::Paid);
        assert!(back.notified);
    }
}
