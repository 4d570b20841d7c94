use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::profile::{Profile, ServiceOptions};
use crate::domain::submission::{Submission as DomainSubmission, SubmissionStatus};
use crate::domain::types::{DraftId, Reference, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::submissions)]
/// Diesel model for [`crate::domain::submission::Submission`]. Profile and
/// options snapshots are stored as JSON text.
pub struct Submission {
    pub id: i32,
    pub reference: String,
    pub draft_id: String,
    pub profile: String,
    pub options: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub followup_required: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::submissions)]
/// Insertable form of [`Submission`].
pub struct NewSubmission<'a> {
    pub reference: &'a str,
    pub draft_id: String,
    pub profile: String,
    pub options: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: &'a str,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Submission> for DomainSubmission {
    type Error = TypeConstraintError;

    fn try_from(row: Submission) -> Result<Self, Self::Error> {
        let profile: Profile = serde_json::from_str(&row.profile)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("profile snapshot: {e}")))?;
        let options: ServiceOptions = serde_json::from_str(&row.options)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("options snapshot: {e}")))?;

        Ok(Self {
            id: row.id,
            reference: Reference::new(row.reference)?,
            draft_id: row.draft_id.parse::<DraftId>()?,
            profile,
            options,
            total_cents: row.total_cents,
            tax_cents: row.tax_cents,
            currency: row.currency,
            status: SubmissionStatus::from(row.status),
            transaction_id: row.transaction_id,
            followup_required: row.followup_required,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn row_converts_into_domain_submission() {
        let now = Utc::now().naive_utc();
        let row = Submission {
            id: 7,
            reference: "TX-ABCDEFGH".to_string(),
            draft_id: DraftId::new().to_string(),
            profile: serde_json::to_string(&Profile::default()).unwrap(),
            options: serde_json::to_string(&ServiceOptions::default()).unwrap(),
            total_cents: 9_000,
            tax_cents: 674,
            currency: "CHF".to_string(),
            status: "Saved".to_string(),
            transaction_id: None,
            followup_required: false,
            created_at: now,
            updated_at: now,
        };

        let domain = DomainSubmission::try_from(row).unwrap();
        assert_eq!(domain.reference.as_str(), "TX-ABCDEFGH");
        assert_eq!(domain.status, SubmissionStatus::Saved);
        assert_eq!(domain.total_cents, 9_000);
    }

    #[test]
    fn corrupt_snapshot_is_rejected() {
        let now = Utc::now().naive_utc();
        let row = Submission {
            id: 7,
            reference: "TX-ABCDEFGH".to_string(),
            draft_id: DraftId::new().to_string(),
            profile: "{not json".to_string(),
            options: serde_json::to_string(&ServiceOptions::default()).unwrap(),
            total_cents: 9_000,
            tax_cents: 674,
            currency: "CHF".to_string(),
            status: "Saved".to_string(),
            transaction_id: None,
            followup_required: false,
            created_at: now,
            updated_at: now,
        };
        assert!(DomainSubmission::try_from(row).is_err());
    }
}
