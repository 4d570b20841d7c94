use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::DbConnection;
use crate::domain::submission::{NewSubmission, Submission, SubmissionStatus};
use crate::domain::types::{DraftId, Reference};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, SubmissionListQuery, SubmissionReader, SubmissionWriter};

/// Attempts at allocating a collision-free reference before giving up.
const REFERENCE_ATTEMPTS: usize = 5;

fn find_by_draft(
    conn: &mut DbConnection,
    draft_id: &DraftId,
) -> RepositoryResult<Option<Submission>> {
    use crate::models::submission::Submission as DbSubmission;
    use crate::schema::submissions;

    let row = submissions::table
        .filter(submissions::draft_id.eq(draft_id.to_string()))
        .first::<DbSubmission>(conn)
        .optional()?;

    row.map(|r| Submission::try_from(r).map_err(RepositoryError::from))
        .transpose()
}

impl SubmissionReader for DieselRepository {
    fn get_submission_by_reference(
        &self,
        reference: &Reference,
    ) -> RepositoryResult<Option<Submission>> {
        use crate::models::submission::Submission as DbSubmission;
        use crate::schema::submissions;

        let mut conn = self.pool().get()?;
        let row = submissions::table
            .filter(submissions::reference.eq(reference.as_str()))
            .first::<DbSubmission>(&mut conn)
            .optional()?;

        row.map(|r| Submission::try_from(r).map_err(RepositoryError::from))
            .transpose()
    }

    fn get_submission_by_draft(&self, draft_id: &DraftId) -> RepositoryResult<Option<Submission>> {
        let mut conn = self.pool().get()?;
        find_by_draft(&mut conn, draft_id)
    }

    fn list_submissions(
        &self,
        query: SubmissionListQuery,
    ) -> RepositoryResult<(usize, Vec<Submission>)> {
        use crate::models::submission::Submission as DbSubmission;
        use crate::schema::submissions;

        let mut conn = self.pool().get()?;

        let mut total_query = submissions::table.into_boxed();
        let mut items_query = submissions::table.into_boxed();
        if let Some(status) = &query.status {
            total_query = total_query.filter(submissions::status.eq(status.to_string()));
            items_query = items_query.filter(submissions::status.eq(status.to_string()));
        }

        let total: i64 = total_query.count().get_result(&mut conn)?;

        items_query = items_query.order(submissions::id.desc());
        if let Some(pagination) = &query.pagination {
            let page = pagination.page.max(1) as i64;
            let per_page = pagination.per_page as i64;
            items_query = items_query
                .limit(per_page)
                .offset((page - 1) * per_page);
        }

        let items = items_query
            .load::<DbSubmission>(&mut conn)?
            .into_iter()
            .map(|r| Submission::try_from(r).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<Submission>>>()?;

        Ok((total as usize, items))
    }
}

impl SubmissionWriter for DieselRepository {
    fn create_submission(&self, new_submission: &NewSubmission) -> RepositoryResult<Submission> {
        use crate::models::submission::{NewSubmission as DbNewSubmission, Submission as DbSubmission};
        use crate::schema::submissions;

        let mut conn = self.pool().get()?;

        // Replayed request for an already-persisted draft: hand back the
        // existing record, never a duplicate.
        if let Some(existing) = find_by_draft(&mut conn, &new_submission.draft_id)? {
            return Ok(existing);
        }

        let profile = serde_json::to_string(&new_submission.profile)
            .map_err(|e| RepositoryError::ValidationError(format!("profile snapshot: {e}")))?;
        let options = serde_json::to_string(&new_submission.options)
            .map_err(|e| RepositoryError::ValidationError(format!("options snapshot: {e}")))?;

        for _ in 0..REFERENCE_ATTEMPTS {
            let reference = Reference::generate();
            let now = Utc::now().naive_utc();
            let row = DbNewSubmission {
                reference: reference.as_str(),
                draft_id: new_submission.draft_id.to_string(),
                profile: profile.clone(),
                options: options.clone(),
                total_cents: new_submission.total_cents,
                tax_cents: new_submission.tax_cents,
                currency: &new_submission.currency,
                status: SubmissionStatus::Saved.to_string(),
                created_at: now,
                updated_at: now,
            };

            match diesel::insert_into(submissions::table)
                .values(&row)
                .get_result::<DbSubmission>(&mut conn)
            {
                Ok(created) => return Submission::try_from(created).map_err(Into::into),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    // Either the draft raced a concurrent create or the
                    // generated reference collided; the former wins.
                    if let Some(existing) = find_by_draft(&mut conn, &new_submission.draft_id)? {
                        return Ok(existing);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RepositoryError::Unexpected(
            "could not allocate a unique submission reference".to_string(),
        ))
    }

    fn update_submission_status(
        &self,
        reference: &Reference,
        status: &SubmissionStatus,
    ) -> RepositoryResult<Submission> {
        use crate::models::submission::Submission as DbSubmission;
        use crate::schema::submissions;

        let mut conn = self.pool().get()?;
        let updated = diesel::update(
            submissions::table.filter(submissions::reference.eq(reference.as_str())),
        )
        .set((
            submissions::status.eq(status.to_string()),
            submissions::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbSubmission>(&mut conn)?;

        Submission::try_from(updated).map_err(Into::into)
    }

    fn record_payment(
        &self,
        reference: &Reference,
        transaction_id: &str,
    ) -> RepositoryResult<Submission> {
        use crate::models::submission::Submission as DbSubmission;
        use crate::schema::submissions;

        let mut conn = self.pool().get()?;
        let updated = diesel::update(
            submissions::table.filter(submissions::reference.eq(reference.as_str())),
        )
        .set((
            submissions::status.eq(SubmissionStatus::Paid.to_string()),
            submissions::transaction_id.eq(transaction_id),
            submissions::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbSubmission>(&mut conn)?;

        Submission::try_from(updated).map_err(Into::into)
    }

    fn set_followup_required(&self, reference: &Reference) -> RepositoryResult<()> {
        use crate::schema::submissions;

        let mut conn = self.pool().get()?;
        let affected = diesel::update(
            submissions::table.filter(submissions::reference.eq(reference.as_str())),
        )
        .set((
            submissions::followup_required.eq(true),
            submissions::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
