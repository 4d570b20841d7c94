use diesel::prelude::*;

use crate::domain::document::{NewSubmissionDocument, SubmissionDocument};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, DocumentReader, DocumentWriter};

impl DocumentReader for DieselRepository {
    fn list_documents(&self, submission_id: i32) -> RepositoryResult<Vec<SubmissionDocument>> {
        use crate::models::document::Document as DbDocument;
        use crate::schema::documents;

        let mut conn = self.pool().get()?;
        documents::table
            .filter(documents::submission_id.eq(submission_id))
            .order(documents::id.asc())
            .load::<DbDocument>(&mut conn)?
            .into_iter()
            .map(|r| SubmissionDocument::try_from(r).map_err(RepositoryError::from))
            .collect()
    }
}

impl DocumentWriter for DieselRepository {
    fn add_document(
        &self,
        document: &NewSubmissionDocument,
    ) -> RepositoryResult<SubmissionDocument> {
        use crate::models::document::{Document as DbDocument, NewDocument as DbNewDocument};
        use crate::schema::documents;

        let mut conn = self.pool().get()?;
        let row: DbNewDocument = document.into();
        let created = diesel::insert_into(documents::table)
            .values(&row)
            .get_result::<DbDocument>(&mut conn)?;

        SubmissionDocument::try_from(created).map_err(Into::into)
    }
}
