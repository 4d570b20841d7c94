use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::document::{
    NewSubmissionDocument as DomainNewDocument, SubmissionDocument as DomainDocument,
};
use crate::domain::requirements::DocumentCategory;
use crate::domain::types::{FileName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::documents)]
/// Diesel model for [`crate::domain::document::SubmissionDocument`].
pub struct Document {
    pub id: i32,
    pub submission_id: i32,
    pub category: String,
    pub file_name: String,
    pub url: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::documents)]
/// Insertable form of [`Document`].
pub struct NewDocument {
    pub submission_id: i32,
    pub category: String,
    pub file_name: String,
    pub url: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Document> for DomainDocument {
    type Error = TypeConstraintError;

    fn try_from(row: Document) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            submission_id: row.submission_id,
            category: row.category.parse::<DocumentCategory>()?,
            file_name: FileName::new(row.file_name)?,
            url: row.url,
            created_at: row.created_at,
        })
    }
}

impl From<&DomainNewDocument> for NewDocument {
    fn from(document: &DomainNewDocument) -> Self {
        Self {
            submission_id: document.submission_id,
            category: document.category.key().to_string(),
            file_name: document.file_name.as_str().to_string(),
            url: document.url.clone(),
            created_at: document.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn category_key_survives_the_db_round_trip() {
        let row = Document {
            id: 1,
            submission_id: 2,
            category: "pillar3a".to_string(),
            file_name: "certificate.pdf".to_string(),
            url: "https://files.example.com/TX-ABCDEFGH/pillar3a/certificate.pdf".to_string(),
            created_at: Utc::now().naive_utc(),
        };
        let domain = DomainDocument::try_from(row).unwrap();
        assert_eq!(domain.category, DocumentCategory::Pillar3a);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let row = Document {
            id: 1,
            submission_id: 2,
            category: "mystery".to_string(),
            file_name: "x.pdf".to_string(),
            url: "https://files.example.com/x.pdf".to_string(),
            created_at: Utc::now().naive_utc(),
        };
        assert!(DomainDocument::try_from(row).is_err());
    }
}
