use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::drafts)]
/// Durable draft row: one JSON payload per form instance.
pub struct Draft {
    pub id: String,
    pub payload: String,
    pub saved_at: NaiveDateTime,
}
