use diesel::prelude::*;

use crate::domain::status_event::{NewStatusEvent, StatusEvent};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, StatusEventReader, StatusEventWriter};

impl StatusEventReader for DieselRepository {
    fn list_status_events(&self, submission_id: i32) -> RepositoryResult<Vec<StatusEvent>> {
        use crate::models::status_event::StatusEvent as DbStatusEvent;
        use crate::schema::status_events;

        let mut conn = self.pool().get()?;
        let events = status_events::table
            .filter(status_events::submission_id.eq(submission_id))
            .order(status_events::id.asc())
            .load::<DbStatusEvent>(&mut conn)?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(events)
    }
}

impl StatusEventWriter for DieselRepository {
    fn append_status_event(&self, event: &NewStatusEvent) -> RepositoryResult<StatusEvent> {
        use crate::models::status_event::{
            NewStatusEvent as DbNewStatusEvent, StatusEvent as DbStatusEvent,
        };
        use crate::schema::status_events;

        let mut conn = self.pool().get()?;
        let row: DbNewStatusEvent = event.into();
        let created = diesel::insert_into(status_events::table)
            .values(&row)
            .get_result::<DbStatusEvent>(&mut conn)?;

        Ok(created.into())
    }
}
