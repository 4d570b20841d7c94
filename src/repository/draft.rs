use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use diesel::prelude::*;
use log::{error, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::draft::DraftState;
use crate::domain::types::DraftId;
use crate::repository::DraftStore;
use crate::repository::errors::{RepositoryError, RepositoryResult};

/// Durable draft store backed by the `drafts` table.
///
/// Two in-memory layers sit beside the durable row:
///
/// * Raw file payloads never serialize into the row; they live in a
///   process-local cache keyed by draft and file id. Within a running
///   process a loaded draft gets its bytes back; after a restart the cache
///   is gone and the affected files report `needs_reattachment`. The durable
///   draft describes what was attached but can never resurrect the bytes.
/// * Storage failures degrade to a per-process fallback map: the caller
///   never sees an error, the draft simply loses durability until the
///   database is reachable again.
pub struct DieselDraftStore {
    pool: DbPool,
    payloads: Mutex<HashMap<DraftId, HashMap<Uuid, Vec<u8>>>>,
    fallback: Mutex<HashMap<DraftId, DraftState>>,
}

impl DieselDraftStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            payloads: Mutex::new(HashMap::new()),
            fallback: Mutex::new(HashMap::new()),
        }
    }

    fn save_durable(&self, draft: &DraftState) -> RepositoryResult<()> {
        use crate::models::draft::Draft as DbDraft;
        use crate::schema::drafts;

        let payload = serde_json::to_string(draft)
            .map_err(|e| RepositoryError::ValidationError(format!("draft payload: {e}")))?;
        let row = DbDraft {
            id: draft.draft_id.to_string(),
            payload,
            saved_at: Utc::now().naive_utc(),
        };

        let mut conn = self.pool.get()?;
        diesel::insert_into(drafts::table)
            .values(&row)
            .on_conflict(drafts::id)
            .do_update()
            .set((
                drafts::payload.eq(&row.payload),
                drafts::saved_at.eq(row.saved_at),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn load_durable(&self, draft_id: &DraftId) -> RepositoryResult<Option<DraftState>> {
        use crate::models::draft::Draft as DbDraft;
        use crate::schema::drafts;

        let mut conn = self.pool.get()?;
        let row = drafts::table
            .find(draft_id.to_string())
            .first::<DbDraft>(&mut conn)
            .optional()?;

        row.map(|r| {
            serde_json::from_str(&r.payload)
                .map_err(|e| RepositoryError::ValidationError(format!("draft payload: {e}")))
        })
        .transpose()
    }

    fn clear_durable(&self, draft_id: &DraftId) -> RepositoryResult<()> {
        use crate::schema::drafts;

        let mut conn = self.pool.get()?;
        diesel::delete(drafts::table.find(draft_id.to_string())).execute(&mut conn)?;
        Ok(())
    }

    /// Rebuilds the payload cache entry from the files currently on the
    /// draft. Bytes of detached or already stored files are released.
    fn cache_payloads(&self, draft: &DraftState) {
        let mut payloads = self.payloads.lock().unwrap();
        let previous = payloads.remove(&draft.draft_id).unwrap_or_default();
        let mut fresh = HashMap::new();
        for file in &draft.files {
            if file.remote_url.is_some() {
                continue;
            }
            if let Some(bytes) = &file.payload {
                fresh.insert(file.local_id, bytes.clone());
            } else if let Some(bytes) = previous.get(&file.local_id) {
                fresh.insert(file.local_id, bytes.clone());
            }
        }
        if !fresh.is_empty() {
            payloads.insert(draft.draft_id, fresh);
        }
    }

    /// Puts cached bytes back onto a loaded draft.
    fn restore_payloads(&self, draft: &mut DraftState) {
        let payloads = self.payloads.lock().unwrap();
        let Some(cached) = payloads.get(&draft.draft_id) else {
            return;
        };
        for file in draft.files.iter_mut() {
            if file.payload.is_none()
                && file.remote_url.is_none()
                && let Some(bytes) = cached.get(&file.local_id)
            {
                file.payload = Some(bytes.clone());
            }
        }
    }
}

impl DraftStore for DieselDraftStore {
    fn save_draft(&self, draft: &DraftState) {
        self.cache_payloads(draft);
        match self.save_durable(draft) {
            Ok(()) => {
                // The durable row is now authoritative.
                self.fallback.lock().unwrap().remove(&draft.draft_id);
            }
            Err(e) => {
                warn!(
                    "draft {}: durable save failed, keeping in memory: {e}",
                    draft.draft_id
                );
                self.fallback
                    .lock()
                    .unwrap()
                    .insert(draft.draft_id, draft.clone());
            }
        }
    }

    fn load_draft(&self, draft_id: &DraftId) -> Option<DraftState> {
        let mut draft = match self.load_durable(draft_id) {
            Ok(Some(draft)) => Some(draft),
            Ok(None) => None,
            Err(e) => {
                error!("draft {draft_id}: durable load failed: {e}");
                None
            }
        }
        .or_else(|| self.fallback.lock().unwrap().get(draft_id).cloned())?;

        self.restore_payloads(&mut draft);
        Some(draft)
    }

    fn clear_draft(&self, draft_id: &DraftId) {
        if let Err(e) = self.clear_durable(draft_id) {
            error!("draft {draft_id}: durable clear failed: {e}");
        }
        self.payloads.lock().unwrap().remove(draft_id);
        self.fallback.lock().unwrap().remove(draft_id);
    }
}
