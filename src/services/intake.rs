//! Wizard use cases: draft lifecycle, step gating, file buffering and the
//! recomputation of derived state after every mutation.

use uuid::Uuid;

use crate::domain::draft::{DraftState, FormStep, UploadedFileRecord};
use crate::domain::pricing::{self, Quote};
use crate::domain::profile::{ClientCategory, DeliveryMethod, ProfileUpdate, ServiceOptions};
use crate::domain::requirements::{self, DocumentCategory, DocumentRequirement};
use crate::domain::types::{DraftId, FileName};
use crate::repository::DraftStore;
use crate::services::{ServiceError, ServiceResult};

/// A draft together with its derived state, recomputed on every read.
#[derive(Debug, Clone)]
pub struct DraftOverview {
    pub draft: DraftState,
    pub requirements: Vec<DocumentRequirement>,
    pub missing_required: Vec<DocumentCategory>,
    pub quote: Quote,
}

impl DraftOverview {
    fn project(draft: DraftState) -> Self {
        let requirements = requirements::derive(&draft.profile);
        let missing_required =
            requirements::missing_required(&requirements, &draft.covered_categories());
        let quote = pricing::quote(&draft.profile, &draft.options);
        Self {
            draft,
            requirements,
            missing_required,
            quote,
        }
    }
}

fn load(store: &(impl DraftStore + ?Sized), draft_id: &DraftId) -> ServiceResult<DraftState> {
    store.load_draft(draft_id).ok_or(ServiceError::NotFound)
}

fn save(store: &(impl DraftStore + ?Sized), mut draft: DraftState) -> DraftOverview {
    draft.touch();
    store.save_draft(&draft);
    DraftOverview::project(draft)
}

/// Draft mutations stop once a submission exists; from there the saga owns
/// the record and the snapshot must stay what was priced and persisted.
fn ensure_mutable(draft: &DraftState) -> ServiceResult<()> {
    if draft.reference.is_some() {
        return Err(ServiceError::Conflict(
            "the submission was already created; the draft can no longer change".to_string(),
        ));
    }
    Ok(())
}

/// Starts a fresh draft and persists its initial state.
pub fn start_draft<S>(store: &S) -> DraftOverview
where
    S: DraftStore + ?Sized,
{
    save(store, DraftState::new(DraftId::new()))
}

/// Reloads a draft with its derived state.
pub fn load_draft<S>(store: &S, draft_id: &DraftId) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    Ok(DraftOverview::project(load(store, draft_id)?))
}

/// Applies one profile update command and persists the successor profile.
pub fn apply_update<S>(
    store: &S,
    draft_id: &DraftId,
    update: ProfileUpdate,
) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    let mut draft = load(store, draft_id)?;
    ensure_mutable(&draft)?;
    draft.profile = draft.profile.apply(update);
    Ok(save(store, draft))
}

/// Replaces the delivery/service preferences.
pub fn update_options<S>(
    store: &S,
    draft_id: &DraftId,
    options: ServiceOptions,
) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    let mut draft = load(store, draft_id)?;
    ensure_mutable(&draft)?;
    draft.options = options;
    Ok(save(store, draft))
}

/// Validates that the given step may be left in the draft's current state.
///
/// Total over all steps so resume logic can re-check a stored pointer.
pub fn advancement_gate(draft: &DraftState, step: FormStep) -> ServiceResult<()> {
    match step {
        FormStep::Situation => {
            let profile = &draft.profile;
            if profile.canton.is_none() {
                return Err(ServiceError::Validation("canton is required".to_string()));
            }
            if profile.employment.is_none() {
                return Err(ServiceError::Validation(
                    "employment status is required".to_string(),
                ));
            }
            if profile.category == ClientCategory::Couple && profile.partner_employment.is_none() {
                return Err(ServiceError::Validation(
                    "employment status of the second adult is required".to_string(),
                ));
            }
            let missing = profile.adults_missing_workplace();
            if let Some(adult) = missing.first() {
                return Err(ServiceError::Validation(format!(
                    "adult {} must declare at least one workplace",
                    adult.ordinal()
                )));
            }
            Ok(())
        }
        FormStep::Financials | FormStep::Property => Ok(()),
        FormStep::Documents => {
            // Postal delivery hands the documents in physically; the
            // electronic upload gate is waived.
            if draft.options.delivery == DeliveryMethod::Postal {
                return Ok(());
            }
            let requirements = requirements::derive(&draft.profile);
            let missing =
                requirements::missing_required(&requirements, &draft.covered_categories());
            if missing.is_empty() {
                Ok(())
            } else {
                let keys: Vec<&str> = missing.iter().map(|c| c.key()).collect();
                Err(ServiceError::Validation(format!(
                    "required documents missing: {}",
                    keys.join(", ")
                )))
            }
        }
        FormStep::Options => {
            if draft.certified {
                Ok(())
            } else {
                Err(ServiceError::Validation(
                    "the certification checkbox must be confirmed".to_string(),
                ))
            }
        }
        FormStep::Payment | FormStep::Completed => Err(ServiceError::Validation(
            "the payment step is left through the submission flow".to_string(),
        )),
    }
}

/// Moves the step pointer. Backward moves are free; a forward move goes one
/// step at a time and only once the gate of the current step passes.
pub fn set_step<S>(store: &S, draft_id: &DraftId, target: FormStep) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    let mut draft = load(store, draft_id)?;
    if target > draft.current_step {
        if Some(target) != draft.current_step.next() {
            return Err(ServiceError::Validation(format!(
                "cannot jump from step {} to {target}",
                draft.current_step
            )));
        }
        advancement_gate(&draft, draft.current_step)?;
    }
    draft.current_step = target;
    Ok(save(store, draft))
}

/// Buffers a file in memory and records its metadata on the draft.
pub fn attach_file<S>(
    store: &S,
    draft_id: &DraftId,
    display_name: FileName,
    category: DocumentCategory,
    payload: Vec<u8>,
) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    if payload.is_empty() {
        return Err(ServiceError::Validation("the file is empty".to_string()));
    }
    let mut draft = load(store, draft_id)?;
    draft
        .files
        .push(UploadedFileRecord::buffered(display_name, category, payload));
    Ok(save(store, draft))
}

/// Re-buffers the payload of a file that lost its bytes across a reload.
pub fn reattach_file<S>(
    store: &S,
    draft_id: &DraftId,
    local_id: &Uuid,
    payload: Vec<u8>,
) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    if payload.is_empty() {
        return Err(ServiceError::Validation("the file is empty".to_string()));
    }
    let mut draft = load(store, draft_id)?;
    let file = draft
        .files
        .iter_mut()
        .find(|f| f.local_id == *local_id)
        .ok_or(ServiceError::NotFound)?;
    if file.is_stored() {
        return Err(ServiceError::Conflict(
            "the file is already stored".to_string(),
        ));
    }
    file.size_bytes = payload.len() as u64;
    file.payload = Some(payload);
    Ok(save(store, draft))
}

/// Detaches a buffered file.
pub fn remove_file<S>(store: &S, draft_id: &DraftId, local_id: &Uuid) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    let mut draft = load(store, draft_id)?;
    let before = draft.files.len();
    draft.files.retain(|f| f.local_id != *local_id);
    if draft.files.len() == before {
        return Err(ServiceError::NotFound);
    }
    Ok(save(store, draft))
}

/// Remembers which document category the user is currently working on.
pub fn set_active_category<S>(
    store: &S,
    draft_id: &DraftId,
    category: Option<DocumentCategory>,
) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    let mut draft = load(store, draft_id)?;
    draft.active_category = category;
    Ok(save(store, draft))
}

/// Records the certification checkbox.
pub fn certify<S>(store: &S, draft_id: &DraftId, certified: bool) -> ServiceResult<DraftOverview>
where
    S: DraftStore + ?Sized,
{
    let mut draft = load(store, draft_id)?;
    ensure_mutable(&draft)?;
    draft.certified = certified;
    Ok(save(store, draft))
}
