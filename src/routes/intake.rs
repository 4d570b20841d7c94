use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, delete, get, patch, post, web};
use log::error;
use uuid::Uuid;

use crate::boundaries::notify::LogNotifier;
use crate::boundaries::payment::LinkPaymentGateway;
use crate::boundaries::storage::LocalFileStorage;
use crate::domain::requirements::DocumentCategory;
use crate::domain::types::{DraftId, FileName};
use crate::dto::intake::{DraftResponse, ResumeResponse, SubmitResponse};
use crate::forms::FormError;
use crate::forms::intake::{
    ActiveCategoryForm, AttachDocumentForm, CertifyForm, DraftCommand, DraftUpdateForm,
    ReattachDocumentForm, StepForm,
};
use crate::repository::DieselRepository;
use crate::repository::draft::DieselDraftStore;
use crate::routes::{bad_request, error_response};
use crate::services::orchestrator::{self, SingleFlight};
use crate::services::{ServiceResult, intake};

fn parse_draft_id(raw: &str) -> Result<DraftId, HttpResponse> {
    raw.parse::<DraftId>()
        .map_err(|_| bad_request("invalid draft id"))
}

fn draft_response(result: ServiceResult<intake::DraftOverview>) -> HttpResponse {
    match result {
        Ok(overview) => HttpResponse::Ok().json(DraftResponse::from(overview)),
        Err(e) => error_response(&e),
    }
}

#[post("/drafts")]
pub async fn start_draft(store: web::Data<DieselDraftStore>) -> impl Responder {
    let overview = intake::start_draft(store.get_ref());
    HttpResponse::Created().json(DraftResponse::from(overview))
}

#[get("/drafts/{draft_id}")]
pub async fn resume_draft(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
    store: web::Data<DieselDraftStore>,
    storage: web::Data<LocalFileStorage>,
    notifier: web::Data<LogNotifier>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };

    match orchestrator::resume(
        repo.get_ref(),
        store.get_ref(),
        storage.get_ref(),
        notifier.get_ref(),
        &draft_id,
    ) {
        Ok(session) => HttpResponse::Ok().json(ResumeResponse::from(session)),
        Err(e) => error_response(&e),
    }
}

#[patch("/drafts/{draft_id}/profile")]
pub async fn update_draft(
    path: web::Path<String>,
    store: web::Data<DieselDraftStore>,
    web::Json(form): web::Json<DraftUpdateForm>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };

    let command = match form.into_command() {
        Ok(command) => command,
        Err(e) => return bad_request(e.to_string()),
    };

    match command {
        DraftCommand::Profile(update) => {
            draft_response(intake::apply_update(store.get_ref(), &draft_id, update))
        }
        DraftCommand::Options(options) => {
            draft_response(intake::update_options(store.get_ref(), &draft_id, options))
        }
    }
}

#[post("/drafts/{draft_id}/step")]
pub async fn set_step(
    path: web::Path<String>,
    store: web::Data<DieselDraftStore>,
    web::Json(form): web::Json<StepForm>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };
    draft_response(intake::set_step(store.get_ref(), &draft_id, form.step))
}

#[post("/drafts/{draft_id}/category")]
pub async fn set_active_category(
    path: web::Path<String>,
    store: web::Data<DieselDraftStore>,
    web::Json(form): web::Json<ActiveCategoryForm>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };
    draft_response(intake::set_active_category(
        store.get_ref(),
        &draft_id,
        form.category,
    ))
}

#[post("/drafts/{draft_id}/certify")]
pub async fn certify(
    path: web::Path<String>,
    store: web::Data<DieselDraftStore>,
    web::Json(form): web::Json<CertifyForm>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };
    draft_response(intake::certify(store.get_ref(), &draft_id, form.certified))
}

/// Reads the buffered multipart file into memory for the draft.
fn read_temp_file(file: &actix_multipart::form::tempfile::TempFile) -> Result<(FileName, Vec<u8>), FormError> {
    let name = file
        .file_name
        .as_deref()
        .ok_or(FormError::MissingFileName)?;
    let display_name = FileName::new(name)?;
    let payload = std::fs::read(file.file.path()).map_err(|e| {
        error!("reading uploaded file failed: {e}");
        FormError::MissingFileName
    })?;
    Ok((display_name, payload))
}

#[post("/drafts/{draft_id}/files")]
pub async fn attach_file(
    path: web::Path<String>,
    store: web::Data<DieselDraftStore>,
    MultipartForm(form): MultipartForm<AttachDocumentForm>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };

    let category = match form.category.parse::<DocumentCategory>() {
        Ok(category) => category,
        Err(_) => return bad_request("unknown document category"),
    };
    let (display_name, payload) = match read_temp_file(&form.file) {
        Ok(parts) => parts,
        Err(e) => return bad_request(e.to_string()),
    };

    draft_response(intake::attach_file(
        store.get_ref(),
        &draft_id,
        display_name,
        category,
        payload,
    ))
}

#[post("/drafts/{draft_id}/files/{local_id}")]
pub async fn reattach_file(
    path: web::Path<(String, Uuid)>,
    store: web::Data<DieselDraftStore>,
    MultipartForm(form): MultipartForm<ReattachDocumentForm>,
) -> impl Responder {
    let (draft_id, local_id) = path.into_inner();
    let draft_id = match parse_draft_id(&draft_id) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };

    let (_, payload) = match read_temp_file(&form.file) {
        Ok(parts) => parts,
        Err(e) => return bad_request(e.to_string()),
    };

    draft_response(intake::reattach_file(
        store.get_ref(),
        &draft_id,
        &local_id,
        payload,
    ))
}

#[delete("/drafts/{draft_id}/files/{local_id}")]
pub async fn remove_file(
    path: web::Path<(String, Uuid)>,
    store: web::Data<DieselDraftStore>,
) -> impl Responder {
    let (draft_id, local_id) = path.into_inner();
    let draft_id = match parse_draft_id(&draft_id) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };
    draft_response(intake::remove_file(store.get_ref(), &draft_id, &local_id))
}

#[post("/drafts/{draft_id}/submit")]
pub async fn submit(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
    store: web::Data<DieselDraftStore>,
    payments: web::Data<LinkPaymentGateway>,
    single_flight: web::Data<SingleFlight>,
) -> impl Responder {
    let draft_id = match parse_draft_id(&path) {
        Ok(draft_id) => draft_id,
        Err(response) => return response,
    };

    match orchestrator::submit(
        repo.get_ref(),
        store.get_ref(),
        payments.get_ref(),
        single_flight.get_ref(),
        &draft_id,
    ) {
        Ok(outcome) => HttpResponse::Ok().json(SubmitResponse::from(outcome)),
        Err(e) => error_response(&e),
    }
}
