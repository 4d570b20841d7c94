use actix_web::{HttpResponse, Responder, get, post, web};
use validator::Validate;

use crate::boundaries::notify::LogNotifier;
use crate::domain::submission::SubmissionStatus;
use crate::domain::types::Reference;
use crate::dto::submission::{
    StatusUpdateResponse, SubmissionDetailResponse, SubmissionResponse,
};
use crate::forms::admin::{ListSubmissionsParams, UpdateStatusForm};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{DieselRepository, SubmissionListQuery};
use crate::routes::{bad_request, error_response};
use crate::services::admin;

#[get("/submissions")]
pub async fn list_submissions(
    params: web::Query<ListSubmissionsParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE).clamp(1, 100);

    let mut query = SubmissionListQuery::new().paginate(page, per_page);
    if let Some(status) = &params.status {
        query = query.status(SubmissionStatus::from(status.as_str()));
    }

    match admin::list_submissions(repo.get_ref(), query) {
        Ok((total, submissions)) => {
            let items: Vec<SubmissionResponse> = submissions.iter().map(Into::into).collect();
            HttpResponse::Ok().json(Paginated::new(items, page, per_page, total))
        }
        Err(e) => error_response(&e),
    }
}

#[get("/submissions/{reference}")]
pub async fn show_submission(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let reference = match Reference::new(path.as_str()) {
        Ok(reference) => reference,
        Err(_) => return bad_request("invalid submission reference"),
    };

    match admin::get_submission(repo.get_ref(), &reference) {
        Ok(detail) => HttpResponse::Ok().json(SubmissionDetailResponse::from(detail)),
        Err(e) => error_response(&e),
    }
}

#[post("/submissions/{reference}/status")]
pub async fn update_status(
    path: web::Path<String>,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<LogNotifier>,
    web::Json(form): web::Json<UpdateStatusForm>,
) -> impl Responder {
    if let Err(e) = form.validate() {
        return bad_request(e.to_string());
    }
    let reference = match Reference::new(path.as_str()) {
        Ok(reference) => reference,
        Err(_) => return bad_request("invalid submission reference"),
    };

    match admin::update_request_status(
        repo.get_ref(),
        notifier.get_ref(),
        &reference,
        SubmissionStatus::from(form.new_status.as_str()),
        SubmissionStatus::from(form.expected_old.as_str()),
        &form.actor,
        form.notify,
    ) {
        Ok(outcome) => HttpResponse::Ok().json(StatusUpdateResponse::from(outcome)),
        Err(e) => error_response(&e),
    }
}
