use actix_web::{HttpResponse, Responder, post, web};
use validator::Validate;

use crate::boundaries::notify::LogNotifier;
use crate::boundaries::storage::LocalFileStorage;
use crate::domain::types::Reference;
use crate::dto::submission::CompletionResponse;
use crate::forms::payment::ConfirmPaymentForm;
use crate::repository::DieselRepository;
use crate::repository::draft::DieselDraftStore;
use crate::routes::{bad_request, error_response};
use crate::services::orchestrator;

/// The asynchronous payment-confirmation signal from the payment provider.
#[post("/payments/confirm")]
pub async fn confirm_payment(
    repo: web::Data<DieselRepository>,
    store: web::Data<DieselDraftStore>,
    storage: web::Data<LocalFileStorage>,
    notifier: web::Data<LogNotifier>,
    web::Json(form): web::Json<ConfirmPaymentForm>,
) -> impl Responder {
    if let Err(e) = form.validate() {
        return bad_request(e.to_string());
    }
    let reference = match Reference::new(form.reference.as_str()) {
        Ok(reference) => reference,
        Err(_) => return bad_request("invalid submission reference"),
    };

    match orchestrator::confirm_payment(
        repo.get_ref(),
        store.get_ref(),
        storage.get_ref(),
        notifier.get_ref(),
        &reference,
        &form.transaction_id,
    ) {
        Ok(outcome) => HttpResponse::Ok().json(CompletionResponse::from(outcome)),
        Err(e) => error_response(&e),
    }
}
