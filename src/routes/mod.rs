//! Thin HTTP handlers delegating to the service layer.

use actix_web::HttpResponse;
use log::error;
use serde::Serialize;

use crate::services::ServiceError;

pub mod admin;
pub mod intake;
pub mod payment;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps a service error onto the HTTP surface.
///
/// Validation → 400, NotFound → 404, Conflict → 409, Payment → 502;
/// everything else is a 500 with the detail kept out of the response.
pub(crate) fn error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::Validation(message) => HttpResponse::BadRequest().json(ErrorBody {
            error: message.clone(),
        }),
        ServiceError::NotFound => HttpResponse::NotFound().finish(),
        ServiceError::Conflict(message) => HttpResponse::Conflict().json(ErrorBody {
            error: message.clone(),
        }),
        ServiceError::Payment(message) => {
            error!("payment boundary failure: {message}");
            HttpResponse::BadGateway().json(ErrorBody {
                error: "the payment session could not be created".to_string(),
            })
        }
        other => {
            error!("request failed: {other}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub(crate) fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody {
        error: message.into(),
    })
}
