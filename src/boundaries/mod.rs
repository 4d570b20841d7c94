//! Seams to the external collaborators of the intake flow.
//!
//! The core only decides *when* to call the payment, storage and
//! notification providers; each provider sits behind a trait so the services
//! stay testable and the concrete integrations replaceable.

use thiserror::Error;

use crate::domain::requirements::DocumentCategory;
use crate::domain::submission::SubmissionStatus;
use crate::domain::types::{ContactEmail, Reference};

pub mod notify;
pub mod payment;
pub mod storage;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("payment boundary error: {0}")]
    Payment(String),

    #[error("storage boundary error: {0}")]
    Storage(String),

    #[error("notification boundary error: {0}")]
    Notification(String),
}

pub type BoundaryResult<T> = Result<T, BoundaryError>;

/// Data handed to the payment provider to open a payment session. Nothing
/// else crosses the boundary.
#[derive(Debug, Clone)]
pub struct PaymentRequest<'a> {
    pub reference: &'a Reference,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub customer_contact: Option<&'a ContactEmail>,
}

/// A payment session the user is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub url: String,
}

pub trait PaymentGateway {
    fn create_payment_session(&self, request: &PaymentRequest) -> BoundaryResult<PaymentSession>;
}

pub trait FileStorage {
    /// Stores the bytes under the submission reference and category, returning
    /// the public URL of the stored object.
    fn put_file(
        &self,
        reference: &Reference,
        category: DocumentCategory,
        bytes: &[u8],
        filename: &str,
    ) -> BoundaryResult<String>;
}

pub trait Notifier {
    fn send_summary(&self, reference: &Reference) -> BoundaryResult<()>;
    fn send_status_change(
        &self,
        reference: &Reference,
        old_status: &SubmissionStatus,
        new_status: &SubmissionStatus,
    ) -> BoundaryResult<()>;
}
