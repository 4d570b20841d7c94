use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate)]
/// The asynchronous payment-confirmation signal.
///
/// Carries only the reference and the provider's opaque transaction id;
/// nothing else crosses the payment boundary into the core.
pub struct ConfirmPaymentForm {
    #[validate(length(min = 1))]
    pub reference: String,
    #[validate(length(min = 1, max = 120))]
    pub transaction_id: String,
}
