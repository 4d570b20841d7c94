//! Hosted-payment-page integration.

use crate::boundaries::{BoundaryError, BoundaryResult, PaymentGateway, PaymentRequest, PaymentSession};

/// Builds redirect URLs for a hosted payment page.
///
/// The page reports the confirmation back through the
/// `/api/v1/payments/confirm` endpoint; this gateway only opens the session.
pub struct LinkPaymentGateway {
    base_url: String,
}

impl LinkPaymentGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl PaymentGateway for LinkPaymentGateway {
    fn create_payment_session(&self, request: &PaymentRequest) -> BoundaryResult<PaymentSession> {
        if self.base_url.is_empty() {
            return Err(BoundaryError::Payment(
                "payment page URL is not configured".to_string(),
            ));
        }

        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{}reference={}&amount={}&currency={}",
            self.base_url, separator, request.reference, request.amount_cents, request.currency
        );
        if let Some(contact) = request.customer_contact {
            url.push_str(&format!("&contact={contact}"));
        }

        Ok(PaymentSession { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ContactEmail, Reference};

    #[test]
    fn session_url_carries_reference_amount_and_currency() {
        let gateway = LinkPaymentGateway::new("https://pay.example.com/session");
        let reference = Reference::new("TX-ABCDEFGH").unwrap();
        let contact = ContactEmail::new("user@example.com").unwrap();
        let session = gateway
            .create_payment_session(&PaymentRequest {
                reference: &reference,
                amount_cents: 9_000,
                currency: "CHF",
                customer_contact: Some(&contact),
            })
            .unwrap();

        assert_eq!(
            session.url,
            "https://pay.example.com/session?reference=TX-ABCDEFGH&amount=9000&currency=CHF&contact=user@example.com"
        );
    }

    #[test]
    fn unconfigured_gateway_reports_a_payment_error() {
        let gateway = LinkPaymentGateway::new("");
        let reference = Reference::new("TX-ABCDEFGH").unwrap();
        let result = gateway.create_payment_session(&PaymentRequest {
            reference: &reference,
            amount_cents: 9_000,
            currency: "CHF",
            customer_contact: None,
        });
        assert!(matches!(result, Err(BoundaryError::Payment(_))));
    }
}
