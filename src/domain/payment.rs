use super::request::{PaymentRequest, PaymentRequestId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PaymentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// The bank's verdict. Both variants are successful executions of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Authorized,
    Declined,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Authorized => "Authorized",
            PaymentStatus::Declined => "Declined",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settled record of a processed [`PaymentRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    id: PaymentId,
    request: Arc<PaymentRequest>,
    status: PaymentStatus,
    authorization_code: Option<String>,
}

impl Payment {
    pub fn authorized(request: Arc<PaymentRequest>, authorization_code: String) -> Self {
        Self {
            id: PaymentId::new(),
            request,
            status: PaymentStatus::Authorized,
            authorization_code: Some(authorization_code),
        }
    }

    pub fn declined(request: Arc<PaymentRequest>) -> Self {
        Self {
            id: PaymentId::new(),
            request,
            status: PaymentStatus::Declined,
            authorization_code: None,
        }
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn request(&self) -> &PaymentRequest {
        &self.request
    }

    pub fn request_id(&self) -> PaymentRequestId {
        self.request.id()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn authorization_code(&self) -> Option<&str> {
        self.authorization_code.as_deref()
    }
}

/// Caller-facing view of a [`Payment`]. Carries only the last four card digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub status: PaymentStatus,
    pub card_number_last_four: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub currency: String,
    pub amount: i64,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        let request = payment.request();
        let card = request.credit_card();
        Self {
            id: payment.id().to_string(),
            status: payment.status(),
            card_number_last_four: card.last_four().to_string(),
            expiry_month: card.expiry_month(),
            expiry_year: card.expiry_year(),
            currency: request.amount().currency().code().to_string(),
            amount: request.amount().minor_units(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::card::CreditCard;
    use crate::domain::request::RequestHash;

    fn request() -> Arc<PaymentRequest> {
        Arc::new(
            PaymentRequest::build(
                CreditCard::new(Some("2222405343248877"), 4, 2099, Some("123")),
                Amount::new(1000, Some("GBP")),
                "key",
                RequestHash::digest(b"payload"),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_payment_links_to_request() {
        let request = request();
        let payment = Payment::authorized(request.clone(), "auth-1".to_string());
        assert_eq!(payment.request_id(), request.id());
        assert_eq!(payment.status(), PaymentStatus::Authorized);
        assert_eq!(payment.authorization_code(), Some("auth-1"));

        let declined = Payment::declined(request);
        assert_eq!(declined.status(), PaymentStatus::Declined);
        assert!(declined.authorization_code().is_none());
        assert_ne!(declined.id(), payment.id());
    }

    #[test]
    fn test_payment_response() {
        let payment = Payment::declined(request());
        let response = PaymentResponse::from(&payment);

        assert_eq!(response.id, payment.id().to_string());
        assert_eq!(response.card_number_last_four, "8877");
        assert_eq!(response.expiry_month, 4);
        assert_eq!(response.expiry_year, 2099);
        assert_eq!(response.currency, "GBP");
        assert_eq!(response.amount, 1000);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "Declined");
    }

    #[test]
    fn test_payment_id_parse() {
        let id = PaymentId::new();
        assert_eq!(id.to_string().parse::<PaymentId>().unwrap(), id);
        assert!("not-a-uuid".parse::<PaymentId>().is_err());
    }
}
