use super::amount::Amount;
use super::card::CreditCard;
use super::request::{PaymentRequest, RequestHash};
use super::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw, unvalidated payment input as received from a client.
///
/// Every field is optional on the wire so that an absent field surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub card_number: Option<String>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub cvv: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
}

impl PaymentSubmission {
    /// Fingerprint of the raw fields, stable across retries of the same payload.
    pub fn content_hash(&self) -> RequestHash {
        let canonical = format!(
            "{}-{}-{}-{}-{}-{}",
            self.card_number.as_deref().unwrap_or_default(),
            self.amount.unwrap_or_default(),
            self.expiry_month.unwrap_or_default(),
            self.expiry_year.unwrap_or_default(),
            self.currency.as_deref().unwrap_or_default(),
            self.cvv.as_deref().unwrap_or_default(),
        );
        RequestHash::digest(canonical.as_bytes())
    }

    /// Validates the submission into a [`PaymentRequest`] created at `now`.
    ///
    /// A missing idempotency key short-circuits before any field is validated.
    pub fn into_request(
        self,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PaymentRequest, ValidationError> {
        let idempotency_key = idempotency_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ValidationError::MissingIdempotencyKey)?;

        let request_hash = self.content_hash();
        let credit_card = CreditCard::new_at(
            self.card_number.as_deref(),
            self.expiry_month.unwrap_or_default(),
            self.expiry_year.unwrap_or_default(),
            self.cvv.as_deref(),
            now,
        );
        let amount = Amount::new(self.amount.unwrap_or_default(), self.currency.as_deref());

        PaymentRequest::build_at(credit_card, amount, idempotency_key, request_hash, now)
    }
}

impl fmt::Debug for PaymentSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSubmission")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}
