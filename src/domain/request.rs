use super::amount::Amount;
use super::card::CreditCard;
use super::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentRequestId(Uuid);

impl PaymentRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SHA-256 fingerprint of a raw submission, used to tell a replay from a
/// different payment sent under the same idempotency key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHash([u8; 32]);

impl RequestHash {
    pub fn digest(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for RequestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestHash({})", self.to_hex())
    }
}

/// A fully validated payment submission awaiting execution.
///
/// Immutable once built. The identity is generated at construction and is
/// never shared with another request, even one carrying the same
/// idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    id: PaymentRequestId,
    credit_card: CreditCard,
    amount: Amount,
    created_at: DateTime<Utc>,
    idempotency_key: String,
    request_hash: RequestHash,
}

impl PaymentRequest {
    pub fn new(
        credit_card: CreditCard,
        amount: Amount,
        idempotency_key: impl Into<String>,
        request_hash: RequestHash,
    ) -> Self {
        Self::new_at(credit_card, amount, idempotency_key, request_hash, Utc::now())
    }

    pub fn new_at(
        credit_card: CreditCard,
        amount: Amount,
        idempotency_key: impl Into<String>,
        request_hash: RequestHash,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentRequestId::new(),
            credit_card,
            amount,
            created_at,
            idempotency_key: idempotency_key.into(),
            request_hash,
        }
    }

    /// Combines independently validated parts into a request.
    ///
    /// Stops at the first invalid part: when both the card and the amount are
    /// invalid only the card error is reported.
    pub fn build(
        credit_card: Result<CreditCard, ValidationError>,
        amount: Result<Amount, ValidationError>,
        idempotency_key: impl Into<String>,
        request_hash: RequestHash,
    ) -> Result<Self, ValidationError> {
        Self::build_at(credit_card, amount, idempotency_key, request_hash, Utc::now())
    }

    /// Same as [`PaymentRequest::build`], stamping the request with `created_at`.
    pub fn build_at(
        credit_card: Result<CreditCard, ValidationError>,
        amount: Result<Amount, ValidationError>,
        idempotency_key: impl Into<String>,
        request_hash: RequestHash,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let credit_card = credit_card?;
        let amount = amount?;
        Ok(Self::new_at(
            credit_card,
            amount,
            idempotency_key,
            request_hash,
            created_at,
        ))
    }

    pub fn id(&self) -> PaymentRequestId {
        self.id
    }

    pub fn credit_card(&self) -> &CreditCard {
        &self.credit_card
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    pub fn request_hash(&self) -> RequestHash {
        self.request_hash
    }
}
