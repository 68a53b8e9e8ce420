use thiserror::Error;

/// Why a submission was refused before reaching the gateway.
///
/// Each variant's `Display` is the message surfaced to the caller, so the
/// card number and CVV are never echoed back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid card number length: {0}. Must be between 14 and 19 digits.")]
    CardNumberLength(usize),
    #[error("Invalid card number. Can only contain digits.")]
    CardNumberDigits,
    #[error("Invalid expiry month: {0}. Must be between 1 and 12.")]
    ExpiryMonth(i32),
    #[error("Invalid expiry year: {0}. Must be between 1 and 9999.")]
    ExpiryYear(i32),
    #[error("Card has expired: {month}/{year}.")]
    CardExpired { month: u32, year: i32 },
    #[error("Invalid CVV length: {0}. Must be between 3 and 4 digits.")]
    CvvLength(usize),
    #[error("Invalid CVV. Can only contain digits.")]
    CvvDigits,
    #[error("Invalid amount: {0}. Must be greater than 0.")]
    NonPositiveAmount(i64),
    #[error("Invalid currency code: {0}. Valid currencies: GBP,EUR,USD")]
    UnknownCurrency(String),
    #[error("Missing header: Idempotency-Key")]
    MissingIdempotencyKey,
    #[error("Reuse of Idempotency-Key: {0} with a different payment")]
    IdempotencyKeyReused(String),
}
