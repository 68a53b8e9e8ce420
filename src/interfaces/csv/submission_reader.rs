use crate::domain::submission::PaymentSubmission;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

/// One CSV row: the idempotency key plus the raw payment fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubmissionRecord {
    pub idempotency_key: Option<String>,
    pub card_number: Option<String>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub cvv: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
}

impl SubmissionRecord {
    pub fn into_parts(self) -> (Option<String>, PaymentSubmission) {
        let submission = PaymentSubmission {
            card_number: self.card_number,
            expiry_month: self.expiry_month,
            expiry_year: self.expiry_year,
            cvv: self.cvv,
            amount: self.amount,
            currency: self.currency,
        };
        (self.idempotency_key, submission)
    }
}

/// Reads payment submissions from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths.
/// Empty cells deserialize as absent so they surface as validation errors.
pub struct SubmissionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SubmissionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes rows. Rows with unparsable numbers yield an error
    /// without ending the stream.
    pub fn submissions(self) -> impl Iterator<Item = Result<SubmissionRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
