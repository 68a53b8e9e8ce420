use crate::application::outcome::SubmissionOutcome;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One output row. Payment columns are empty for failed submissions and the
/// message column is empty for successful ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub idempotency_key: String,
    pub outcome: &'static str,
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub card_number_last_four: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub message: Option<String>,
}

impl OutcomeRecord {
    pub fn new(idempotency_key: Option<&str>, outcome: &SubmissionOutcome) -> Self {
        let mut record = Self {
            idempotency_key: idempotency_key.unwrap_or_default().to_string(),
            outcome: outcome.label(),
            payment_id: None,
            status: None,
            card_number_last_four: None,
            amount: None,
            currency: None,
            message: None,
        };

        match outcome.to_response() {
            Ok(response) => {
                record.payment_id = Some(response.id);
                record.status = Some(response.status.to_string());
                record.card_number_last_four = Some(response.card_number_last_four);
                record.amount = Some(response.amount);
                record.currency = Some(response.currency);
            }
            Err(error) => record.message = Some(error.message),
        }
        record
    }
}

/// Writes outcome rows as CSV with a header line.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, record: &OutcomeRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a OutcomeRecord>,
    ) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::card::CreditCard;
    use crate::domain::payment::Payment;
    use crate::domain::request::{PaymentRequest, RequestHash};
    use crate::domain::validation::ValidationError;
    use std::sync::Arc;

    fn render(records: &[OutcomeRecord]) -> String {
        let mut buffer = Vec::new();
        OutcomeWriter::new(&mut buffer).write_all(records).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_created_row() {
        let request = PaymentRequest::build(
            CreditCard::new(Some("2222405343248877"), 4, 2099, Some("123")),
            Amount::new(1000, Some("GBP")),
            "key-1",
            RequestHash::digest(b""),
        )
        .unwrap();
        let payment = Payment::authorized(Arc::new(request), "auth".to_string());
        let outcome = SubmissionOutcome::Created(payment.clone());
        let record = OutcomeRecord::new(Some("key-1"), &outcome);

        let output = render(&[record]);
        assert!(output.starts_with(concat!(
            "idempotency_key,outcome,payment_id,status,",
            "card_number_last_four,amount,currency,message\n"
        )));
        assert!(output.contains(&format!(
            "key-1,CREATED,{},Authorized,8877,1000,GBP,\n",
            payment.id()
        )));
        assert!(!output.contains("2222405343248877"));
    }

    #[test]
    fn test_failure_row() {
        let record = OutcomeRecord::new(
            None,
            &SubmissionOutcome::InvalidRequest(ValidationError::MissingIdempotencyKey),
        );

        let output = render(&[record]);
        assert!(output.contains(",INVALID_REQUEST,,,,,,Missing header: Idempotency-Key\n"));
    }
}
