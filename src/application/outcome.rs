use crate::domain::payment::{Payment, PaymentResponse};
use crate::domain::validation::ValidationError;
use serde::Serialize;
use std::time::Duration;

/// Terminal state of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// This submission executed the payment (authorized or declined).
    Created(Payment),
    /// A replay of a submission that already completed.
    Existing(Payment),
    /// A replay of a submission whose execution has not completed yet.
    StillProcessing { retry_after: Duration },
    InvalidRequest(ValidationError),
    /// The bank refused the request as malformed. The key may be retried.
    BadUpstreamRequest(String),
    /// Transport, timeout or protocol failure. The key may be retried.
    InternalError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    InvalidRequest,
    StillProcessing,
    BadUpstreamRequest,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl SubmissionOutcome {
    pub fn payment(&self) -> Option<&Payment> {
        match self {
            SubmissionOutcome::Created(payment) | SubmissionOutcome::Existing(payment) => {
                Some(payment)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Created(_) => "CREATED",
            SubmissionOutcome::Existing(_) => "EXISTING",
            SubmissionOutcome::StillProcessing { .. } => "STILL_PROCESSING",
            SubmissionOutcome::InvalidRequest(_) => "INVALID_REQUEST",
            SubmissionOutcome::BadUpstreamRequest(_) => "BAD_UPSTREAM_REQUEST",
            SubmissionOutcome::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> Result<PaymentResponse, ErrorResponse> {
        let (category, message, retry_after_secs) = match self {
            SubmissionOutcome::Created(payment) | SubmissionOutcome::Existing(payment) => {
                return Ok(PaymentResponse::from(payment));
            }
            SubmissionOutcome::StillProcessing { retry_after } => (
                ErrorCategory::StillProcessing,
                "Payment is still being processed. Try again later.".to_string(),
                Some(retry_after.as_secs().max(1)),
            ),
            SubmissionOutcome::InvalidRequest(error) => {
                (ErrorCategory::InvalidRequest, error.to_string(), None)
            }
            SubmissionOutcome::BadUpstreamRequest(message) => {
                (ErrorCategory::BadUpstreamRequest, message.clone(), None)
            }
            SubmissionOutcome::InternalError(message) => {
                (ErrorCategory::InternalError, message.clone(), None)
            }
        };

        Err(ErrorResponse {
            category,
            message,
            retry_after_secs,
        })
    }
}
