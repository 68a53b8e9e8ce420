use thiserror::Error;

/// Infrastructure failures. Expected business outcomes (validation, replay,
/// gateway declines and rejections) are modelled as values, not as errors.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Payment {0} has already been stored")]
    DuplicatePayment(String),
    #[error("Store error: {0}")]
    StoreError(String),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
