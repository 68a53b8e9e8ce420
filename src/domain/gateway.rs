use thiserror::Error;

/// What the authorization gateway made of a payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Authorized { authorization_code: String },
    Declined,
    /// The gateway refused the request as malformed.
    Rejected(String),
    Error(GatewayFailure),
}

/// Why a gateway call produced no usable verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayFailure {
    #[error("gateway call timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected gateway HTTP status: {0}")]
    UnexpectedStatus(u16),
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("gateway authorized the payment without an authorization code")]
    MissingAuthorizationCode,
}
