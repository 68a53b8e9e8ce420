use crate::domain::gateway::{GatewayFailure, GatewayOutcome};
use crate::domain::ports::PaymentGateway;
use crate::domain::request::PaymentRequest;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct BankPaymentRequest<'a> {
    card_number: &'a str,
    expiry_date: String,
    currency: &'static str,
    amount: i64,
    cvv: &'a str,
}

impl<'a> From<&'a PaymentRequest> for BankPaymentRequest<'a> {
    fn from(request: &'a PaymentRequest) -> Self {
        let card = request.credit_card();
        Self {
            card_number: card.card_number(),
            expiry_date: card.expiry_date(),
            currency: request.amount().currency().code(),
            amount: request.amount().minor_units(),
            cvv: card.cvv(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BankPaymentResponse {
    authorized: bool,
    #[serde(default)]
    authorization_code: Option<String>,
}

/// Calls the acquiring bank's `POST /payments` endpoint over HTTP.
///
/// Performs exactly one attempt per call; the per-request timeout is derived
/// from the caller's deadline.
pub struct HttpGatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn payments_url(&self) -> String {
        format!("{}/payments", self.base_url)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for HttpGatewayClient {
    async fn send(&self, request: &PaymentRequest, deadline: Instant) -> GatewayOutcome {
        let timeout = deadline.saturating_duration_since(Instant::now());
        if timeout.is_zero() {
            return GatewayOutcome::Error(GatewayFailure::Timeout);
        }

        info!(payment_request_id = %request.id(), "sending payment to bank");

        let response = match self
            .client
            .post(self.payments_url())
            .json(&BankPaymentRequest::from(request))
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return GatewayOutcome::Error(transport_failure(e)),
        };

        let status = response.status();
        if status.is_client_error() {
            let reason = response.text().await.unwrap_or_default();
            warn!(
                payment_request_id = %request.id(),
                status = status.as_u16(),
                "bank rejected payment request"
            );
            return GatewayOutcome::Rejected(reason);
        }
        if !status.is_success() {
            return GatewayOutcome::Error(GatewayFailure::UnexpectedStatus(status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return GatewayOutcome::Error(transport_failure(e)),
        };

        let outcome = interpret(&body);
        debug!(payment_request_id = %request.id(), ?outcome, "bank responded");
        outcome
    }
}

fn transport_failure(error: reqwest::Error) -> GatewayFailure {
    if error.is_timeout() {
        GatewayFailure::Timeout
    } else {
        GatewayFailure::Transport(error.to_string())
    }
}

fn interpret(body: &[u8]) -> GatewayOutcome {
    match serde_json::from_slice::<BankPaymentResponse>(body) {
        Ok(BankPaymentResponse {
            authorized: true,
            authorization_code: Some(code),
        }) if !code.is_empty() => GatewayOutcome::Authorized {
            authorization_code: code,
        },
        Ok(BankPaymentResponse {
            authorized: true, ..
        }) => GatewayOutcome::Error(GatewayFailure::MissingAuthorizationCode),
        Ok(BankPaymentResponse {
            authorized: false, ..
        }) => GatewayOutcome::Declined,
        Err(e) => GatewayOutcome::Error(GatewayFailure::MalformedResponse(e.to_string())),
    }
}
