use crate::domain::gateway::{GatewayFailure, GatewayOutcome};
use crate::domain::ports::PaymentGateway;
use crate::domain::request::PaymentRequest;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// In-process stand-in for the acquiring bank.
///
/// The verdict is keyed on the card number's last digit: odd authorizes,
/// even declines, `0` answers as if the bank were unavailable (HTTP 503).
#[derive(Debug, Clone, Default)]
pub struct SimulatedBank {
    latency: Duration,
}

impl SimulatedBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for SimulatedBank {
    async fn send(&self, request: &PaymentRequest, deadline: Instant) -> GatewayOutcome {
        let ready_at = Instant::now() + self.latency;
        if ready_at > deadline {
            tokio::time::sleep_until(deadline).await;
            return GatewayOutcome::Error(GatewayFailure::Timeout);
        }
        tokio::time::sleep_until(ready_at).await;

        let last_digit = request
            .credit_card()
            .card_number()
            .bytes()
            .last()
            .map(|b| b - b'0');

        match last_digit {
            Some(0) => GatewayOutcome::Error(GatewayFailure::UnexpectedStatus(503)),
            Some(digit) if digit % 2 == 1 => GatewayOutcome::Authorized {
                authorization_code: Uuid::new_v4().to_string(),
            },
            _ => GatewayOutcome::Declined,
        }
    }
}
