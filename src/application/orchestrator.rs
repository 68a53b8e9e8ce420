use super::outcome::SubmissionOutcome;
use crate::config::OrchestratorConfig;
use crate::domain::gateway::{GatewayFailure, GatewayOutcome};
use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::{Admission, PaymentGatewayBox, PaymentStoreBox, RequestCacheRef};
use crate::domain::request::PaymentRequest;
use crate::domain::submission::PaymentSubmission;
use crate::domain::validation::ValidationError;
use crate::error::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const BAD_UPSTREAM_MESSAGE: &str = "Invalid card details.";
const INTERNAL_ERROR_MESSAGE: &str = "An error occurred processing your payment.";

/// Drives a submission from raw input to a terminal [`SubmissionOutcome`].
///
/// The idempotency cache decides which submission executes; the admitted
/// request itself acts as the concurrency token, so nothing is locked while
/// the gateway call is in flight.
pub struct PaymentOrchestrator {
    cache: RequestCacheRef,
    gateway: PaymentGatewayBox,
    store: PaymentStoreBox,
    config: OrchestratorConfig,
}

impl PaymentOrchestrator {
    /// Creates a new `PaymentOrchestrator`.
    ///
    /// # Arguments
    ///
    /// * `cache` - The idempotency-key table shared by every submission.
    /// * `gateway` - The bank authorization client.
    /// * `store` - The payment store.
    /// * `config` - Gateway ceiling and still-processing back-off.
    pub fn new(
        cache: RequestCacheRef,
        gateway: PaymentGatewayBox,
        store: PaymentStoreBox,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            cache,
            gateway,
            store,
            config,
        }
    }

    /// Validates and processes a raw submission.
    ///
    /// `deadline` is the caller's own deadline; the gateway call is bounded by
    /// the earlier of it and the configured gateway ceiling.
    pub async fn submit(
        &self,
        submission: PaymentSubmission,
        idempotency_key: Option<&str>,
        deadline: Option<Instant>,
    ) -> SubmissionOutcome {
        match submission.into_request(idempotency_key, Utc::now()) {
            Ok(request) => self.process(Arc::new(request), deadline).await,
            Err(e) => {
                debug!(error = %e, "rejected invalid submission");
                SubmissionOutcome::InvalidRequest(e)
            }
        }
    }

    /// Admits an already validated request and either executes or replays it.
    pub async fn process(
        &self,
        request: Arc<PaymentRequest>,
        deadline: Option<Instant>,
    ) -> SubmissionOutcome {
        match self.cache.try_admit(request.clone()) {
            Admission::Admitted => {
                info!(
                    payment_request_id = %request.id(),
                    idempotency_key = request.idempotency_key(),
                    created_at = %request.created_at(),
                    "admitted payment request"
                );
                self.execute(request, deadline).await
            }
            Admission::Conflict(existing) => self.replay(&request, &existing).await,
        }
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.store.get_by_id(id).await
    }

    async fn replay(
        &self,
        request: &PaymentRequest,
        existing: &PaymentRequest,
    ) -> SubmissionOutcome {
        if existing.request_hash() != request.request_hash() {
            warn!(
                idempotency_key = request.idempotency_key(),
                "idempotency key reused with a different payload"
            );
            return SubmissionOutcome::InvalidRequest(ValidationError::IdempotencyKeyReused(
                request.idempotency_key().to_string(),
            ));
        }

        match self.store.get_by_request_id(existing.id()).await {
            Ok(Some(payment)) => {
                debug!(payment_id = %payment.id(), "replaying completed payment");
                SubmissionOutcome::Existing(payment)
            }
            Ok(None) => SubmissionOutcome::StillProcessing {
                retry_after: self.config.still_processing_retry_after,
            },
            Err(e) => {
                error!(payment_request_id = %existing.id(), error = %e, "payment lookup failed");
                SubmissionOutcome::InternalError(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }

    async fn execute(
        &self,
        request: Arc<PaymentRequest>,
        deadline: Option<Instant>,
    ) -> SubmissionOutcome {
        let admission = AdmissionGuard::new(self.cache.clone(), request.clone());
        let deadline = self.gateway_deadline(deadline);

        let outcome = tokio::time::timeout_at(deadline, self.gateway.send(&request, deadline))
            .await
            .unwrap_or(GatewayOutcome::Error(GatewayFailure::Timeout));

        let payment = match outcome {
            GatewayOutcome::Authorized { authorization_code } => {
                Payment::authorized(request.clone(), authorization_code)
            }
            GatewayOutcome::Declined => Payment::declined(request.clone()),
            GatewayOutcome::Rejected(reason) => {
                warn!(payment_request_id = %request.id(), %reason, "bank reports invalid request");
                admission.retract();
                return SubmissionOutcome::BadUpstreamRequest(BAD_UPSTREAM_MESSAGE.to_string());
            }
            GatewayOutcome::Error(failure) => {
                error!(payment_request_id = %request.id(), error = %failure, "bank call failed");
                admission.retract();
                return SubmissionOutcome::InternalError(INTERNAL_ERROR_MESSAGE.to_string());
            }
        };

        if let Err(e) = self.store.put(payment.clone()).await {
            error!(payment_id = %payment.id(), error = %e, "failed to store payment");
            admission.retract();
            return SubmissionOutcome::InternalError(INTERNAL_ERROR_MESSAGE.to_string());
        }

        admission.commit();
        info!(
            payment_id = %payment.id(),
            payment_request_id = %request.id(),
            status = %payment.status(),
            "payment recorded"
        );
        SubmissionOutcome::Created(payment)
    }

    fn gateway_deadline(&self, caller_deadline: Option<Instant>) -> Instant {
        let ceiling = Instant::now() + self.config.gateway_timeout;
        caller_deadline.map_or(ceiling, |deadline| deadline.min(ceiling))
    }
}

/// Holds an admitted key for the duration of an execution.
///
/// Unless committed, the key is released on drop, which also covers the
/// orchestrator future being cancelled mid-call.
struct AdmissionGuard {
    cache: RequestCacheRef,
    request: Arc<PaymentRequest>,
    armed: bool,
}

impl AdmissionGuard {
    fn new(cache: RequestCacheRef, request: Arc<PaymentRequest>) -> Self {
        Self {
            cache,
            request,
            armed: true,
        }
    }

    fn commit(mut self) {
        self.armed = false;
        self.cache.settle(&self.request);
    }

    fn retract(mut self) {
        self.armed = false;
        self.release();
    }

    fn release(&self) {
        if self.cache.retract(&self.request) {
            debug!(
                idempotency_key = self.request.idempotency_key(),
                "released idempotency key"
            );
        }
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                payment_request_id = %self.request.id(),
                "payment execution abandoned"
            );
            self.release();
        }
    }
}
