use super::gateway::GatewayOutcome;
use super::payment::{Payment, PaymentId};
use super::request::{PaymentRequest, PaymentRequestId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Appends a payment, indexing it by its own id and by its request id.
    async fn put(&self, payment: Payment) -> Result<()>;
    async fn get_by_id(&self, id: PaymentId) -> Result<Option<Payment>>;
    async fn get_by_request_id(&self, request_id: PaymentRequestId) -> Result<Option<Payment>>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;

/// Result of offering a request to the [`RequestCache`].
#[derive(Debug, Clone)]
pub enum Admission {
    Admitted,
    /// The key is already held; carries the stored request untouched.
    Conflict(Arc<PaymentRequest>),
}

/// Idempotency-key table.
///
/// Methods are synchronous: implementations hold their lock only for the
/// insert-if-absent or remove, never across an await point.
pub trait RequestCache: Send + Sync {
    /// Inserts the request if its key is free. At most one concurrent caller
    /// per key observes [`Admission::Admitted`].
    fn try_admit(&self, request: Arc<PaymentRequest>) -> Admission;

    /// Releases the key if it is still held by this very request.
    /// Returns whether an entry was removed.
    fn retract(&self, request: &PaymentRequest) -> bool;

    /// Marks the request's execution as complete. Its retention window starts
    /// here; until then the entry cannot expire.
    fn settle(&self, request: &PaymentRequest) -> bool;

    /// Drops settled entries past the retention window. Returns how many were removed.
    fn purge_expired(&self) -> usize;
}

pub type RequestCacheRef = Arc<dyn RequestCache>;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits the request for authorization, giving up at `deadline`.
    async fn send(&self, request: &PaymentRequest, deadline: Instant) -> GatewayOutcome;
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
