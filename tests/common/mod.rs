#![allow(dead_code)]

use paygate::application::orchestrator::PaymentOrchestrator;
use paygate::config::OrchestratorConfig;
use paygate::domain::gateway::GatewayOutcome;
use paygate::domain::payment::{Payment, PaymentId};
use paygate::domain::ports::{PaymentGateway, PaymentStore, PaymentStoreBox};
use paygate::domain::request::{PaymentRequest, PaymentRequestId};
use paygate::domain::submission::PaymentSubmission;
use paygate::error::{PaymentError, Result};
use paygate::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryRequestCache};
use std::collections::VecDeque;
use std::io::Error;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Instant;

pub const SUBMISSION_HEADER: [&str; 7] = [
    "idempotency_key",
    "card_number",
    "expiry_month",
    "expiry_year",
    "cvv",
    "amount",
    "currency",
];

pub fn submission(card_number: &str, amount: i64, currency: &str) -> PaymentSubmission {
    PaymentSubmission {
        card_number: Some(card_number.to_string()),
        expiry_month: Some(4),
        expiry_year: Some(2099),
        cvv: Some("123".to_string()),
        amount: Some(amount),
        currency: Some(currency.to_string()),
    }
}

pub fn authorized(code: &str) -> GatewayOutcome {
    GatewayOutcome::Authorized {
        authorization_code: code.to_string(),
    }
}

/// Replays a fixed script of outcomes, one per call, then keeps authorizing.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<GatewayOutcome>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new(script: impl IntoIterator<Item = GatewayOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn send(&self, _request: &PaymentRequest, _deadline: Instant) -> GatewayOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| authorized("auth-default"))
    }
}

/// Authorizes only once released, signalling when a call has started.
#[derive(Clone, Default)]
pub struct GatedGateway {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

impl GatedGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for GatedGateway {
    async fn send(&self, _request: &PaymentRequest, _deadline: Instant) -> GatewayOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        authorized("auth-gated")
    }
}

/// A store that is down for writes, or for every operation.
pub struct FailingStore {
    pub fail_reads: bool,
}

#[async_trait::async_trait]
impl PaymentStore for FailingStore {
    async fn put(&self, _payment: Payment) -> Result<()> {
        Err(PaymentError::StoreError("disk full".to_string()))
    }

    async fn get_by_id(&self, _id: PaymentId) -> Result<Option<Payment>> {
        self.read()
    }

    async fn get_by_request_id(&self, _request_id: PaymentRequestId) -> Result<Option<Payment>> {
        self.read()
    }
}

impl FailingStore {
    fn read(&self) -> Result<Option<Payment>> {
        if self.fail_reads {
            Err(PaymentError::StoreError("connection reset".to_string()))
        } else {
            Ok(None)
        }
    }
}

pub fn orchestrator_with(
    cache: &InMemoryRequestCache,
    gateway: impl PaymentGateway + 'static,
    store: PaymentStoreBox,
) -> PaymentOrchestrator {
    PaymentOrchestrator::new(
        Arc::new(cache.clone()),
        Box::new(gateway),
        store,
        OrchestratorConfig::default(),
    )
}

pub fn orchestrator(
    cache: &InMemoryRequestCache,
    gateway: impl PaymentGateway + 'static,
) -> PaymentOrchestrator {
    orchestrator_with(cache, gateway, Box::new(InMemoryPaymentStore::new()))
}

pub fn write_submissions_csv(path: &Path, rows: &[[&str; 7]]) -> std::result::Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    wtr.write_record(SUBMISSION_HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
