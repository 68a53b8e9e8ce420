use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::{Admission, PaymentStore, RequestCache};
use crate::domain::request::{PaymentRequest, PaymentRequestId};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// How long an admitted idempotency key is remembered.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    request: Arc<PaymentRequest>,
    /// Set once the execution completed. Unsettled entries never expire.
    settled_at: Option<Instant>,
}

impl CacheEntry {
    fn admitted(request: Arc<PaymentRequest>) -> Self {
        Self {
            request,
            settled_at: None,
        }
    }

    fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        self.settled_at
            .is_some_and(|settled_at| now.duration_since(settled_at) >= retention)
    }

    fn is_held_by(&self, request: &PaymentRequest) -> bool {
        self.request.id() == request.id()
    }
}

/// A thread-safe in-memory idempotency-key table.
///
/// A single `Mutex` guards the whole map, which makes admission a linearizable
/// insert-if-absent. The retention window of an entry starts when it is
/// settled; past it the entry is treated as absent and replaced on the next
/// admission for its key, or dropped by [`RequestCache::purge_expired`].
#[derive(Clone)]
pub struct InMemoryRequestCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    retention: Duration,
}

impl Default for InMemoryRequestCache {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl InMemoryRequestCache {
    /// Creates an empty cache with the default 24h retention.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Critical sections never panic mid-update, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestCache for InMemoryRequestCache {
    fn try_admit(&self, request: Arc<PaymentRequest>) -> Admission {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.entry(request.idempotency_key().to_string()) {
            Entry::Occupied(mut occupied) if occupied.get().is_expired(now, self.retention) => {
                debug!(
                    idempotency_key = request.idempotency_key(),
                    "replacing expired idempotency entry"
                );
                occupied.insert(CacheEntry::admitted(request));
                Admission::Admitted
            }
            Entry::Occupied(occupied) => Admission::Conflict(occupied.get().request.clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::admitted(request));
                Admission::Admitted
            }
        }
    }

    fn retract(&self, request: &PaymentRequest) -> bool {
        let mut entries = self.lock();
        let held_by_request = entries
            .get(request.idempotency_key())
            .is_some_and(|entry| entry.is_held_by(request));

        if held_by_request {
            entries.remove(request.idempotency_key());
        }
        held_by_request
    }

    fn settle(&self, request: &PaymentRequest) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(request.idempotency_key()) {
            Some(entry) if entry.is_held_by(request) && entry.settled_at.is_none() => {
                entry.settled_at = Some(Instant::now());
                true
            }
            _ => false,
        }
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.retention));
        before - entries.len()
    }
}

#[derive(Default)]
struct PaymentTables {
    payments: HashMap<PaymentId, Payment>,
    by_request: HashMap<PaymentRequestId, PaymentId>,
}

/// A thread-safe in-memory payment store.
///
/// Uses `Arc<RwLock<..>>` over the payment table and the request index so both
/// are updated under one write lock.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    tables: Arc<RwLock<PaymentTables>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn put(&self, payment: Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.payments.contains_key(&payment.id()) {
            return Err(PaymentError::DuplicatePayment(payment.id().to_string()));
        }
        tables.by_request.insert(payment.request_id(), payment.id());
        tables.payments.insert(payment.id(), payment);
        Ok(())
    }

    async fn get_by_id(&self, id: PaymentId) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn get_by_request_id(&self, request_id: PaymentRequestId) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_request
            .get(&request_id)
            .and_then(|id| tables.payments.get(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::card::CreditCard;
    use crate::domain::request::RequestHash;

    fn request(key: &str, payload: &[u8]) -> Arc<PaymentRequest> {
        Arc::new(
            PaymentRequest::build(
                CreditCard::new(Some("2222405343248877"), 4, 2099, Some("123")),
                Amount::new(1000, Some("GBP")),
                key,
                RequestHash::digest(payload),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_admit_then_conflict() {
        let cache = InMemoryRequestCache::new();
        let first = request("key-1", b"a");
        let second = request("key-1", b"a");

        assert!(matches!(cache.try_admit(first.clone()), Admission::Admitted));
        match cache.try_admit(second) {
            Admission::Conflict(existing) => assert_eq!(existing.id(), first.id()),
            Admission::Admitted => panic!("second admission must conflict"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let cache = InMemoryRequestCache::new();
        assert!(matches!(cache.try_admit(request("a", b"x")), Admission::Admitted));
        assert!(matches!(cache.try_admit(request("b", b"x")), Admission::Admitted));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_retract_frees_key_and_is_idempotent() {
        let cache = InMemoryRequestCache::new();
        let first = request("key-1", b"a");
        cache.try_admit(first.clone());

        assert!(cache.retract(&first));
        assert!(!cache.retract(&first));
        assert!(cache.is_empty());
        assert!(matches!(cache.try_admit(request("key-1", b"a")), Admission::Admitted));
    }

    #[test]
    fn test_retract_ignores_other_holder_of_key() {
        let cache = InMemoryRequestCache::new();
        let holder = request("key-1", b"a");
        let stranger = request("key-1", b"a");
        cache.try_admit(holder.clone());

        assert!(!cache.retract(&stranger));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_settled_entry_expires() {
        let cache = InMemoryRequestCache::with_retention(Duration::ZERO);
        let first = request("key-1", b"a");
        assert!(matches!(cache.try_admit(first.clone()), Admission::Admitted));
        assert!(cache.settle(&first));
        assert!(matches!(cache.try_admit(request("key-1", b"b")), Admission::Admitted));
    }

    #[test]
    fn test_unsettled_entry_never_expires() {
        let cache = InMemoryRequestCache::with_retention(Duration::ZERO);
        let in_flight = request("key-1", b"a");
        cache.try_admit(in_flight.clone());

        match cache.try_admit(request("key-1", b"a")) {
            Admission::Conflict(existing) => assert_eq!(existing.id(), in_flight.id()),
            Admission::Admitted => panic!("an in-flight entry must not expire"),
        }
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_settle_only_by_holder_and_once() {
        let cache = InMemoryRequestCache::new();
        let holder = request("key-1", b"a");
        cache.try_admit(holder.clone());

        assert!(!cache.settle(&request("key-1", b"a")));
        assert!(!cache.settle(&request("key-2", b"a")));
        assert!(cache.settle(&holder));
        assert!(!cache.settle(&holder));
    }

    #[test]
    fn test_purge_expired() {
        let expiring = InMemoryRequestCache::with_retention(Duration::ZERO);
        for key in ["a", "b"] {
            let settled = request(key, b"x");
            expiring.try_admit(settled.clone());
            expiring.settle(&settled);
        }
        expiring.try_admit(request("in-flight", b"x"));
        assert_eq!(expiring.purge_expired(), 2);
        assert_eq!(expiring.len(), 1);

        let retained = InMemoryRequestCache::new();
        let settled = request("a", b"x");
        retained.try_admit(settled.clone());
        retained.settle(&settled);
        assert_eq!(retained.purge_expired(), 0);
        assert_eq!(retained.len(), 1);
    }

    #[tokio::test]
    async fn test_payment_store_round_trip() {
        let store = InMemoryPaymentStore::new();
        let payment = Payment::authorized(request("key-1", b"a"), "auth".to_string());

        store.put(payment.clone()).await.unwrap();

        assert_eq!(store.get_by_id(payment.id()).await.unwrap(), Some(payment.clone()));
        assert_eq!(
            store.get_by_request_id(payment.request_id()).await.unwrap(),
            Some(payment)
        );
        assert!(store.get_by_id(PaymentId::new()).await.unwrap().is_none());
        assert!(
            store
                .get_by_request_id(PaymentRequestId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_payment_store_is_append_only() {
        let store = InMemoryPaymentStore::new();
        let payment = Payment::declined(request("key-1", b"a"));

        store.put(payment.clone()).await.unwrap();
        assert!(matches!(
            store.put(payment).await,
            Err(PaymentError::DuplicatePayment(_))
        ));
    }
}
