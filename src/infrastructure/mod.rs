//! Adapters behind the domain ports: in-memory idempotency cache and payment
//! store, the HTTP bank client and a simulated bank.

pub mod http_gateway;
pub mod in_memory;
pub mod simulated_bank;
