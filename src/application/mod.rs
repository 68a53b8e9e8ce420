//! Application layer containing the payment orchestration.
//!
//! `PaymentOrchestrator` turns a raw submission into a terminal
//! `SubmissionOutcome`, using the idempotency cache to pick the single
//! execution per key and replaying stored payments to every duplicate.
//! `spawn_retention_sweep` keeps the key table bounded by its retention window.

pub mod orchestrator;
pub mod outcome;
pub mod retention;
