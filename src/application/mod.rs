//! Application layer containing the core business logic orchestration.
//!
//! Three services cover the core: `TaskLifecycle` for the task/submission
//! state machine, `SettlementEngine` for ledger movements, and
//! `PaymentOrchestrator` for the gateway initialize/verify flow. Each owns
//! boxed store ports and is constructed explicitly at startup.

pub mod lifecycle;
pub mod payments;
pub mod settlement;
