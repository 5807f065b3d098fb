// Router module - deposit, withdrawal and migration routing
// This file wires backend selection, leg planning and execution behind the
// Router entry point
//
// Numan Thabit 2025 Nov

pub mod execution;
pub mod routes;
pub mod selector;
pub mod validation;

#[allow(clippy::module_inception)]
pub mod router;

pub use execution::{DepositOutcome, ExecutionEngine};
pub use router::Router;
pub use routes::{
    DepositReceipt, LegReceipt, MigrateReceipt, Position, WithdrawPlan, WithdrawReceipt,
    WithdrawRequest,
};
pub use selector::BackendSelector;
