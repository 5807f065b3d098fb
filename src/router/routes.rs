// Request and receipt types for router operations
// This file defines what callers ask the router for and what each
// operation reports back, leg by leg
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::ports::backend::BackendRef;
use serde::Serialize;

/// Parameters of a withdrawal.
///
/// With no `amount` the caller's whole position is withdrawn. With an amount,
/// a shortfall fails with `InsufficientBalance` unless `accept_partial` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawRequest {
    pub recipient: Option<Address>,
    pub amount: Option<u128>,
    pub accept_partial: bool,
}

impl WithdrawRequest {
    /// Withdraw everything the caller holds across all backends.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn exact(amount: u128) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn to(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn accept_partial(mut self) -> Self {
        self.accept_partial = true;
        self
    }
}

/// One backend's share of a withdrawal, sized before any funds move.
#[derive(Clone)]
pub struct PlannedLeg {
    pub backend: BackendRef,
    pub shares: u128,
    pub expected: u128,
}

/// Read-only withdrawal plan, in directory order.
#[derive(Clone, Default)]
pub struct WithdrawPlan {
    pub legs: Vec<PlannedLeg>,
    /// Asset value of all legs at the rates observed while planning.
    pub planned: u128,
}

impl WithdrawPlan {
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegReceipt {
    pub backend: Address,
    pub shares: u128,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    pub asset: Address,
    pub backend: Address,
    pub recipient: Address,
    /// Asset actually taken by the backend.
    pub deposited: u128,
    /// Asset the backend did not take, returned to the caller.
    pub refunded: u128,
    pub shares: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawReceipt {
    pub asset: Address,
    pub recipient: Address,
    pub requested: Option<u128>,
    pub withdrawn: u128,
    pub partial: bool,
    pub legs: Vec<LegReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrateReceipt {
    pub asset: Address,
    pub backend: Address,
    pub migrated: u128,
    pub refunded: u128,
    pub shares: u128,
    pub legs: Vec<LegReceipt>,
}

impl MigrateReceipt {
    pub fn is_noop(&self) -> bool {
        self.legs.is_empty()
    }
}

/// A holder's live position in one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub backend: Address,
    pub shares: u128,
    pub value: u128,
}
