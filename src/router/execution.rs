// Execution engine - sizes and executes backend legs
// This file implements the per-backend withdrawal plan, leg execution and
// the deposit call-out, all accounted by balance deltas on the router
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::{LedgerError, RouterError};
use crate::ports::asset::Asset;
use crate::ports::backend::{Backend, BackendRef};
use crate::quant::shares_for_amount;
use crate::router::routes::{LegReceipt, PlannedLeg, WithdrawPlan};
use tracing::debug;

/// Result of pushing asset into a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOutcome {
    pub shares: u128,
    pub consumed: u128,
}

/// Executes backend interactions on behalf of the router at `address`.
pub struct ExecutionEngine {
    address: Address,
}

impl ExecutionEngine {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Size the legs needed to withdraw `amount` (or everything when `None`)
    /// of `owner`'s position from `backends`, in the order given. Read-only.
    pub async fn plan_withdrawal(
        &self,
        owner: &Address,
        backends: &[BackendRef],
        amount: Option<u128>,
    ) -> Result<WithdrawPlan, RouterError> {
        let mut plan = WithdrawPlan::default();
        let mut remaining = amount;

        for backend in backends {
            if remaining == Some(0) {
                break;
            }
            let balance = backend.share_balance_of(owner).await?;
            if balance == 0 {
                continue;
            }
            let value = backend.shares_to_asset(balance).await?;

            let (shares, expected) = match remaining {
                Some(rem) if value > rem => {
                    let shares = shares_for_amount(rem, balance, value)?.min(balance);
                    (shares, backend.shares_to_asset(shares).await?)
                }
                _ => (balance, value),
            };

            debug!(
                backend = %backend.address(),
                balance = balance,
                shares = shares,
                expected = expected,
                "planned withdrawal leg"
            );
            plan.planned = plan
                .planned
                .checked_add(expected)
                .ok_or(RouterError::Arithmetic)?;
            if let Some(rem) = remaining.as_mut() {
                *rem = rem.saturating_sub(expected);
            }
            plan.legs.push(PlannedLeg {
                backend: backend.clone(),
                shares,
                expected,
            });
        }
        Ok(plan)
    }

    /// Redeem every planned leg into the router's own balance.
    pub async fn execute_withdrawal(
        &self,
        owner: &Address,
        plan: &WithdrawPlan,
    ) -> Result<Vec<LegReceipt>, RouterError> {
        let mut receipts = Vec::with_capacity(plan.legs.len());
        for leg in &plan.legs {
            let amount = leg
                .backend
                .withdraw(owner, leg.shares, &self.address)
                .await?;
            debug!(
                backend = %leg.backend.address(),
                shares = leg.shares,
                amount = amount,
                "withdrawal leg executed"
            );
            receipts.push(LegReceipt {
                backend: leg.backend.address(),
                shares: leg.shares,
                amount,
            });
        }
        Ok(receipts)
    }

    /// Deposit `amount` of the router's own asset into `backend`, crediting
    /// `recipient`. Backends that cannot mint to a third party mint to the
    /// router and the shares are forwarded straight away.
    pub async fn deposit_into(
        &self,
        asset: &dyn Asset,
        backend: &dyn Backend,
        amount: u128,
        recipient: &Address,
    ) -> Result<DepositOutcome, RouterError> {
        let spender = backend.address();
        if asset.allowance(&self.address, &spender).await? < amount {
            asset.approve(&self.address, &spender, u128::MAX).await?;
        }

        let before = asset.balance_of(&self.address).await?;
        let shares = if backend.mints_to_recipient() {
            backend.deposit(&self.address, amount, recipient).await?
        } else {
            let shares = backend.deposit(&self.address, amount, &self.address).await?;
            backend
                .transfer_shares(&self.address, recipient, shares)
                .await?;
            shares
        };
        let after = asset.balance_of(&self.address).await?;
        let consumed = before.checked_sub(after).ok_or_else(|| {
            LedgerError::Rejected(format!("backend {spender} increased router balance on deposit"))
        })?;

        Ok(DepositOutcome { shares, consumed })
    }

    /// Send back whatever the router holds above `baseline`, so balances that
    /// were there before the operation stay untouched.
    pub async fn settle_excess(
        &self,
        asset: &dyn Asset,
        baseline: u128,
        to: &Address,
    ) -> Result<u128, RouterError> {
        let now = asset.balance_of(&self.address).await?;
        let excess = now.saturating_sub(baseline);
        if excess > 0 {
            asset.transfer(&self.address, to, excess).await?;
        }
        Ok(excess)
    }
}
