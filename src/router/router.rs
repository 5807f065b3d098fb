// Router - routes deposits to the preferred backend and pulls withdrawals
// from wherever a caller's position actually lives
//
// Holds only the owner and the directory pointer. Every operation resolves
// backends fresh, runs serialized inside a host transaction and leaves the
// router's own balances exactly where they started.
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::control::ExecutionGuard;
use crate::errors::RouterError;
use crate::metrics;
use crate::ports::asset::Asset;
use crate::ports::backend::BackendRef;
use crate::ports::directory::Directory;
use crate::ports::host::TransactionHost;
use crate::router::execution::ExecutionEngine;
use crate::router::routes::{
    DepositReceipt, MigrateReceipt, Position, WithdrawReceipt, WithdrawRequest,
};
use crate::router::selector::BackendSelector;
use crate::router::validation::{
    check_shortfall, resolve_recipient, validate_amount, validate_optional_amount,
};
use crate::state::RouterState;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct Router {
    address: Address,
    state: RouterState,
    host: Arc<dyn TransactionHost>,
    engine: ExecutionEngine,
    guard: ExecutionGuard,
}

impl Router {
    pub fn new(
        address: Address,
        owner: Address,
        directory: Arc<dyn Directory>,
        host: Arc<dyn TransactionHost>,
    ) -> Self {
        info!(
            router = %address,
            owner = %owner,
            directory = %directory.address(),
            "router deployed"
        );
        Self {
            address,
            state: RouterState::new(owner, directory),
            host,
            engine: ExecutionEngine::new(address),
            guard: ExecutionGuard::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn owner(&self) -> Address {
        self.state.owner().await
    }

    pub async fn directory(&self) -> Arc<dyn Directory> {
        self.state.directory().await
    }

    /// Preferred backend for `asset`.
    pub async fn best_backend(&self, asset: &Address) -> Result<BackendRef, RouterError> {
        let directory = self.state.directory().await;
        BackendSelector::new(directory.as_ref()).best(asset).await
    }

    /// All backends for `asset`, oldest first, preferred last.
    pub async fn all_backends(&self, asset: &Address) -> Result<Vec<BackendRef>, RouterError> {
        let directory = self.state.directory().await;
        BackendSelector::new(directory.as_ref()).all(asset).await
    }

    /// `holder`'s live positions for `asset`, one entry per backend with shares.
    pub async fn positions(
        &self,
        asset: &Address,
        holder: &Address,
    ) -> Result<Vec<Position>, RouterError> {
        let mut positions = Vec::new();
        for backend in self.all_backends(asset).await? {
            let shares = backend.share_balance_of(holder).await?;
            if shares == 0 {
                continue;
            }
            positions.push(Position {
                backend: backend.address(),
                shares,
                value: backend.shares_to_asset(shares).await?,
            });
        }
        Ok(positions)
    }

    /// Asset value of `holder`'s position across every backend.
    pub async fn total_balance(&self, asset: &Address, holder: &Address) -> Result<u128, RouterError> {
        self.positions(asset, holder)
            .await?
            .iter()
            .try_fold(0u128, |acc, p| acc.checked_add(p.value))
            .ok_or(RouterError::Arithmetic)
    }

    /// Pull `amount` from `caller` and deposit it into the preferred backend,
    /// crediting `recipient` (default: `caller`).
    #[tracing::instrument(skip_all, fields(caller = %caller, asset = %asset.address(), amount = amount))]
    pub async fn deposit(
        &self,
        caller: &Address,
        asset: &dyn Asset,
        recipient: Option<Address>,
        amount: u128,
    ) -> Result<DepositReceipt, RouterError> {
        let receipt = self
            .transact("deposit", self.deposit_inner(caller, asset, recipient, amount))
            .await?;
        metrics::record_volume("deposit", receipt.deposited);
        Ok(receipt)
    }

    async fn deposit_inner(
        &self,
        caller: &Address,
        asset: &dyn Asset,
        recipient: Option<Address>,
        amount: u128,
    ) -> Result<DepositReceipt, RouterError> {
        validate_amount(amount)?;
        let recipient = resolve_recipient(caller, recipient)?;
        let asset_addr = asset.address();

        let baseline = asset.balance_of(&self.address).await?;
        asset
            .transfer_from(&self.address, caller, &self.address, amount)
            .await?;

        let best = self.best_backend(&asset_addr).await?;
        let outcome = self
            .engine
            .deposit_into(asset, best.as_ref(), amount, &recipient)
            .await?;
        let refunded = self.engine.settle_excess(asset, baseline, caller).await?;

        info!(
            backend = %best.address(),
            recipient = %recipient,
            deposited = outcome.consumed,
            refunded = refunded,
            shares = outcome.shares,
            "deposit routed"
        );
        Ok(DepositReceipt {
            asset: asset_addr,
            backend: best.address(),
            recipient,
            deposited: outcome.consumed,
            refunded,
            shares: outcome.shares,
        })
    }

    /// Withdraw from every backend holding the caller's position, oldest
    /// first, until the request is satisfied; proceeds go to the recipient.
    #[tracing::instrument(skip_all, fields(caller = %caller, asset = %asset.address(), amount = ?request.amount))]
    pub async fn withdraw(
        &self,
        caller: &Address,
        asset: &dyn Asset,
        request: WithdrawRequest,
    ) -> Result<WithdrawReceipt, RouterError> {
        let receipt = self
            .transact("withdraw", self.withdraw_inner(caller, asset, request))
            .await?;
        metrics::record_volume("withdraw", receipt.withdrawn);
        Ok(receipt)
    }

    async fn withdraw_inner(
        &self,
        caller: &Address,
        asset: &dyn Asset,
        request: WithdrawRequest,
    ) -> Result<WithdrawReceipt, RouterError> {
        validate_optional_amount(request.amount)?;
        let recipient = resolve_recipient(caller, request.recipient)?;
        let asset_addr = asset.address();

        let backends = self.all_backends(&asset_addr).await?;
        let plan = self
            .engine
            .plan_withdrawal(caller, &backends, request.amount)
            .await?;
        check_shortfall(request.amount, plan.planned, request.accept_partial)?;

        let baseline = asset.balance_of(&self.address).await?;
        let legs = self.engine.execute_withdrawal(caller, &plan).await?;
        let withdrawn = self
            .engine
            .settle_excess(asset, baseline, &recipient)
            .await?;
        // judge the request by what actually arrived, not by the plan
        check_shortfall(request.amount, withdrawn, request.accept_partial)?;

        let partial = request.amount.is_some_and(|req| withdrawn < req);
        info!(
            recipient = %recipient,
            withdrawn = withdrawn,
            legs = legs.len(),
            partial = partial,
            "withdrawal routed"
        );
        Ok(WithdrawReceipt {
            asset: asset_addr,
            recipient,
            requested: request.amount,
            withdrawn,
            partial,
            legs,
        })
    }

    /// Move the caller's position out of superseded backends into the
    /// preferred one. Up to `amount` when given, everything otherwise.
    ///
    /// Whatever the old backends pay out is re-deposited in full, so a
    /// partial migration leaves no asset behind in the router.
    #[tracing::instrument(skip_all, fields(caller = %caller, asset = %asset.address(), amount = ?amount))]
    pub async fn migrate(
        &self,
        caller: &Address,
        asset: &dyn Asset,
        amount: Option<u128>,
    ) -> Result<MigrateReceipt, RouterError> {
        let receipt = self
            .transact("migrate", self.migrate_inner(caller, asset, amount))
            .await?;
        metrics::record_volume("migrate", receipt.migrated);
        Ok(receipt)
    }

    async fn migrate_inner(
        &self,
        caller: &Address,
        asset: &dyn Asset,
        amount: Option<u128>,
    ) -> Result<MigrateReceipt, RouterError> {
        validate_optional_amount(amount)?;
        let asset_addr = asset.address();

        let best = self.best_backend(&asset_addr).await?;
        let stale: Vec<BackendRef> = self
            .all_backends(&asset_addr)
            .await?
            .into_iter()
            .filter(|b| b.address() != best.address())
            .collect();
        let plan = self.engine.plan_withdrawal(caller, &stale, amount).await?;

        if plan.is_empty() {
            info!(backend = %best.address(), "position already in preferred backend");
            return Ok(MigrateReceipt {
                asset: asset_addr,
                backend: best.address(),
                migrated: 0,
                refunded: 0,
                shares: 0,
                legs: Vec::new(),
            });
        }

        let baseline = asset.balance_of(&self.address).await?;
        let legs = self.engine.execute_withdrawal(caller, &plan).await?;
        let withdrawn = asset
            .balance_of(&self.address)
            .await?
            .saturating_sub(baseline);

        let mut shares = 0;
        let mut migrated = 0;
        if withdrawn > 0 {
            let outcome = self
                .engine
                .deposit_into(asset, best.as_ref(), withdrawn, caller)
                .await?;
            shares = outcome.shares;
            migrated = outcome.consumed;
        }
        let refunded = self.engine.settle_excess(asset, baseline, caller).await?;

        info!(
            backend = %best.address(),
            migrated = migrated,
            refunded = refunded,
            shares = shares,
            legs = legs.len(),
            "position migrated"
        );
        Ok(MigrateReceipt {
            asset: asset_addr,
            backend: best.address(),
            migrated,
            refunded,
            shares,
            legs,
        })
    }

    /// Point the router at `directory`. Owner only, and the owner must be
    /// that directory's governance.
    pub async fn set_directory(
        &self,
        caller: &Address,
        directory: Arc<dyn Directory>,
    ) -> Result<(), RouterError> {
        let result = self
            .guard
            .run(self.set_directory_inner(caller, directory))
            .await
            .and_then(|r| r);
        metrics::record_outcome("set_directory", &result);
        result
    }

    async fn set_directory_inner(
        &self,
        caller: &Address,
        directory: Arc<dyn Directory>,
    ) -> Result<(), RouterError> {
        let owner = self.state.owner().await;
        if *caller != owner {
            warn!(caller = %caller, "set_directory rejected: not owner");
            return Err(RouterError::NotAuthorized { caller: *caller });
        }

        let target = directory.address();
        let governance = directory
            .governance()
            .await
            .map_err(|e| RouterError::InvalidDirectory {
                directory: target,
                reason: e.to_string(),
            })?;
        if governance != owner {
            warn!(directory = %target, governance = %governance, "set_directory rejected");
            return Err(RouterError::InvalidDirectory {
                directory: target,
                reason: format!("governance is {governance}, router owner is {owner}"),
            });
        }

        let previous = self.state.replace_directory(directory).await;
        info!(from = %previous.address(), to = %target, "directory updated");
        Ok(())
    }

    /// Hand ownership to `new_owner` immediately. Owner only.
    pub async fn transfer_ownership(
        &self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), RouterError> {
        let result = self
            .guard
            .run(self.transfer_ownership_inner(caller, new_owner))
            .await
            .and_then(|r| r);
        metrics::record_outcome("transfer_ownership", &result);
        result
    }

    async fn transfer_ownership_inner(
        &self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), RouterError> {
        let owner = self.state.owner().await;
        if *caller != owner {
            warn!(caller = %caller, "transfer_ownership rejected: not owner");
            return Err(RouterError::NotAuthorized { caller: *caller });
        }
        let previous = self.state.replace_owner(new_owner).await;
        info!(from = %previous, to = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Run one state-changing operation: serialized, inside a host
    /// transaction, reverted on any error.
    async fn transact<T, F>(&self, op: &'static str, fut: F) -> Result<T, RouterError>
    where
        F: Future<Output = Result<T, RouterError>>,
    {
        let timer = metrics::OP_LATENCY.with_label_values(&[op]).start_timer();
        let result = self
            .guard
            .run(self.in_transaction(op, fut))
            .await
            .and_then(|r| r);
        timer.observe_duration();
        metrics::record_outcome(op, &result);
        if let Err(err) = &result {
            warn!(op = op, error = %err, "operation aborted");
        }
        result
    }

    async fn in_transaction<T, F>(&self, op: &'static str, fut: F) -> Result<T, RouterError>
    where
        F: Future<Output = Result<T, RouterError>>,
    {
        let snapshot = self.host.snapshot().await?;
        match fut.await {
            Ok(value) => {
                self.host.commit(snapshot).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(revert_err) = self.host.revert(snapshot).await {
                    error!(op = op, error = %revert_err, "host revert failed");
                }
                Err(err)
            }
        }
    }
}
