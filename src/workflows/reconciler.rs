use tracing::{debug, warn};

use crate::models::{Actor, WalletError};
use crate::types::{Monetary, ShopId, WalletId};
use crate::workflows::Ledger;

/// What a reconciliation run found and wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub wallet_id: WalletId,
    pub previous_balance: Monetary,
    pub gateway_income: Monetary,
    pub internal_total: Monetary,
    pub final_balance: Monetary
}

impl Reconciliation {
    /// How far the stored balance had wandered from the recomputed one.
    pub fn drift(&self) -> Monetary {
        self.final_balance.checked_sub(self.previous_balance).unwrap_or(Monetary::ZERO)
    }
}

/// Recomputes a balance from gateway orders plus the full transaction log and force-writes it.
#[derive(Clone)]
pub struct SettlementReconciler {
    ledger: Ledger
}

impl SettlementReconciler {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Safe to run at any time; with no new events a second run writes the same balance.
    ///
    /// # Errors
    /// Any failed read aborts before the write, so a partial read never becomes a balance.
    pub fn reconcile(&self, actor: &Actor, wallet_id: WalletId) -> Result<Reconciliation, WalletError> {
        if !actor.is_privileged() {
            return Err(WalletError::unauthorized(actor, "reconcile wallets"))
        }

        let wallet = self.ledger.wallet(wallet_id)?;

        let gateway_income = match wallet.owner.shop_id() {
            Some(shop_id) => self.gateway_income(wallet_id, shop_id)?,
            None => Monetary::ZERO
        };

        let internal_total = self.ledger.ledger_total(wallet_id)?;
        let computed = gateway_income.checked_add(internal_total)
            .ok_or_else(|| WalletError::overflow(wallet_id))?;

        if computed.is_negative() {
            warn!("Wallet [{wallet_id}] recomputed to {computed}, clamping to zero");
        }

        let updated = self.ledger.wallets.set_balance(wallet_id, computed)?;
        let reconciliation = Reconciliation {
            wallet_id,
            previous_balance: wallet.balance,
            gateway_income,
            internal_total,
            final_balance: updated.balance
        };

        if reconciliation.drift().is_zero() {
            debug!("Wallet [{wallet_id}] reconciled at {}", updated.balance);
        } else {
            warn!("Wallet [{wallet_id}] drifted by {}, corrected {} -> {}", reconciliation.drift(), wallet.balance, updated.balance);
        }

        Ok(reconciliation)
    }

    fn gateway_income(&self, wallet_id: WalletId, shop_id: ShopId) -> Result<Monetary, WalletError> {
        let orders = self.ledger.orders.completed_gateway_orders(shop_id)?;
        let mut income = Monetary::ZERO;

        for order in orders {
            let net = order.net_income().ok_or_else(|| WalletError::overflow(wallet_id))?;
            income = income.checked_add(net).ok_or_else(|| WalletError::overflow(wallet_id))?;
        }

        Ok(income)
    }
}
