use tracing::debug;

use crate::models::{
    Actor, NewTransaction, OrderCompleted, OrderRecord, OrderStatus, PaymentMethod, Reference, TransactionType, WalletError,
    WalletOwner, WalletTransaction
};
use crate::types::WalletId;
use crate::workflows::{Ledger, Reconciliation, SettlementReconciler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomeOutcome {
    /// A cash order was credited to the shop. Either entry is `None` when it already existed
    /// or, for the fee, when there was no fee to take.
    Recorded {
        revenue: Option<WalletTransaction>,
        fee: Option<WalletTransaction>
    },
    /// A gateway order was added to the order book and the shop reconciled.
    Reconciled(Reconciliation)
}

/// Turns completed orders into shop income.
#[derive(Clone)]
pub struct IncomeRecorder {
    ledger: Ledger,
    reconciler: SettlementReconciler
}

impl IncomeRecorder {
    pub fn new(ledger: Ledger, reconciler: SettlementReconciler) -> Self {
        Self { ledger, reconciler }
    }

    pub fn record(&self, actor: &Actor, event: &OrderCompleted) -> Result<IncomeOutcome, WalletError> {
        if !actor.is_privileged() {
            return Err(WalletError::unauthorized(actor, "record order income"))
        }

        if !event.total_amount.is_positive() {
            return Err(WalletError::invalid_amount(event.total_amount, "order total must be positive"))
        }

        if event.platform_fee.is_negative() || event.platform_fee > event.total_amount {
            return Err(WalletError::invalid_amount(event.platform_fee, "platform fee must lie between zero and the order total"))
        }

        let wallet = self.ledger.wallets.get_or_create(&WalletOwner::Shop(event.shop_id))?;

        match event.payment_method {
            PaymentMethod::Cash => self.record_cash(wallet.id, event),
            PaymentMethod::Gateway => {
                let mut order = OrderRecord::completed(event);

                //NOTE: A completion that arrives after the buyer was refunded must not count as income.
                if self.ledger.transactions.find_refund_for_order(event.order_id)?.is_some() {
                    debug!("Gateway order [{}] was already refunded and stays cancelled", event.order_id);
                    order.status = OrderStatus::Cancelled;
                }

                self.ledger.orders.record(order)?;
                debug!("Gateway order [{}] recorded for shop [{}]", event.order_id, event.shop_id);
                self.reconciler.reconcile(actor, wallet.id).map(IncomeOutcome::Reconciled)
            }
        }
    }

    //NOTE: Each entry is checked separately so replaying an event finishes a run that failed between the two posts.
    fn record_cash(&self, wallet_id: WalletId, event: &OrderCompleted) -> Result<IncomeOutcome, WalletError> {
        let reference = Reference::Order(event.order_id);

        let revenue = match self.ledger.transactions.find_by_reference(wallet_id, TransactionType::SalesRevenue, reference)? {
            Some(_) => None,
            None => Some(self.ledger.post(NewTransaction::sales_revenue(wallet_id, event.order_id, event.total_amount))?)
        };

        let fee = if event.platform_fee.is_positive()
            && self.ledger.transactions.find_by_reference(wallet_id, TransactionType::PlatformFee, reference)?.is_none()
        {
            Some(self.ledger.post(NewTransaction::platform_fee(wallet_id, event.order_id, event.platform_fee))?)
        } else {
            None
        };

        if revenue.is_none() && fee.is_none() {
            debug!("Cash order [{}] was already recorded", event.order_id);
        } else {
            debug!("Cash order [{}] credited to wallet [{wallet_id}]", event.order_id);
        }

        Ok(IncomeOutcome::Recorded { revenue, fee })
    }
}
