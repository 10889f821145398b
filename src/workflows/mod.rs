mod income;
mod reconciler;
mod refund;
mod withdrawal;

use std::sync::Arc;

use tracing::error;

use crate::models::{NewTransaction, Wallet, WalletError, WalletTransaction};
use crate::storage::{
    OrderSource, OrderStorage, TransactionLog, TransactionStorage, WalletStorage, WalletStore, WithdrawalStorage,
    WithdrawalStore
};
use crate::types::{Monetary, WalletId};

pub use income::{IncomeOutcome, IncomeRecorder};
pub use reconciler::{Reconciliation, SettlementReconciler};
pub use refund::{RefundOutcome, RefundRouter};
pub use withdrawal::{WithdrawalWorkflow, MINIMUM_WITHDRAWAL};

/// Handles to every store the workflows touch.
#[derive(Clone)]
pub struct Ledger {
    pub wallets: Arc<dyn WalletStore>,
    pub transactions: Arc<dyn TransactionLog>,
    pub withdrawals: Arc<dyn WithdrawalStore>,
    pub orders: Arc<dyn OrderSource>
}

impl Ledger {
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        transactions: Arc<dyn TransactionLog>,
        withdrawals: Arc<dyn WithdrawalStore>,
        orders: Arc<dyn OrderSource>
    ) -> Self {
        Self { wallets, transactions, withdrawals, orders }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(WalletStorage::new()),
            Arc::new(TransactionStorage::new()),
            Arc::new(WithdrawalStorage::new()),
            Arc::new(OrderStorage::new())
        )
    }

    /// Moves the balance by the entry's signed amount and appends the entry.
    ///
    /// The two writes are one logical unit: if the append fails the balance change is
    /// reversed before the error is returned.
    pub fn post(&self, entry: NewTransaction) -> Result<WalletTransaction, WalletError> {
        let wallet_id = entry.wallet_id;
        let amount = entry.amount;

        if amount.is_zero() {
            return Err(WalletError::invalid_amount(amount, "ledger entries must move funds"))
        }

        self.apply(wallet_id, amount)?;

        match self.transactions.append(entry) {
            Ok(transaction) => Ok(transaction),
            Err(append_error) => {
                if let Err(error) = self.apply(wallet_id, -amount) {
                    error!("Could not reverse {amount} on wallet [{wallet_id}] after a failed append: {error}");
                }

                Err(append_error.into())
            }
        }
    }

    /// Credits positive amounts and debits negative ones.
    fn apply(&self, wallet_id: WalletId, amount: Monetary) -> Result<Wallet, WalletError> {
        if amount.is_negative() {
            self.wallets.debit(wallet_id, amount.abs())
        } else {
            self.wallets.credit(wallet_id, amount)
        }
    }

    pub fn wallet(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.wallets.find(wallet_id)?.ok_or_else(|| WalletError::wallet_not_found(wallet_id))
    }

    /// Sum of every entry logged against the wallet.
    pub fn ledger_total(&self, wallet_id: WalletId) -> Result<Monetary, WalletError> {
        let entries = self.transactions.entries(wallet_id)?;

        Monetary::checked_sum(entries.iter().map(|entry| entry.amount))
            .ok_or_else(|| WalletError::overflow(wallet_id))
    }
}
