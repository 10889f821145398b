mod errors;
mod order_storage;
mod transaction_storage;
mod wallet_storage;
mod withdrawal_storage;

use crate::models::{
    Decision, NewTransaction, NewWithdrawal, OrderRecord, Reference, TransactionType, Wallet, WalletError, WalletOwner,
    WalletTransaction, Withdrawal, WithdrawalFilter
};
use crate::types::{Monetary, OrderId, ShopId, WalletId, WithdrawalId};

pub use errors::StorageError;
pub use order_storage::OrderStorage;
pub use transaction_storage::TransactionStorage;
pub use wallet_storage::WalletStorage;
pub use withdrawal_storage::WithdrawalStorage;

/// Balance records, one per owner.
///
/// This is the only place a balance may change. `credit` and `debit` must check and apply
/// in one atomic step so two concurrent debits can never both pass the funds check.
pub trait WalletStore: Send + Sync + 'static {
    /// Returns the owner's wallet, creating an empty one on first access.
    fn get_or_create(&self, owner: &WalletOwner) -> Result<Wallet, StorageError>;
    fn find(&self, wallet_id: WalletId) -> Result<Option<Wallet>, StorageError>;
    fn find_by_owner(&self, owner: &WalletOwner) -> Result<Option<Wallet>, StorageError>;
    fn credit(&self, wallet_id: WalletId, amount: Monetary) -> Result<Wallet, WalletError>;
    fn debit(&self, wallet_id: WalletId, amount: Monetary) -> Result<Wallet, WalletError>;
    /// Reserved for reconciliation. Negative values are clamped to zero.
    fn set_balance(&self, wallet_id: WalletId, balance: Monetary) -> Result<Wallet, WalletError>;
    /// Re-keys a wallet to a new owner that has no wallet yet.
    fn transfer_ownership(&self, wallet_id: WalletId, owner: WalletOwner) -> Result<Wallet, WalletError>;
    fn wallets(&self) -> Result<Vec<Wallet>, StorageError>;
}

/// Append-only ledger entries.
pub trait TransactionLog: Send + Sync + 'static {
    fn append(&self, entry: NewTransaction) -> Result<WalletTransaction, StorageError>;
    /// All entries of a wallet in append order.
    fn entries(&self, wallet_id: WalletId) -> Result<Vec<WalletTransaction>, StorageError>;
    fn find_by_reference(
        &self,
        wallet_id: WalletId,
        transaction_type: TransactionType,
        reference: Reference
    ) -> Result<Option<WalletTransaction>, StorageError>;

    /// The first refund logged for an order, whichever wallet received it.
    fn find_refund_for_order(&self, order_id: OrderId) -> Result<Option<WalletTransaction>, StorageError>;
}

pub trait WithdrawalStore: Send + Sync + 'static {
    fn create(&self, request: NewWithdrawal) -> Result<Withdrawal, StorageError>;
    fn find(&self, withdrawal_id: WithdrawalId) -> Result<Option<Withdrawal>, StorageError>;
    /// Applies a decision atomically. The flag is `false` when the decision was already in effect.
    fn decide(&self, withdrawal_id: WithdrawalId, decision: &Decision) -> Result<(Withdrawal, bool), WalletError>;
    fn reopen(&self, withdrawal_id: WithdrawalId) -> Result<Withdrawal, WalletError>;
    /// Matching withdrawals, newest first.
    fn list(&self, filter: &WithdrawalFilter) -> Result<Vec<Withdrawal>, StorageError>;
}

/// Completed and cancelled orders, the authoritative source for gateway income.
pub trait OrderSource: Send + Sync + 'static {
    /// Adds a completed order. A cancelled order is never reopened by a replayed completion.
    fn record(&self, order: OrderRecord) -> Result<(), StorageError>;
    /// Marks a known order cancelled. Unknown orders are ignored.
    fn mark_cancelled(&self, order_id: OrderId) -> Result<Option<OrderRecord>, StorageError>;
    fn completed_gateway_orders(&self, shop_id: ShopId) -> Result<Vec<OrderRecord>, StorageError>;
}
