use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::models::{NewTransaction, Reference, TransactionType, WalletTransaction};
use crate::storage::{StorageError, TransactionLog};
use crate::types::{OrderId, WalletId};

/// In-memory append-only transaction log, partitioned by wallet.
pub struct TransactionStorage {
    entries: DashMap<WalletId, Vec<WalletTransaction>>,
    /// First refund logged for each order, whichever wallet received it.
    refunds: DashMap<OrderId, WalletTransaction>,
    sequence: AtomicU64
}

impl TransactionStorage {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            refunds: DashMap::new(),
            sequence: AtomicU64::new(1)
        }
    }
}

impl Default for TransactionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionLog for TransactionStorage {
    fn append(&self, entry: NewTransaction) -> Result<WalletTransaction, StorageError> {
        let mut partition = self.entries.entry(entry.wallet_id).or_default();

        //NOTE: Ids are taken while the partition is locked so per-wallet order follows id order.
        let transaction = entry.into_transaction(self.sequence.fetch_add(1, Ordering::Relaxed));
        partition.push(transaction.clone());

        if let (TransactionType::Refund, Some(Reference::Order(order_id))) = (transaction.transaction_type, transaction.reference) {
            self.refunds.entry(order_id).or_insert_with(|| transaction.clone());
        }

        Ok(transaction)
    }

    fn entries(&self, wallet_id: WalletId) -> Result<Vec<WalletTransaction>, StorageError> {
        Ok(self.entries.get(&wallet_id).map(|partition| partition.value().clone()).unwrap_or_default())
    }

    fn find_by_reference(
        &self,
        wallet_id: WalletId,
        transaction_type: TransactionType,
        reference: Reference
    ) -> Result<Option<WalletTransaction>, StorageError> {
        let Some(partition) = self.entries.get(&wallet_id) else {
            return Ok(None)
        };

        Ok(partition.iter()
            .find(|transaction| transaction.transaction_type == transaction_type && transaction.reference == Some(reference))
            .cloned())
    }

    fn find_refund_for_order(&self, order_id: OrderId) -> Result<Option<WalletTransaction>, StorageError> {
        Ok(self.refunds.get(&order_id).map(|refund| refund.value().clone()))
    }
}
