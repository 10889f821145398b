use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::models::{Decision, NewWithdrawal, WalletError, Withdrawal, WithdrawalFilter};
use crate::storage::{StorageError, WithdrawalStore};
use crate::types::WithdrawalId;

pub struct WithdrawalStorage {
    withdrawals: DashMap<WithdrawalId, Withdrawal>,
    sequence: AtomicU64
}

impl WithdrawalStorage {
    pub fn new() -> Self {
        Self {
            withdrawals: DashMap::new(),
            sequence: AtomicU64::new(1)
        }
    }
}

impl Default for WithdrawalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl WithdrawalStore for WithdrawalStorage {
    fn create(&self, request: NewWithdrawal) -> Result<Withdrawal, StorageError> {
        let withdrawal = Withdrawal::new(self.sequence.fetch_add(1, Ordering::Relaxed), request);
        self.withdrawals.insert(withdrawal.id, withdrawal.clone());

        Ok(withdrawal)
    }

    fn find(&self, withdrawal_id: WithdrawalId) -> Result<Option<Withdrawal>, StorageError> {
        Ok(self.withdrawals.get(&withdrawal_id).map(|withdrawal| withdrawal.value().clone()))
    }

    fn decide(&self, withdrawal_id: WithdrawalId, decision: &Decision) -> Result<(Withdrawal, bool), WalletError> {
        let mut withdrawal = self.withdrawals.get_mut(&withdrawal_id)
            .ok_or_else(|| WalletError::withdrawal_not_found(withdrawal_id))?;

        let changed = withdrawal.value_mut().decide(decision)?;

        Ok((withdrawal.value().clone(), changed))
    }

    fn reopen(&self, withdrawal_id: WithdrawalId) -> Result<Withdrawal, WalletError> {
        let mut withdrawal = self.withdrawals.get_mut(&withdrawal_id)
            .ok_or_else(|| WalletError::withdrawal_not_found(withdrawal_id))?;

        withdrawal.value_mut().reopen();

        Ok(withdrawal.value().clone())
    }

    fn list(&self, filter: &WithdrawalFilter) -> Result<Vec<Withdrawal>, StorageError> {
        let mut withdrawals: Vec<Withdrawal> = self.withdrawals.iter()
            .filter(|item| filter.matches(item.value()))
            .map(|item| item.value().clone())
            .collect();

        withdrawals.sort_by(|left, right| right.id.cmp(&left.id));

        Ok(withdrawals)
    }
}
