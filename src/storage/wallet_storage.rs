use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::models::{Wallet, WalletError, WalletOwner};
use crate::storage::{StorageError, WalletStore};
use crate::types::{Monetary, WalletId};

/// In-memory wallet store.
///
/// Balance checks and updates happen while holding the shard write lock for the wallet,
/// which gives the same guarantee as a conditional `UPDATE ... WHERE balance >= amount`.
pub struct WalletStorage {
    wallets: DashMap<WalletId, Wallet>,
    owners: DashMap<WalletOwner, WalletId>,
    sequence: AtomicU64
}

impl WalletStorage {
    pub fn new() -> Self {
        Self {
            wallets: DashMap::new(),
            owners: DashMap::new(),
            sequence: AtomicU64::new(1)
        }
    }

    fn mutate<F>(&self, wallet_id: WalletId, mutation: F) -> Result<Wallet, WalletError>
    where
        F: FnOnce(&mut Wallet) -> Result<(), WalletError>,
    {
        let mut wallet = self.wallets.get_mut(&wallet_id)
            .ok_or_else(|| WalletError::wallet_not_found(wallet_id))?;

        mutation(wallet.value_mut())?;

        Ok(wallet.value().clone())
    }
}

impl Default for WalletStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletStore for WalletStorage {
    fn get_or_create(&self, owner: &WalletOwner) -> Result<Wallet, StorageError> {
        let wallet_id = *self.owners.entry(owner.clone()).or_insert_with(|| {
            let wallet_id = self.sequence.fetch_add(1, Ordering::Relaxed);
            self.wallets.insert(wallet_id, Wallet::new(wallet_id, owner.clone()));
            debug!("Created wallet [{wallet_id}] for [{owner}]");
            wallet_id
        });

        self.wallets.get(&wallet_id)
            .map(|wallet| wallet.clone())
            .ok_or_else(|| StorageError::conflict(format!("owner [{owner}] points at missing wallet [{wallet_id}]")))
    }

    fn find(&self, wallet_id: WalletId) -> Result<Option<Wallet>, StorageError> {
        Ok(self.wallets.get(&wallet_id).map(|wallet| wallet.clone()))
    }

    fn find_by_owner(&self, owner: &WalletOwner) -> Result<Option<Wallet>, StorageError> {
        let Some(wallet_id) = self.owners.get(owner).map(|entry| *entry.value()) else {
            return Ok(None)
        };

        self.find(wallet_id)
    }

    fn credit(&self, wallet_id: WalletId, amount: Monetary) -> Result<Wallet, WalletError> {
        self.mutate(wallet_id, |wallet| wallet.credit(amount))
    }

    fn debit(&self, wallet_id: WalletId, amount: Monetary) -> Result<Wallet, WalletError> {
        self.mutate(wallet_id, |wallet| wallet.debit(amount))
    }

    fn set_balance(&self, wallet_id: WalletId, balance: Monetary) -> Result<Wallet, WalletError> {
        self.mutate(wallet_id, |wallet| {
            wallet.force_balance(balance);
            Ok(())
        })
    }

    fn transfer_ownership(&self, wallet_id: WalletId, owner: WalletOwner) -> Result<Wallet, WalletError> {
        let previous_owner = self.wallets.get(&wallet_id)
            .map(|wallet| wallet.owner.clone())
            .ok_or_else(|| WalletError::wallet_not_found(wallet_id))?;

        //NOTE: The owner index entry must be released before touching the old key, both may share a shard.
        match self.owners.entry(owner.clone()) {
            Entry::Occupied(_) => return Err(WalletError::wallet_already_owned(&owner)),
            Entry::Vacant(entry) => {
                entry.insert(wallet_id);
            }
        }

        let wallet = self.mutate(wallet_id, |wallet| {
            wallet.owner = owner.clone();
            wallet.updated_at = Utc::now();
            Ok(())
        });

        let wallet = match wallet {
            Ok(wallet) => wallet,
            Err(error) => {
                self.owners.remove(&owner);
                return Err(error)
            }
        };

        self.owners.remove(&previous_owner);
        debug!("Wallet [{wallet_id}] moved from [{previous_owner}] to [{owner}]");

        Ok(wallet)
    }

    fn wallets(&self) -> Result<Vec<Wallet>, StorageError> {
        let mut wallets: Vec<Wallet> = self.wallets.iter().map(|item| item.value().clone()).collect();
        wallets.sort_by_key(|wallet| wallet.id);

        Ok(wallets)
    }
}
