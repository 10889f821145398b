use std::time::Duration;

use thiserror::Error;

use crate::models::{Actor, Wallet, WalletOwner, Withdrawal, WithdrawalStatus};
use crate::storage::StorageError;
use crate::types::{Monetary, WalletId, WithdrawalId};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Insufficient funds in wallet [{wallet_id}]: requested {requested}, available {available}, short by {shortfall}")]
    InsufficientFunds {
        wallet_id: WalletId,
        requested: Monetary,
        available: Monetary,
        shortfall: Monetary
    },
    #[error("Withdrawal of {requested} from wallet [{wallet_id}] is below the minimum of {minimum}")]
    BelowMinimumWithdrawal {
        wallet_id: WalletId,
        requested: Monetary,
        minimum: Monetary
    },
    #[error("Wallet [{wallet_id}] was not found")]
    WalletNotFound {
        wallet_id: WalletId
    },
    #[error("No wallet exists for owner [{owner}]")]
    OwnerNotFound {
        owner: WalletOwner
    },
    #[error("Withdrawal [{withdrawal_id}] was not found")]
    WithdrawalNotFound {
        withdrawal_id: WithdrawalId
    },
    #[error("Actor [{actor}] is not allowed to {action}")]
    Unauthorized {
        actor: String,
        action: &'static str
    },
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        amount: Monetary,
        reason: &'static str
    },
    #[error("Bank details for a withdrawal from wallet [{wallet_id}] are incomplete")]
    InvalidBankDetails {
        wallet_id: WalletId
    },
    #[error("Rejecting withdrawal [{withdrawal_id}] requires a note")]
    NoteRequired {
        withdrawal_id: WithdrawalId
    },
    #[error("Withdrawal [{withdrawal_id}] cannot move from [{from}] to [{to}]")]
    InvalidTransition {
        withdrawal_id: WithdrawalId,
        from: WithdrawalStatus,
        to: WithdrawalStatus
    },
    #[error("Wallet [{wallet_id}] holds a guest balance and must be claimed before withdrawing")]
    GuestWithdrawal {
        wallet_id: WalletId
    },
    #[error("Owner [{owner}] already has a wallet")]
    WalletAlreadyOwned {
        owner: WalletOwner
    },
    #[error("[{value}] is not a wallet owner reference")]
    InvalidOwner {
        value: String
    },
    #[error("Numeric overflow occurred for wallet [{wallet_id}]")]
    Overflow {
        wallet_id: WalletId
    },
    #[error("Operation on wallet [{wallet_id}] timed out after {elapsed:?}")]
    Timeout {
        wallet_id: WalletId,
        elapsed: Duration
    },
    #[error("Wallet actor for [{wallet_id}] is not running")]
    EngineUnavailable {
        wallet_id: WalletId
    },
    #[error(transparent)]
    Storage(#[from] StorageError)
}

impl WalletError {
    //NOTE: Most variants are built from a wallet or withdrawal the caller already holds,
    //      so the constructors pull the fields out for them.

    pub fn insufficient_funds(wallet: &Wallet, requested: Monetary) -> Self {
        Self::InsufficientFunds {
            wallet_id: wallet.id,
            requested,
            available: wallet.balance,
            shortfall: requested.checked_sub(wallet.balance).unwrap_or(requested)
        }
    }

    pub fn below_minimum(wallet_id: WalletId, requested: Monetary, minimum: Monetary) -> Self {
        Self::BelowMinimumWithdrawal { wallet_id, requested, minimum }
    }

    pub fn wallet_not_found(wallet_id: WalletId) -> Self {
        Self::WalletNotFound { wallet_id }
    }

    pub fn owner_not_found(owner: &WalletOwner) -> Self {
        Self::OwnerNotFound { owner: owner.clone() }
    }

    pub fn withdrawal_not_found(withdrawal_id: WithdrawalId) -> Self {
        Self::WithdrawalNotFound { withdrawal_id }
    }

    pub fn unauthorized(actor: &Actor, action: &'static str) -> Self {
        Self::Unauthorized { actor: actor.to_string(), action }
    }

    pub fn invalid_amount(amount: Monetary, reason: &'static str) -> Self {
        Self::InvalidAmount { amount, reason }
    }

    pub fn invalid_bank_details(wallet_id: WalletId) -> Self {
        Self::InvalidBankDetails { wallet_id }
    }

    pub fn note_required(withdrawal_id: WithdrawalId) -> Self {
        Self::NoteRequired { withdrawal_id }
    }

    pub fn invalid_transition(withdrawal: &Withdrawal, to: WithdrawalStatus) -> Self {
        Self::InvalidTransition {
            withdrawal_id: withdrawal.id,
            from: withdrawal.status,
            to
        }
    }

    pub fn guest_withdrawal(wallet_id: WalletId) -> Self {
        Self::GuestWithdrawal { wallet_id }
    }

    pub fn wallet_already_owned(owner: &WalletOwner) -> Self {
        Self::WalletAlreadyOwned { owner: owner.clone() }
    }

    pub fn invalid_owner(value: &str) -> Self {
        Self::InvalidOwner { value: value.to_string() }
    }

    pub fn overflow(wallet_id: WalletId) -> Self {
        Self::Overflow { wallet_id }
    }

    pub fn timeout(wallet_id: WalletId, elapsed: Duration) -> Self {
        Self::Timeout { wallet_id, elapsed }
    }

    pub fn engine_unavailable(wallet_id: WalletId) -> Self {
        Self::EngineUnavailable { wallet_id }
    }

    /// Infrastructure failures the caller layer has to deal with.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Timeout { .. } | Self::EngineUnavailable { .. })
    }

    /// Failures caused by the request itself. Retrying them unchanged never helps.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::BelowMinimumWithdrawal { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidBankDetails { .. }
                | Self::NoteRequired { .. }
                | Self::GuestWithdrawal { .. }
                | Self::InvalidOwner { .. }
        )
    }
}
