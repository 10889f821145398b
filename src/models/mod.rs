mod errors;
mod order;
mod transaction;
mod wallet;
mod withdrawal;

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub use errors::WalletError;
pub use order::{OrderCancelled, OrderCompleted, OrderRecord, OrderStatus, PaymentMethod, Purchaser};
pub use transaction::{NewTransaction, Reference, TransactionType, WalletTransaction};
pub use wallet::{Wallet, WalletOwner};
pub use withdrawal::{
    BankDetails, Decision, NewWithdrawal, Withdrawal, WithdrawalDecided, WithdrawalFilter, WithdrawalRequested,
    WithdrawalStatus
};

/// Whoever is asking for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Internal collaborators such as the order pipeline or a scheduled sync.
    System,
    Admin,
    Owner(WalletOwner)
}

impl Actor {
    /// May feed order events and trigger reconciliation.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::System | Self::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn owns(&self, wallet: &Wallet) -> bool {
        matches!(self, Self::Owner(owner) if *owner == wallet.owner)
    }
}

impl Display for Actor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => formatter.write_str("system"),
            Self::Admin => formatter.write_str("admin"),
            Self::Owner(owner) => write!(formatter, "{owner}")
        }
    }
}

impl FromStr for Actor {
    type Err = WalletError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "system" => Ok(Self::System),
            "admin" => Ok(Self::Admin),
            owner => owner.parse().map(Self::Owner)
        }
    }
}
