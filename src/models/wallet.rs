use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::errors::WalletError;
use crate::types::{Monetary, ShopId, UserId, WalletId};

/// Who a wallet belongs to.
///
/// Guest wallets hold refunds for buyers who checked out by email only. They behave like
/// any other wallet for crediting and reconciliation but cannot be withdrawn from until
/// claimed by a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletOwner {
    Shop(ShopId),
    User(UserId),
    Guest(String)
}

impl WalletOwner {
    /// Builds a guest owner with the email normalised for use as a key.
    pub fn guest(email: &str) -> Self {
        Self::Guest(email.trim().to_lowercase())
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }

    pub fn shop_id(&self) -> Option<ShopId> {
        match self {
            Self::Shop(shop_id) => Some(*shop_id),
            _ => None
        }
    }
}

impl Display for WalletOwner {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shop(shop_id) => write!(formatter, "shop:{shop_id}"),
            Self::User(user_id) => write!(formatter, "user:{user_id}"),
            Self::Guest(email) => write!(formatter, "guest:{email}")
        }
    }
}

impl FromStr for WalletOwner {
    type Err = WalletError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let Some((kind, key)) = value.split_once(':') else {
            return Err(WalletError::invalid_owner(value))
        };

        match kind {
            "shop" => key.parse().map(Self::Shop).map_err(|_| WalletError::invalid_owner(value)),
            "user" => key.parse().map(Self::User).map_err(|_| WalletError::invalid_owner(value)),
            "guest" if key.contains('@') => Ok(Self::guest(key)),
            _ => Err(WalletError::invalid_owner(value))
        }
    }
}

/// A balance record for a single owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner: WalletOwner,
    /// Never negative; every debit is funds-checked first.
    pub balance: Monetary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl Wallet {
    /// Creates an empty wallet for the given owner.
    pub fn new(id: WalletId, owner: WalletOwner) -> Self {
        let now = Utc::now();

        Self {
            id,
            owner,
            balance: Monetary::new(),
            created_at: now,
            updated_at: now
        }
    }

    pub fn can_withdraw(&self) -> bool {
        !self.owner.is_guest()
    }

    /// Increases the balance by a strictly positive amount.
    pub fn credit(&mut self, amount: Monetary) -> Result<(), WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::invalid_amount(amount, "credit amount must be positive"))
        }

        self.balance = self.balance.checked_add(amount)
            .ok_or_else(|| WalletError::overflow(self.id))?;
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Decreases the balance by a strictly positive amount.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` and leaves the balance untouched when the amount
    /// exceeds the current balance.
    pub fn debit(&mut self, amount: Monetary) -> Result<(), WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::invalid_amount(amount, "debit amount must be positive"))
        }

        if self.balance < amount {
            return Err(WalletError::insufficient_funds(self, amount))
        }

        self.balance = self.balance.checked_sub(amount)
            .ok_or_else(|| WalletError::overflow(self.id))?;
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Overwrites the balance with a recomputed value, clamped at zero.
    pub fn force_balance(&mut self, balance: Monetary) {
        self.balance = balance.clamp_non_negative();
        self.updated_at = Utc::now();
    }
}
