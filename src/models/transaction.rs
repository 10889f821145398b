use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Wallet, Withdrawal};
use crate::types::{Monetary, OrderId, TransactionId, WalletId, WithdrawalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    SalesRevenue,
    Deposit,
    Withdrawal,
    Refund,
    Payment,
    PlatformFee
}

impl Display for TransactionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SalesRevenue => "sales_revenue",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Refund => "refund",
            Self::Payment => "payment",
            Self::PlatformFee => "platform_fee"
        };

        formatter.write_str(name)
    }
}

/// The economic event a ledger entry points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reference {
    Order(OrderId),
    Withdrawal(WithdrawalId),
    Wallet(WalletId)
}

impl Display for Reference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(order_id) => write!(formatter, "order:{order_id}"),
            Self::Withdrawal(withdrawal_id) => write!(formatter, "withdrawal:{withdrawal_id}"),
            Self::Wallet(wallet_id) => write!(formatter, "wallet:{wallet_id}")
        }
    }
}

/// An immutable ledger entry as stored in the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletTransaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    /// Positive for credits, negative for debits.
    pub amount: Monetary,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub reference: Option<Reference>,
    pub created_at: DateTime<Utc>
}

/// A ledger entry that has not been appended yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub amount: Monetary,
    pub transaction_type: TransactionType,
    pub description: String,
    pub reference: Option<Reference>
}

impl NewTransaction {
    pub fn new(wallet_id: WalletId, amount: Monetary, transaction_type: TransactionType, description: impl Into<String>) -> Self {
        Self {
            wallet_id,
            amount,
            transaction_type,
            description: description.into(),
            reference: None
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn sales_revenue(wallet_id: WalletId, order_id: OrderId, total: Monetary) -> Self {
        Self::new(wallet_id, total, TransactionType::SalesRevenue, format!("sales revenue for order {order_id}"))
            .with_reference(Reference::Order(order_id))
    }

    pub fn platform_fee(wallet_id: WalletId, order_id: OrderId, fee: Monetary) -> Self {
        Self::new(wallet_id, -fee, TransactionType::PlatformFee, format!("platform fee for order {order_id}"))
            .with_reference(Reference::Order(order_id))
    }

    pub fn order_refund(wallet: &Wallet, order_id: OrderId, amount: Monetary) -> Self {
        let description = if wallet.owner.is_guest() {
            format!("refund for order {order_id} held for {}", wallet.owner)
        } else {
            format!("refund for order {order_id}")
        };

        Self::new(wallet.id, amount, TransactionType::Refund, description)
            .with_reference(Reference::Order(order_id))
    }

    pub fn withdrawal(withdrawal: &Withdrawal) -> Self {
        Self::new(
            withdrawal.wallet_id,
            -withdrawal.amount,
            TransactionType::Withdrawal,
            format!("withdrawal to {} {}", withdrawal.bank.bank_name, withdrawal.bank.masked_account_number())
        )
        .with_reference(Reference::Withdrawal(withdrawal.id))
    }

    pub fn withdrawal_refund(withdrawal: &Withdrawal) -> Self {
        Self::new(withdrawal.wallet_id, withdrawal.amount, TransactionType::Refund, "rejected withdrawal refund")
            .with_reference(Reference::Withdrawal(withdrawal.id))
    }

    /// Moves a claimed guest balance out of the guest wallet.
    pub fn claim_out(guest_wallet_id: WalletId, user_wallet_id: WalletId, amount: Monetary) -> Self {
        Self::new(guest_wallet_id, -amount, TransactionType::Payment, format!("guest balance claimed into wallet {user_wallet_id}"))
            .with_reference(Reference::Wallet(user_wallet_id))
    }

    /// Lands a claimed guest balance in the user's wallet.
    pub fn claim_in(user_wallet_id: WalletId, guest_wallet_id: WalletId, amount: Monetary) -> Self {
        Self::new(user_wallet_id, amount, TransactionType::Deposit, format!("guest balance claimed from wallet {guest_wallet_id}"))
            .with_reference(Reference::Wallet(guest_wallet_id))
    }

    pub fn into_transaction(self, id: TransactionId) -> WalletTransaction {
        WalletTransaction {
            id,
            wallet_id: self.wallet_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            description: self.description,
            reference: self.reference,
            created_at: Utc::now()
        }
    }
}
