use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::errors::WalletError;
use crate::types::{Monetary, WalletId, WithdrawalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected
}

impl Display for WithdrawalStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected"
        };

        formatter.write_str(name)
    }
}

/// Destination account for a payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String
}

impl BankDetails {
    pub fn new(bank_name: impl Into<String>, account_number: impl Into<String>, account_holder: impl Into<String>) -> Self {
        Self {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            account_holder: account_holder.into()
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.bank_name, &self.account_number, &self.account_holder]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Last four digits only, for descriptions and logs.
    pub fn masked_account_number(&self) -> String {
        let digits: Vec<char> = self.account_number.trim().chars().collect();
        let visible: String = digits[digits.len().saturating_sub(4)..].iter().collect();

        format!("****{visible}")
    }
}

/// Parses the `bank|account|holder` form used by event files.
impl FromStr for BankDetails {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split('|').map(str::trim).collect();

        match parts.as_slice() {
            [bank_name, account_number, account_holder] => Ok(Self::new(*bank_name, *account_number, *account_holder)),
            _ => Err(format!("expected bank|account|holder, found [{value}]"))
        }
    }
}

/// An administrator's verdict on a pending withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { note: String }
}

impl Decision {
    pub fn reject(note: impl Into<String>) -> Self {
        Self::Reject { note: note.into() }
    }

    pub fn target(&self) -> WithdrawalStatus {
        match self {
            Self::Approve => WithdrawalStatus::Approved,
            Self::Reject { .. } => WithdrawalStatus::Rejected
        }
    }
}

/// A withdrawal that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub wallet_id: WalletId,
    pub amount: Monetary,
    pub bank: BankDetails
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub wallet_id: WalletId,
    pub amount: Monetary,
    pub status: WithdrawalStatus,
    pub bank: BankDetails,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>
}

impl Withdrawal {
    pub fn new(id: WithdrawalId, request: NewWithdrawal) -> Self {
        Self {
            id,
            wallet_id: request.wallet_id,
            amount: request.amount,
            status: WithdrawalStatus::Pending,
            bank: request.bank,
            admin_note: None,
            created_at: Utc::now(),
            decided_at: None
        }
    }

    /// Moves a pending withdrawal into its terminal state.
    ///
    /// Returns `Ok(false)` when the withdrawal already sits in the requested terminal state,
    /// so repeating a decision is a no-op.
    ///
    /// # Errors
    /// Returns `InvalidTransition` when asked to flip one terminal state into the other.
    pub fn decide(&mut self, decision: &Decision) -> Result<bool, WalletError> {
        let target = decision.target();

        if self.status == target {
            return Ok(false)
        }

        if self.status != WithdrawalStatus::Pending {
            return Err(WalletError::invalid_transition(self, target))
        }

        if let Decision::Reject { note } = decision {
            self.admin_note = Some(note.trim().to_string());
        }

        self.status = target;
        self.decided_at = Some(Utc::now());

        Ok(true)
    }

    /// Puts a decided withdrawal back to pending after a failed release.
    pub fn reopen(&mut self) {
        self.status = WithdrawalStatus::Pending;
        self.admin_note = None;
        self.decided_at = None;
    }
}

/// Owner-initiated request to pay a wallet balance out to a bank account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequested {
    pub wallet_id: WalletId,
    pub amount: Monetary,
    pub bank: BankDetails
}

/// Administrator decision on an existing withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalDecided {
    pub withdrawal_id: WithdrawalId,
    pub decision: Decision
}

/// Narrows a withdrawal listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawalFilter {
    pub status: Option<WithdrawalStatus>,
    pub wallet_id: Option<WalletId>
}

impl WithdrawalFilter {
    pub fn pending() -> Self {
        Self { status: Some(WithdrawalStatus::Pending), wallet_id: None }
    }

    pub fn for_wallet(wallet_id: WalletId) -> Self {
        Self { status: None, wallet_id: Some(wallet_id) }
    }

    pub fn matches(&self, withdrawal: &Withdrawal) -> bool {
        self.status.is_none_or(|status| status == withdrawal.status)
            && self.wallet_id.is_none_or(|wallet_id| wallet_id == withdrawal.wallet_id)
    }
}
