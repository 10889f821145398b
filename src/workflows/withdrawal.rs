use tracing::{debug, error, warn};

use crate::models::{
    Actor, Decision, NewTransaction, NewWithdrawal, WalletError, Withdrawal, WithdrawalDecided, WithdrawalFilter,
    WithdrawalRequested
};
use crate::types::{Monetary, WalletId, WithdrawalId};
use crate::workflows::Ledger;

/// Default payout threshold.
pub const MINIMUM_WITHDRAWAL: i64 = 20_000;

const ABORTED_NOTE: &str = "withdrawal aborted: ledger entry could not be written";

/// Request → pending → approved | rejected.
///
/// Funds are reserved (debited) when the request is made so the same balance cannot back two
/// pending requests. Approval commits the reservation, rejection releases it with a refund entry.
#[derive(Clone)]
pub struct WithdrawalWorkflow {
    ledger: Ledger,
    minimum: Monetary
}

impl WithdrawalWorkflow {
    pub fn new(ledger: Ledger, minimum: Monetary) -> Self {
        Self { ledger, minimum }
    }

    pub fn minimum(&self) -> Monetary {
        self.minimum
    }

    /// Reserves the amount and opens a pending withdrawal.
    ///
    /// # Errors
    /// Validation failures (`BelowMinimumWithdrawal`, `InsufficientFunds`, `InvalidBankDetails`,
    /// `GuestWithdrawal`, `Unauthorized`) are raised before any write. A storage failure after the
    /// debit is compensated by crediting the amount back.
    pub fn request(&self, actor: &Actor, request: &WithdrawalRequested) -> Result<Withdrawal, WalletError> {
        let wallet_id = request.wallet_id;
        let amount = request.amount;

        if !amount.is_positive() {
            return Err(WalletError::invalid_amount(amount, "withdrawal amount must be positive"))
        }

        if amount < self.minimum {
            return Err(WalletError::below_minimum(wallet_id, amount, self.minimum))
        }

        let wallet = self.ledger.wallet(wallet_id)?;

        if !actor.owns(&wallet) {
            return Err(WalletError::unauthorized(actor, "request a withdrawal from this wallet"))
        }

        if !wallet.can_withdraw() {
            return Err(WalletError::guest_withdrawal(wallet_id))
        }

        if !request.bank.is_complete() {
            return Err(WalletError::invalid_bank_details(wallet_id))
        }

        if wallet.balance < amount {
            return Err(WalletError::insufficient_funds(&wallet, amount))
        }

        self.ledger.wallets.debit(wallet_id, amount)?;

        let new_withdrawal = NewWithdrawal { wallet_id, amount, bank: request.bank.clone() };
        let withdrawal = match self.ledger.withdrawals.create(new_withdrawal) {
            Ok(withdrawal) => withdrawal,
            Err(error) => {
                self.release(wallet_id, amount);
                return Err(error.into())
            }
        };

        if let Err(error) = self.ledger.transactions.append(NewTransaction::withdrawal(&withdrawal)) {
            self.release(wallet_id, amount);

            if let Err(close_error) = self.ledger.withdrawals.decide(withdrawal.id, &Decision::reject(ABORTED_NOTE)) {
                error!("Withdrawal [{}] left pending without a ledger entry: {close_error}", withdrawal.id);
            }

            return Err(error.into())
        }

        debug!("Withdrawal [{}] of {amount} from wallet [{wallet_id}] is pending", withdrawal.id);

        Ok(withdrawal)
    }

    /// Commits a reservation. Funds already left the balance at request time.
    pub fn approve(&self, actor: &Actor, withdrawal_id: WithdrawalId) -> Result<Withdrawal, WalletError> {
        if !actor.is_admin() {
            return Err(WalletError::unauthorized(actor, "approve withdrawals"))
        }

        let (withdrawal, changed) = self.ledger.withdrawals.decide(withdrawal_id, &Decision::Approve)?;

        if changed {
            debug!("Withdrawal [{withdrawal_id}] approved");
        }

        Ok(withdrawal)
    }

    /// Releases a reservation back to the wallet and records why.
    pub fn reject(&self, actor: &Actor, withdrawal_id: WithdrawalId, note: &str) -> Result<Withdrawal, WalletError> {
        if !actor.is_admin() {
            return Err(WalletError::unauthorized(actor, "reject withdrawals"))
        }

        if note.trim().is_empty() {
            return Err(WalletError::note_required(withdrawal_id))
        }

        let (withdrawal, changed) = self.ledger.withdrawals.decide(withdrawal_id, &Decision::reject(note))?;

        if !changed {
            return Ok(withdrawal)
        }

        if let Err(error) = self.ledger.post(NewTransaction::withdrawal_refund(&withdrawal)) {
            warn!("Refund for rejected withdrawal [{withdrawal_id}] failed, reopening: {error}");

            if let Err(reopen_error) = self.ledger.withdrawals.reopen(withdrawal_id) {
                error!("Withdrawal [{withdrawal_id}] is rejected but was never refunded: {reopen_error}");
            }

            return Err(error)
        }

        debug!("Withdrawal [{withdrawal_id}] rejected, {} returned to wallet [{}]", withdrawal.amount, withdrawal.wallet_id);

        Ok(withdrawal)
    }

    pub fn decide(&self, actor: &Actor, decided: &WithdrawalDecided) -> Result<Withdrawal, WalletError> {
        match &decided.decision {
            Decision::Approve => self.approve(actor, decided.withdrawal_id),
            Decision::Reject { note } => self.reject(actor, decided.withdrawal_id, note)
        }
    }

    pub fn list(&self, filter: &WithdrawalFilter) -> Result<Vec<Withdrawal>, WalletError> {
        Ok(self.ledger.withdrawals.list(filter)?)
    }

    fn release(&self, wallet_id: WalletId, amount: Monetary) {
        match self.ledger.wallets.credit(wallet_id, amount) {
            Ok(_) => warn!("Released {amount} back to wallet [{wallet_id}] after a failed withdrawal"),
            Err(error) => error!("Could not release {amount} back to wallet [{wallet_id}]: {error}")
        }
    }
}
