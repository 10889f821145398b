use tracing::{debug, error, info, warn};

use crate::models::{
    Actor, NewTransaction, OrderCancelled, OrderRecord, Reference, TransactionType, Wallet, WalletError, WalletOwner,
    WalletTransaction
};
use crate::types::{Monetary, OrderId, UserId, WalletId};
use crate::workflows::Ledger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    Credited {
        transaction: WalletTransaction,
        /// The order book entry that stopped counting as income, if the order was known.
        cancelled: Option<OrderRecord>
    },
    /// The order had already been refunded; nothing was credited.
    AlreadyRefunded(WalletTransaction)
}

impl RefundOutcome {
    pub fn transaction(&self) -> &WalletTransaction {
        match self {
            Self::Credited { transaction, .. } | Self::AlreadyRefunded(transaction) => transaction
        }
    }

    pub fn is_credited(&self) -> bool {
        matches!(self, Self::Credited { .. })
    }
}

/// Sends refunds for cancelled orders to the buyer's wallet, or to a guest wallet keyed by
/// email when the buyer never registered.
#[derive(Clone)]
pub struct RefundRouter {
    ledger: Ledger
}

impl RefundRouter {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// The wallet a cancellation will be refunded into.
    pub fn destination(&self, event: &OrderCancelled) -> Result<Wallet, WalletError> {
        Ok(self.ledger.wallets.get_or_create(&event.buyer.owner())?)
    }

    /// The refund already logged for an order, in whichever wallet it now sits.
    pub fn existing_refund(&self, order_id: OrderId) -> Result<Option<WalletTransaction>, WalletError> {
        Ok(self.ledger.transactions.find_refund_for_order(order_id)?)
    }

    /// Credits the buyer once per order.
    pub fn refund(&self, actor: &Actor, event: &OrderCancelled) -> Result<RefundOutcome, WalletError> {
        if !actor.is_privileged() {
            return Err(WalletError::unauthorized(actor, "refund orders"))
        }

        if !event.total_amount.is_positive() {
            return Err(WalletError::invalid_amount(event.total_amount, "refund amount must be positive"))
        }

        if let Some(existing) = self.existing_refund(event.order_id)? {
            debug!("Order [{}] was already refunded to wallet [{}]", event.order_id, existing.wallet_id);
            return Ok(RefundOutcome::AlreadyRefunded(existing))
        }

        let wallet = self.destination(event)?;

        //NOTE: The order leaves the gateway income set before money moves, so a failure here leaves nothing to undo.
        let cancelled = self.ledger.orders.mark_cancelled(event.order_id)?;

        let transaction = self.ledger.post(NewTransaction::order_refund(&wallet, event.order_id, event.total_amount))?;

        debug!("Refunded {} for order [{}] to [{}]", event.total_amount, event.order_id, wallet.owner);

        Ok(RefundOutcome::Credited { transaction, cancelled })
    }

    pub fn authorize_claim(&self, actor: &Actor) -> Result<(), WalletError> {
        if !actor.is_privileged() {
            return Err(WalletError::unauthorized(actor, "claim guest balances"))
        }

        Ok(())
    }

    /// Hands a guest balance to the user who just registered with that email.
    ///
    /// If the user has no wallet yet the guest wallet simply changes owner and keeps its history.
    /// Otherwise the balance moves across with a pair of entries.
    pub fn claim(&self, actor: &Actor, email: &str, user_id: UserId) -> Result<Wallet, WalletError> {
        self.authorize_claim(actor)?;

        let guest_owner = WalletOwner::guest(email);
        let guest = self.ledger.wallets.find_by_owner(&guest_owner)?
            .ok_or_else(|| WalletError::owner_not_found(&guest_owner))?;
        let user_owner = WalletOwner::User(user_id);

        let Some(user_wallet) = self.ledger.wallets.find_by_owner(&user_owner)? else {
            let claimed = self.ledger.wallets.transfer_ownership(guest.id, user_owner)?;
            info!("Guest wallet [{}] claimed by user [{user_id}]", guest.id);
            return Ok(claimed)
        };

        let amount = self.release_guest_balance(guest.id, user_wallet.id)?;

        if amount.is_zero() {
            return self.ledger.wallet(user_wallet.id)
        }

        match self.deposit_guest_balance(user_wallet.id, guest.id, amount) {
            Ok(wallet) => Ok(wallet),
            Err(error) => {
                if let Err(restore_error) = self.restore_guest_balance(guest.id, user_wallet.id, amount) {
                    error!("Guest wallet [{}] lost {amount} in a failed claim: {restore_error}", guest.id);
                }

                Err(error)
            }
        }
    }

    /// First half of a merge: empties the guest wallet and returns what was taken.
    pub fn release_guest_balance(&self, guest_wallet_id: WalletId, user_wallet_id: WalletId) -> Result<Monetary, WalletError> {
        let amount = self.ledger.wallet(guest_wallet_id)?.balance;

        if amount.is_zero() {
            return Ok(amount)
        }

        self.ledger.post(NewTransaction::claim_out(guest_wallet_id, user_wallet_id, amount))?;

        Ok(amount)
    }

    /// Second half of a merge: lands the released amount in the user's wallet.
    pub fn deposit_guest_balance(&self, user_wallet_id: WalletId, guest_wallet_id: WalletId, amount: Monetary) -> Result<Wallet, WalletError> {
        self.ledger.post(NewTransaction::claim_in(user_wallet_id, guest_wallet_id, amount))?;

        info!("Moved {amount} from guest wallet [{guest_wallet_id}] into wallet [{user_wallet_id}]");

        self.ledger.wallet(user_wallet_id)
    }

    /// Undoes [`RefundRouter::release_guest_balance`] when the deposit could not be made.
    pub fn restore_guest_balance(&self, guest_wallet_id: WalletId, user_wallet_id: WalletId, amount: Monetary) -> Result<(), WalletError> {
        let reversal = NewTransaction::new(guest_wallet_id, amount, TransactionType::Deposit, "reversal of failed guest claim")
            .with_reference(Reference::Wallet(user_wallet_id));

        self.ledger.post(reversal)?;

        warn!("Restored {amount} to guest wallet [{guest_wallet_id}] after a failed claim");

        Ok(())
    }
}
