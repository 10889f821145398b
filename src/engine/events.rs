use std::fmt;
use std::fmt::{Display, Formatter};

use serde::Deserialize;

use crate::engine::EventError;
use crate::models::{
    Actor, BankDetails, Decision, OrderCancelled, OrderCompleted, PaymentMethod, Purchaser, WalletOwner,
    WithdrawalDecided
};
use crate::types::{Monetary, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrderCompleted,
    OrderCancelled,
    WithdrawalRequested,
    WithdrawalApproved,
    WithdrawalRejected,
    GuestClaimed,
    Reconcile
}

impl Display for EventKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrderCompleted => "order_completed",
            Self::OrderCancelled => "order_cancelled",
            Self::WithdrawalRequested => "withdrawal_requested",
            Self::WithdrawalApproved => "withdrawal_approved",
            Self::WithdrawalRejected => "withdrawal_rejected",
            Self::GuestClaimed => "guest_claimed",
            Self::Reconcile => "reconcile"
        };

        formatter.write_str(name)
    }
}

/// One row of an event replay file: `event,actor,owner,reference,amount,fee,method,detail`.
///
/// Columns an event does not use are left empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventRecord {
    pub event: EventKind,
    pub actor: String,
    pub owner: Option<String>,
    pub reference: Option<u64>,
    pub amount: Option<Monetary>,
    pub fee: Option<Monetary>,
    pub method: Option<String>,
    pub detail: Option<String>
}

/// Everything the engine can be asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    OrderCompleted(OrderCompleted),
    OrderCancelled(OrderCancelled),
    WithdrawalRequested {
        owner: WalletOwner,
        amount: Monetary,
        bank: BankDetails
    },
    WithdrawalDecided(WithdrawalDecided),
    GuestClaimed {
        email: String,
        user_id: UserId
    },
    Reconcile {
        owner: WalletOwner
    }
}

impl EventRecord {
    /// Validates the columns the event needs and builds it together with the acting party.
    pub fn decode(&self) -> Result<(Actor, LedgerEvent), EventError> {
        let kind = self.event;
        let actor = self.actor.parse::<Actor>()
            .map_err(|_| EventError::invalid(kind, "actor", self.actor.as_str()))?;

        let event = match kind {
            EventKind::OrderCompleted => {
                let owner = self.owner()?;
                let shop_id = owner.shop_id()
                    .ok_or_else(|| EventError::invalid(kind, "owner", owner.to_string()))?;
                let method = self.method.as_deref().ok_or_else(|| EventError::missing(kind, "method"))?;
                let payment_method = method.parse::<PaymentMethod>()
                    .map_err(|_| EventError::invalid(kind, "method", method))?;

                LedgerEvent::OrderCompleted(OrderCompleted {
                    order_id: self.reference()?,
                    shop_id,
                    payment_method,
                    total_amount: self.amount()?,
                    platform_fee: self.fee.unwrap_or(Monetary::ZERO)
                })
            }
            EventKind::OrderCancelled => {
                let buyer = match self.owner()? {
                    WalletOwner::User(user_id) => Purchaser::Registered(user_id),
                    WalletOwner::Guest(email) => Purchaser::Guest(email),
                    shop => return Err(EventError::invalid(kind, "owner", shop.to_string()))
                };

                LedgerEvent::OrderCancelled(OrderCancelled {
                    order_id: self.reference()?,
                    total_amount: self.amount()?,
                    buyer
                })
            }
            EventKind::WithdrawalRequested => {
                let detail = self.detail.as_deref().ok_or_else(|| EventError::missing(kind, "detail"))?;
                let bank = detail.parse::<BankDetails>()
                    .map_err(|_| EventError::invalid(kind, "detail", detail))?;

                LedgerEvent::WithdrawalRequested {
                    owner: self.owner()?,
                    amount: self.amount()?,
                    bank
                }
            }
            EventKind::WithdrawalApproved => LedgerEvent::WithdrawalDecided(WithdrawalDecided {
                withdrawal_id: self.reference()?,
                decision: Decision::Approve
            }),
            //NOTE: A blank note is left for the workflow to refuse so the rejection is reported as NoteRequired.
            EventKind::WithdrawalRejected => LedgerEvent::WithdrawalDecided(WithdrawalDecided {
                withdrawal_id: self.reference()?,
                decision: Decision::reject(self.detail.clone().unwrap_or_default())
            }),
            EventKind::GuestClaimed => {
                let WalletOwner::Guest(email) = self.owner()? else {
                    return Err(EventError::invalid(kind, "owner", self.owner.clone().unwrap_or_default()))
                };

                LedgerEvent::GuestClaimed { email, user_id: self.reference()? }
            }
            EventKind::Reconcile => LedgerEvent::Reconcile { owner: self.owner()? }
        };

        Ok((actor, event))
    }

    fn owner(&self) -> Result<WalletOwner, EventError> {
        let value = self.owner.as_deref().ok_or_else(|| EventError::missing(self.event, "owner"))?;

        value.parse().map_err(|_| EventError::invalid(self.event, "owner", value))
    }

    fn reference(&self) -> Result<u64, EventError> {
        self.reference.ok_or_else(|| EventError::missing(self.event, "reference"))
    }

    fn amount(&self) -> Result<Monetary, EventError> {
        self.amount.ok_or_else(|| EventError::missing(self.event, "amount"))
    }
}
