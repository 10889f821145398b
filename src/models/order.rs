use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::WalletOwner;
use crate::types::{Monetary, OrderId, ShopId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid through the third-party payment processor.
    Gateway,
    /// Cash or point-of-sale payment taken by the shop.
    Cash
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "gateway" => Ok(Self::Gateway),
            "cash" | "pos" => Ok(Self::Cash),
            other => Err(format!("unknown payment method [{other}]"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Completed,
    Cancelled
}

/// An order as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub shop_id: ShopId,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub total_amount: Monetary,
    pub platform_fee: Monetary
}

impl OrderRecord {
    pub fn completed(event: &OrderCompleted) -> Self {
        Self {
            order_id: event.order_id,
            shop_id: event.shop_id,
            payment_method: event.payment_method,
            status: OrderStatus::Completed,
            total_amount: event.total_amount,
            platform_fee: event.platform_fee
        }
    }

    /// What the shop keeps after the platform fee.
    pub fn net_income(&self) -> Option<Monetary> {
        self.total_amount.checked_sub(self.platform_fee)
    }

    pub fn counts_as_gateway_income(&self) -> bool {
        self.payment_method == PaymentMethod::Gateway && self.status == OrderStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCompleted {
    pub order_id: OrderId,
    pub shop_id: ShopId,
    pub payment_method: PaymentMethod,
    pub total_amount: Monetary,
    pub platform_fee: Monetary
}

/// The buyer an order refund goes back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchaser {
    Registered(UserId),
    Guest(String)
}

impl Purchaser {
    pub fn owner(&self) -> WalletOwner {
        match self {
            Self::Registered(user_id) => WalletOwner::User(*user_id),
            Self::Guest(email) => WalletOwner::guest(email)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub total_amount: Monetary,
    pub buyer: Purchaser
}
