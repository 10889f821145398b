use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::models::{OrderRecord, OrderStatus};
use crate::storage::{OrderSource, StorageError};
use crate::types::{OrderId, ShopId};

/// In-memory order book standing in for the storefront's order table.
pub struct OrderStorage {
    orders: DashMap<OrderId, OrderRecord>
}

impl OrderStorage {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new()
        }
    }
}

impl Default for OrderStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderSource for OrderStorage {
    fn record(&self, order: OrderRecord) -> Result<(), StorageError> {
        match self.orders.entry(order.order_id) {
            Entry::Occupied(existing) if existing.get().status == OrderStatus::Cancelled => {
                debug!("Order [{}] is already cancelled, keeping it out of gateway income", order.order_id);
            }
            Entry::Occupied(mut existing) => {
                existing.insert(order);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(order);
            }
        }

        Ok(())
    }

    fn mark_cancelled(&self, order_id: OrderId) -> Result<Option<OrderRecord>, StorageError> {
        Ok(self.orders.get_mut(&order_id).map(|mut order| {
            order.status = OrderStatus::Cancelled;
            order.value().clone()
        }))
    }

    fn completed_gateway_orders(&self, shop_id: ShopId) -> Result<Vec<OrderRecord>, StorageError> {
        let mut orders: Vec<OrderRecord> = self.orders.iter()
            .filter(|item| item.shop_id == shop_id && item.counts_as_gateway_income())
            .map(|item| item.value().clone())
            .collect();

        orders.sort_by_key(|order| order.order_id);

        Ok(orders)
    }
}
