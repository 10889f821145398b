mod errors;
mod monetary;
#[cfg(test)]
mod tests;

pub use errors::MonetaryError;
pub use monetary::{Monetary, DECIMAL_PLACES};

pub type WalletId = u64;
pub type TransactionId = u64;
pub type WithdrawalId = u64;
pub type OrderId = u64;
pub type ShopId = u64;
pub type UserId = u64;
