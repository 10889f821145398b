mod wallet_actor;
#[cfg(test)]
mod tests;

pub use wallet_actor::{WalletActor, WalletMailbox};
