mod config;
mod errors;
mod events;
mod settlement_engine;

pub use config::EngineConfig;
pub use errors::EventError;
pub use events::{EventKind, EventRecord, LedgerEvent};
pub use settlement_engine::{SettlementEngine, WalletSnapshot};
