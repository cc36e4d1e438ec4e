//! Ledger orchestration: account store, transaction journal, configuration,
//! and the `Ledger` type that ties them to a WAL.

#![warn(missing_docs)]

pub mod config;
pub mod ledger;
pub mod store;
pub mod transaction;

pub use config::LedgerConfig;
pub use ledger::Ledger;
pub use store::AccountStore;
pub use transaction::Transaction;
