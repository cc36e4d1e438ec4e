//! Core types shared across the ledger workspace
//!
//! This crate defines the foundational types used by both `ledger-durability`
//! and `ledger-engine`:
//! - [`Account`] / [`AccountType`]: the account record and its kind
//! - [`LedgerError`] / [`LedgerResult`]: the unified error taxonomy
//! - on-disk constants shared by the WAL record format and the snapshot format

#![warn(missing_docs)]

pub mod account;
pub mod constants;
pub mod error;

pub use account::{Account, AccountType};
pub use constants::{
    CASH_ACCOUNT_ID, CURRENCY_LEN, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CURRENCY,
    INITIAL_TABLE_CAPACITY, MAX_TABLE_CAPACITY,
};
pub use error::{LedgerError, LedgerResult};
