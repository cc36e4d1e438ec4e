//! # ledgerdb
//!
//! An embedded, crash-safe double-entry ledger for a single process: every
//! balance-affecting operation is durable on disk before the call that made
//! it returns, and a reopened ledger recovers exactly the state it had at
//! the moment of its last successful write.
//!
//! # Quick start
//!
//! ```no_run
//! use ledgerdb::{AccountType, Ledger};
//!
//! fn main() -> ledgerdb::LedgerResult<()> {
//!     let mut ledger = Ledger::open("./accounts.wal")?;
//!
//!     let checking = ledger.create_account(AccountType::Checking, "USD")?;
//!     ledger.deposit(checking, 10_000)?;
//!     ledger.withdraw(checking, 2_500)?;
//!
//!     assert_eq!(ledger.balance(checking)?, 7_500);
//!     Ok(())
//! }
//! ```
//!
//! # Model
//!
//! Every account is debit/credit balanced against account `0`, the cash
//! reserve: deposits and withdrawals are transfers between an account and the
//! reserve, and a direct transfer moves value between two ordinary accounts.
//! A debit raises the target's balance; a credit lowers it. The reserve is
//! the sole account permitted to carry a negative balance, and the sum of
//! every account's balance is always exactly zero.
//!
//! # Durability
//!
//! Every mutating call appends one or more fixed-size records to a
//! write-ahead log and flushes before returning. Reopening a ledger replays
//! that log from the start (or from its most recent checkpoint) to rebuild
//! the account table in memory; a torn record at the tail (the signature of
//! a crash mid-append) is treated as a clean end of log rather than an
//! error, while a corrupt record earlier in the log is not.
//!
//! Internal crates (`ledger-core`, `ledger-durability`, `ledger-engine`) are
//! not exposed directly. Only the re-exports below are part of the stable
//! public surface.

#![warn(missing_docs)]

pub use ledger_core::{Account, AccountType, LedgerError, LedgerResult};
pub use ledger_engine::{LedgerConfig, Ledger};
