//! Shared on-disk and policy constants
//!
//! Kept as named constants rather than inlined so the WAL record format and
//! the account store agree on a single definition.

/// Account id `0`: the cash reserve, counterparty for deposits and withdrawals.
/// The only account permitted to carry a negative balance.
pub const CASH_ACCOUNT_ID: u32 = 0;

/// Width in bytes of the fixed ASCII currency field on an account and on disk.
pub const CURRENCY_LEN: usize = 4;

/// Conventional default currency used when a caller doesn't specify one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Initial capacity of the open-addressed account table.
pub const INITIAL_TABLE_CAPACITY: u32 = 4096;

/// Capacity ceiling the account table will not grow past.
pub const MAX_TABLE_CAPACITY: u32 = 1 << 20;

/// Default number of write ops between automatic checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 100;
