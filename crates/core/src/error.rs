//! Error types for the ledger
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations,
//! the same way the rest of this workspace does.

use std::io;

/// Result type alias for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Unified error taxonomy for the ledger core.
///
/// These map onto the error codes in the operation surface: *ok*, *nomem*,
/// *io*, *invalid*, *not-found*, *deadlock* (reserved, unused), *constraint*.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Underlying file I/O failure, or a CRC mismatch / truncated record
    /// encountered during WAL replay.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed arguments: null/non-positive amount, unknown WAL opcode,
    /// or a mutation attempted on an already-terminal transaction.
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// The referenced account id does not exist in the store.
    #[error("account {account_id} not found")]
    NotFound {
        /// The account id that was looked up.
        account_id: u32,
    },

    /// A balance would go negative on a non-reserve account, or a
    /// transaction's debits and credits do not balance at commit time.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Allocation failure, or the account table has reached its capacity
    /// ceiling and cannot grow further.
    #[error("out of memory: {0}")]
    NoMem(String),

    /// Reserved for future multi-process/multi-threaded lock arbitration.
    /// Unused by the single-threaded core.
    #[error("deadlock detected")]
    Deadlock,
}
