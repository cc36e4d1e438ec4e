//! WAL record format: a fixed 32-byte payload plus a 4-byte CRC32 trailer.
//!
//! ```text
//! offset  size  field
//! 0       1     op (u8)
//! 1       3     reserved, zero
//! 4       8     tx_id (u64) -- for CHECKPOINT: snapshot length in bytes
//! 12      4     account_id (u32)
//! 16      8     amount (i64)
//! 24      4     acct_type (u32)
//! 28      4     currency (4 ASCII bytes, null-padded)
//! ----    4     CRC32 of the 32-byte payload, little-endian
//! ```
//!
//! All multi-byte fields are little-endian. CHECKPOINT records are followed
//! by `tx_id` additional raw snapshot bytes after the CRC trailer; those
//! bytes are not themselves CRC-protected (see [`crate::wal`]).

use ledger_core::{LedgerError, LedgerResult};

/// Size of the fixed record payload, before the CRC trailer.
pub const RECORD_PAYLOAD_SIZE: usize = 32;

/// Size of a full record: payload plus 4-byte CRC trailer.
pub const RECORD_SIZE: usize = RECORD_PAYLOAD_SIZE + 4;

const CURRENCY_LEN: usize = ledger_core::CURRENCY_LEN;

/// WAL opcodes. Numeric assignments are part of the stable on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    /// Marks the start of a transaction.
    BeginTx = 1,
    /// Records the intent to debit an account (raise its balance).
    Debit = 2,
    /// Records the intent to credit an account (lower its balance).
    Credit = 3,
    /// Marks successful completion of a transaction.
    Commit = 4,
    /// Marks that a transaction was rolled back.
    Abort = 5,
    /// Carries an inline snapshot; `tx_id` field holds the snapshot length.
    Checkpoint = 6,
    /// Records that a new account was created.
    CreateAccount = 7,
}

impl Op {
    /// Decode the on-disk opcode byte. Unknown opcodes are an *invalid* WAL,
    /// not a silently-ignored one.
    pub fn from_u8(value: u8) -> LedgerResult<Self> {
        match value {
            1 => Ok(Op::BeginTx),
            2 => Ok(Op::Debit),
            3 => Ok(Op::Credit),
            4 => Ok(Op::Commit),
            5 => Ok(Op::Abort),
            6 => Ok(Op::Checkpoint),
            7 => Ok(Op::CreateAccount),
            other => Err(LedgerError::Invalid(format!(
                "unknown WAL opcode {other}"
            ))),
        }
    }
}

/// A decoded WAL record payload (without its CRC trailer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// The record's opcode.
    pub op: Op,
    /// Transaction id this record belongs to. For CHECKPOINT, the snapshot
    /// byte length instead.
    pub tx_id: u64,
    /// Account affected by DEBIT/CREDIT/CREATE_ACCOUNT; zero otherwise.
    pub account_id: u32,
    /// Signed amount in cents for DEBIT/CREDIT; zero otherwise.
    pub amount: i64,
    /// Account type discriminant for CREATE_ACCOUNT; zero otherwise.
    pub acct_type: u32,
    /// Fixed 4-byte ASCII currency code, null-padded.
    pub currency: [u8; CURRENCY_LEN],
}

impl Record {
    /// Encode the 32-byte payload. Does not include the CRC trailer.
    pub fn encode(&self) -> [u8; RECORD_PAYLOAD_SIZE] {
        let mut buf = [0u8; RECORD_PAYLOAD_SIZE];
        buf[0] = self.op as u8;
        // bytes 1..4 stay zero (reserved)
        buf[4..12].copy_from_slice(&self.tx_id.to_le_bytes());
        buf[12..16].copy_from_slice(&self.account_id.to_le_bytes());
        buf[16..24].copy_from_slice(&self.amount.to_le_bytes());
        buf[24..28].copy_from_slice(&self.acct_type.to_le_bytes());
        buf[28..32].copy_from_slice(&self.currency);
        buf
    }

    /// Decode a 32-byte payload. Does not verify any CRC; that is the
    /// caller's responsibility (see [`crate::wal::Wal::replay`]).
    pub fn decode(buf: &[u8; RECORD_PAYLOAD_SIZE]) -> LedgerResult<Self> {
        let op = Op::from_u8(buf[0])?;
        let tx_id = u64::from_le_bytes(buf[4..12].try_into().unwrap());
        let account_id = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let amount = i64::from_le_bytes(buf[16..24].try_into().unwrap());
        let acct_type = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        let mut currency = [0u8; CURRENCY_LEN];
        currency.copy_from_slice(&buf[28..32]);
        Ok(Record {
            op,
            tx_id,
            account_id,
            amount,
            acct_type,
            currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let record = Record {
            op: Op::Debit,
            tx_id: 42,
            account_id: 7,
            amount: -1500,
            acct_type: 1,
            currency: *b"USD\0",
        };
        let encoded = record.encode();
        assert_eq!(encoded.len(), RECORD_PAYLOAD_SIZE);
        assert_eq!(Record::decode(&encoded).unwrap(), record);
    }

    #[test]
    fn reserved_bytes_are_zero() {
        let record = Record {
            op: Op::Commit,
            tx_id: 1,
            account_id: 0,
            amount: 0,
            acct_type: 0,
            currency: [0; CURRENCY_LEN],
        };
        let encoded = record.encode();
        assert_eq!(&encoded[1..4], &[0, 0, 0]);
    }

    #[test]
    fn rejects_unknown_opcode() {
        let mut encoded = Record {
            op: Op::Abort,
            tx_id: 0,
            account_id: 0,
            amount: 0,
            acct_type: 0,
            currency: [0; CURRENCY_LEN],
        }
        .encode();
        encoded[0] = 99;
        assert!(Record::decode(&encoded).is_err());
    }

    #[test]
    fn checkpoint_tx_id_carries_snapshot_length() {
        let record = Record {
            op: Op::Checkpoint,
            tx_id: 4096,
            account_id: 0,
            amount: 0,
            acct_type: 0,
            currency: [0; CURRENCY_LEN],
        };
        let decoded = Record::decode(&record.encode()).unwrap();
        assert_eq!(decoded.tx_id, 4096);
    }
}
