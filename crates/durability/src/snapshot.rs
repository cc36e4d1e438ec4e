//! Snapshot byte format carried inline by CHECKPOINT records.
//!
//! The snapshot is opaque to the WAL: [`crate::wal::Wal::checkpoint`] only
//! knows its length. Layout:
//!
//! ```text
//! 4 bytes  next_tx_id (u32)
//! 4 bytes  count (u32)
//! count * 29-byte entries:
//!   offset 0   4  id (u32)
//!   offset 4   1  type (u8)
//!   offset 5   3  reserved / padding
//!   offset 8   8  balance (i64)
//!   offset 16  8  version (u64)
//!   offset 24  4  currency (4 ASCII bytes)
//! ```
//!
//! The 29-byte stride (with its 3 reserved padding bytes) is preserved
//! bit-for-bit rather than packed down to 25 bytes, for compatibility with
//! existing on-disk snapshots, as the format explicitly permits.

use ledger_core::CURRENCY_LEN;

/// Size of the snapshot header (`next_tx_id` + `count`).
pub const HEADER_SIZE: usize = 8;

/// Size of a single encoded account entry.
pub const ENTRY_SIZE: usize = 29;

/// One account's fields as carried in a snapshot, prior to being installed
/// into an account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Account id.
    pub id: u32,
    /// Account type discriminant.
    pub account_type: u8,
    /// Balance in cents.
    pub balance_cents: i64,
    /// Version (tx_id of last mutation).
    pub version: u64,
    /// Fixed 4-byte ASCII currency code.
    pub currency: [u8; CURRENCY_LEN],
}

/// Encode the snapshot header: `next_tx_id` followed by the entry count.
pub fn encode_header(next_tx_id: u32, count: u32) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0..4].copy_from_slice(&next_tx_id.to_le_bytes());
    buf[4..8].copy_from_slice(&count.to_le_bytes());
    buf
}

/// Decode the snapshot header. Returns `(next_tx_id, count)`.
pub fn decode_header(buf: &[u8]) -> Option<(u32, u32)> {
    if buf.len() < HEADER_SIZE {
        return None;
    }
    let next_tx_id = u32::from_le_bytes(buf[0..4].try_into().ok()?);
    let count = u32::from_le_bytes(buf[4..8].try_into().ok()?);
    Some((next_tx_id, count))
}

/// Encode a single 29-byte account entry.
pub fn encode_entry(entry: &SnapshotEntry) -> [u8; ENTRY_SIZE] {
    let mut buf = [0u8; ENTRY_SIZE];
    buf[0..4].copy_from_slice(&entry.id.to_le_bytes());
    buf[4] = entry.account_type;
    // bytes 5..8 stay zero (reserved padding)
    buf[8..16].copy_from_slice(&entry.balance_cents.to_le_bytes());
    buf[16..24].copy_from_slice(&entry.version.to_le_bytes());
    buf[24..28].copy_from_slice(&entry.currency);
    buf
}

/// Decode a single 29-byte account entry.
pub fn decode_entry(buf: &[u8]) -> Option<SnapshotEntry> {
    if buf.len() < ENTRY_SIZE {
        return None;
    }
    let id = u32::from_le_bytes(buf[0..4].try_into().ok()?);
    let account_type = buf[4];
    let balance_cents = i64::from_le_bytes(buf[8..16].try_into().ok()?);
    let version = u64::from_le_bytes(buf[16..24].try_into().ok()?);
    let mut currency = [0u8; CURRENCY_LEN];
    currency.copy_from_slice(&buf[24..28]);
    Some(SnapshotEntry {
        id,
        account_type,
        balance_cents,
        version,
        currency,
    })
}

/// Encode a full snapshot: header plus every entry, in the order given.
pub fn encode_snapshot(next_tx_id: u32, entries: &[SnapshotEntry]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + entries.len() * ENTRY_SIZE);
    buf.extend_from_slice(&encode_header(next_tx_id, entries.len() as u32));
    for entry in entries {
        buf.extend_from_slice(&encode_entry(entry));
    }
    buf
}

/// Decode a full snapshot into `(next_tx_id, entries)`. Stops reading if
/// the buffer is shorter than the declared entry count implies, rather than
/// panicking, matching the defensive-length-check in the original format.
pub fn decode_snapshot(buf: &[u8]) -> Option<(u32, Vec<SnapshotEntry>)> {
    let (next_tx_id, count) = decode_header(buf)?;
    let mut entries = Vec::with_capacity(count as usize);
    let mut offset = HEADER_SIZE;
    for _ in 0..count {
        if offset + ENTRY_SIZE > buf.len() {
            break;
        }
        entries.push(decode_entry(&buf[offset..offset + ENTRY_SIZE])?);
        offset += ENTRY_SIZE;
    }
    Some((next_tx_id, entries))
}
