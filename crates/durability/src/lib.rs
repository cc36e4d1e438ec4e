//! Durability layer for the ledger
//!
//! This crate handles everything that touches disk:
//!
//! - [`checksum`]: CRC32 over fixed byte ranges
//! - [`record`]: the 36-byte WAL record format (32-byte payload + CRC32 trailer)
//! - [`wal`]: append-only WAL file, replay protocol, checkpoint support
//! - [`snapshot`]: the opaque snapshot byte format checkpoints carry

#![warn(missing_docs)]

pub mod checksum;
pub mod record;
pub mod snapshot;
pub mod wal;

pub use record::{Op, Record, RECORD_PAYLOAD_SIZE, RECORD_SIZE};
pub use wal::Wal;
