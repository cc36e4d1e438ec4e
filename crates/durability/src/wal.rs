//! Append-only WAL file: record append path, checkpoint emission, and replay.
//!
//! Every append writes one 36-byte record (payload + CRC32 trailer) at the
//! current end of file and flushes synchronously before returning. There is
//! no write batching: each record is durable on disk (via `flush` plus the
//! OS's own guarantees) before the call that wrote it returns.

use crate::checksum::crc32;
use crate::record::{Op, Record, RECORD_SIZE};
use ledger_core::{LedgerError, LedgerResult};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// A write-ahead log file.
///
/// Owns the single [`File`] handle backing it. Not internally synchronised;
/// the embedding `Ledger` is the sole owner, matching the single-threaded
/// resource model.
pub struct Wal {
    file: File,
    path: PathBuf,
}

impl Wal {
    /// Open the WAL file at `path`, creating it if absent. Positions for
    /// appending at the current end of file.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        debug!(path = %path.display(), "opened WAL for append");
        Ok(Wal { file, path })
    }

    /// Append a raw record built from its fields. Flushes before returning.
    pub fn append(
        &mut self,
        op: Op,
        tx_id: u64,
        account_id: u32,
        amount: i64,
        acct_type: u32,
        currency: [u8; ledger_core::CURRENCY_LEN],
    ) -> LedgerResult<()> {
        let record = Record {
            op,
            tx_id,
            account_id,
            amount,
            acct_type,
            currency,
        };
        self.append_record(&record)
    }

    fn append_record(&mut self, record: &Record) -> LedgerResult<()> {
        let payload = record.encode();
        let crc = crc32(&payload);
        self.file.write_all(&payload)?;
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.flush()?;
        trace!(op = ?record.op, tx_id = record.tx_id, "appended WAL record");
        Ok(())
    }

    /// Append a BEGIN_TX record.
    pub fn begin_tx(&mut self, tx_id: u64) -> LedgerResult<()> {
        self.append(Op::BeginTx, tx_id, 0, 0, 0, [0; ledger_core::CURRENCY_LEN])
    }

    /// Append a COMMIT record.
    pub fn commit(&mut self, tx_id: u64) -> LedgerResult<()> {
        self.append(Op::Commit, tx_id, 0, 0, 0, [0; ledger_core::CURRENCY_LEN])
    }

    /// Append an ABORT record.
    pub fn abort(&mut self, tx_id: u64) -> LedgerResult<()> {
        self.append(Op::Abort, tx_id, 0, 0, 0, [0; ledger_core::CURRENCY_LEN])
    }

    /// Write a CHECKPOINT record whose `tx_id` field carries `snapshot`'s
    /// byte length, followed by the raw snapshot bytes. The snapshot bytes
    /// are not themselves CRC-protected; they are guarded by the strict
    /// length and the enclosing record's CRC.
    pub fn checkpoint(&mut self, snapshot: &[u8]) -> LedgerResult<()> {
        let record = Record {
            op: Op::Checkpoint,
            tx_id: snapshot.len() as u64,
            account_id: 0,
            amount: 0,
            acct_type: 0,
            currency: [0; ledger_core::CURRENCY_LEN],
        };
        let payload = record.encode();
        let crc = crc32(&payload);
        self.file.write_all(&payload)?;
        self.file.write_all(&crc.to_le_bytes())?;
        if !snapshot.is_empty() {
            self.file.write_all(snapshot)?;
        }
        self.file.flush()?;
        debug!(snapshot_len = snapshot.len(), "wrote CHECKPOINT record");
        Ok(())
    }

    /// Re-open the WAL for reading from the beginning and replay every
    /// record until EOF.
    ///
    /// `record_cb` is invoked for every non-checkpoint record. `checkpoint_cb`,
    /// if given, is invoked with the raw snapshot bytes of every CHECKPOINT
    /// record that carries one; its job is to reset and reload the caller's
    /// state from that snapshot. Without a `checkpoint_cb`, snapshot bytes are
    /// skipped.
    ///
    /// A read that produces fewer than [`RECORD_SIZE`] bytes is treated as a
    /// clean EOF (handles a torn last record from a crash mid-append), not an
    /// error. A CRC mismatch on a record that otherwise read in full halts
    /// replay and returns an *io* error.
    ///
    /// After replay, the file is re-opened in append mode at EOF.
    pub fn replay(
        &mut self,
        mut record_cb: impl FnMut(&Record) -> LedgerResult<()>,
        mut checkpoint_cb: Option<&mut dyn FnMut(&[u8]) -> LedgerResult<()>>,
    ) -> LedgerResult<()> {
        let mut reader = File::open(&self.path)?;
        let mut records_seen = 0u64;

        loop {
            let mut buf = [0u8; RECORD_SIZE];
            let n = read_up_to(&mut reader, &mut buf)?;
            if n < RECORD_SIZE {
                break;
            }

            let payload: [u8; crate::record::RECORD_PAYLOAD_SIZE] =
                buf[0..crate::record::RECORD_PAYLOAD_SIZE].try_into().unwrap();
            let stored_crc = u32::from_le_bytes(buf[crate::record::RECORD_PAYLOAD_SIZE..].try_into().unwrap());
            let computed_crc = crc32(&payload);
            if stored_crc != computed_crc {
                warn!(records_seen, "WAL record CRC mismatch during replay");
                return Err(LedgerError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "WAL record CRC mismatch",
                )));
            }

            let record = Record::decode(&payload)?;
            records_seen += 1;

            if record.op == Op::Checkpoint && record.tx_id > 0 {
                let snapshot_len = record.tx_id as usize;
                let mut snapshot = vec![0u8; snapshot_len];
                let got = read_up_to(&mut reader, &mut snapshot)?;
                if got < snapshot_len {
                    // The record header made it to disk but its inline snapshot
                    // was torn off mid-write. Same treatment as a torn record:
                    // stop cleanly instead of surfacing a hard error.
                    break;
                }
                if let Some(cb) = checkpoint_cb.as_deref_mut() {
                    debug!(snapshot_len, "replaying CHECKPOINT");
                    cb(&snapshot)?;
                }
                continue;
            }

            record_cb(&record)?;
        }

        drop(reader);
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)?;
        debug!(records_seen, "WAL replay complete");
        Ok(())
    }
}

/// Read into `buf` until it is full or EOF is reached, returning the number
/// of bytes actually read. Unlike a single `Read::read` call, this loops
/// across short reads so a 36-byte record isn't mistaken for a truncated one
/// just because the OS handed it back in two pieces.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn append_and_replay_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.begin_tx(1).unwrap();
            wal.append(Op::Debit, 1, 0, 100, 0, [0; 4]).unwrap();
            wal.append(Op::Credit, 1, 1, 100, 0, [0; 4]).unwrap();
            wal.commit(1).unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let mut ops = Vec::new();
        wal.replay(
            |record| {
                ops.push(record.op);
                Ok(())
            },
            None,
        )
        .unwrap();
        assert_eq!(ops, vec![Op::BeginTx, Op::Debit, Op::Credit, Op::Commit]);
    }

    #[test]
    fn checkpoint_round_trips_with_callback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let snapshot = vec![1, 2, 3, 4, 5];

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.begin_tx(1).unwrap();
            wal.checkpoint(&snapshot).unwrap();
            wal.commit(2).unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let mut seen_snapshot = None;
        let mut cb = |bytes: &[u8]| -> LedgerResult<()> {
            seen_snapshot = Some(bytes.to_vec());
            Ok(())
        };
        let mut ops = Vec::new();
        wal.replay(
            |record| {
                ops.push(record.op);
                Ok(())
            },
            Some(&mut cb),
        )
        .unwrap();

        assert_eq!(ops, vec![Op::BeginTx, Op::Commit]);
        assert_eq!(seen_snapshot, Some(snapshot));
    }

    #[test]
    fn checkpoint_skipped_without_callback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.checkpoint(&[9, 9, 9]).unwrap();
            wal.commit(1).unwrap();
        }
        let mut wal = Wal::open(&path).unwrap();
        let mut ops = Vec::new();
        wal.replay(
            |record| {
                ops.push(record.op);
                Ok(())
            },
            None,
        )
        .unwrap();
        assert_eq!(ops, vec![Op::Commit]);
    }

    #[test]
    fn truncated_tail_record_is_clean_eof() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.begin_tx(1).unwrap();
            wal.commit(1).unwrap();
        }
        // Truncate mid-record: chop off the last few bytes of the file.
        let full_len = fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(full_len - 10).unwrap();

        let mut wal = Wal::open(&path).unwrap();
        let mut ops = Vec::new();
        wal.replay(
            |record| {
                ops.push(record.op);
                Ok(())
            },
            None,
        )
        .unwrap();
        assert_eq!(ops, vec![Op::BeginTx]);
    }

    #[test]
    fn crc_mismatch_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.begin_tx(1).unwrap();
            wal.commit(1).unwrap();
        }
        // Flip a byte inside the first record's payload.
        let mut bytes = fs::read(&path).unwrap();
        bytes[2] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let mut wal = Wal::open(&path).unwrap();
        let result = wal.replay(|_record| Ok(()), None);
        assert!(matches!(result, Err(LedgerError::Io(_))));
    }

    #[test]
    fn appendable_after_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let mut wal = Wal::open(&path).unwrap();
        wal.begin_tx(1).unwrap();
        wal.replay(|_| Ok(()), None).unwrap();
        wal.commit(1).unwrap();

        let mut wal = Wal::open(&path).unwrap();
        let mut ops = Vec::new();
        wal.replay(
            |record| {
                ops.push(record.op);
                Ok(())
            },
            None,
        )
        .unwrap();
        assert_eq!(ops, vec![Op::BeginTx, Op::Commit]);
    }

    /// Crash safety: a WAL truncated at *any* [`RECORD_SIZE`]-aligned offset
    /// must still replay cleanly, including offsets that land inside a
    /// checkpoint's inline snapshot bytes rather than on a record boundary.
    #[test]
    fn replay_tolerates_truncation_at_every_record_aligned_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        // Snapshot length deliberately not a multiple of RECORD_SIZE, so some
        // aligned truncation offsets fall mid-snapshot rather than mid-header.
        let snapshot: Vec<u8> = (0u8..50).collect();

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.begin_tx(1).unwrap();
            wal.append(Op::Debit, 1, 0, 100, 0, [0; 4]).unwrap();
            wal.append(Op::Credit, 1, 1, 100, 0, [0; 4]).unwrap();
            wal.commit(1).unwrap();
            wal.checkpoint(&snapshot).unwrap();
            wal.begin_tx(2).unwrap();
            wal.append(Op::Debit, 2, 1, 50, 0, [0; 4]).unwrap();
            wal.append(Op::Credit, 2, 2, 50, 0, [0; 4]).unwrap();
            wal.commit(2).unwrap();
        }

        let full_bytes = fs::read(&path).unwrap();
        let full_len = full_bytes.len() as u64;

        let mut offset = 0u64;
        while offset <= full_len {
            let truncated_len = offset.min(full_len) as usize;
            let truncated_path = dir.path().join(format!("truncated_{offset}.wal"));
            fs::write(&truncated_path, &full_bytes[..truncated_len]).unwrap();

            let mut wal = Wal::open(&truncated_path).unwrap();
            let mut ops = Vec::new();
            let mut snapshots_seen = Vec::new();
            let mut checkpoint_cb = |bytes: &[u8]| -> LedgerResult<()> {
                snapshots_seen.push(bytes.to_vec());
                Ok(())
            };
            let result = wal.replay(
                |record| {
                    ops.push(record.op);
                    Ok(())
                },
                Some(&mut checkpoint_cb),
            );
            assert!(
                result.is_ok(),
                "replay failed at truncation offset {offset}/{full_len}: {result:?}"
            );
            // A checkpoint's snapshot is only ever delivered whole; a torn
            // one is dropped along with the record, never handed over partial.
            for seen in &snapshots_seen {
                assert_eq!(seen, &snapshot);
            }
            // The WAL must stay usable after recovering from any truncation.
            wal.commit(999).unwrap();

            offset += RECORD_SIZE as u64;
        }
    }
}
