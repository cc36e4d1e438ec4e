//! The `Ledger`: orchestrates the account store, the WAL, and transaction
//! replay into the single entry point applications use.

use crate::config::LedgerConfig;
use crate::store::AccountStore;
use crate::transaction::Transaction;
use ledger_core::account::pack_currency;
use ledger_core::{Account, AccountType, CASH_ACCOUNT_ID, LedgerError, LedgerResult};
use ledger_durability::{Op, Record, Wal};
use std::cell::RefCell;
use std::path::Path;
use tracing::{debug, info, warn};

/// A single-process, crash-safe double-entry ledger backed by a write-ahead
/// log. Not `Sync`/`Send` by design: exactly one `Ledger` owns its WAL file
/// and account table, with no internal locking.
pub struct Ledger {
    store: AccountStore,
    wal: Wal,
    next_tx_id: u64,
    ops_since_checkpoint: u64,
    config: LedgerConfig,
}

struct ReplayState {
    store: AccountStore,
    next_tx_id: u64,
}

fn apply_replay_record(state: &mut ReplayState, record: &Record) -> LedgerResult<()> {
    match record.op {
        Op::BeginTx => {
            if state.next_tx_id <= record.tx_id {
                state.next_tx_id = record.tx_id + 1;
            }
        }
        Op::CreateAccount => {
            let account_type = AccountType::from_u8(record.acct_type as u8)?;
            let currency = ledger_core::account::unpack_currency(&record.currency);
            state.store.create(account_type, &currency)?;
        }
        Op::Debit => {
            state
                .store
                .apply_delta(record.account_id, -record.amount, record.tx_id)?;
        }
        Op::Credit => {
            state
                .store
                .apply_delta(record.account_id, record.amount, record.tx_id)?;
        }
        Op::Commit | Op::Abort => {}
        Op::Checkpoint => {
            // Wal::replay intercepts any CHECKPOINT record carrying a
            // nonzero snapshot length before it reaches this callback. A
            // zero-length one carries nothing to apply.
        }
    }
    Ok(())
}

impl Ledger {
    /// Open (or create) the ledger at `path` with [`LedgerConfig::default`].
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        Self::open_with_config(path, LedgerConfig::default())
    }

    /// Open (or create) the ledger at `path` with a caller-supplied config.
    ///
    /// The cash reserve (account 0) is materialised in memory *before*
    /// replay begins and is never itself represented by a WAL record: it is
    /// a reserved id, not a created account, so there is nothing to log and
    /// nothing to replay for it. This sidesteps a hazard in logging it like
    /// any other account: CREATE_ACCOUNT replay always auto-assigns the next
    /// free id rather than the id originally recorded, so a reserve logged
    /// this way would land at a different id on every replay and its past
    /// DEBIT/CREDIT records (account_id 0) would reference an id that does
    /// not yet exist in the freshly-replayed store.
    pub fn open_with_config(path: impl AsRef<Path>, config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        let mut wal = Wal::open(path)?;

        let mut initial_store =
            AccountStore::with_capacity(config.initial_capacity, config.max_capacity);
        initial_store.create_with_id(CASH_ACCOUNT_ID, AccountType::Checking, &config.default_currency)?;

        let state = RefCell::new(ReplayState {
            store: initial_store,
            next_tx_id: 0,
        });

        let record_cb = |record: &Record| -> LedgerResult<()> {
            let mut guard = state.borrow_mut();
            apply_replay_record(&mut guard, record)
        };
        let max_capacity = config.max_capacity;
        let mut checkpoint_cb = |bytes: &[u8]| -> LedgerResult<()> {
            let (new_store, next_tx_id) = AccountStore::restore_from_snapshot(bytes, max_capacity)?;
            let mut guard = state.borrow_mut();
            guard.store = new_store;
            guard.next_tx_id = next_tx_id;
            Ok(())
        };

        wal.replay(record_cb, Some(&mut checkpoint_cb))?;

        let ReplayState { mut store, next_tx_id } = state.into_inner();

        // Every checkpoint this ledger writes includes the reserve, so a
        // restored snapshot always carries it; this only guards a snapshot
        // produced by other tooling that omitted it.
        if store.get(CASH_ACCOUNT_ID).is_err() {
            store.create_with_id(CASH_ACCOUNT_ID, AccountType::Checking, &config.default_currency)?;
        }

        info!(accounts = store.count(), next_tx_id, "ledger opened");
        Ok(Ledger {
            store,
            wal,
            next_tx_id,
            ops_since_checkpoint: 0,
            config,
        })
    }

    /// Create a new account, logging its creation to the WAL. Returns the
    /// newly assigned account id.
    pub fn create_account(&mut self, account_type: AccountType, currency: &str) -> LedgerResult<u32> {
        let id = self.store.create(account_type, currency)?;
        let packed_currency = pack_currency(currency)?;
        self.wal
            .append(Op::CreateAccount, 0, id, 0, account_type.to_u8() as u32, packed_currency)?;
        debug!(account_id = id, "created account");
        self.tick_checkpoint()?;
        Ok(id)
    }

    /// Move `amount_cents` from the cash reserve into `account_id`.
    pub fn deposit(&mut self, account_id: u32, amount_cents: i64) -> LedgerResult<()> {
        self.do_transfer(CASH_ACCOUNT_ID, account_id, amount_cents)
    }

    /// Move `amount_cents` out of `account_id` into the cash reserve.
    pub fn withdraw(&mut self, account_id: u32, amount_cents: i64) -> LedgerResult<()> {
        self.do_transfer(account_id, CASH_ACCOUNT_ID, amount_cents)
    }

    /// Move `amount_cents` from `from` to `to`.
    pub fn transfer(&mut self, from: u32, to: u32, amount_cents: i64) -> LedgerResult<()> {
        self.do_transfer(from, to, amount_cents)
    }

    /// Current balance of `account_id`, in cents.
    pub fn balance(&self, account_id: u32) -> LedgerResult<i64> {
        self.store.get(account_id).map(|account| account.balance_cents)
    }

    /// Current full record for `account_id`, including its version.
    pub fn account(&self, account_id: u32) -> LedgerResult<Account> {
        self.store.get(account_id)
    }

    /// Per-account transaction history. Always empty: this ledger does not
    /// retain a queryable transaction log beyond the WAL itself.
    pub fn history(&self, _account_id: u32) -> LedgerResult<Vec<u64>> {
        Ok(Vec::new())
    }

    /// The tx_id the next committed transaction will use.
    pub fn next_tx_id(&self) -> u64 {
        self.next_tx_id
    }

    fn do_transfer(&mut self, from: u32, to: u32, amount_cents: i64) -> LedgerResult<()> {
        if amount_cents <= 0 {
            return Err(LedgerError::Invalid(
                "transfer amount must be positive".to_string(),
            ));
        }
        let tx_id = self.next_tx_id;
        self.next_tx_id += 1;

        self.wal.begin_tx(tx_id)?;
        self.wal.append(Op::Debit, tx_id, from, amount_cents, 0, [0; ledger_core::CURRENCY_LEN])?;
        self.wal.append(Op::Credit, tx_id, to, amount_cents, 0, [0; ledger_core::CURRENCY_LEN])?;

        let mut txn = Transaction::begin(&mut self.store, tx_id);
        // The in-memory journal uses the opposite sign convention from the
        // WAL record names: crediting `from` lowers its balance (the source
        // gives money up) and debiting `to` raises its (the destination
        // receives it). Both legs still sum to the same amount, satisfying
        // the debits-equal-credits check at commit.
        txn.credit(from, amount_cents)?;
        txn.debit(to, amount_cents)?;

        match txn.commit() {
            Ok(()) => {
                self.wal.commit(tx_id)?;
                debug!(tx_id, from, to, amount_cents, "transfer committed");
                self.tick_checkpoint()?;
                Ok(())
            }
            Err(err) => {
                self.wal.abort(tx_id)?;
                debug!(tx_id, %err, "transfer aborted");
                Err(err)
            }
        }
    }

    fn tick_checkpoint(&mut self) -> LedgerResult<()> {
        self.ops_since_checkpoint += 1;
        if self.ops_since_checkpoint < self.config.checkpoint_interval {
            return Ok(());
        }
        let snapshot = self.store.serialize(self.next_tx_id as u32);
        // A checkpoint is a performance optimisation, not a correctness
        // requirement: failure to write one is logged and otherwise
        // ignored, the same way the WAL keeps running if a lower-priority
        // maintenance operation can't complete.
        match self.wal.checkpoint(&snapshot) {
            Ok(()) => {
                self.ops_since_checkpoint = 0;
                debug!(accounts = self.store.count(), "checkpoint written");
            }
            Err(err) => {
                warn!(%err, "checkpoint skipped");
            }
        }
        Ok(())
    }
}
