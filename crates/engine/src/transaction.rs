//! In-memory transaction journal bound to a single [`AccountStore`] borrow.
//!
//! A `Transaction` is a short-lived builder: accumulate debits and credits,
//! then `commit` or `abort`. It does not touch the WAL — the caller is
//! responsible for writing BEGIN_TX/DEBIT/CREDIT/COMMIT/ABORT records around
//! it (see [`crate::ledger::Ledger::do_transfer`]).

use crate::store::AccountStore;
use ledger_core::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Open,
    Committed,
    Aborted,
}

struct JournalEntry {
    account_id: u32,
    amount_cents: i64,
    is_debit: bool,
}

/// A transaction journal: a sequence of debits/credits against accounts in
/// one [`AccountStore`], applied atomically at `commit` if (and only if)
/// total debits equal total credits.
pub struct Transaction<'a> {
    store: &'a mut AccountStore,
    tx_id: u64,
    entries: Vec<JournalEntry>,
    total_debits: i64,
    total_credits: i64,
    state: TxState,
}

impl<'a> Transaction<'a> {
    /// Start a new transaction against `store`, stamping `tx_id` as the
    /// version every touched account will record.
    pub fn begin(store: &'a mut AccountStore, tx_id: u64) -> Self {
        Transaction {
            store,
            tx_id,
            entries: Vec::new(),
            total_debits: 0,
            total_credits: 0,
            state: TxState::Open,
        }
    }

    /// Journal a debit (raises the account's balance at commit time).
    pub fn debit(&mut self, account_id: u32, amount_cents: i64) -> LedgerResult<()> {
        self.append_entry(account_id, amount_cents, true)
    }

    /// Journal a credit (lowers the account's balance at commit time).
    pub fn credit(&mut self, account_id: u32, amount_cents: i64) -> LedgerResult<()> {
        self.append_entry(account_id, amount_cents, false)
    }

    fn append_entry(&mut self, account_id: u32, amount_cents: i64, is_debit: bool) -> LedgerResult<()> {
        if self.state != TxState::Open {
            return Err(LedgerError::Invalid(
                "transaction is not open".to_string(),
            ));
        }
        if amount_cents <= 0 {
            return Err(LedgerError::Invalid(
                "journal amount must be positive".to_string(),
            ));
        }
        if is_debit {
            self.total_debits += amount_cents;
        } else {
            self.total_credits += amount_cents;
        }
        self.entries.push(JournalEntry {
            account_id,
            amount_cents,
            is_debit,
        });
        Ok(())
    }

    /// Commit: require total debits to equal total credits, then apply every
    /// entry's delta in journal order. If a delta fails partway through (an
    /// account would go negative), the entries already applied are **not**
    /// rolled back — the caller is responsible for ensuring this can't
    /// happen (e.g. checking balances before journaling), or for accepting
    /// the partial effect. The transaction is left in the `Open` state on a
    /// mid-commit failure rather than forced into `Aborted`, since it has
    /// already partially taken effect and isn't cleanly either.
    pub fn commit(&mut self) -> LedgerResult<()> {
        if self.state != TxState::Open {
            return Err(LedgerError::Invalid(
                "transaction already terminal".to_string(),
            ));
        }
        if self.total_debits != self.total_credits {
            return Err(LedgerError::Constraint(format!(
                "debits {} do not equal credits {}",
                self.total_debits, self.total_credits
            )));
        }
        for entry in &self.entries {
            let delta = if entry.is_debit {
                entry.amount_cents
            } else {
                -entry.amount_cents
            };
            self.store.apply_delta(entry.account_id, delta, self.tx_id)?;
        }
        self.state = TxState::Committed;
        Ok(())
    }

    /// Mark the transaction aborted. No deltas from journaled-but-uncommitted
    /// entries are ever applied, so there is nothing to undo.
    pub fn abort(&mut self) {
        self.state = TxState::Aborted;
    }

    /// True once `commit` has succeeded.
    pub fn is_committed(&self) -> bool {
        self.state == TxState::Committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::AccountType;

    fn two_accounts(store: &mut AccountStore) -> (u32, u32) {
        store.create_with_id(0, AccountType::Checking, "USD").unwrap();
        let b = store.create(AccountType::Checking, "USD").unwrap();
        (0, b)
    }

    #[test]
    fn balanced_commit_applies_all_deltas() {
        let mut store = AccountStore::with_capacity(8, 64);
        let (cash, other) = two_accounts(&mut store);

        let mut tx = Transaction::begin(&mut store, 1);
        tx.credit(cash, 500).unwrap();
        tx.debit(other, 500).unwrap();
        tx.commit().unwrap();

        assert!(tx.is_committed());
        assert_eq!(store.get(cash).unwrap().balance_cents, -500);
        assert_eq!(store.get(other).unwrap().balance_cents, 500);
    }

    #[test]
    fn unbalanced_commit_is_rejected_and_applies_nothing() {
        let mut store = AccountStore::with_capacity(8, 64);
        let (cash, other) = two_accounts(&mut store);

        let mut tx = Transaction::begin(&mut store, 1);
        tx.credit(cash, 500).unwrap();
        tx.debit(other, 400).unwrap();
        let result = tx.commit();

        assert!(matches!(result, Err(LedgerError::Constraint(_))));
        assert_eq!(store.get(cash).unwrap().balance_cents, 0);
        assert_eq!(store.get(other).unwrap().balance_cents, 0);
    }

    #[test]
    fn nonpositive_amount_is_rejected() {
        let mut store = AccountStore::with_capacity(8, 64);
        let (cash, _other) = two_accounts(&mut store);
        let mut tx = Transaction::begin(&mut store, 1);
        assert!(matches!(
            tx.debit(cash, 0),
            Err(LedgerError::Invalid(_))
        ));
        assert!(matches!(
            tx.credit(cash, -10),
            Err(LedgerError::Invalid(_))
        ));
    }

    #[test]
    fn cannot_mutate_after_commit() {
        let mut store = AccountStore::with_capacity(8, 64);
        let (cash, other) = two_accounts(&mut store);
        let mut tx = Transaction::begin(&mut store, 1);
        tx.credit(cash, 100).unwrap();
        tx.debit(other, 100).unwrap();
        tx.commit().unwrap();
        assert!(matches!(
            tx.debit(other, 1),
            Err(LedgerError::Invalid(_))
        ));
    }
}
