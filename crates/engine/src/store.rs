//! In-memory account store: an open-addressed table keyed by account id.
//!
//! Linear probing, starting at `id mod capacity`, doubling capacity up to a
//! configured ceiling. Not internally synchronised — owned exclusively by a
//! single [`crate::ledger::Ledger`].

use ledger_core::account::{pack_currency, unpack_currency};
use ledger_core::{Account, AccountType, LedgerError, LedgerResult};
use ledger_durability::snapshot::{self, SnapshotEntry};
use tracing::debug;

/// Open-addressed account table.
pub struct AccountStore {
    slots: Vec<Option<Account>>,
    capacity: u32,
    max_capacity: u32,
    next_id: u32,
    count: u32,
}

impl AccountStore {
    /// Create an empty store with the given initial capacity and growth
    /// ceiling.
    pub fn with_capacity(initial_capacity: u32, max_capacity: u32) -> Self {
        AccountStore {
            slots: vec![None; initial_capacity as usize],
            capacity: initial_capacity,
            max_capacity,
            next_id: 1,
            count: 0,
        }
    }

    /// Number of accounts currently stored.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Current table capacity (not the same as `count`).
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn grow(&mut self) -> LedgerResult<()> {
        if self.capacity >= self.max_capacity {
            return Err(LedgerError::NoMem(
                "account table at capacity ceiling".to_string(),
            ));
        }
        let new_capacity = self.capacity.saturating_mul(2).min(self.max_capacity);
        let old_slots = std::mem::replace(&mut self.slots, vec![None; new_capacity as usize]);
        self.capacity = new_capacity;
        debug!(new_capacity, "account table grown");
        for account in old_slots.into_iter().flatten() {
            self.insert(account)?;
        }
        Ok(())
    }

    fn insert(&mut self, account: Account) -> LedgerResult<()> {
        let start = (account.id % self.capacity) as usize;
        let mut idx = start;
        loop {
            if self.slots[idx].is_none() {
                self.slots[idx] = Some(account);
                return Ok(());
            }
            idx = (idx + 1) % self.capacity as usize;
            if idx == start {
                return Err(LedgerError::NoMem("account table full".to_string()));
            }
        }
    }

    fn slot_index(&self, id: u32) -> Option<usize> {
        let start = (id % self.capacity) as usize;
        let mut idx = start;
        loop {
            match &self.slots[idx] {
                None => return None,
                Some(account) if account.id == id => return Some(idx),
                Some(_) => {}
            }
            idx = (idx + 1) % self.capacity as usize;
            if idx == start {
                return None;
            }
        }
    }

    /// Allocate the next monotonically increasing id and install a fresh
    /// account with zero balance and zero version.
    pub fn create(&mut self, account_type: AccountType, currency: &str) -> LedgerResult<u32> {
        if self.count >= self.capacity {
            self.grow()?;
        }
        let id = self.next_id;
        let packed_currency = pack_currency(currency)?;
        self.insert(Account::new(id, account_type, packed_currency))?;
        self.next_id += 1;
        self.count += 1;
        Ok(id)
    }

    /// Insert an account at a caller-given id. Used only during replay and
    /// checkpoint restore, where the id must be preserved exactly. Advances
    /// `next_id` past `id` if needed. Fails if `id` is already present.
    pub fn create_with_id(
        &mut self,
        id: u32,
        account_type: AccountType,
        currency: &str,
    ) -> LedgerResult<()> {
        if self.slot_index(id).is_some() {
            return Err(LedgerError::Invalid(format!(
                "account {id} already exists"
            )));
        }
        if self.count >= self.capacity {
            self.grow()?;
        }
        let packed_currency = pack_currency(currency)?;
        self.insert(Account::new(id, account_type, packed_currency))?;
        self.count += 1;
        if self.next_id <= id {
            self.next_id = id + 1;
        }
        Ok(())
    }

    /// Fetch a by-value snapshot of the account.
    pub fn get(&self, id: u32) -> LedgerResult<Account> {
        self.slot_index(id)
            .map(|idx| self.slots[idx].expect("slot_index only returns occupied slots"))
            .ok_or(LedgerError::NotFound { account_id: id })
    }

    /// Atomically apply `delta_cents` to the account's balance, stamping
    /// `version`. Rejects a resulting negative balance unless `id` is the
    /// cash reserve.
    pub fn apply_delta(&mut self, id: u32, delta_cents: i64, version: u64) -> LedgerResult<()> {
        let idx = self
            .slot_index(id)
            .ok_or(LedgerError::NotFound { account_id: id })?;
        let account = self.slots[idx].as_mut().expect("occupied slot");
        let new_balance = account.balance_cents.checked_add(delta_cents).ok_or_else(|| {
            LedgerError::Constraint(format!("account {id} balance would overflow"))
        })?;
        if new_balance < 0 && !account.allows_negative_balance() {
            return Err(LedgerError::Constraint(format!(
                "account {id} would go negative"
            )));
        }
        account.balance_cents = new_balance;
        account.version = version;
        Ok(())
    }

    /// Overwrite an account's balance and version directly. Used only during
    /// checkpoint restore. Still rejects a negative balance on non-reserve
    /// accounts — the cash reserve is explicitly exempted, matching
    /// `apply_delta`: a reserve account is negative in the overwhelming
    /// common case, and a checkpoint restore that rejected that would make
    /// every checkpoint taken after a single deposit unloadable.
    pub fn set_balance(&mut self, id: u32, balance_cents: i64, version: u64) -> LedgerResult<()> {
        let idx = self
            .slot_index(id)
            .ok_or(LedgerError::NotFound { account_id: id })?;
        let account = self.slots[idx].as_mut().expect("occupied slot");
        if balance_cents < 0 && !account.allows_negative_balance() {
            return Err(LedgerError::Constraint(format!(
                "account {id} balance would be negative"
            )));
        }
        account.balance_cents = balance_cents;
        account.version = version;
        Ok(())
    }

    /// Encode the store's complete state as a snapshot (§6.3 format),
    /// stamping `next_tx_id`.
    pub fn serialize(&self, next_tx_id: u32) -> Vec<u8> {
        let entries: Vec<SnapshotEntry> = self
            .slots
            .iter()
            .flatten()
            .map(|account| SnapshotEntry {
                id: account.id,
                account_type: account.account_type.to_u8(),
                balance_cents: account.balance_cents,
                version: account.version,
                currency: account.currency,
            })
            .collect();
        snapshot::encode_snapshot(next_tx_id, &entries)
    }

    /// Rebuild a fresh store from a snapshot's bytes. Returns the rebuilt
    /// store and the `next_tx_id` it carried.
    pub fn restore_from_snapshot(bytes: &[u8], max_capacity: u32) -> LedgerResult<(Self, u64)> {
        let (next_tx_id, entries) = snapshot::decode_snapshot(bytes).ok_or_else(|| {
            LedgerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "malformed snapshot",
            ))
        })?;
        let initial_capacity = ledger_core::INITIAL_TABLE_CAPACITY
            .max((entries.len() as u32).next_power_of_two())
            .min(max_capacity.max(1));
        let mut store = AccountStore::with_capacity(initial_capacity, max_capacity);
        for entry in entries {
            let account_type = AccountType::from_u8(entry.account_type)?;
            let currency = unpack_currency(&entry.currency);
            store.create_with_id(entry.id, account_type, &currency)?;
            store.set_balance(entry.id, entry.balance_cents, entry.version)?;
        }
        Ok((store, next_tx_id as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_allocates_monotonic_ids() {
        let mut store = AccountStore::with_capacity(4, 64);
        let a = store.create(AccountType::Checking, "USD").unwrap();
        let b = store.create(AccountType::Savings, "USD").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn create_with_id_advances_next_id() {
        let mut store = AccountStore::with_capacity(4, 64);
        store
            .create_with_id(5, AccountType::Checking, "USD")
            .unwrap();
        let next = store.create(AccountType::Checking, "USD").unwrap();
        assert_eq!(next, 6);
    }

    #[test]
    fn get_missing_account_is_not_found() {
        let store = AccountStore::with_capacity(4, 64);
        assert!(matches!(
            store.get(42),
            Err(LedgerError::NotFound { account_id: 42 })
        ));
    }

    #[test]
    fn apply_delta_rejects_negative_on_non_reserve() {
        let mut store = AccountStore::with_capacity(4, 64);
        let id = store.create(AccountType::Checking, "USD").unwrap();
        assert!(matches!(
            store.apply_delta(id, -100, 1),
            Err(LedgerError::Constraint(_))
        ));
        assert_eq!(store.get(id).unwrap().balance_cents, 0);
    }

    #[test]
    fn apply_delta_allows_reserve_to_cross_zero() {
        let mut store = AccountStore::with_capacity(4, 64);
        store
            .create_with_id(0, AccountType::Checking, "USD")
            .unwrap();
        store.apply_delta(0, -500, 1).unwrap();
        assert_eq!(store.get(0).unwrap().balance_cents, -500);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut store = AccountStore::with_capacity(2, 64);
        for _ in 0..10 {
            store.create(AccountType::Checking, "USD").unwrap();
        }
        assert_eq!(store.count(), 10);
        assert!(store.capacity() >= 10);
    }

    #[test]
    fn grow_fails_at_ceiling() {
        let mut store = AccountStore::with_capacity(2, 2);
        store.create(AccountType::Checking, "USD").unwrap();
        store.create(AccountType::Checking, "USD").unwrap();
        assert!(matches!(
            store.create(AccountType::Checking, "USD"),
            Err(LedgerError::NoMem(_))
        ));
    }

    #[test]
    fn serialize_round_trips_through_restore() {
        let mut store = AccountStore::with_capacity(8, 64);
        store
            .create_with_id(0, AccountType::Checking, "USD")
            .unwrap();
        let id = store.create(AccountType::Savings, "USD").unwrap();
        store.apply_delta(0, -2500, 7).unwrap();
        store.apply_delta(id, 2500, 7).unwrap();

        let bytes = store.serialize(8);
        let (restored, next_tx_id) = AccountStore::restore_from_snapshot(&bytes, 64).unwrap();
        assert_eq!(next_tx_id, 8);
        assert_eq!(restored.get(0).unwrap().balance_cents, -2500);
        assert_eq!(restored.get(id).unwrap().balance_cents, 2500);
    }
}
