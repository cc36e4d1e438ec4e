//! Account record and account kind
use crate::constants::CURRENCY_LEN;
use crate::error::{LedgerError, LedgerResult};

/// The kind of account. Purely descriptive; does not affect balance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    /// A checking account.
    Checking,
    /// A savings account.
    Savings,
    /// An investment account.
    Investment,
}

impl AccountType {
    /// Decode the on-disk discriminant used by the WAL record and snapshot
    /// formats. Unknown values are rejected rather than silently defaulted.
    pub fn from_u8(value: u8) -> LedgerResult<Self> {
        match value {
            0 => Ok(AccountType::Checking),
            1 => Ok(AccountType::Savings),
            2 => Ok(AccountType::Investment),
            other => Err(LedgerError::Invalid(format!(
                "unknown account type discriminant {other}"
            ))),
        }
    }

    /// Encode as the on-disk discriminant.
    pub fn to_u8(self) -> u8 {
        match self {
            AccountType::Checking => 0,
            AccountType::Savings => 1,
            AccountType::Investment => 2,
        }
    }
}

/// Pad a currency code to the fixed 4-byte ASCII field, null-padding on the
/// right. Rejects codes longer than the field and non-ASCII input.
pub fn pack_currency(code: &str) -> LedgerResult<[u8; CURRENCY_LEN]> {
    if !code.is_ascii() {
        return Err(LedgerError::Invalid(format!(
            "currency code {code:?} is not ASCII"
        )));
    }
    if code.len() > CURRENCY_LEN {
        return Err(LedgerError::Invalid(format!(
            "currency code {code:?} longer than {CURRENCY_LEN} bytes"
        )));
    }
    let mut packed = [0u8; CURRENCY_LEN];
    packed[..code.len()].copy_from_slice(code.as_bytes());
    Ok(packed)
}

/// Recover a display string from a packed currency field, trimming the
/// trailing null padding.
pub fn unpack_currency(packed: &[u8; CURRENCY_LEN]) -> String {
    let end = packed.iter().position(|&b| b == 0).unwrap_or(CURRENCY_LEN);
    String::from_utf8_lossy(&packed[..end]).into_owned()
}

/// A single account: balance-bearing entity with id, type, currency, balance,
/// and version.
///
/// `get` on the store returns this type by value — it is a point-in-time
/// snapshot, not a handle back into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    /// Unique id within the store. Id `0` is the cash reserve.
    pub id: u32,
    /// The account's kind.
    pub account_type: AccountType,
    /// Fixed 4-byte ASCII currency code, null-padded.
    pub currency: [u8; CURRENCY_LEN],
    /// Balance in integer cents. Non-negative for every account except id 0.
    pub balance_cents: i64,
    /// The tx_id of the most recent committed transaction that touched this
    /// account. Monotonic non-decreasing.
    pub version: u64,
}

impl Account {
    /// Construct a freshly-created account: zero balance, zero version.
    pub fn new(id: u32, account_type: AccountType, currency: [u8; CURRENCY_LEN]) -> Self {
        Account {
            id,
            account_type,
            currency,
            balance_cents: 0,
            version: 0,
        }
    }

    /// Whether this account may carry a negative balance (true only for the
    /// cash reserve, id 0).
    pub fn allows_negative_balance(&self) -> bool {
        self.id == crate::constants::CASH_ACCOUNT_ID
    }

    /// The currency code as a display string.
    pub fn currency_str(&self) -> String {
        unpack_currency(&self.currency)
    }
}
