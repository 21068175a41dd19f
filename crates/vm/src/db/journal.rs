use ledgervm_common::{Address, H256, U256};

use crate::{account::CachedAccount, errors::InternalError};

use super::gen_db::CacheDB;

/// A single undoable change to the cached state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// The account was created, or brought into existence by a write.
    /// Holds the whole account as it was before.
    AccountCreated {
        address: Address,
        previous: CachedAccount,
    },
    BalanceChanged {
        address: Address,
        previous: U256,
    },
    NonceChanged {
        address: Address,
        previous: u64,
    },
    CodeChanged {
        address: Address,
        previous: H256,
    },
    StorageChanged {
        address: Address,
        key: H256,
        previous: U256,
    },
}

impl JournalEntry {
    fn undo(self, accounts: &mut CacheDB) -> Result<(), InternalError> {
        match self {
            JournalEntry::AccountCreated { address, previous } => {
                accounts.insert(address, previous);
            }
            JournalEntry::BalanceChanged { address, previous } => {
                cached(accounts, address)?.info.balance = previous;
            }
            JournalEntry::NonceChanged { address, previous } => {
                cached(accounts, address)?.info.nonce = previous;
            }
            JournalEntry::CodeChanged { address, previous } => {
                cached(accounts, address)?.info.code_hash = previous;
            }
            JournalEntry::StorageChanged {
                address,
                key,
                previous,
            } => {
                cached(accounts, address)?.storage.insert(key, previous);
            }
        }
        Ok(())
    }
}

fn cached(accounts: &mut CacheDB, address: Address) -> Result<&mut CachedAccount, InternalError> {
    accounts
        .get_mut(&address)
        .ok_or(InternalError::AccountNotFound(address))
}

/// Ordered log of state changes. A snapshot is a position in this log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Undoes entries newest first until the journal is back at `checkpoint`.
    pub fn revert_to(
        &mut self,
        checkpoint: usize,
        accounts: &mut CacheDB,
    ) -> Result<(), InternalError> {
        if checkpoint > self.entries.len() {
            return Err(InternalError::InvalidSnapshot(checkpoint));
        }
        while self.entries.len() > checkpoint {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            entry.undo(accounts)?;
        }
        Ok(())
    }

    /// Forgets every entry. Changes can no longer be reverted afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
