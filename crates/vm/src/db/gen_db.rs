use std::collections::hash_map::Entry;
use std::sync::Arc;

use bytes::Bytes;
use ledgervm_common::constants::EMPTY_KECCACK_HASH;
use ledgervm_common::types::{AccountInfo, AccountUpdate};
use ledgervm_common::utils::keccak;
use ledgervm_common::{Address, H256, U256};
use rustc_hash::FxHashMap;

use super::journal::{Journal, JournalEntry};
use super::{Database, SnapshotId, StateView};
use crate::account::{AccountStatus, CachedAccount};
use crate::errors::InternalError;

pub type CacheDB = FxHashMap<Address, CachedAccount>;

/// In-memory world state layered over a [`Database`].
///
/// Accounts are loaded lazily and kept twice: `initial_accounts_state` holds
/// them as first read from the store and `current_accounts_state` receives every
/// change. Each change is also written to a [`Journal`] so it can be rolled back
/// to any snapshot.
#[derive(Clone)]
pub struct GeneralizedDatabase {
    pub store: Arc<dyn Database>,
    pub current_accounts_state: CacheDB,
    pub initial_accounts_state: CacheDB,
    pub codes: FxHashMap<H256, Bytes>,
    journal: Journal,
}

impl GeneralizedDatabase {
    pub fn new(store: Arc<dyn Database>) -> Self {
        Self {
            store,
            current_accounts_state: Default::default(),
            initial_accounts_state: Default::default(),
            codes: Default::default(),
            journal: Journal::new(),
        }
    }

    // ================== Account related functions =====================
    /// Loads account
    /// If it's the first time it's loaded store it in `initial_accounts_state`
    /// and also cache it in `current_accounts_state` for making changes to it
    fn load_account(&mut self, address: Address) -> Result<&mut CachedAccount, InternalError> {
        match self.current_accounts_state.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                if let Some(account) = self.initial_accounts_state.get(&address) {
                    return Ok(entry.insert(account.clone()));
                }
                let state = self.store.get_account_state(address)?;
                let account = CachedAccount::from(state);
                self.initial_accounts_state.insert(address, account.clone());
                Ok(entry.insert(account))
            }
        }
    }

    /// Gets the account for writing. Writing to a nonexistent account brings it
    /// into existence, and that is journaled as well.
    fn account_for_write(&mut self, address: Address) -> Result<&mut CachedAccount, InternalError> {
        self.load_account(address)?;
        let account = self
            .current_accounts_state
            .get_mut(&address)
            .ok_or(InternalError::AccountNotFound(address))?;
        if !account.exists {
            self.journal.record(JournalEntry::AccountCreated {
                address,
                previous: account.clone(),
            });
            account.exists = true;
        }
        account.mark_modified();
        Ok(account)
    }

    /// Gets code given the code hash, loading it from the store on a cache miss.
    pub fn get_code_by_hash(&mut self, code_hash: H256) -> Result<Bytes, InternalError> {
        if code_hash == EMPTY_KECCACK_HASH {
            return Ok(Bytes::new());
        }
        match self.codes.entry(code_hash) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let code = self.store.get_account_code(code_hash)?;
                Ok(entry.insert(code).clone())
            }
        }
    }

    /// Gets storage slot from Database, storing in initial_accounts_state for
    /// efficiency when getting AccountUpdates.
    fn get_value_from_database(
        &mut self,
        address: Address,
        key: H256,
    ) -> Result<U256, InternalError> {
        let value = self.store.get_storage_value(address, key)?;
        // Account must already be in initial_accounts_state
        match self.initial_accounts_state.get_mut(&address) {
            Some(account) => {
                account.storage.insert(key, value);
            }
            None => {
                return Err(InternalError::msg(
                    "Account not found in cache when fetching storage",
                ));
            }
        }
        Ok(value)
    }

    /// Number of changes that can currently be reverted.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Accepts every change made so far. Snapshots taken before this call become invalid.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Net effect of the execution on every account it modified, ordered by address.
    pub fn get_state_transitions(&self) -> Result<Vec<AccountUpdate>, InternalError> {
        let mut account_updates: Vec<AccountUpdate> = vec![];
        for (address, new_state_account) in self.current_accounts_state.iter() {
            if new_state_account.is_unmodified() {
                // Skip processing account that we know wasn't mutably accessed during execution
                continue;
            }
            let initial_state_account = self
                .initial_accounts_state
                .get(address)
                .ok_or(InternalError::AccountNotFound(*address))?;

            let created = new_state_account.exists && !initial_state_account.exists;
            let removed_storage = new_state_account.storage_is_fresh()
                && initial_state_account.exists
                && new_state_account.exists;

            let acc_info_updated =
                created || initial_state_account.info != new_state_account.info;

            let new_code_hash = new_state_account.info.code_hash;
            let code = if initial_state_account.info.code_hash != new_code_hash {
                if new_code_hash == EMPTY_KECCACK_HASH {
                    Some(Bytes::new())
                } else {
                    Some(
                        self.codes
                            .get(&new_code_hash)
                            .cloned()
                            .ok_or(InternalError::CodeNotFound(new_code_hash))?,
                    )
                }
            } else {
                None
            };

            let mut added_storage: FxHashMap<H256, U256> = Default::default();
            for (key, new_value) in &new_state_account.storage {
                let old_value = if removed_storage {
                    // There's no old value if the account was re-created.
                    U256::zero()
                } else {
                    initial_state_account
                        .storage
                        .get(key)
                        .copied()
                        .unwrap_or_default()
                };
                if *new_value != old_value {
                    added_storage.insert(*key, *new_value);
                }
            }

            if !acc_info_updated && added_storage.is_empty() && !removed_storage {
                // Account hasn't been updated
                continue;
            }

            account_updates.push(AccountUpdate {
                address: *address,
                info: acc_info_updated.then(|| new_state_account.info.clone()),
                code,
                removed_storage,
                added_storage,
            });
        }
        account_updates.sort_by_key(|update| update.address);
        Ok(account_updates)
    }
}

impl StateView for GeneralizedDatabase {
    fn account_exists(&mut self, address: Address) -> Result<bool, InternalError> {
        Ok(self.load_account(address)?.exists)
    }

    fn create_account(&mut self, address: Address) -> Result<(), InternalError> {
        let previous = self.load_account(address)?.clone();
        let balance = previous.info.balance;
        self.journal
            .record(JournalEntry::AccountCreated { address, previous });
        self.current_accounts_state.insert(
            address,
            CachedAccount {
                info: AccountInfo {
                    balance,
                    ..Default::default()
                },
                storage: Default::default(),
                exists: true,
                status: AccountStatus::Created,
            },
        );
        Ok(())
    }

    fn get_account(&mut self, address: Address) -> Result<AccountInfo, InternalError> {
        Ok(self.load_account(address)?.info.clone())
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), InternalError> {
        let previous = self.get_balance(address)?;
        let balance = previous
            .checked_add(amount)
            .ok_or(InternalError::Overflow)?;
        self.account_for_write(address)?.info.balance = balance;
        self.journal
            .record(JournalEntry::BalanceChanged { address, previous });
        Ok(())
    }

    fn sub_balance(&mut self, address: Address, amount: U256) -> Result<(), InternalError> {
        let previous = self.get_balance(address)?;
        let balance = previous
            .checked_sub(amount)
            .ok_or(InternalError::Underflow)?;
        self.account_for_write(address)?.info.balance = balance;
        self.journal
            .record(JournalEntry::BalanceChanged { address, previous });
        Ok(())
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), InternalError> {
        let previous = self.get_nonce(address)?;
        self.account_for_write(address)?.info.nonce = nonce;
        self.journal
            .record(JournalEntry::NonceChanged { address, previous });
        Ok(())
    }

    fn get_code(&mut self, address: Address) -> Result<Bytes, InternalError> {
        let code_hash = self.load_account(address)?.info.code_hash;
        self.get_code_by_hash(code_hash)
    }

    fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), InternalError> {
        let previous = self.get_code_hash(address)?;
        let code_hash = keccak(&code);
        self.codes.insert(code_hash, code);
        self.account_for_write(address)?.info.code_hash = code_hash;
        self.journal
            .record(JournalEntry::CodeChanged { address, previous });
        Ok(())
    }

    fn get_storage(&mut self, address: Address, key: H256) -> Result<U256, InternalError> {
        let account = self.load_account(address)?;
        if let Some(value) = account.storage.get(&key) {
            return Ok(*value);
        }
        if !account.exists || account.storage_is_fresh() {
            return Ok(U256::zero());
        }
        let value = self.get_value_from_database(address, key)?;
        self.load_account(address)?.storage.insert(key, value);
        Ok(value)
    }

    fn set_storage(
        &mut self,
        address: Address,
        key: H256,
        value: U256,
    ) -> Result<(), InternalError> {
        let previous = self.get_storage(address, key)?;
        self.account_for_write(address)?.storage.insert(key, value);
        self.journal.record(JournalEntry::StorageChanged {
            address,
            key,
            previous,
        });
        Ok(())
    }

    fn snapshot(&mut self) -> SnapshotId {
        SnapshotId::new(self.journal.len())
    }

    fn revert_to_snapshot(&mut self, snapshot: SnapshotId) -> Result<(), InternalError> {
        self.journal
            .revert_to(snapshot.id(), &mut self.current_accounts_state)
    }
}
