use ledgervm_common::constants::EMPTY_KECCACK_HASH;
use ledgervm_common::types::{AccountInfo, AccountState};
use ledgervm_common::{H256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account as cached by the `GeneralizedDatabase`.
///
/// Code is not stored here; it lives in the database's code cache keyed by
/// `info.code_hash`, so identical contracts share one copy in memory.
/// Storage only holds the slots that were read or written during execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccount {
    pub info: AccountInfo,
    pub storage: BTreeMap<H256, U256>,
    /// False for addresses the backing store has never seen and nothing has created yet.
    pub exists: bool,
    pub status: AccountStatus,
}

impl From<Option<AccountState>> for CachedAccount {
    fn from(state: Option<AccountState>) -> Self {
        match state {
            Some(state) => CachedAccount {
                info: AccountInfo {
                    code_hash: state.code_hash,
                    balance: state.balance,
                    nonce: state.nonce,
                },
                storage: BTreeMap::new(),
                exists: true,
                status: AccountStatus::Unmodified,
            },
            None => CachedAccount::default(),
        }
    }
}

impl CachedAccount {
    pub fn has_code(&self) -> bool {
        self.info.code_hash != EMPTY_KECCACK_HASH
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    pub fn is_unmodified(&self) -> bool {
        matches!(self.status, AccountStatus::Unmodified)
    }

    /// Storage persisted in the backing store no longer applies to a re-created account.
    pub fn storage_is_fresh(&self) -> bool {
        matches!(self.status, AccountStatus::Created)
    }

    pub fn mark_modified(&mut self) {
        if self.is_unmodified() {
            self.status = AccountStatus::Modified;
        }
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    Unmodified,
    Modified,
    /// Created by a message call or contract creation during this execution.
    Created,
}
