use std::collections::BTreeMap;

use bytes::Bytes;
use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{EMPTY_KECCACK_HASH, EMPTY_TRIE_HASH},
    types::GenesisAccount,
    utils::keccak,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub code_hash: H256,
    pub balance: U256,
    pub nonce: u64,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            code_hash: EMPTY_KECCACK_HASH,
            balance: U256::zero(),
            nonce: 0,
        }
    }
}

impl AccountInfo {
    /// An account is empty when it has no code, zero nonce and zero balance (EIP-161).
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code_hash == EMPTY_KECCACK_HASH
    }
}

/// Account as persisted in the state trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: H256,
    pub code_hash: H256,
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            storage_root: EMPTY_TRIE_HASH,
            code_hash: EMPTY_KECCACK_HASH,
        }
    }
}

/// Account with its code and storage fully materialized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub info: AccountInfo,
    pub code: Bytes,
    pub storage: BTreeMap<H256, U256>,
}

impl Account {
    pub fn new(balance: U256, code: Bytes, nonce: u64, storage: BTreeMap<H256, U256>) -> Self {
        Self {
            info: AccountInfo {
                code_hash: keccak(&code),
                balance,
                nonce,
            },
            code,
            storage,
        }
    }

    pub fn has_code(&self) -> bool {
        self.info.code_hash != EMPTY_KECCACK_HASH
    }
}

impl From<GenesisAccount> for Account {
    fn from(genesis: GenesisAccount) -> Self {
        let storage = genesis
            .storage
            .into_iter()
            .map(|(key, value)| (H256(key.to_big_endian()), value))
            .collect();
        Account::new(genesis.balance, genesis.code, genesis.nonce, storage)
    }
}
