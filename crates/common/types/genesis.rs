use std::{collections::BTreeMap, ops::Index};

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::types::BlockHeader;

use self::Fork::*;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    /// Chain configuration
    pub config: ChainConfig,
    /// The initial state of the accounts in the genesis block.
    pub alloc: BTreeMap<Address, GenesisAccount>,
    /// Genesis header values
    #[serde(default)]
    pub coinbase: Address,
    #[serde(default, deserialize_with = "crate::serde_utils::u256::deser_hex_or_dec_str")]
    pub difficulty: U256,
    #[serde(default, deserialize_with = "crate::serde_utils::u64::deser_hex_or_dec_str")]
    pub gas_limit: u64,
    #[serde(default, deserialize_with = "crate::serde_utils::u64::deser_hex_or_dec_str")]
    pub timestamp: u64,
}

impl Genesis {
    pub fn get_block_header(&self) -> BlockHeader {
        BlockHeader {
            parent_hash: H256::zero(),
            coinbase: self.coinbase,
            difficulty: self.difficulty,
            number: 0,
            gas_limit: self.gas_limit,
            timestamp: self.timestamp,
        }
    }
}

#[allow(unused)]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GenesisAccount {
    #[serde(default, with = "crate::serde_utils::bytes")]
    pub code: Bytes,
    #[serde(default)]
    pub storage: BTreeMap<U256, U256>,
    #[serde(deserialize_with = "crate::serde_utils::u256::deser_hex_or_dec_str")]
    pub balance: U256,
    #[serde(default, deserialize_with = "crate::serde_utils::u64::deser_hex_or_dec_str")]
    pub nonce: u64,
}

/// Block-number activated protocol upgrades, in activation order.
#[repr(u8)]
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Clone, Copy, Serialize, Deserialize,
)]
pub enum Fork {
    #[default]
    Frontier = 0,
    Homestead = 1,
    TangerineWhistle = 2,
    SpuriousDragon = 3,
    Byzantium = 4,
}

#[allow(clippy::as_conversions)]
impl<T> Index<Fork> for [T] {
    type Output = T;
    fn index(&self, fork: Fork) -> &Self::Output {
        &self[fork as usize]
    }
}

pub const FORKS: [Fork; 5] = [Frontier, Homestead, TangerineWhistle, SpuriousDragon, Byzantium];

/// Blockchain settings defined per block
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Current chain identifier
    #[serde(default)]
    pub chain_id: u64,

    /// Block numbers for the block where each fork was activated
    /// (None = no fork, 0 = fork is already active)
    #[serde(default)]
    pub homestead_block: Option<u64>,
    #[serde(default)]
    pub eip150_block: Option<u64>,
    #[serde(default)]
    pub eip155_block: Option<u64>,
    #[serde(default)]
    pub eip158_block: Option<u64>,
    #[serde(default)]
    pub byzantium_block: Option<u64>,
}

impl ChainConfig {
    /// Config with every known fork active from genesis.
    pub fn all_forks_active(chain_id: u64) -> Self {
        Self {
            chain_id,
            homestead_block: Some(0),
            eip150_block: Some(0),
            eip155_block: Some(0),
            eip158_block: Some(0),
            byzantium_block: Some(0),
        }
    }

    /// Activation block of each fork, indexable by [`Fork`].
    pub fn fork_activation_blocks(&self) -> [Option<u64>; FORKS.len()] {
        [
            Some(0),
            self.homestead_block,
            self.eip150_block,
            // Spurious Dragon ships EIP-155 and EIP-158 together; empty-account
            // semantics follow EIP-158.
            self.eip158_block,
            self.byzantium_block,
        ]
    }

    pub fn is_fork_activated(&self, fork: Fork, block_number: u64) -> bool {
        self.fork_activation_blocks()[fork]
            .is_some_and(|activation_block| block_number >= activation_block)
    }

    pub fn is_homestead_activated(&self, block_number: u64) -> bool {
        self.is_fork_activated(Homestead, block_number)
    }

    pub fn is_eip158_activated(&self, block_number: u64) -> bool {
        self.is_fork_activated(SpuriousDragon, block_number)
    }

    pub fn get_fork(&self, block_number: u64) -> Fork {
        let Some(index) = self
            .fork_activation_blocks()
            .iter()
            .rposition(|possible_block| {
                possible_block.is_some_and(|activation_block| activation_block <= block_number)
            })
        else {
            return Frontier;
        };
        FORKS.get(index).copied().unwrap_or(Frontier)
    }
}
