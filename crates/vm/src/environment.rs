use ledgervm_common::constants::BLOCK_HASH_HISTORY;
use ledgervm_common::types::BlockHeader;
use ledgervm_common::{Address, H256, U256};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::db::StateView;
use crate::errors::InternalError;

/// Decides whether value may move between accounts and moves it.
pub trait ValueTransfer: Send + Sync {
    fn can_transfer(
        &self,
        state: &mut dyn StateView,
        from: Address,
        value: U256,
    ) -> Result<bool, InternalError>;

    fn transfer(
        &self,
        state: &mut dyn StateView,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), InternalError>;
}

/// Plain balance accounting: the sender must hold at least `value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceTransfer;

impl ValueTransfer for BalanceTransfer {
    fn can_transfer(
        &self,
        state: &mut dyn StateView,
        from: Address,
        value: U256,
    ) -> Result<bool, InternalError> {
        Ok(state.get_balance(from)? >= value)
    }

    fn transfer(
        &self,
        state: &mut dyn StateView,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), InternalError> {
        if value.is_zero() {
            return Ok(());
        }
        state.sub_balance(from, value)?;
        state.add_balance(to, value)
    }
}

/// Resolves the hash of a block by number.
pub trait BlockHashLookup: Send + Sync {
    fn block_hash(&self, number: u64) -> H256;
}

impl<F> BlockHashLookup for F
where
    F: Fn(u64) -> H256 + Send + Sync,
{
    fn block_hash(&self, number: u64) -> H256 {
        self(number)
    }
}

/// No ancestors known; every lookup yields the zero hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlockHashes;

impl BlockHashLookup for NoBlockHashes {
    fn block_hash(&self, _number: u64) -> H256 {
        H256::zero()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockHashes(pub FxHashMap<u64, H256>);

impl BlockHashLookup for BlockHashes {
    fn block_hash(&self, number: u64) -> H256 {
        self.0.get(&number).copied().unwrap_or_default()
    }
}

impl FromIterator<(u64, H256)> for BlockHashes {
    fn from_iter<I: IntoIterator<Item = (u64, H256)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Block and transaction context shared by every frame of an execution.
/// Frames only ever see it by shared reference.
#[derive(Clone)]
pub struct Environment {
    /// The sender address of the external transaction.
    pub origin: Address,
    pub gas_price: U256,
    pub coinbase: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub difficulty: U256,
    pub block_gas_limit: u64,
    pub value_transfer: Arc<dyn ValueTransfer>,
    pub block_hashes: Arc<dyn BlockHashLookup>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("origin", &self.origin)
            .field("gas_price", &self.gas_price)
            .field("coinbase", &self.coinbase)
            .field("block_number", &self.block_number)
            .field("timestamp", &self.timestamp)
            .field("difficulty", &self.difficulty)
            .field("block_gas_limit", &self.block_gas_limit)
            .finish_non_exhaustive()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            origin: Address::zero(),
            gas_price: U256::zero(),
            coinbase: Address::zero(),
            block_number: 0,
            timestamp: 0,
            difficulty: U256::zero(),
            block_gas_limit: 0,
            value_transfer: Arc::new(BalanceTransfer),
            block_hashes: Arc::new(NoBlockHashes),
        }
    }
}

impl Environment {
    pub fn from_block(header: &BlockHeader, origin: Address, gas_price: U256) -> Self {
        Self {
            origin,
            gas_price,
            coinbase: header.coinbase,
            block_number: header.number,
            timestamp: header.timestamp,
            difficulty: header.difficulty,
            block_gas_limit: header.gas_limit,
            ..Default::default()
        }
    }

    pub fn with_value_transfer(mut self, value_transfer: Arc<dyn ValueTransfer>) -> Self {
        self.value_transfer = value_transfer;
        self
    }

    pub fn with_block_hashes(mut self, block_hashes: Arc<dyn BlockHashLookup>) -> Self {
        self.block_hashes = block_hashes;
        self
    }

    /// Hash of an ancestor block. Only the 256 most recent ancestors are
    /// reachable; anything else, the current block included, is the zero hash.
    pub fn block_hash(&self, number: u64) -> H256 {
        let reachable = number < self.block_number
            && self.block_number.saturating_sub(number) <= BLOCK_HASH_HISTORY;
        if !reachable {
            return H256::zero();
        }
        self.block_hashes.block_hash(number)
    }
}
