use crate::errors::{DatabaseError, InternalError};
use bytes::Bytes;
use ledgervm_common::{
    Address, H256, U256,
    types::{AccountInfo, AccountState},
};

pub mod gen_db;
pub mod journal;

pub use gen_db::GeneralizedDatabase;

/// Read-only access to persisted world state.
pub trait Database: Send + Sync {
    /// `None` when the store has never seen the address.
    fn get_account_state(&self, address: Address) -> Result<Option<AccountState>, DatabaseError>;
    fn get_storage_value(&self, address: Address, key: H256) -> Result<U256, DatabaseError>;
    fn get_account_code(&self, code_hash: H256) -> Result<Bytes, DatabaseError>;
}

/// Opaque marker of a point in the state history.
///
/// Only valid for the [`StateView`] that issued it, and only until that view is
/// reverted to an earlier snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(usize);

impl SnapshotId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn id(&self) -> usize {
        self.0
    }
}

/// Mutable world state the VM executes against.
///
/// Reads take `&mut self` because implementations are expected to cache what
/// they load.
pub trait StateView {
    fn account_exists(&mut self, address: Address) -> Result<bool, InternalError>;

    /// Creates a fresh account at `address`. An existing balance carries over,
    /// everything else is reset.
    fn create_account(&mut self, address: Address) -> Result<(), InternalError>;

    /// Account info, or the empty default for a nonexistent account.
    fn get_account(&mut self, address: Address) -> Result<AccountInfo, InternalError>;

    fn get_balance(&mut self, address: Address) -> Result<U256, InternalError> {
        Ok(self.get_account(address)?.balance)
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), InternalError>;
    fn sub_balance(&mut self, address: Address, amount: U256) -> Result<(), InternalError>;

    fn get_nonce(&mut self, address: Address) -> Result<u64, InternalError> {
        Ok(self.get_account(address)?.nonce)
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), InternalError>;

    fn get_code_hash(&mut self, address: Address) -> Result<H256, InternalError> {
        Ok(self.get_account(address)?.code_hash)
    }

    fn get_code(&mut self, address: Address) -> Result<Bytes, InternalError>;
    fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), InternalError>;

    fn get_storage(&mut self, address: Address, key: H256) -> Result<U256, InternalError>;
    fn set_storage(&mut self, address: Address, key: H256, value: U256)
    -> Result<(), InternalError>;

    /// Marks the current state so it can be restored with [`StateView::revert_to_snapshot`].
    fn snapshot(&mut self) -> SnapshotId;

    /// Undoes every change made since `snapshot` was taken.
    fn revert_to_snapshot(&mut self, snapshot: SnapshotId) -> Result<(), InternalError>;
}
