use crate::{Address, Bytes, H256, U256, types::AccountInfo};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Net change to a single account produced by an execution.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountUpdate {
    pub address: Address,
    pub info: Option<AccountInfo>,
    pub code: Option<Bytes>,
    /// The account was re-created, so any storage persisted before is void.
    pub removed_storage: bool,
    pub added_storage: FxHashMap<H256, U256>,
}
