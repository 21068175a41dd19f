use ledgervm_common::types::{ChainConfig, Fork};

/// Fork-dependent behaviour of the dispatcher, resolved once for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkRules {
    fork: Fork,
    homestead: bool,
    eip158: bool,
}

impl ForkRules {
    pub fn new(chain_config: &ChainConfig, block_number: u64) -> Self {
        Self {
            fork: chain_config.get_fork(block_number),
            homestead: chain_config.is_homestead_activated(block_number),
            eip158: chain_config.is_eip158_activated(block_number),
        }
    }

    /// Rules of a chain that activated every fork up to and including `fork`.
    pub fn for_fork(fork: Fork) -> Self {
        Self {
            fork,
            homestead: fork >= Fork::Homestead,
            eip158: fork >= Fork::SpuriousDragon,
        }
    }

    pub fn fork(&self) -> Fork {
        self.fork
    }

    /// EIP-158: a zero-value call must not bring an empty account into existence.
    pub fn skip_empty_zero_value_calls(&self) -> bool {
        self.eip158
    }

    /// Homestead: running out of gas while depositing contract code fails the
    /// creation. Before it, the account stays behind without code.
    pub fn code_store_failure_reverts(&self) -> bool {
        self.homestead
    }

    /// EIP-161: contracts start with nonce 1.
    pub fn created_account_nonce(&self) -> u64 {
        if self.eip158 { 1 } else { 0 }
    }
}
