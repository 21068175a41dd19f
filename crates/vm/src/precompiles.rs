use ledgervm_common::types::Fork::{self, *};
use ledgervm_common::{Address, H160};

/// A native contract living at a reserved address. The dispatcher only needs
/// to know where they are; executing them is the interpreter's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precompile {
    pub address: H160,
    pub name: &'static str,
    pub active_since_fork: Fork,
}

const fn precompile_address(index: u8) -> H160 {
    let mut bytes = [0u8; 20];
    bytes[19] = index;
    H160(bytes)
}

pub const ECRECOVER: Precompile = Precompile {
    address: precompile_address(0x01),
    name: "ECREC",
    active_since_fork: Frontier,
};

pub const SHA2_256: Precompile = Precompile {
    address: precompile_address(0x02),
    name: "SHA256",
    active_since_fork: Frontier,
};

pub const RIPEMD_160: Precompile = Precompile {
    address: precompile_address(0x03),
    name: "RIPEMD160",
    active_since_fork: Frontier,
};

pub const IDENTITY: Precompile = Precompile {
    address: precompile_address(0x04),
    name: "ID",
    active_since_fork: Frontier,
};

pub const MODEXP: Precompile = Precompile {
    address: precompile_address(0x05),
    name: "MODEXP",
    active_since_fork: Byzantium,
};

pub const ECADD: Precompile = Precompile {
    address: precompile_address(0x06),
    name: "BN254_ADD",
    active_since_fork: Byzantium,
};

pub const ECMUL: Precompile = Precompile {
    address: precompile_address(0x07),
    name: "BN254_MUL",
    active_since_fork: Byzantium,
};

pub const ECPAIRING: Precompile = Precompile {
    address: precompile_address(0x08),
    name: "BN254_PAIRING",
    active_since_fork: Byzantium,
};

pub const PRECOMPILES: [Precompile; 8] = [
    ECRECOVER, SHA2_256, RIPEMD_160, IDENTITY, MODEXP, ECADD, ECMUL, ECPAIRING,
];

pub fn precompiles_for_fork(fork: Fork) -> impl Iterator<Item = Precompile> {
    PRECOMPILES
        .into_iter()
        .filter(move |precompile| precompile.active_since_fork <= fork)
}

pub fn is_precompile(address: &Address, fork: Fork) -> bool {
    precompiles_for_fork(fork).any(|precompile| precompile.address == *address)
}
