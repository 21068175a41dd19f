/// Deepest nesting at which a call or creation may still start.
pub const MAX_CALL_DEPTH: usize = 1024;

/// EIP-170
pub const MAX_CODE_SIZE: usize = 24576;

/// Gas per byte of code deposited by a contract creation.
pub const CREATE_DATA_GAS: u64 = 200;
