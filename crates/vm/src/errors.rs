use bytes::Bytes;
use ledgervm_common::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::call_frame::CallFrame;

/// Errors that can end a message call or contract creation.
///
/// Every variant except [`VMError::Internal`] is resolved inside the frame that
/// produced it: the frame's state changes are rolled back and its gas is
/// consumed. Internal errors mean the state view or the VM itself is broken and
/// they propagate to the top-level caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VMError {
    #[error("Max call depth exceeded")]
    DepthExceeded,
    #[error(
        "Insufficient balance for transfer{}",
        .0.as_ref().map(|funds| format!(": {funds}")).unwrap_or_default()
    )]
    InsufficientBalance(Option<InsufficientFunds>),
    #[error("Contract code size exceeds the limit")]
    CodeSizeExceeded,
    #[error("Contract creation code storage out of gas")]
    CodeStoreOutOfGas,
    #[error("Execution fault: {0}")]
    ExecutionFault(#[from] ExecutionFault),
    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),
}

impl VMError {
    /// Internal errors are not resolved by the frame, they abort the whole
    /// top-level operation.
    pub fn should_propagate(&self) -> bool {
        matches!(self, VMError::Internal(_))
    }
}

/// Detail attached to [`VMError::InsufficientBalance`] by CALLCODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("requested {requested}, has {available}")]
pub struct InsufficientFunds {
    pub requested: U256,
    pub available: U256,
}

/// Faults raised by the interpreter while running a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ExecutionFault {
    #[error("Out of gas")]
    OutOfGas,
    #[error("Invalid opcode {0:#04x}")]
    InvalidOpcode(u8),
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Stack overflow")]
    StackOverflow,
    #[error("Execution reverted")]
    Revert,
    #[error("Execution cancelled")]
    Cancelled,
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum InternalError {
    #[error("Arithmetic operation overflowed")]
    Overflow,
    #[error("Arithmetic operation underflowed")]
    Underflow,
    #[error("Snapshot {0} is not part of the journal")]
    InvalidSnapshot(usize),
    #[error("Account {0:#x} not found in cache")]
    AccountNotFound(Address),
    #[error("Code with hash {0:#x} not found")]
    CodeNotFound(H256),
    #[error("Could not pop callframe")]
    CouldNotPopCallframe,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Custom(String),
}

impl InternalError {
    pub fn msg(msg: &'static str) -> Self {
        Self::Custom(msg.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DatabaseError {
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxResult {
    Success,
    /// The operation was skipped before doing any work: recursion is disabled or
    /// the target is a nonexistent account that a zero-value call does not create.
    NoOp,
    Revert(VMError),
}

impl TxResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, TxResult::Revert(_))
    }

    pub fn error(&self) -> Option<&VMError> {
        match self {
            TxResult::Revert(error) => Some(error),
            _ => None,
        }
    }
}

/// Outcome of a message call, as seen by the frame that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextResult {
    pub result: TxResult,
    /// Gas handed to the callee.
    pub gas_limit: u64,
    /// Gas the callee did not give back.
    pub gas_used: u64,
    pub output: Bytes,
}

impl ContextResult {
    pub fn success(frame: &CallFrame, output: Bytes) -> Self {
        Self {
            result: TxResult::Success,
            gas_limit: frame.gas_limit,
            gas_used: frame.gas_used,
            output,
        }
    }

    /// The operation did nothing; all gas goes back to the caller.
    pub fn no_op(gas_limit: u64) -> Self {
        Self {
            result: TxResult::NoOp,
            gas_limit,
            gas_used: 0,
            output: Bytes::new(),
        }
    }

    /// A precondition failed before any state was touched; all gas goes back to the caller.
    pub fn early_revert(gas_limit: u64, error: VMError) -> Self {
        Self {
            result: TxResult::Revert(error),
            gas_limit,
            gas_used: 0,
            output: Bytes::new(),
        }
    }

    /// The frame failed after it started running, so it keeps all of its gas.
    pub fn failure(frame: &CallFrame, error: VMError) -> Self {
        Self {
            result: TxResult::Revert(error),
            gas_limit: frame.gas_limit,
            gas_used: frame.gas_used,
            output: Bytes::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    pub fn error(&self) -> Option<&VMError> {
        self.result.error()
    }

    pub fn gas_left(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_used)
    }
}

/// Outcome of a contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResult {
    pub context: ContextResult,
    /// Derived address of the new contract. `None` only when creation was
    /// rejected before the caller's nonce was read.
    pub address: Option<Address>,
    /// Set when code deposit ran out of gas under rules that keep the created
    /// account anyway. The account exists but holds no code.
    pub deposit_error: Option<VMError>,
}

impl CreateResult {
    pub fn rejected(context: ContextResult) -> Self {
        Self {
            context,
            address: None,
            deposit_error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.context.is_success()
    }

    pub fn error(&self) -> Option<&VMError> {
        self.context.error().or(self.deposit_error.as_ref())
    }

    pub fn gas_left(&self) -> u64 {
        self.context.gas_left()
    }
}
