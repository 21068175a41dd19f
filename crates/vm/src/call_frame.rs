use bytes::Bytes;
use ledgervm_common::{Address, H256, U256, tracing::CallType};

use crate::errors::{ExecutionFault, VMError};

/// Execution context of a single message call or contract creation.
///
/// A frame is built by the dispatcher, handed to the interpreter, and dropped
/// once the invocation returns, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Address seen as the sender of this message.
    pub msg_sender: Address,
    /// Account whose balance and storage the code acts on.
    pub to: Address,
    /// Account the running code was loaded from. Differs from `to` for
    /// CALLCODE and DELEGATECALL.
    pub code_address: Address,
    pub bytecode: Bytes,
    pub code_hash: H256,
    /// Value carried by the message. For DELEGATECALL it is the parent's value,
    /// nothing is transferred.
    pub msg_value: U256,
    pub gas_limit: u64,
    pub gas_used: u64,
    /// Nesting level the frame was started at. The top-level frame has depth 0.
    pub depth: usize,
    pub call_type: CallType,
    /// DELEGATECALL frames act on behalf of their parent's sender.
    pub is_delegate: bool,
    pub is_create: bool,
}

impl CallFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msg_sender: Address,
        to: Address,
        code_address: Address,
        bytecode: Bytes,
        code_hash: H256,
        msg_value: U256,
        gas_limit: u64,
        depth: usize,
        call_type: CallType,
    ) -> Self {
        Self {
            msg_sender,
            to,
            code_address,
            bytecode,
            code_hash,
            msg_value,
            gas_limit,
            gas_used: 0,
            depth,
            call_type,
            is_delegate: false,
            is_create: matches!(call_type, CallType::CREATE),
        }
    }

    /// Makes this frame act on behalf of `parent`: the sender and value seen by
    /// the running code are the ones `parent` received.
    pub fn as_delegate(mut self, parent: &CallFrame) -> Self {
        self.msg_sender = parent.msg_sender;
        self.msg_value = parent.msg_value;
        self.is_delegate = true;
        self
    }

    pub fn gas_remaining(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_used)
    }

    /// Charges `gas` if the frame can afford it. Nothing is charged otherwise.
    pub fn use_gas(&mut self, gas: u64) -> bool {
        if gas > self.gas_remaining() {
            return false;
        }
        self.gas_used = self.gas_used.saturating_add(gas);
        true
    }

    /// Like [`CallFrame::use_gas`], but failing to pay is an out of gas fault.
    pub fn increase_consumed_gas(&mut self, gas: u64) -> Result<(), VMError> {
        if self.use_gas(gas) {
            Ok(())
        } else {
            Err(ExecutionFault::OutOfGas.into())
        }
    }

    /// Gives back gas a nested call did not spend.
    pub fn return_gas(&mut self, gas: u64) {
        self.gas_used = self.gas_used.saturating_sub(gas);
    }

    pub fn consume_all_gas(&mut self) {
        self.gas_used = self.gas_limit;
    }
}
