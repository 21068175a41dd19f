use bytes::Bytes;
use ledgervm_common::{Address, U256};

use crate::{
    call_frame::CallFrame,
    db::StateView,
    environment::Environment,
    errors::{ContextResult, CreateResult, VMError},
    fork_rules::ForkRules,
};

/// Runs contract code.
///
/// The VM owns dispatch, snapshots and gas policy; the interpreter only runs
/// the code of the frame it is given. It charges gas on `frame` as it goes and
/// returns the frame's output, or the fault that stopped it.
pub trait Interpreter: Send + Sync {
    fn run(
        &self,
        host: &mut dyn Host,
        frame: &mut CallFrame,
        input: &Bytes,
    ) -> Result<Bytes, VMError>;
}

/// What running code can reach: shared context, world state, and the nested
/// call and create operations.
pub trait Host {
    fn env(&self) -> &Environment;
    fn rules(&self) -> &ForkRules;
    fn state(&mut self) -> &mut dyn StateView;
    /// Nesting level of the frame currently running.
    fn depth(&self) -> usize;
    /// Interpreters poll this between instructions and stop with
    /// `ExecutionFault::Cancelled` once it is set.
    fn is_cancelled(&self) -> bool;

    fn call(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<ContextResult, VMError>;

    fn call_code(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<ContextResult, VMError>;

    fn delegate_call(
        &mut self,
        parent: &CallFrame,
        address: Address,
        input: Bytes,
        gas: u64,
    ) -> Result<ContextResult, VMError>;

    fn create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<CreateResult, VMError>;
}
