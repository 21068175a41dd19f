use std::sync::Arc;

use bytes::Bytes;
use ledgervm_common::{Address, U256, types::ChainConfig};
use tokio_util::sync::CancellationToken;

use crate::{
    call_frame::CallFrame,
    config::VMConfig,
    db::StateView,
    environment::Environment,
    errors::{ContextResult, CreateResult, VMError},
    fork_rules::ForkRules,
    interpreter::{Host, Interpreter},
    tracing::CallTracer,
};

/// Message-call and contract-creation dispatcher.
///
/// One `VM` drives one execution against a [`StateView`]. Nested calls made by
/// running code come back through [`Host`] and reuse the same instance, so the
/// depth counter, tracer and cancellation flag are shared by every frame.
pub struct VM<'a> {
    pub env: Environment,
    pub db: &'a mut dyn StateView,
    pub tracer: CallTracer,
    pub(crate) chain_config: ChainConfig,
    pub(crate) rules: ForkRules,
    pub(crate) config: VMConfig,
    pub(crate) interpreter: Arc<dyn Interpreter>,
    /// Nesting level of the frame currently running, 0 when idle.
    pub(crate) depth: usize,
    cancellation: CancellationToken,
}

impl<'a> VM<'a> {
    pub fn new(
        env: Environment,
        db: &'a mut dyn StateView,
        chain_config: ChainConfig,
        config: VMConfig,
        interpreter: Arc<dyn Interpreter>,
    ) -> Self {
        let rules = ForkRules::new(&chain_config, env.block_number);
        Self {
            env,
            db,
            tracer: CallTracer::disabled(),
            chain_config,
            rules,
            config,
            interpreter,
            depth: 0,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_tracer(mut self, tracer: CallTracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Ties this VM to an externally owned token, e.g. one that is also
    /// cancelled on shutdown or a timeout.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Asks the running interpreter to stop at its next check. Safe to call
    /// from any thread through [`VM::cancellation_token`], and more than once.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn rules(&self) -> &ForkRules {
        &self.rules
    }

    pub fn config(&self) -> &VMConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Arc<dyn Interpreter> {
        &self.interpreter
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Host for VM<'_> {
    fn env(&self) -> &Environment {
        &self.env
    }

    fn rules(&self) -> &ForkRules {
        &self.rules
    }

    fn state(&mut self) -> &mut dyn StateView {
        &mut *self.db
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn is_cancelled(&self) -> bool {
        VM::is_cancelled(self)
    }

    fn call(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<ContextResult, VMError> {
        VM::call(self, caller, address, input, gas, value)
    }

    fn call_code(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<ContextResult, VMError> {
        VM::call_code(self, caller, address, input, gas, value)
    }

    fn delegate_call(
        &mut self,
        parent: &CallFrame,
        address: Address,
        input: Bytes,
        gas: u64,
    ) -> Result<ContextResult, VMError> {
        VM::delegate_call(self, parent, address, input, gas)
    }

    fn create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<CreateResult, VMError> {
        VM::create(self, caller, init_code, gas, value)
    }
}
