//! Entry points of the dispatcher: CALL, CALLCODE, DELEGATECALL and CREATE.
//!
//! Every operation opens a trace frame, runs its precondition checks, takes a
//! state snapshot and hands a [`CallFrame`] to the interpreter. A frame that
//! fails after it started loses all of its gas and its state changes are
//! reverted to the snapshot. Precondition failures touch nothing and give all
//! gas back.

use bytes::Bytes;
use ledgervm_common::{
    Address, U256, evm::calculate_create_address, tracing::CallType, utils::keccak,
};
use tracing::{debug, trace};

use crate::{
    call_frame::CallFrame,
    errors::{ContextResult, CreateResult, InternalError, VMError},
    execution_handlers::FundsErrorDetail,
    gas_cost,
    precompiles::is_precompile,
    vm::VM,
};

impl<'a> VM<'a> {
    /// Runs the code at `address` against `address`'s own state, moving
    /// `value` from `caller` to it first.
    pub fn call(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas_limit: u64,
        value: U256,
    ) -> Result<ContextResult, VMError> {
        self.tracer.enter(
            CallType::CALL,
            caller,
            address,
            value,
            gas_limit,
            &input,
            self.depth == 0,
        );
        let result = self.generic_call(caller, address, input, gas_limit, value);
        self.trace_exit(result.as_ref())?;
        result
    }

    /// Runs the code at `address` against `caller`'s state. `value` must be
    /// affordable, but stays with `caller`.
    pub fn call_code(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas_limit: u64,
        value: U256,
    ) -> Result<ContextResult, VMError> {
        self.tracer.enter(
            CallType::CALLCODE,
            caller,
            address,
            value,
            gas_limit,
            &input,
            self.depth == 0,
        );
        let result = self.generic_call_code(caller, address, input, gas_limit, value);
        self.trace_exit(result.as_ref())?;
        result
    }

    /// Runs the code at `address` as if it were `parent`'s own: same state,
    /// same sender and same value.
    pub fn delegate_call(
        &mut self,
        parent: &CallFrame,
        address: Address,
        input: Bytes,
        gas_limit: u64,
    ) -> Result<ContextResult, VMError> {
        self.tracer.enter(
            CallType::DELEGATECALL,
            parent.to,
            address,
            parent.msg_value,
            gas_limit,
            &input,
            self.depth == 0,
        );
        let result = self.generic_delegate_call(parent, address, input, gas_limit);
        self.trace_exit(result.as_ref())?;
        result
    }

    /// Deploys a contract: runs `init_code` at a fresh address derived from
    /// `caller` and its nonce, then stores the returned bytes as the code.
    pub fn create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas_limit: u64,
        value: U256,
    ) -> Result<CreateResult, VMError> {
        // The new address is not known until the nonce is read.
        self.tracer.enter(
            CallType::CREATE,
            caller,
            Address::zero(),
            value,
            gas_limit,
            &init_code,
            self.depth == 0,
        );
        let result = self.generic_create(caller, init_code, gas_limit, value);
        self.trace_exit(result.as_ref().map(|created| &created.context))?;
        result
    }

    fn generic_call(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas_limit: u64,
        value: U256,
    ) -> Result<ContextResult, VMError> {
        if let Some(rejected) =
            self.validate_entry(caller, Some(value), gas_limit, FundsErrorDetail::Plain)?
        {
            return Ok(rejected);
        }

        let snapshot = self.db.snapshot();

        if !self.db.account_exists(address)? {
            if !is_precompile(&address, self.rules.fork())
                && self.rules.skip_empty_zero_value_calls()
                && value.is_zero()
            {
                trace!(%address, "Zero-value call to nonexistent account, nothing to do");
                return Ok(ContextResult::no_op(gas_limit));
            }
            self.db.create_account(address)?;
        }

        self.env
            .value_transfer
            .transfer(&mut *self.db, caller, address, value)?;

        let bytecode = self.db.get_code(address)?;
        let code_hash = self.db.get_code_hash(address)?;
        let frame = CallFrame::new(
            caller,
            address,
            address,
            bytecode,
            code_hash,
            value,
            gas_limit,
            self.depth,
            CallType::CALL,
        );
        self.execute_frame(frame, &input, snapshot)
    }

    fn generic_call_code(
        &mut self,
        caller: Address,
        address: Address,
        input: Bytes,
        gas_limit: u64,
        value: U256,
    ) -> Result<ContextResult, VMError> {
        if let Some(rejected) =
            self.validate_entry(caller, Some(value), gas_limit, FundsErrorDetail::Detailed)?
        {
            return Ok(rejected);
        }

        let snapshot = self.db.snapshot();

        let bytecode = self.db.get_code(address)?;
        let code_hash = self.db.get_code_hash(address)?;
        let frame = CallFrame::new(
            caller,
            caller,
            address,
            bytecode,
            code_hash,
            value,
            gas_limit,
            self.depth,
            CallType::CALLCODE,
        );
        self.execute_frame(frame, &input, snapshot)
    }

    fn generic_delegate_call(
        &mut self,
        parent: &CallFrame,
        address: Address,
        input: Bytes,
        gas_limit: u64,
    ) -> Result<ContextResult, VMError> {
        if let Some(rejected) =
            self.validate_entry(parent.to, None, gas_limit, FundsErrorDetail::Plain)?
        {
            return Ok(rejected);
        }

        let snapshot = self.db.snapshot();

        let bytecode = self.db.get_code(address)?;
        let code_hash = self.db.get_code_hash(address)?;
        let frame = CallFrame::new(
            parent.to,
            parent.to,
            address,
            bytecode,
            code_hash,
            parent.msg_value,
            gas_limit,
            self.depth,
            CallType::DELEGATECALL,
        )
        .as_delegate(parent);
        self.execute_frame(frame, &input, snapshot)
    }

    fn generic_create(
        &mut self,
        caller: Address,
        init_code: Bytes,
        gas_limit: u64,
        value: U256,
    ) -> Result<CreateResult, VMError> {
        if let Some(rejected) =
            self.validate_entry(caller, Some(value), gas_limit, FundsErrorDetail::Plain)?
        {
            return Ok(CreateResult::rejected(rejected));
        }

        // The nonce bump happens before the snapshot, so a failed creation
        // still consumes the nonce.
        let nonce = self.db.get_nonce(caller)?;
        let next_nonce = nonce.checked_add(1).ok_or(InternalError::Overflow)?;
        self.db.set_nonce(caller, next_nonce)?;

        let snapshot = self.db.snapshot();
        let new_address = calculate_create_address(caller, nonce);
        self.tracer.set_current_callee(new_address, self.depth == 0);

        self.db.create_account(new_address)?;
        let created_nonce = self.rules.created_account_nonce();
        if created_nonce != 0 {
            self.db.set_nonce(new_address, created_nonce)?;
        }
        self.env
            .value_transfer
            .transfer(&mut *self.db, caller, new_address, value)?;

        let code_hash = keccak(&init_code);
        let mut frame = CallFrame::new(
            caller,
            new_address,
            new_address,
            init_code,
            code_hash,
            value,
            gas_limit,
            self.depth,
            CallType::CREATE,
        );

        let error = match self.run_frame(&mut frame, &Bytes::new()) {
            Ok(code) => self.deposit_code(&mut frame, new_address, code)?,
            Err(error) => Some(error),
        };

        let created = |context| CreateResult {
            context,
            address: Some(new_address),
            deposit_error: None,
        };

        match error {
            None => {
                debug!(%caller, address = %new_address, "Contract created");
                Ok(created(ContextResult::success(&frame, Bytes::new())))
            }
            Some(VMError::CodeStoreOutOfGas) if !self.rules.code_store_failure_reverts() => {
                debug!(
                    address = %new_address,
                    "Code deposit out of gas, keeping account without code"
                );
                Ok(CreateResult {
                    deposit_error: Some(VMError::CodeStoreOutOfGas),
                    ..created(ContextResult::success(&frame, Bytes::new()))
                })
            }
            Some(error) => {
                let context = self.revert_frame(&mut frame, snapshot, error)?;
                Ok(created(context))
            }
        }
    }

    /// Stores the code returned by init code, charging for every byte.
    /// Returns the error that makes the deposit fail, if any.
    fn deposit_code(
        &mut self,
        frame: &mut CallFrame,
        address: Address,
        code: Bytes,
    ) -> Result<Option<VMError>, VMError> {
        if code.len() > self.config.max_code_size {
            return Ok(Some(VMError::CodeSizeExceeded));
        }
        let affordable = gas_cost::code_deposit_cost(code.len(), self.config.create_data_gas)
            .is_ok_and(|cost| frame.use_gas(cost));
        if !affordable {
            return Ok(Some(VMError::CodeStoreOutOfGas));
        }
        self.db.set_code(address, code)?;
        Ok(None)
    }
}
