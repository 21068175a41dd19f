use std::sync::Arc;

use bytes::Bytes;
use ledgervm_common::{Address, U256};
use tracing::{debug, trace, warn};

use crate::{
    call_frame::CallFrame,
    db::SnapshotId,
    errors::{ContextResult, ExecutionFault, InsufficientFunds, InternalError, VMError},
    vm::VM,
};

/// How an insufficient balance is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FundsErrorDetail {
    Plain,
    /// Include the requested amount and the available balance.
    Detailed,
}

impl<'a> VM<'a> {
    /// Checks every operation runs before it touches state: recursion switch,
    /// call depth and, when value moves, the transfer permission.
    ///
    /// Returns the result to hand back when the operation must not proceed.
    pub(crate) fn validate_entry(
        &mut self,
        caller: Address,
        value: Option<U256>,
        gas_limit: u64,
        detail: FundsErrorDetail,
    ) -> Result<Option<ContextResult>, VMError> {
        if self.config.no_recursion && self.depth > 0 {
            trace!(depth = self.depth, "Recursion disabled, skipping nested call");
            return Ok(Some(ContextResult::no_op(gas_limit)));
        }

        if self.depth > self.config.max_call_depth {
            debug!(
                depth = self.depth,
                max_call_depth = self.config.max_call_depth,
                "Call depth exceeded"
            );
            return Ok(Some(ContextResult::early_revert(
                gas_limit,
                VMError::DepthExceeded,
            )));
        }

        if let Some(value) = value {
            if !self
                .env
                .value_transfer
                .can_transfer(&mut *self.db, caller, value)?
            {
                let funds = match detail {
                    FundsErrorDetail::Plain => None,
                    FundsErrorDetail::Detailed => Some(InsufficientFunds {
                        requested: value,
                        available: self.db.get_balance(caller)?,
                    }),
                };
                debug!(%caller, %value, "Insufficient balance for transfer");
                return Ok(Some(ContextResult::early_revert(
                    gas_limit,
                    VMError::InsufficientBalance(funds),
                )));
            }
        }

        Ok(None)
    }

    /// Runs `frame` through the interpreter one nesting level below the
    /// current one. The depth counter is restored on every way out.
    pub(crate) fn run_frame(
        &mut self,
        frame: &mut CallFrame,
        input: &Bytes,
    ) -> Result<Bytes, VMError> {
        if self.is_cancelled() {
            return Err(ExecutionFault::Cancelled.into());
        }
        let parent_depth = self.depth;
        self.depth = parent_depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;

        let interpreter = Arc::clone(&self.interpreter);
        let result = interpreter.run(self, frame, input);

        self.depth = parent_depth;
        result
    }

    /// Runs a message call frame and settles its outcome.
    pub(crate) fn execute_frame(
        &mut self,
        mut frame: CallFrame,
        input: &Bytes,
        snapshot: SnapshotId,
    ) -> Result<ContextResult, VMError> {
        match self.run_frame(&mut frame, input) {
            Ok(output) => Ok(ContextResult::success(&frame, output)),
            Err(error) => self.revert_frame(&mut frame, snapshot, error),
        }
    }

    /// Failure after the frame started: all of its gas is consumed and state
    /// goes back to `snapshot`. Internal errors propagate untouched.
    pub(crate) fn revert_frame(
        &mut self,
        frame: &mut CallFrame,
        snapshot: SnapshotId,
        error: VMError,
    ) -> Result<ContextResult, VMError> {
        if error.should_propagate() {
            warn!(to = %frame.to, depth = frame.depth, %error, "Aborting execution");
            return Err(error);
        }
        frame.consume_all_gas();
        self.db.revert_to_snapshot(snapshot)?;
        debug!(
            to = %frame.to,
            depth = frame.depth,
            call_type = ?frame.call_type,
            %error,
            "Frame reverted"
        );
        Ok(ContextResult::failure(frame, error))
    }

    /// Closes the trace frame opened by a public operation.
    pub(crate) fn trace_exit(
        &mut self,
        outcome: Result<&ContextResult, &VMError>,
    ) -> Result<(), VMError> {
        let is_top_call = self.depth == 0;
        self.tracer.exit_context(outcome, is_top_call)?;
        Ok(())
    }
}
