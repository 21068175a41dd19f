use bytes::Bytes;
use ledgervm_common::{Address, U256, tracing::CallType};
use serde::Serialize;

use crate::errors::{ContextResult, InternalError, VMError};

/// Geth's callTracer (https://geth.ethereum.org/docs/developers/evm-tracing/built-in-tracers)
/// Use `CallTracer::disabled()` when tracing is not wanted.
#[derive(Debug, Default)]
pub struct CallTracer {
    /// Stack for tracer callframes, at the end of execution there will be only one element.
    /// Entering a new top call discards the trace of the previous one.
    pub callframes: Vec<TracerCallFrame>,
    /// If true, trace only the top call
    pub only_top_call: bool,
    /// If active is set to false it won't trace.
    pub active: bool,
}

/// Call frame as recorded by the tracer, with its nested calls.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct TracerCallFrame {
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub from: Address,
    pub to: Address,
    #[serde(serialize_with = "to_hex")]
    pub value: U256,
    #[serde(serialize_with = "to_hex")]
    pub gas: u64,
    #[serde(rename = "gasUsed", serialize_with = "to_hex")]
    pub gas_used: u64,
    #[serde(serialize_with = "to_hex")]
    pub input: Bytes,
    #[serde(serialize_with = "to_hex")]
    pub output: Bytes,
    #[serde(serialize_with = "option_string_empty_as_str")]
    pub error: Option<String>,
    pub calls: Vec<TracerCallFrame>,
}

impl CallTracer {
    pub fn new(only_top_call: bool) -> Self {
        CallTracer {
            callframes: vec![],
            only_top_call,
            active: true,
        }
    }

    pub fn disabled() -> Self {
        CallTracer {
            active: false,
            ..Default::default()
        }
    }

    /// Starts trace call.
    #[allow(clippy::too_many_arguments)]
    pub fn enter(
        &mut self,
        call_type: CallType,
        from: Address,
        to: Address,
        value: U256,
        gas: u64,
        input: &Bytes,
        is_top_call: bool,
    ) {
        if !self.active {
            return;
        }
        if is_top_call {
            self.callframes.clear();
        } else if self.only_top_call {
            return;
        }
        let callframe = TracerCallFrame::new(call_type, from, to, value, gas, input.clone());
        self.callframes.push(callframe);
    }

    /// Sets the callee of the innermost open call. Contract creations only learn
    /// their address after the call was entered.
    pub fn set_current_callee(&mut self, to: Address, is_top_call: bool) {
        if !self.active || (self.only_top_call && !is_top_call) {
            return;
        }
        if let Some(callframe) = self.callframes.last_mut() {
            callframe.to = to;
        }
    }

    fn exit(
        &mut self,
        gas_used: u64,
        output: Bytes,
        error: Option<String>,
    ) -> Result<(), InternalError> {
        let mut executed_callframe = self
            .callframes
            .pop()
            .ok_or(InternalError::CouldNotPopCallframe)?;

        executed_callframe.process_output(gas_used, output, error);

        // Append executed callframe to parent callframe if appropriate.
        if let Some(parent_callframe) = self.callframes.last_mut() {
            parent_callframe.calls.push(executed_callframe);
        } else {
            self.callframes.push(executed_callframe);
        };
        Ok(())
    }

    /// Exits trace call with the outcome of the operation, including errors
    /// that propagated out of it.
    pub fn exit_context(
        &mut self,
        outcome: Result<&ContextResult, &VMError>,
        is_top_call: bool,
    ) -> Result<(), InternalError> {
        if !self.active {
            return Ok(());
        }
        if self.only_top_call && !is_top_call {
            return Ok(());
        }
        match outcome {
            Ok(context) => self.exit(
                context.gas_used,
                context.output.clone(),
                context.error().map(ToString::to_string),
            ),
            Err(error) => self.exit(0, Bytes::new(), Some(error.to_string())),
        }
    }

    /// The finished top call, once every nested call has exited.
    pub fn root(&self) -> Option<&TracerCallFrame> {
        match self.callframes.as_slice() {
            [root] => Some(root),
            _ => None,
        }
    }
}

impl TracerCallFrame {
    pub fn new(
        call_type: CallType,
        from: Address,
        to: Address,
        value: U256,
        gas: u64,
        input: Bytes,
    ) -> Self {
        Self {
            call_type,
            from,
            to,
            value,
            gas,
            input,
            ..Default::default()
        }
    }

    pub fn process_output(&mut self, gas_used: u64, output: Bytes, error: Option<String>) {
        self.gas_used = gas_used;
        self.output = output;
        self.error = error;
    }
}

fn to_hex<T, S>(x: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::LowerHex,
    S: serde::Serializer,
{
    s.serialize_str(&format!("0x{:x}", x))
}

fn option_string_empty_as_str<S>(x: &Option<String>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(x.as_deref().unwrap_or(""))
}
