//! # ledgervm
//!
//! Message-call and contract-creation dispatcher for an Ethereum-style
//! account ledger.
//!
//! ## Overview
//!
//! The dispatcher sits between running contract code and the world state. It
//! decides whether a CALL, CALLCODE, DELEGATECALL or CREATE may proceed, moves
//! value, takes state snapshots, builds the [`call_frame::CallFrame`] for the
//! interpreter and settles the outcome: a frame that fails after it started
//! loses all of its gas and every state change it made is reverted.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            VM                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  ForkRules  │  │ CallTracer  │  │    Environment      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │        call / call_code / delegate_call / create            │
//! └─────────────────────────────────────────────────────────────┘
//!          │ CallFrame                      ▲ Host
//!          ▼                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Interpreter                          │
//! └─────────────────────────────────────────────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │           StateView (GeneralizedDatabase + Journal)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`vm`] | The VM, its accessors and its [`interpreter::Host`] implementation |
//! | [`system`] | CALL, CALLCODE, DELEGATECALL and CREATE |
//! | [`call_frame`] | Execution context of one invocation |
//! | [`interpreter`] | Interpreter and Host traits |
//! | [`environment`] | Block and transaction context, value transfer, block hashes |
//! | [`fork_rules`] | Fork-dependent dispatcher behaviour |
//! | [`precompiles`] | Precompiled contract addresses per fork |
//! | [`db`] | Database and StateView traits, [`db::GeneralizedDatabase`] |
//! | [`config`] | Runtime limits |
//! | [`errors`] | VMError and call results |
//! | [`tracing`] | Geth-compatible call tracer |

pub mod account;
pub mod call_frame;
pub mod config;
pub mod constants;
pub mod db;
pub mod environment;
pub mod errors;
pub mod execution_handlers;
pub mod fork_rules;
pub mod gas_cost;
pub mod interpreter;
pub mod precompiles;
pub mod system;
pub mod tracing;
pub mod vm;

pub use config::VMConfig;
pub use environment::Environment;
pub use errors::{ContextResult, CreateResult, TxResult, VMError};
pub use vm::VM;
