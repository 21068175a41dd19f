pub use ethereum_types::*;
pub mod constants;
pub mod evm;
pub mod serde_utils;
pub mod tracing;
pub mod types;
pub mod utils;
pub use bytes::Bytes;
