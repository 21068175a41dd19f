mod account;
mod account_update;
mod block;
mod genesis;

pub use account::*;
pub use account_update::*;
pub use block::*;
pub use genesis::*;
