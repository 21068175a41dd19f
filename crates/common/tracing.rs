use serde::Serialize;

/// Kind of message call or creation recorded by the call tracer.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    #[default]
    CALL,
    CALLCODE,
    DELEGATECALL,
    CREATE,
}
