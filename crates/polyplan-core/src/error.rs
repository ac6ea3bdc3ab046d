use thiserror::Error;

use crate::id::{InputSlotId, OperatorId, OutputSlotId};

/// Canonical result for every polyplan crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Contract violations raised by plan construction and traversal.
///
/// None of these are retried. They indicate a bug in whoever drives the graph
/// (builder, optimizer pass), so the call that caused them fails immediately.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot connect {input}: input slot is already occupied by {occupant}")]
    Occupied { input: String, occupant: String },

    #[error("cannot disconnect {input}: it is not occupied by {output}")]
    NotConnected { output: String, input: String },

    #[error("cannot connect {output} ({produced}) to {input} ({expected}): mismatching types")]
    TypeMismatch {
        output: String,
        input: String,
        produced: String,
        expected: String,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("ownership violation: {0}")]
    Ownership(String),

    #[error("{child} is not a child of {parent}")]
    NotAChild { child: String, parent: String },

    #[error("illegal {kind} index {index} for {operator} (has {len})")]
    IndexOutOfRange {
        operator: String,
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{operator} has no slot named '{name}'")]
    UnknownSlotName { operator: String, name: String },

    #[error("{operator} declares more than one {kind} named '{name}'")]
    DuplicateSlotName {
        operator: String,
        kind: &'static str,
        name: String,
    },

    #[error("unknown operator {0}")]
    UnknownOperator(OperatorId),

    #[error("unknown slot {0}")]
    UnknownSlot(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("cardinality estimation error: {0}")]
    Estimate(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("hashing error: {0}")]
    Hash(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    pub fn unknown_input(id: InputSlotId) -> Self {
        Error::UnknownSlot(id.to_string())
    }

    pub fn unknown_output(id: OutputSlotId) -> Self {
        Error::UnknownSlot(id.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
