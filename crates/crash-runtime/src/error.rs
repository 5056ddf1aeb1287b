//! Runtime errors

use thiserror::Error;

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no circuit named '{0}'")]
    UnknownCircuit(String),

    #[error("no circuit selected")]
    NoSelection,

    #[error("'{circuit}' has no input named '{input}'")]
    UnknownInput { circuit: String, input: String },

    #[error("'{circuit}' takes {expected} input(s) but {actual} were given")]
    ArityMismatch {
        circuit: String,
        expected: usize,
        actual: usize,
    },

    #[error("state does not fit '{circuit}': {message}")]
    StateShape { circuit: String, message: String },

    #[error("'{circuit}' is not stateful and takes no state")]
    UnexpectedState { circuit: String },

    #[error("'{caller}' refers to circuit #{callee}, which is not in the unit")]
    Unresolved { caller: String, callee: u32 },

    #[error("'{circuit}' produced {actual} value(s) where {expected} were expected")]
    OutputArity {
        circuit: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed circuit '{circuit}': {message}")]
    Malformed { circuit: String, message: String },
}
