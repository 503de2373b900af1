use thiserror::Error;

/// Failure while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in `{op}`")]
    Overflow { op: &'static str },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("variable `{0}` has no value in this activation")]
    UnboundVariable(String),

    #[error("parameter `{0}` is not in scope")]
    UnboundParameter(String),

    #[error("null reference")]
    NullReference,

    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("member `{0}` has no value")]
    MissingField(String),

    #[error("value of kind {0} is not callable")]
    NotCallable(&'static str),

    #[error("expected {expected} argument(s), got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("{bounds} array bounds given for an array of rank {rank}")]
    RankMismatch { bounds: usize, rank: usize },

    #[error("invalid assignment target")]
    InvalidAssignment,

    #[error("{0}")]
    Native(String),

    #[error("maximum evaluation depth of {0} exceeded")]
    DepthExceeded(usize),
}
