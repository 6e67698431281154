//! Error types for IR construction and emission.

use alloc::format;
use alloc::string::String;
use core::fmt;

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

/// Error raised while building or emitting IR.
///
/// Errors are raised at the emit site and propagate to the top-level
/// translator, which aborts the offending function. The SSA construction pass
/// never raises; it produces Undef values where no definition reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    /// A static precondition was violated: mismatched operand types, an out
    /// of bounds composite index, mixed widths in a polymorphic emit.
    InvalidArgument(String),
    /// A legal but unsupported opcode or path.
    NotImplemented(String),
    /// An unreachable branch was taken; an earlier pass should have rewritten
    /// the instruction.
    LogicError(String),
}

impl IrError {
    /// Build an `InvalidArgument` error. Accepts anything printable, so call
    /// sites can pass `format_args!` without allocating twice.
    pub fn invalid_argument(msg: impl fmt::Display) -> Self {
        IrError::InvalidArgument(format!("{msg}"))
    }

    /// Build a `NotImplemented` error.
    pub fn not_implemented(msg: impl fmt::Display) -> Self {
        IrError::NotImplemented(format!("{msg}"))
    }

    /// Build a `LogicError`.
    pub fn logic_error(msg: impl fmt::Display) -> Self {
        IrError::LogicError(format!("{msg}"))
    }
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            IrError::NotImplemented(msg) => write!(f, "not implemented: {msg}"),
            IrError::LogicError(msg) => write!(f, "logic error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn display_carries_context() {
        let err = IrError::invalid_argument(format_args!("mismatching types {} and {}", 1, 2));
        assert_eq!(
            format!("{err}"),
            "invalid argument: mismatching types 1 and 2"
        );
    }

    #[test]
    fn kinds_are_distinct() {
        assert_ne!(
            IrError::not_implemented("IPA.CONSTANT"),
            IrError::logic_error("IPA.CONSTANT")
        );
    }
}
