//! Fatal conditions raised by the machine
//!
//! Nothing the machine can hit is recoverable. Every failure stops the run,
//! and the machine refuses to execute further instructions until a new
//! program is loaded. Embedders decide what a fatal condition means for
//! them; the `minvm` binary turns it into a non-zero exit status.

use thiserror::Error;

use crate::opcodes::Opcode;
use crate::value::Value;

/// Machine result type alias.
pub type Result<T> = std::result::Result<T, Fatal>;

/// Which of the two program cursors went out of bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    /// Instruction pointer
    Ip,
    /// Data pointer
    Dp,
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pointer::Ip => write!(f, "instruction pointer"),
            Pointer::Dp => write!(f, "data pointer"),
        }
    }
}

/// Conditions that end a run
#[derive(Debug, Error)]
pub enum Fatal {
    /// An instruction popped from an empty stack.
    #[error("stack underflow: {opcode} at ip {ip} popped an empty stack")]
    StackUnderflow { ip: i64, opcode: Opcode },

    /// IP or DP addressed a character outside the program.
    ///
    /// Running IP off the end halts normally. IP is only reported here after
    /// a backward jump past position zero, or when a halted machine is
    /// stepped explicitly.
    #[error("{pointer} {index} out of range for program of length {len}")]
    OutOfRange {
        pointer: Pointer,
        index: i64,
        len: usize,
    },

    /// SP_STDOUT popped a value that is not a Unicode scalar value.
    #[error("cannot write {value}: not a valid character code point")]
    InvalidCodePoint { value: Value },

    /// Integer arithmetic left the 64-bit range.
    #[error("integer overflow in {opcode} at ip {ip}")]
    Overflow { ip: i64, opcode: Opcode },

    /// The output sink rejected a write.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// `run_with_budget` executed its whole budget without halting.
    #[error("step budget of {budget} exhausted before the program halted")]
    StepBudgetExhausted { budget: u64 },

    /// A previous step already failed; the machine needs a new program.
    #[error("machine has faulted; load a program to reset it")]
    Faulted,
}

impl Fatal {
    /// Whether this is a stack underflow
    pub fn is_underflow(&self) -> bool {
        matches!(self, Fatal::StackUnderflow { .. })
    }

    /// Whether this condition leaves the machine faulted
    ///
    /// Exhausting a step budget is the only condition that does not: the
    /// machine stopped between instructions and can be resumed.
    pub fn is_fault(&self) -> bool {
        !matches!(self, Fatal::StepBudgetExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Fatal::StackUnderflow {
            ip: 0,
            opcode: Opcode::Pop,
        };
        assert_eq!(
            err.to_string(),
            "stack underflow: POP 'l' at ip 0 popped an empty stack"
        );

        let err = Fatal::OutOfRange {
            pointer: Pointer::Dp,
            index: 5,
            len: 5,
        };
        assert_eq!(
            err.to_string(),
            "data pointer 5 out of range for program of length 5"
        );
    }

    #[test]
    fn test_classification() {
        let underflow = Fatal::StackUnderflow {
            ip: 3,
            opcode: Opcode::Add,
        };
        assert!(underflow.is_underflow());
        assert!(underflow.is_fault());

        let budget = Fatal::StepBudgetExhausted { budget: 10 };
        assert!(!budget.is_underflow());
        assert!(!budget.is_fault());
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Fatal = io.into();
        assert!(matches!(err, Fatal::Output(_)));
        assert!(err.is_fault());
    }
}
