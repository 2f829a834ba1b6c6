/// Instruction set for the minvm stack machine
///
/// Every instruction is a single character of program text. Characters that
/// are not listed here are not instructions: the machine pushes their literal
/// value instead (see [`crate::value::literal`]).

/// The eleven instruction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Arithmetic (pop 2, push 1)
    /// `*`: a * b
    Multiply,
    /// `+`: a + b
    Add,
    /// `~`: -a (pop 1, push 1)
    SignedNegate,

    // Data pointer
    /// `y`: pop a value and make it the new data pointer
    DpPop,
    /// `t`: push the literal value of `program[DP]`, then advance DP
    DpRead,

    // Output
    /// `o`: pop a code point and write that character to the output sink
    SpStdout,

    // Stack operations
    /// `m`: duplicate the top value
    Dup,
    /// `l`: pop the top value and discard it
    Pop,

    // Logic and control flow
    /// `!`: pop a, pop b, push 1 if they differ else 0
    LogicalInequality,
    /// `b`: pop offset, pop value; if value is nonzero, IP += offset
    ///
    /// The offset is applied before the automatic advance, so a taken jump
    /// moves IP by `offset + 1` in total.
    JumpConditional,
    /// `e`: no effect
    ///
    /// Despite the name this does not halt the machine. Execution only ends
    /// when IP runs past the end of the program.
    End,
}

impl Opcode {
    /// All opcodes in table order
    pub const ALL: [Opcode; 11] = [
        Opcode::Multiply,
        Opcode::Add,
        Opcode::DpPop,
        Opcode::DpRead,
        Opcode::SpStdout,
        Opcode::Dup,
        Opcode::LogicalInequality,
        Opcode::JumpConditional,
        Opcode::SignedNegate,
        Opcode::Pop,
        Opcode::End,
    ];

    /// Look up the instruction for a source character
    ///
    /// Returns `None` for characters that should be pushed as literals.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '*' => Some(Opcode::Multiply),
            '+' => Some(Opcode::Add),
            'y' => Some(Opcode::DpPop),
            't' => Some(Opcode::DpRead),
            'o' => Some(Opcode::SpStdout),
            'm' => Some(Opcode::Dup),
            '!' => Some(Opcode::LogicalInequality),
            'b' => Some(Opcode::JumpConditional),
            '~' => Some(Opcode::SignedNegate),
            'l' => Some(Opcode::Pop),
            'e' => Some(Opcode::End),
            _ => None,
        }
    }

    /// The source character for this instruction
    pub fn as_char(self) -> char {
        match self {
            Opcode::Multiply => '*',
            Opcode::Add => '+',
            Opcode::DpPop => 'y',
            Opcode::DpRead => 't',
            Opcode::SpStdout => 'o',
            Opcode::Dup => 'm',
            Opcode::LogicalInequality => '!',
            Opcode::JumpConditional => 'b',
            Opcode::SignedNegate => '~',
            Opcode::Pop => 'l',
            Opcode::End => 'e',
        }
    }

    /// Upper-case name used in traces and error messages
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Multiply => "MULTIPLY",
            Opcode::Add => "ADD",
            Opcode::DpPop => "DP_POP",
            Opcode::DpRead => "DP_READ",
            Opcode::SpStdout => "SP_STDOUT",
            Opcode::Dup => "DUP",
            Opcode::LogicalInequality => "LOGICAL_INEQUALITY",
            Opcode::JumpConditional => "JUMP_CONDITIONAL",
            Opcode::SignedNegate => "SIGNED_NEGATE",
            Opcode::Pop => "POP",
            Opcode::End => "END",
        }
    }

    /// Number of values this instruction pops
    pub fn pops(self) -> usize {
        match self {
            Opcode::Multiply
            | Opcode::Add
            | Opcode::LogicalInequality
            | Opcode::JumpConditional => 2,

            Opcode::DpPop
            | Opcode::SpStdout
            | Opcode::Dup
            | Opcode::SignedNegate
            | Opcode::Pop => 1,

            Opcode::DpRead | Opcode::End => 0,
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.mnemonic(), self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_char(opcode.as_char()), Some(opcode));
        }
    }

    #[test]
    fn test_table_characters() {
        let table: String = Opcode::ALL.iter().map(|op| op.as_char()).collect();
        assert_eq!(table, "*+ytom!b~le");
    }

    #[test]
    fn test_non_instructions() {
        for c in ['0', '9', 'A', 'H', ' ', ',', '\0', 'E', 'B', 'é'] {
            assert_eq!(Opcode::from_char(c), None, "{:?} should be a literal", c);
        }
    }

    #[test]
    fn test_pop_counts() {
        assert_eq!(Opcode::JumpConditional.pops(), 2);
        assert_eq!(Opcode::Dup.pops(), 1);
        assert_eq!(Opcode::DpRead.pops(), 0);
        assert_eq!(Opcode::End.pops(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::Pop.to_string(), "POP 'l'");
    }
}
