use std::fmt;

/// Program text shared by the instruction and data pointers
///
/// A program is an immutable sequence of Unicode scalar values. The machine
/// fetches instructions from it through IP and reads data from it through DP,
/// so the same buffer is both code and data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    chars: Vec<char>,
}

impl Program {
    /// Create a program from its source text
    pub fn new(source: &str) -> Self {
        Program {
            chars: source.chars().collect(),
        }
    }

    /// Number of characters in the program
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Fetch the character at a signed index
    ///
    /// Negative indices and indices past the end yield `None`; there is no
    /// wrap-around from the end of the program.
    pub fn get(&self, index: i64) -> Option<char> {
        let index = usize::try_from(index).ok()?;
        self.chars.get(index).copied()
    }

    /// Whether a signed index lies inside the program
    pub fn contains(&self, index: i64) -> bool {
        self.get(index).is_some()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

impl From<&str> for Program {
    fn from(source: &str) -> Self {
        Program::new(source)
    }
}

impl From<String> for Program {
    fn from(source: String) -> Self {
        Program::new(&source)
    }
}

impl From<Vec<char>> for Program {
    fn from(chars: Vec<char>) -> Self {
        Program { chars }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_by_char_not_byte() {
        let program = Program::new("é+\0");
        assert_eq!(program.len(), 3);
        assert_eq!(program.get(0), Some('é'));
        assert_eq!(program.get(1), Some('+'));
        assert_eq!(program.get(2), Some('\0'));
    }

    #[test]
    fn test_out_of_range_indices() {
        let program = Program::new("ab");
        assert_eq!(program.get(2), None);
        assert_eq!(program.get(-1), None);
        assert!(!program.contains(-1));
        assert!(program.contains(1));
    }

    #[test]
    fn test_empty_program() {
        let program = Program::from("");
        assert!(program.is_empty());
        assert_eq!(program.get(0), None);
    }

    #[test]
    fn test_display_preserves_source() {
        let source = "92*1+ytHi\0";
        assert_eq!(Program::from(source).to_string(), source);
    }
}
