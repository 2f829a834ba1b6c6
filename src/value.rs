/// Stack values are plain signed integers
///
/// Characters are converted to integers when they are pushed, never when they
/// are popped, so the stack never holds anything but numbers.
pub type Value = i64;

/// Literal value of a program character
///
/// ASCII decimal digits push their numeric value (`'7'` pushes 7). Every other
/// character, including instruction characters read through DP, pushes its
/// code point (`'A'` pushes 65).
pub fn literal(c: char) -> Value {
    match c.to_digit(10) {
        Some(digit) => Value::from(digit),
        None => Value::from(u32::from(c)),
    }
}

/// Character whose code point is `value`, if it is a Unicode scalar value
pub fn to_char(value: Value) -> Option<char> {
    u32::try_from(value).ok().and_then(char::from_u32)
}

/// Render an optional stack top the way traces show it
pub fn describe_top(top: Option<Value>) -> String {
    match top {
        Some(value) => value.to_string(),
        None => "nil".to_string(),
    }
}
