//! minvm: a single-character stack machine
//!
//! A program is a string. Each character is one instruction, and any
//! character that is not an instruction pushes its own value onto an integer
//! stack. A second cursor, the data pointer, reads the same string as data,
//! which lets a program print text embedded in itself.
//!
//! # Architecture
//!
//! - **Instruction table** ([`Opcode`]): eleven single-character instructions
//! - **Machine** ([`Machine`]): fetch-decode-execute loop over a [`Program`]
//! - **Observer pattern** ([`Observer`]): optional per-step debug tracing
//! - **Fatal conditions** ([`Fatal`]): every failure stops the run
//!
//! # Example Usage
//!
//! ```
//! use minvm::{Machine, HELLO_WORLD};
//!
//! let mut machine = Machine::new();
//! machine.load(HELLO_WORLD);
//! // The sample program underflows once it has printed its text
//! let result = machine.run();
//! assert!(result.unwrap_err().is_underflow());
//! assert_eq!(machine.take_output(), "Hello, World!");
//! ```

// Core modules
pub mod error;
pub mod executor;
pub mod observer;
pub mod opcodes;
pub mod program;
pub mod value;

// Language bindings
#[cfg(feature = "python")]
pub mod python_bindings;

// Re-export main types for convenience
pub use error::{Fatal, Pointer, Result};
pub use executor::{Machine, State};
pub use observer::{Observer, Recorder, Snapshot, TraceObserver, TracingObserver};
pub use opcodes::Opcode;
pub use program::Program;
pub use value::Value;

/// Sample program that prints `Hello, World!`
///
/// DP is set to the `H`, then a read/print loop runs until it reads the
/// trailing NUL. Execution then falls through into the text itself, where
/// `e` and `l` are instructions, and stops on a stack underflow at the
/// second `l`.
pub const HELLO_WORLD: &str = "92*1+ytotm0!52*~bleHello, World!\0";

/// Run `source` on a fresh machine and return everything it printed
///
/// Output written before a fatal condition is discarded along with the
/// machine; use [`Machine`] directly to keep it.
pub fn run_to_string(source: &str) -> Result<String> {
    let mut machine = Machine::new();
    machine.load(source);
    machine.run()?;
    Ok(machine.take_output())
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use rand::Rng;

    fn run_on(stack: &[Value], source: &str) -> Machine {
        let mut machine = Machine::new();
        for value in stack {
            machine.push(*value);
        }
        machine.load(source);
        machine.run().unwrap();
        machine
    }

    #[test]
    fn test_hello_world() {
        let mut machine = Machine::new();
        machine.load(HELLO_WORLD);
        let result = machine.run();

        assert_eq!(machine.output().as_slice(), b"Hello, World!");
        match result {
            Err(Fatal::StackUnderflow { ip, opcode }) => {
                assert_eq!(ip, 22);
                assert_eq!(opcode, Opcode::Pop);
                assert_eq!(machine.program().get(ip), Some('l'));
            }
            other => panic!("Expected underflow after the text, got {:?}", other),
        }
        // The read loop consumed the NUL sentinel
        assert_eq!(machine.dp(), 33);
        assert!(machine.is_faulted());
    }

    #[test]
    fn test_print_loop_halts_cleanly() {
        // DP = 16 points at "Hi". After the NUL ends the loop, 'l' drops the
        // leftover 0 and the data characters are pushed as literals.
        let source = "44*ytotm0!52*~blHi\0";
        let mut machine = Machine::new();
        machine.load(source);
        machine.run().unwrap();

        assert_eq!(machine.take_output(), "Hi");
        assert_eq!(machine.state(), State::Halted);
        assert_eq!(machine.stack(), &[72, 105, 0]);
        assert_eq!(run_to_string(source).unwrap(), "Hi");
    }

    #[test]
    fn test_literal_push_law() {
        assert_eq!(run_on(&[], "7").stack(), &[7]);
        assert_eq!(run_on(&[], "A").stack(), &[65]);
    }

    #[test]
    fn test_add_and_multiply_commute() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let a: Value = rng.gen_range(-1_000_000..=1_000_000);
            let b: Value = rng.gen_range(-1_000_000..=1_000_000);

            let ab = run_on(&[a, b], "+");
            let ba = run_on(&[b, a], "+");
            assert_eq!(ab.stack(), &[a + b]);
            assert_eq!(ab.stack(), ba.stack());

            let ab = run_on(&[a, b], "*");
            let ba = run_on(&[b, a], "*");
            assert_eq!(ab.stack(), &[a * b]);
            assert_eq!(ab.stack(), ba.stack());
        }
    }

    #[test]
    fn test_dup_copies_top() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let below: Value = rng.r#gen();
            let top: Value = rng.r#gen();
            let machine = run_on(&[below, top], "m");
            assert_eq!(machine.stack(), &[below, top, top]);
        }
    }

    #[test]
    fn test_inequality_both_branches() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let x: Value = rng.gen_range(-50..=50);
            let y: Value = rng.gen_range(-50..=50);
            let machine = run_on(&[x, y], "!");
            let expected = if y != x { 1 } else { 0 };
            assert_eq!(machine.stack(), &[expected]);
        }
        assert_eq!(run_on(&[4, 4], "!").stack(), &[0]);
        assert_eq!(run_on(&[4, 5], "!").stack(), &[1]);
    }

    #[test]
    fn test_jump_displacement_law() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let pre_ip: i64 = rng.gen_range(0..8);
            let offset: Value = rng.gen_range(-20..=20);
            let condition: Value = rng.gen_range(-2..=2);

            // Pad with END so the jump sits at `pre_ip`
            let source = format!("{}b", "e".repeat(pre_ip as usize));
            let mut machine = Machine::new();
            machine.load(source.as_str());
            for _ in 0..pre_ip {
                machine.step().unwrap();
            }
            machine.push(condition);
            machine.push(offset);
            machine.step().unwrap();

            let expected = if condition != 0 {
                pre_ip + offset + 1
            } else {
                pre_ip + 1
            };
            assert_eq!(machine.ip(), expected);
        }
    }

    #[test]
    fn test_pop_alone_underflows() {
        let result = run_to_string("l");
        assert!(matches!(result, Err(Fatal::StackUnderflow { ip: 0, .. })));
    }

    #[test]
    fn test_trace_observer_end_to_end() {
        let mut machine = Machine::new().with_observer(TraceObserver::new(Vec::new()));
        machine.load("12+");
        machine.run().unwrap();

        let (_, observer) = machine.into_parts();
        let trace = String::from_utf8(observer.into_inner()).unwrap();
        assert_eq!(trace.matches("-------------------\nIP:").count(), 3);
        assert!(trace.contains("IP: 2 '+'\nDP: 0\nStacktop: 2\nStep: 2\n"));
    }

    #[test]
    fn test_machines_do_not_share_state() {
        let mut first = Machine::new();
        first.load("123");
        first.run().unwrap();

        let second = Machine::new();
        assert!(second.stack().is_empty());
        assert_eq!(second.steps(), 0);
    }
}
