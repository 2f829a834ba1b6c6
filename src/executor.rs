use std::io::Write;

use tracing::{debug, warn};

use crate::error::{Fatal, Pointer, Result};
use crate::observer::{Observer, Snapshot};
use crate::opcodes::Opcode;
use crate::program::Program;
use crate::value::{self, Value};

/// Externally visible machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// IP is before the end of the program
    Running,
    /// IP ran past the end of the program
    Halted,
}

/// Single-character stack machine
///
/// The machine owns its program, its integer stack, both program cursors and
/// the step counter. Nothing is shared between machines.
///
/// Output from `o` goes to `W`, and every step is reported to the observer
/// `O` before it executes. `Machine::new()` writes into a `Vec<u8>` and has
/// tracing disabled.
pub struct Machine<W: Write = Vec<u8>, O: Observer = ()> {
    program: Program,

    /// Value stack
    stack: Vec<Value>,

    ip: i64,
    dp: i64,

    /// Completed steps, across every program this machine has loaded
    steps: u64,

    /// Set when a step fails; cleared by `load`
    faulted: bool,

    output: W,
    observer: O,
}

impl Machine<Vec<u8>, ()> {
    /// Create a machine that collects its output in memory
    pub fn new() -> Self {
        Machine::with_output(Vec::new())
    }
}

impl Default for Machine<Vec<u8>, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Machine<W, ()> {
    /// Create a machine writing to `output`, with no observer attached
    pub fn with_output(output: W) -> Self {
        Machine {
            program: Program::default(),
            stack: Vec::with_capacity(32),
            ip: 0,
            dp: 0,
            steps: 0,
            faulted: false,
            output,
            observer: (),
        }
    }
}

impl<W: Write, O: Observer> Machine<W, O> {
    /// Replace the observer, keeping all other state
    pub fn with_observer<P: Observer>(self, observer: P) -> Machine<W, P> {
        Machine {
            program: self.program,
            stack: self.stack,
            ip: self.ip,
            dp: self.dp,
            steps: self.steps,
            faulted: self.faulted,
            output: self.output,
            observer,
        }
    }

    /// Load a program and reset both cursors to 0
    ///
    /// The stack, the output sink and the step counter are left alone. Use
    /// [`Machine::clear_stack`] or a fresh machine for an independent run.
    pub fn load(&mut self, program: impl Into<Program>) {
        self.program = program.into();
        self.ip = 0;
        self.dp = 0;
        self.faulted = false;
        debug!(len = self.program.len(), "program loaded");
    }

    /// Step until IP runs past the end of the program
    pub fn run(&mut self) -> Result<()> {
        while self.state() == State::Running {
            self.step()?;
        }
        debug!(
            steps = self.steps,
            depth = self.stack.len(),
            "program halted"
        );
        Ok(())
    }

    /// Run for at most `budget` steps
    ///
    /// Returns the number of steps executed if the program halted within the
    /// budget. A program that is still running afterwards yields
    /// [`Fatal::StepBudgetExhausted`]; the machine is left between
    /// instructions and can be resumed.
    pub fn run_with_budget(&mut self, budget: u64) -> Result<u64> {
        let mut executed = 0;
        while self.state() == State::Running {
            if executed == budget {
                return Err(Fatal::StepBudgetExhausted { budget });
            }
            self.step()?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Execute the instruction at IP, then advance IP by one
    pub fn step(&mut self) -> Result<()> {
        if self.faulted {
            return Err(Fatal::Faulted);
        }

        match self.step_inner() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.faulted = true;
                warn!(ip = self.ip, dp = self.dp, error = %err, "machine faulted");
                Err(err)
            }
        }
    }

    fn step_inner(&mut self) -> Result<()> {
        let cursor = self.program.get(self.ip).ok_or(Fatal::OutOfRange {
            pointer: Pointer::Ip,
            index: self.ip,
            len: self.program.len(),
        })?;

        self.observer.before_step(&Snapshot {
            ip: self.ip,
            cursor,
            dp: self.dp,
            top: self.stack.last().copied(),
            step: self.steps,
        });

        match Opcode::from_char(cursor) {
            Some(opcode) => self.execute(opcode)?,
            None => self.stack.push(value::literal(cursor)),
        }

        self.steps += 1;
        self.ip = self.ip.checked_add(1).ok_or(Fatal::OutOfRange {
            pointer: Pointer::Ip,
            index: self.ip,
            len: self.program.len(),
        })?;
        Ok(())
    }

    fn execute(&mut self, opcode: Opcode) -> Result<()> {
        match opcode {
            Opcode::Multiply => {
                let a = self.pop(opcode)?;
                let b = self.pop(opcode)?;
                let product = a.checked_mul(b).ok_or(self.overflow(opcode))?;
                self.stack.push(product);
            }

            Opcode::Add => {
                let a = self.pop(opcode)?;
                let b = self.pop(opcode)?;
                let sum = a.checked_add(b).ok_or(self.overflow(opcode))?;
                self.stack.push(sum);
            }

            Opcode::DpPop => {
                self.dp = self.pop(opcode)?;
            }

            Opcode::DpRead => {
                let c = self.program.get(self.dp).ok_or(Fatal::OutOfRange {
                    pointer: Pointer::Dp,
                    index: self.dp,
                    len: self.program.len(),
                })?;
                // In range, so this cannot overflow.
                self.dp += 1;
                self.stack.push(value::literal(c));
            }

            Opcode::SpStdout => {
                let code = self.pop(opcode)?;
                let c = value::to_char(code).ok_or(Fatal::InvalidCodePoint { value: code })?;
                let mut buf = [0u8; 4];
                self.output.write_all(c.encode_utf8(&mut buf).as_bytes())?;
            }

            Opcode::Dup => {
                let a = self.pop(opcode)?;
                self.stack.push(a);
                self.stack.push(a);
            }

            Opcode::LogicalInequality => {
                let a = self.pop(opcode)?;
                let b = self.pop(opcode)?;
                self.stack.push(Value::from(a != b));
            }

            Opcode::JumpConditional => {
                let offset = self.pop(opcode)?;
                let condition = self.pop(opcode)?;
                if condition != 0 {
                    self.ip = self.ip.checked_add(offset).ok_or(self.overflow(opcode))?;
                }
            }

            Opcode::SignedNegate => {
                let a = self.pop(opcode)?;
                let negated = a.checked_neg().ok_or(self.overflow(opcode))?;
                self.stack.push(negated);
            }

            Opcode::Pop => {
                self.pop(opcode)?;
            }

            Opcode::End => {}
        }
        Ok(())
    }

    #[inline]
    fn pop(&mut self, opcode: Opcode) -> Result<Value> {
        self.stack.pop().ok_or(Fatal::StackUnderflow {
            ip: self.ip,
            opcode,
        })
    }

    fn overflow(&self, opcode: Opcode) -> Fatal {
        Fatal::Overflow {
            ip: self.ip,
            opcode,
        }
    }

    /// RUNNING while IP is before the end of the program, HALTED after
    pub fn state(&self) -> State {
        if self.ip < self.program.len() as i64 {
            State::Running
        } else {
            State::Halted
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state() == State::Halted
    }

    /// Whether a step has failed since the last `load`
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Stack contents, bottom first
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Push a value, e.g. to seed the stack before a run
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    pub fn ip(&self) -> i64 {
        self.ip
    }

    pub fn dp(&self) -> i64 {
        self.dp
    }

    /// Steps completed since the machine was created
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the machine, returning its output sink and observer
    pub fn into_parts(self) -> (W, O) {
        (self.output, self.observer)
    }
}

impl<O: Observer> Machine<Vec<u8>, O> {
    /// Drain everything written so far as text
    pub fn take_output(&mut self) -> String {
        let bytes = std::mem::take(&mut self.output);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
