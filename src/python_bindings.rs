//! Python bindings for the minvm machine
//!
//! This module exposes the Rust machine to Python using PyO3. It is only
//! built with the `python` feature.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::error::Fatal;
use crate::executor::Machine;

fn fatal_to_py(err: Fatal) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// Run a program on a fresh machine and return its output
///
/// Args:
///     source (str): Program text
///
/// Returns:
///     str: Everything the program wrote before halting
///
/// Raises:
///     RuntimeError: If the program hits a fatal condition
///
/// Example:
///     >>> run("44*ytotm0!52*~blHi\0")
///     'Hi'
#[pyfunction]
fn run(source: &str) -> PyResult<String> {
    crate::run_to_string(source).map_err(fatal_to_py)
}

/// A stack machine with in-memory output
///
/// Example:
///     >>> machine = Machine()
///     >>> machine.load("92*")
///     >>> machine.run()
///     >>> machine.stack
///     [18]
#[pyclass(name = "Machine")]
struct PyMachine {
    inner: Machine,
}

#[pymethods]
impl PyMachine {
    #[new]
    fn new() -> Self {
        PyMachine {
            inner: Machine::new(),
        }
    }

    /// Load a program; the stack is kept
    fn load(&mut self, source: &str) {
        self.inner.load(source);
    }

    /// Execute a single instruction
    fn step(&mut self) -> PyResult<()> {
        self.inner.step().map_err(fatal_to_py)
    }

    /// Run until the program halts
    fn run(&mut self) -> PyResult<()> {
        self.inner.run().map_err(fatal_to_py)
    }

    /// Run at most `budget` steps, returning how many ran
    ///
    /// Raises:
    ///     RuntimeError: If the program is still running afterwards, or on
    ///         any fatal condition
    fn run_with_budget(&mut self, budget: u64) -> PyResult<u64> {
        self.inner.run_with_budget(budget).map_err(fatal_to_py)
    }

    /// Drain the output written so far
    fn take_output(&mut self) -> String {
        self.inner.take_output()
    }

    fn clear_stack(&mut self) {
        self.inner.clear_stack();
    }

    fn push(&mut self, value: i64) {
        self.inner.push(value);
    }

    #[getter]
    fn stack(&self) -> Vec<i64> {
        self.inner.stack().to_vec()
    }

    #[getter]
    fn ip(&self) -> i64 {
        self.inner.ip()
    }

    #[getter]
    fn dp(&self) -> i64 {
        self.inner.dp()
    }

    #[getter]
    fn steps(&self) -> u64 {
        self.inner.steps()
    }

    #[getter]
    fn halted(&self) -> bool {
        self.inner.is_halted()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Machine ip={} dp={} depth={} steps={}>",
            self.inner.ip(),
            self.inner.dp(),
            self.inner.stack().len(),
            self.inner.steps()
        )
    }
}

/// Python module definition
#[pymodule]
fn minvm(m: &Bound<'_, pyo3::types::PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run, m)?)?;
    m.add_class::<PyMachine>()?;
    m.add("HELLO_WORLD", crate::HELLO_WORLD)?;
    Ok(())
}
