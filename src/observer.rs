use std::io::Write;

use crate::value::{Value, describe_top};

/// Machine state captured immediately before an instruction executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Position of the instruction about to run
    pub ip: i64,
    /// Character at `ip`
    pub cursor: char,
    pub dp: i64,
    /// Top of the stack, `None` when the stack is empty
    pub top: Option<Value>,
    /// Number of steps already completed since the machine was created
    pub step: u64,
}

/// Observer trait for debug tracing
///
/// The machine calls `before_step` synchronously, once per step, before the
/// instruction at `snapshot.ip` executes. Observers only see a copy of the
/// state and cannot change how the program runs.
///
/// `()` is the no-op observer used when tracing is disabled.
pub trait Observer {
    fn before_step(&mut self, snapshot: &Snapshot);
}

impl Observer for () {
    #[inline]
    fn before_step(&mut self, _snapshot: &Snapshot) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn before_step(&mut self, snapshot: &Snapshot) {
        (**self).before_step(snapshot);
    }
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn before_step(&mut self, snapshot: &Snapshot) {
        (**self).before_step(snapshot);
    }
}

/// Writes a human-readable block for every step
///
/// ```text
/// -------------------
/// IP: 3 '1'
/// DP: 0
/// Stacktop: 18
/// Step: 3
/// -------------------
/// ```
pub struct TraceObserver<W: Write> {
    sink: W,
}

impl<W: Write> TraceObserver<W> {
    pub fn new(sink: W) -> Self {
        TraceObserver { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl TraceObserver<std::io::Stderr> {
    /// Trace to standard error, keeping standard output for program output
    pub fn stderr() -> Self {
        TraceObserver::new(std::io::stderr())
    }
}

impl<W: Write> Observer for TraceObserver<W> {
    fn before_step(&mut self, snapshot: &Snapshot) {
        // A broken trace sink must not stop the program.
        let _ = write!(
            self.sink,
            "-------------------\n\
             IP: {} '{}'\n\
             DP: {}\n\
             Stacktop: {}\n\
             Step: {}\n\
             -------------------\n",
            snapshot.ip,
            snapshot.cursor.escape_default(),
            snapshot.dp,
            describe_top(snapshot.top),
            snapshot.step,
        );
    }
}

/// Emits one `trace`-level event per step
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn before_step(&mut self, snapshot: &Snapshot) {
        tracing::trace!(
            ip = snapshot.ip,
            cursor = %snapshot.cursor.escape_default(),
            dp = snapshot.dp,
            top = %describe_top(snapshot.top),
            step = snapshot.step,
            "step"
        );
    }
}

/// Collects every snapshot in order
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub snapshots: Vec<Snapshot>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instruction pointers in execution order
    pub fn ips(&self) -> Vec<i64> {
        self.snapshots.iter().map(|s| s.ip).collect()
    }
}

impl Observer for Recorder {
    fn before_step(&mut self, snapshot: &Snapshot) {
        self.snapshots.push(*snapshot);
    }
}
