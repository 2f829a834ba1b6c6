//! minvm - run a single-character stack machine program
//!
//! Program output goes to stdout. Logs, traces and the final stack go to
//! stderr. A fatal machine condition exits with status 1; being unable to
//! read the program exits with status 2.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use minvm::{Fatal, HELLO_WORLD, Machine, Observer, TraceObserver, TracingObserver};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minvm")]
#[command(about = "Run a single-character stack machine program")]
struct Cli {
    /// Program text (defaults to the bundled Hello World program)
    #[arg(conflicts_with = "file")]
    program: Option<String>,

    /// Read the program from a file instead
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Print a block describing machine state before every step
    #[arg(long)]
    trace: bool,

    /// Stop with an error after this many steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print the final stack after the run
    #[arg(long)]
    dump_stack: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Machine(#[from] Fatal),

    #[error("failed to flush output: {0}")]
    Flush(#[source] io::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Machine(_) => ExitCode::from(1),
            CliError::Read { .. } | CliError::Flush(_) => ExitCode::from(2),
        }
    }
}

impl Cli {
    fn source(&self) -> Result<String, CliError> {
        match (&self.file, &self.program) {
            (Some(path), _) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            }),
            (None, Some(program)) => Ok(program.clone()),
            (None, None) => Ok(HELLO_WORLD.to_string()),
        }
    }
}

fn execute<O: Observer>(cli: &Cli, source: &str, observer: O) -> Result<(), CliError> {
    let stdout = io::stdout().lock();
    let mut machine = Machine::with_output(stdout).with_observer(observer);
    machine.load(source);

    let result = match cli.max_steps {
        Some(budget) => machine.run_with_budget(budget).map(|_| ()),
        None => machine.run(),
    };

    machine.output_mut().flush().map_err(CliError::Flush)?;

    if cli.dump_stack {
        eprintln!("stack: {:?}", machine.stack());
    }
    info!(
        steps = machine.steps(),
        ip = machine.ip(),
        dp = machine.dp(),
        "run finished"
    );

    result.map_err(CliError::from)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let source = cli.source()?;
    if cli.trace {
        execute(cli, &source, TraceObserver::stderr())
    } else {
        execute(cli, &source, TracingObserver)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minvm=error".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}
