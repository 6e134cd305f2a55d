//! `qecsim` command-line entry point.
//!
//! Loads `qec_codes.qec` from the current directory, runs the bit-flip test
//! once and prints the report. Exit status is 0 after a report (whatever the
//! verdict), 1 if the operation source could not be loaded, 2 if execution
//! failed and 64 if the command line was rejected.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use qecsim::runner;
use qecsim::simulation::{DEFAULT_SOURCE_FILE, Simulator, SimulatorConfig};

/// Run the 3-qubit bit-flip code test on the embedded simulator
#[derive(Parser, Debug)]
#[command(name = "qecsim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Operation-definition source to load
    #[arg(long, default_value = DEFAULT_SOURCE_FILE)]
    source: PathBuf,

    /// Seed for measurement sampling (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            source_path: self.source.clone(),
            seed: self.seed,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here and are not failures.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(runner::USAGE_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = cli.simulator_config();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = runner::run_demo(|| Simulator::initialize(config), &mut out);
    ExitCode::from(runner::exit_status(&outcome, &mut io::stderr().lock()))
}
