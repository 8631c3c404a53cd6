#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the lifetime demonstrations.
//!
//! The scenarios themselves live in the library and are tested there. This module only wires
//! the command line to a trace sink.

use std::process::ExitCode;

use argh::FromArgs;
use lifetime_demos::{Scenario, run_scenarios};
use lifetime_trace::{ConsoleSink, Trace, TracingSink};
use tracing_subscriber::EnvFilter;

/// Prints the order in which objects are constructed and destroyed in a set of scripted
/// scenarios.
#[derive(FromArgs)]
struct Args {
    /// run only this scenario (see --list for the names)
    #[argh(option)]
    scenario: Option<Scenario>,

    /// list the available scenarios and exit
    #[argh(switch)]
    list: bool,

    /// leave memory addresses out of the output
    #[argh(switch)]
    hide_addresses: bool,

    /// emit structured tracing events instead of plain lines (filtered by RUST_LOG)
    #[argh(switch)]
    structured: bool,
}

#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    if args.list {
        for scenario in Scenario::ALL {
            println!("{:<28}{}", scenario.name(), scenario.description());
        }

        return ExitCode::SUCCESS;
    }

    let builder = Trace::builder().addresses(!args.hide_addresses);

    let trace = if args.structured {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();

        builder.sink(TracingSink::new()).build()
    } else {
        builder.sink(ConsoleSink::new()).build()
    };

    let scenarios = args
        .scenario
        .map_or_else(|| Scenario::ALL.to_vec(), |scenario| vec![scenario]);

    match run_scenarios(&trace, &scenarios) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
