use std::process::ExitCode;

use clap::Parser;
use fiftyseven::{Compiler, cli::*};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let (stage, io, options) = Cli::parse().mode.into_parts();
	match Compiler::new(options).run_file(stage, &io.input, io.output.as_ref()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("Failed run file: {e}");
			ExitCode::FAILURE
		}
	}
}
