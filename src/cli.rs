use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{codegen::CodegenOptions, compiler::Stage};

#[derive(Parser, Debug)]
#[command(name = "fiftyseven", version, about = "Compiler for the 57 language", long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
	/// Compile source into assembly
	Compile {
		#[command(flatten)]
		io:      Io,
		/// Binary output path, accepted and not written
		#[arg(long, value_name = "FILE")]
		binary:  Option<PathBuf>,
		#[command(flatten)]
		backend: Backend,
	},
	/// Parse source into the prefix tree form
	Front {
		#[command(flatten)]
		io: Io,
	},
	/// Fold constants in the prefix tree form
	Middle {
		#[command(flatten)]
		io: Io,
	},
	/// Generate assembly from the prefix tree form
	Back {
		#[command(flatten)]
		io:      Io,
		#[command(flatten)]
		backend: Backend,
	},
	/// Turn the prefix tree form back into source
	Decompile {
		#[command(flatten)]
		io: Io,
	},
}

#[derive(Args, Debug)]
pub struct Io {
	/// Input file
	#[arg(value_name = "FILE")]
	pub input:  PathBuf,
	/// Output file, stdout when absent
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct Backend {
	/// Spaces per nesting level
	#[arg(long, default_value_t = 4)]
	pub indent:   usize,
	/// Emit `@` comments around control flow and calls
	#[arg(long)]
	pub annotate: bool,
}

impl Mode {
	/// The pipeline stage, its files and the backend settings.
	pub fn into_parts(self) -> (Stage, Io, CodegenOptions) {
		let options = |backend: Backend| CodegenOptions { indent: backend.indent, annotate: backend.annotate };
		match self {
			Mode::Compile { io, backend, .. } => (Stage::Compile, io, options(backend)),
			Mode::Front { io } => (Stage::Front, io, CodegenOptions::default()),
			Mode::Middle { io } => (Stage::Middle, io, CodegenOptions::default()),
			Mode::Back { io, backend } => (Stage::Back, io, options(backend)),
			Mode::Decompile { io } => (Stage::Decompile, io, CodegenOptions::default()),
		}
	}
}
