use std::{fs, io::Write, path::Path};

use anyhow::Context;
use tracing::info;

use crate::{
	CompileError,
	codegen::{self, CodegenOptions},
	parser::Parser,
	scanner::Scanner,
	simplify::simplify,
	symbols::Symbols,
	tree::{Tree, prefix},
	unparser::unparse,
};

/// One run of the pipeline, or a part of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
	/// Source to assembly.
	Compile,
	/// Source to prefix tree text.
	Front,
	/// Prefix tree text to prefix tree text with constants folded.
	Middle,
	/// Prefix tree text to assembly.
	Back,
	/// Prefix tree text back to source.
	Decompile,
}

/// Compiler is the entry point of the 57 toolchain.
#[derive(Debug, Default, Clone)]
pub struct Compiler {
	options: CodegenOptions,
}

impl Compiler {
	pub fn new(options: CodegenOptions) -> Self { Self { options } }

	/// Read `input`, run `stage` on it and write the result to `output`, or
	/// to stdout when there is none.
	pub fn run_file<P: AsRef<Path>>(&self, stage: Stage, input: P, output: Option<P>) -> Result<(), CompileError> {
		let input = input.as_ref();
		let source = fs::read_to_string(input).with_context(|| format!("Failed open {}", input.display()))?;
		let text = self.run(stage, &source)?;
		match output {
			Some(path) => {
				let path = path.as_ref();
				fs::write(path, text).with_context(|| format!("Failed write {}", path.display()))?;
				info!(output = %path.display(), ?stage, "written");
			}
			None => std::io::stdout().write_all(text.as_bytes()).context("Failed write stdout")?,
		}
		Ok(())
	}

	pub fn run(&self, stage: Stage, text: &str) -> Result<String, CompileError> {
		match stage {
			Stage::Compile => self.compile(text),
			Stage::Front => self.front(text),
			Stage::Middle => self.middle(text),
			Stage::Back => self.back(text),
			Stage::Decompile => self.decompile(text),
		}
	}

	/// Compile source text into assembly.
	pub fn compile(&self, source: &str) -> Result<String, CompileError> {
		let (tree, mut symbols) = self.parse(source)?;
		Ok(codegen::generate(&tree, &mut symbols, &self.options)?)
	}

	/// Compile source text into the prefix tree form.
	pub fn front(&self, source: &str) -> Result<String, CompileError> {
		let (tree, symbols) = self.parse(source)?;
		Ok(prefix::write(&tree, &symbols)?)
	}

	/// Fold constants in the prefix tree form.
	pub fn middle(&self, text: &str) -> Result<String, CompileError> {
		let (mut tree, symbols) = self.read(text)?;
		simplify(&mut tree);
		Ok(prefix::write(&tree, &symbols)?)
	}

	/// Generate assembly from the prefix tree form.
	pub fn back(&self, text: &str) -> Result<String, CompileError> {
		let (tree, mut symbols) = self.read(text)?;
		Ok(codegen::generate(&tree, &mut symbols, &self.options)?)
	}

	/// Regenerate source text from the prefix tree form.
	pub fn decompile(&self, text: &str) -> Result<String, CompileError> {
		let (tree, symbols) = self.read(text)?;
		Ok(unparse(&tree, &symbols)?)
	}

	/// Scan and parse `source` into a verified tree.
	pub fn parse(&self, source: &str) -> Result<(Tree, Symbols), CompileError> {
		let tokens = Scanner::new(source).scan_tokens()?;
		let (tree, symbols) = Parser::new(tokens).parse()?;
		tree.verify(&symbols)?;
		Ok((tree, symbols))
	}

	fn read(&self, text: &str) -> Result<(Tree, Symbols), CompileError> {
		let (tree, symbols) = prefix::read(text)?;
		tree.verify(&symbols)?;
		Ok((tree, symbols))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ParseErrorType, ScanErrorType, TreeError};

	const PROGRAM: &str = "575757 main 57 575757 x == 7 57 . x 57 {";

	#[test]
	fn front_then_back_matches_compile() {
		let compiler = Compiler::default();
		let text = compiler.run(Stage::Front, PROGRAM).unwrap();
		assert_eq!(compiler.run(Stage::Back, &text).unwrap(), compiler.run(Stage::Compile, PROGRAM).unwrap());
	}

	#[test]
	fn middle_keeps_what_the_program_does() {
		let compiler = Compiler::default();
		let source = "575757 main 57 575757 x == { / 1 57 575757 y == 2 - 3 / 4 57 . x + 0 57 . y 57 {";
		let front = compiler.front(source).unwrap();
		let middle = compiler.run(Stage::Middle, &front).unwrap();
		assert_ne!(middle, front);
		assert!(middle.contains("(ASSIGN (y nil nil) (14 nil nil))"));

		let asm = compiler.back(&middle).unwrap();
		let instructions = |asm: &str| asm.lines().filter(|line| !line.trim().is_empty()).count();
		assert!(instructions(&asm) < instructions(&compiler.back(&front).unwrap()));
		assert_eq!(
			asm,
			"call main:\nhlt\n\nmain:\n    in\n    pop [0]\n    push 14\n    pop [1]\n    push [0]\n    out\n    pop\n    \
			 push [1]\n    out\n    pop\n    ret\n"
		);
		assert_eq!(compiler.middle(&middle).unwrap(), middle);
	}

	#[test]
	fn decompile_returns_source() {
		let compiler = Compiler::default();
		let text = compiler.front(PROGRAM).unwrap();
		let source = compiler.decompile(&text).unwrap();
		assert_eq!(compiler.front(&source).unwrap(), text);
	}

	#[test]
	fn errors_name_their_stage() {
		let compiler = Compiler::default();
		assert!(matches!(
			compiler.compile("575757 main 57 \"open"),
			Err(CompileError::ScanError(e)) if e.r#type == ScanErrorType::UnterminatedString
		));
		assert!(matches!(
			compiler.compile("575757 main 57 y 57 {"),
			Err(CompileError::ParseError(e)) if e.r#type == ParseErrorType::UndefinedName("y".to_string())
		));
		assert!(matches!(compiler.back("(ADD (1 nil nil) nil)"), Err(CompileError::TreeError(TreeError::BadArity { .. }))));
		assert!(matches!(compiler.back("(RETURN (POW (1 nil nil) (2 nil nil)) nil)"), Err(CompileError::CodegenError(_))));
	}

	#[test]
	fn run_file_reports_missing_input() {
		let result = Compiler::default().run_file(Stage::Compile, Path::new("/nonexistent/main.57"), None);
		assert!(matches!(result, Err(CompileError::InternalError(_))));
	}
}
