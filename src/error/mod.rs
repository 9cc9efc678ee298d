pub mod codegen;
pub mod parser;
pub mod scanner;
pub mod tree;

use crate::{CodegenError, ParseError, ScanError, TreeError, error::{parser::ParserError, scanner::ScannerError}};

/// CompileError is the top-level error type of every pipeline stage.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
	/// Internal compiler error, I/O included
	#[error("CompilerInternalError: {0}")]
	InternalError(#[from] anyhow::Error),
	#[error("Lexical error: {0}")]
	ScanError(#[from] ScanError),
	#[error("Syntax error: {0}")]
	ParseError(#[from] ParseError),
	#[error("Broken tree: {0}")]
	TreeError(#[from] TreeError),
	#[error("Code generation failed: {0}")]
	CodegenError(#[from] CodegenError),
}

impl From<ScannerError> for CompileError {
	fn from(error: ScannerError) -> Self {
		match error {
			ScannerError::InternalError(e) => e.into(),
			ScannerError::ScanError(e) => e.into(),
		}
	}
}

impl From<ParserError> for CompileError {
	fn from(error: ParserError) -> Self {
		match error {
			ParserError::InternalError(e) => e.into(),
			ParserError::ParseError(e) => e.into(),
		}
	}
}
