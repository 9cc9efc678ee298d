/// Scanner related errors
#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
	/// Internal compiler error, should never happen
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	/// Errors encountered during scanning
	#[error(transparent)]
	ScanError(#[from] ScanError),
}

/// A specific scanning error with its source position and type.
#[derive(thiserror::Error, Debug)]
#[error("line {line}, column {column}: {type}")]
pub struct ScanError {
	/// The line where the error occurred.
	pub line:   usize,
	/// The byte column inside that line.
	pub column: usize,
	/// The type of scanning error.
	pub r#type: ScanErrorType,
}

impl ScanError {
	pub fn new(line: usize, column: usize, r#type: ScanErrorType) -> Self { Self { line, column, r#type } }
}

/// Types of scanning errors.
#[derive(Debug, PartialEq)]
pub enum ScanErrorType {
	/// A character no token starts with.
	UnexpectedCharacter(char),
	/// A `"` without its closing partner.
	UnterminatedString,
	/// A keyword marker that is not followed by what it needs, e.g. a lone `!`.
	MalformedMarker(char),
	/// A digit run that does not fit into an integer.
	InvalidNumber(String),
}

impl std::fmt::Display for ScanErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorType::*;
		match self {
			UnexpectedCharacter(c) => {
				write!(f, "Unexpected character '{c}'")
			}
			UnterminatedString => {
				write!(f, "Unterminated string")
			}
			MalformedMarker(c) => {
				write!(f, "Malformed marker '{c}', expected '{c}='")
			}
			InvalidNumber(text) => {
				write!(f, "Invalid number literal '{text}'")
			}
		}
	}
}
