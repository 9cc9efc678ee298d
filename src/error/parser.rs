#[derive(thiserror::Error, Debug)]
pub enum ParserError {
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	ParseError(#[from] ParseError),
}

#[derive(thiserror::Error, Debug)]
#[error("line {line}, column {column}: {type}")]
pub struct ParseError {
	pub line:   usize,
	pub column: usize,
	pub r#type: ParseErrorType,
}

impl ParseError {
	pub fn new(line: usize, column: usize, r#type: ParseErrorType) -> Self { Self { line, column, r#type } }
}

#[derive(Debug, PartialEq)]
pub enum ParseErrorType {
	/// Found one token while the grammar required another.
	UnexpectedToken { expected: String, found: String },
	/// A name used before any declaration of it.
	UndefinedName(String),
	/// The token cannot start an expression.
	ExpectedExpression(String),
}

impl std::fmt::Display for ParseErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ParseErrorType::*;
		match self {
			UnexpectedToken { expected, found } => {
				write!(f, "Expected {expected}, found {found}")
			}
			UndefinedName(name) => {
				write!(f, "Undefined name '{name}'")
			}
			ExpectedExpression(found) => {
				write!(f, "Expected expression, found {found}")
			}
		}
	}
}
